//! Session state machine
//!
//! Tracks the lifecycle of one signaling connection from accept to close.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::registry::Identity;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// TCP accepted, WebSocket handshake not finished
    Connecting,
    /// WebSocket open, waiting for the login frame
    AwaitingLogin,
    /// Logged in and registered
    Active,
    /// Cleaned up; no further frames are processed
    Closed,
}

/// Complete session state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Name registered at login
    identity: Option<Identity>,

    /// Connection start time
    pub connected_at: Instant,

    /// Time when login succeeded
    pub logged_in_at: Option<Instant>,

    /// Text frames received
    pub messages_received: u64,

    /// Messages this session delivered to other peers
    pub messages_relayed: u64,
}

impl SessionState {
    /// Create a new session state
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Connecting,
            identity: None,
            connected_at: Instant::now(),
            logged_in_at: None,
            messages_received: 0,
            messages_relayed: 0,
        }
    }

    /// WebSocket handshake finished
    pub fn transport_ready(&mut self) {
        if self.phase == SessionPhase::Connecting {
            self.phase = SessionPhase::AwaitingLogin;
        }
    }

    /// Login accepted and registered
    pub fn on_login(&mut self, identity: Identity) {
        if self.phase == SessionPhase::AwaitingLogin {
            self.identity = Some(identity);
            self.logged_in_at = Some(Instant::now());
            self.phase = SessionPhase::Active;
        }
    }

    /// Enter `Closed`, returning the identity that needs cleanup if the
    /// session was active
    pub fn close(&mut self) -> Option<Identity> {
        let was_active = self.phase == SessionPhase::Active;
        self.phase = SessionPhase::Closed;

        if was_active {
            self.identity.clone()
        } else {
            None
        }
    }

    /// Name registered at login
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Check if session is active
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Check if session is closed
    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Closed
    }

    /// Get session duration
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
