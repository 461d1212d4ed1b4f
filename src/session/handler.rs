//! Session handler
//!
//! Applies inbound frames to the session state machine:
//!
//! - `AwaitingLogin`: only `login` is accepted. Success registers the peer,
//!   acknowledges and broadcasts presence. Anything else gets an `error`.
//! - `Active`: `login` and `user_list` are ignored, everything else is
//!   handed to the router.
//! - Close: the registry entry is released and presence rebroadcast.
//!
//! Once a close has been requested on the peer handle (for example after a
//! newer login took the name), further frames are dropped.
//!
//! Protocol errors are answered and never end the session.

use std::net::SocketAddr;

use crate::protocol::{parse, ClientMessage, ProtocolError, RoutedMessage, ServerMessage};
use crate::registry::{Identity, PeerHandle, Registration};
use crate::relay::{broadcast_presence, route};

use super::context::RelayContext;
use super::state::{SessionPhase, SessionState};

/// Drives one connection's protocol state
pub struct SessionHandler {
    state: SessionState,
    handle: PeerHandle,
    ctx: RelayContext,
}

impl SessionHandler {
    /// Create a handler for the connection behind `handle`
    pub fn new(peer_addr: SocketAddr, handle: PeerHandle, ctx: RelayContext) -> Self {
        Self {
            state: SessionState::new(handle.session_id(), peer_addr),
            handle,
            ctx,
        }
    }

    /// Current session state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// WebSocket handshake finished
    pub fn on_transport_ready(&mut self) {
        self.state.transport_ready();
        tracing::debug!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            "Awaiting login"
        );
    }

    /// Whether this connection has been asked to close
    pub fn close_requested(&self) -> bool {
        self.handle.close_requested()
    }

    /// Handle one inbound text frame
    pub async fn on_text(&mut self, text: &str) {
        if self.state.is_closed() {
            return;
        }
        if self.close_requested() {
            tracing::debug!(session_id = self.state.id, "Frame dropped after close request");
            return;
        }
        self.state.messages_received += 1;

        let message = match parse(text) {
            Ok(message) => message,
            Err(e) => {
                self.protocol_error(e);
                return;
            }
        };

        match self.state.phase {
            SessionPhase::AwaitingLogin => self.on_awaiting_login(message).await,
            SessionPhase::Active => self.on_active(message).await,
            SessionPhase::Connecting | SessionPhase::Closed => {
                tracing::debug!(
                    session_id = self.state.id,
                    phase = ?self.state.phase,
                    "Frame ignored"
                );
            }
        }
    }

    /// Handle a binary frame, which the protocol does not use
    pub fn on_binary(&mut self) {
        if !self.state.is_closed() && !self.close_requested() {
            self.protocol_error(ProtocolError::Unsupported("binary"));
        }
    }

    /// Tear the session down. Safe to call more than once.
    pub async fn on_close(&mut self) {
        let Some(identity) = self.state.close() else {
            return;
        };

        let released = self
            .ctx
            .registry
            .release(identity.as_str(), self.state.id)
            .await;

        tracing::info!(
            session_id = self.state.id,
            identity = %identity,
            duration_secs = self.state.duration().as_secs(),
            received = self.state.messages_received,
            relayed = self.state.messages_relayed,
            "Session closed"
        );

        // An evicted session no longer owns the name; its successor is still present
        if released {
            self.broadcast().await;
        }
    }

    async fn on_awaiting_login(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::Login { name } => self.login(name).await,
            ClientMessage::Presence | ClientMessage::Routed(_) => {
                self.reply(ServerMessage::error("login required before sending messages"));
            }
        }
    }

    async fn on_active(&mut self, message: ClientMessage) {
        if message.is_noop() {
            tracing::trace!(
                session_id = self.state.id,
                message = ?message,
                "Ignoring login/presence frame"
            );
            return;
        }

        if let ClientMessage::Routed(routed) = message {
            self.relay(routed).await;
        }
    }

    async fn login(&mut self, name: String) {
        let identity = match Identity::parse(name) {
            Ok(identity) => identity,
            Err(e) => return self.reject_login(e.to_string()),
        };

        if let Some(ref directory) = self.ctx.directory {
            if let Err(e) = directory.login_user(identity.as_str()) {
                return self.reject_login(e.to_string());
            }
        }

        match self
            .ctx
            .registry
            .register(identity.clone(), self.handle.clone())
            .await
        {
            Ok(Registration::Inserted) => {}
            Ok(Registration::Replaced(previous)) => evict(&previous),
            Err(e) => return self.reject_login(e.to_string()),
        }

        tracing::info!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            identity = %identity,
            "Login accepted"
        );

        self.state.on_login(identity);
        self.ctx.stats.login(true);
        self.reply(ServerMessage::login_ok());
        self.broadcast().await;
    }

    fn reject_login(&mut self, reason: String) {
        tracing::info!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            reason = %reason,
            "Login refused"
        );
        self.ctx.stats.login(false);
        self.reply(ServerMessage::login_failed(reason));
    }

    async fn relay(&mut self, message: RoutedMessage) {
        let Some(sender) = self.state.identity() else {
            return;
        };

        if let Some(declared) = message.sender.as_deref() {
            if declared != sender.as_str() {
                tracing::debug!(
                    session_id = self.state.id,
                    identity = %sender,
                    declared = declared,
                    "Routed frame names a different sender"
                );
            }
        }

        let outcome = route(&self.ctx.registry, sender, &self.handle, &message).await;
        self.ctx.stats.record_route(outcome);

        if outcome.is_delivered() {
            self.state.messages_relayed += 1;
        }
    }

    async fn broadcast(&self) {
        let report = broadcast_presence(&self.ctx.registry).await;
        self.ctx.stats.record_broadcast(&report);
    }

    fn protocol_error(&mut self, error: ProtocolError) {
        tracing::debug!(
            session_id = self.state.id,
            error = %error,
            "Protocol error"
        );
        self.ctx.stats.protocol_error();
        self.reply(ServerMessage::error(error.to_string()));
    }

    fn reply(&self, message: ServerMessage) {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(session_id = self.state.id, error = %e, "Failed to encode reply");
                return;
            }
        };

        if let Err(e) = self.handle.try_send_text(text) {
            tracing::debug!(session_id = self.state.id, error = %e, "Reply dropped");
        }
    }
}

/// Tell a connection that lost its name to a newer login, then close it
fn evict(previous: &PeerHandle) {
    if let Ok(text) = ServerMessage::error("signed in from another connection").encode() {
        let _ = previous.try_send_text(text);
    }
    if !previous.close() {
        tracing::debug!(
            session_id = previous.session_id(),
            "Close frame not queued for evicted connection"
        );
    }
}
