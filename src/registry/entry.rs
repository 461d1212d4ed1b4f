//! Peer handles and registry entries
//!
//! A [`PeerHandle`] is the registry's non-owning reference to a connection:
//! the sending half of that connection's outbound queue plus a close signal.
//! The session that accepted the socket owns the receiving half and the
//! socket itself.
//!
//! The close signal is separate from the queue, so a close request is seen
//! even when the queue is full.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::watch;

/// Item queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Text frame to deliver
    Text(String),
    /// Ask the writer to send a close frame and stop
    Close,
}

/// Why a message could not be queued for a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Peer is not draining its queue
    #[error("peer outbound queue is full")]
    QueueFull,
    /// Peer's writer has stopped
    #[error("peer disconnected")]
    Disconnected,
}

impl<T> From<TrySendError<T>> for DeliveryError {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Disconnected,
        }
    }
}

/// Cloneable handle for pushing messages to one connection
#[derive(Debug, Clone)]
pub struct PeerHandle {
    session_id: u64,
    tx: mpsc::Sender<Outbound>,
    close_tx: Arc<watch::Sender<bool>>,
}

impl PeerHandle {
    /// Wrap an existing queue sender
    pub fn new(session_id: u64, tx: mpsc::Sender<Outbound>) -> Self {
        let (close_tx, _) = watch::channel(false);
        Self {
            session_id,
            tx,
            close_tx: Arc::new(close_tx),
        }
    }

    /// Create a handle together with the queue receiver its writer drains
    pub fn channel(session_id: u64, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(session_id, tx), rx)
    }

    /// Session that owns the connection
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Queue a text frame without waiting
    pub fn try_send_text(&self, text: impl Into<String>) -> Result<(), DeliveryError> {
        self.tx.try_send(Outbound::Text(text.into()))?;
        Ok(())
    }

    /// Ask the connection to close
    ///
    /// The close signal is always raised. Returns false if the close frame
    /// itself could not be queued for the writer.
    pub fn close(&self) -> bool {
        self.close_tx.send_replace(true);
        self.tx.try_send(Outbound::Close).is_ok()
    }

    /// Whether [`close`](Self::close) has been called on any clone
    pub fn close_requested(&self) -> bool {
        *self.close_tx.borrow()
    }

    /// Receiver that observes close requests
    pub fn close_signal(&self) -> watch::Receiver<bool> {
        self.close_tx.subscribe()
    }

    /// Whether the writer side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Whether two handles point at the same queue
    pub fn same_peer(&self, other: &PeerHandle) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

/// Entry for a single identity in the registry
#[derive(Debug, Clone)]
pub(super) struct RegistryEntry {
    pub(super) handle: PeerHandle,
    pub(super) registered_at: Instant,
}

impl RegistryEntry {
    pub(super) fn new(handle: PeerHandle) -> Self {
        Self {
            handle,
            registered_at: Instant::now(),
        }
    }
}
