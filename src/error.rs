//! Error types for the relay
//!
//! Each module owns a narrow error enum; [`Error`] folds them together for
//! the connection driver and the server entry points.

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::protocol::ProtocolError;
use crate::registry::RegistryError;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Socket-level failure (bind, accept, configure)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or framing failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Wire message could not be parsed or encoded
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registry rejected an operation
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// User directory rejected an operation
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}
