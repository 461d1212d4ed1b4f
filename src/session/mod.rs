//! Per-connection session handling
//!
//! A session is created for every accepted WebSocket and walks
//! `Connecting → AwaitingLogin → Active → Closed`. The transport driver in
//! `server::connection` feeds it frames; the session drives the registry,
//! the presence broadcaster and the router.

pub mod context;
pub mod handler;
pub mod state;

pub use context::RelayContext;
pub use handler::SessionHandler;
pub use state::{SessionPhase, SessionState};
