//! WebSocket server
//!
//! Accepts TCP connections, upgrades them to WebSocket and runs one
//! session per connection against the shared registry.

pub mod config;
pub(crate) mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use listener::RelayServer;
