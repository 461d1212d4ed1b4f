//! # signal-relay
//!
//! A WebSocket signaling relay. Peers log in under a name, see who else is
//! online, and exchange opaque offer/answer/candidate messages addressed by
//! name so they can set up a direct peer-to-peer session elsewhere.
//!
//! - [`registry`]: the concurrent map of live names to connection handles
//! - [`session`]: per-connection state machine (login, relay, cleanup)
//! - [`relay`]: presence broadcast and point-to-point routing
//! - [`protocol`]: the JSON wire format
//! - [`server`]: TCP/WebSocket accept loop and connection driver
//! - [`directory`]: optional account directory checked at login
//!
//! ## Example
//!
//! ```no_run
//! use signal_relay::{RelayServer, ServerConfig};
//!
//! # async fn example() -> signal_relay::Result<()> {
//! let server = RelayServer::new(ServerConfig::default());
//! server
//!     .run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod directory;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use directory::{MemoryDirectory, UserDirectory};
pub use error::{Error, Result};
pub use registry::{DuplicatePolicy, Identity, Registry, RegistryConfig};
pub use server::{RelayServer, ServerConfig};
