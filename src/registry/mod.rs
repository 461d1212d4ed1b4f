//! Connection registry for presence and routing
//!
//! The registry maps each logged-in identity to a handle on that peer's
//! outbound queue. It is the single source of truth for "who is connected".
//!
//! # Architecture
//!
//! ```text
//!                          Arc<Registry>
//!                     ┌─────────────────────────┐
//!                     │ peers: BTreeMap<        │
//!                     │   Identity,             │
//!                     │   RegistryEntry {       │
//!                     │     handle: PeerHandle, │
//!                     │   }                     │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │ lookup / entries (clone handle, drop lock)
//!         ┌───────────────────────┼───────────────────────┐
//!         ▼                       ▼                       ▼
//!    [Session A]             [Session B]             [Session C]
//!    mpsc::Receiver          mpsc::Receiver          mpsc::Receiver
//!         │                       │                       │
//!         └──► writer task ──► WebSocket sink
//! ```
//!
//! # Delivery
//!
//! Handles are cloned out of the lock before any send. Sends use
//! `try_send` on a bounded queue, so a peer that stops draining only loses
//! its own messages and never stalls the sender.

pub mod config;
pub mod entry;
pub mod error;
pub mod identity;
pub mod store;

pub use config::{DuplicatePolicy, RegistryConfig};
pub use entry::{DeliveryError, Outbound, PeerHandle};
pub use error::RegistryError;
pub use identity::{Identity, MAX_IDENTITY_LEN};
pub use store::{Registration, Registry};
