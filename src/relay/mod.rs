//! Presence fan-out and point-to-point forwarding
//!
//! Both operations read handles out of the [`Registry`](crate::registry::Registry)
//! and then queue frames without holding any lock. A failed send affects
//! only the peer it was addressed to.

pub mod broadcast;
pub mod router;

pub use broadcast::{broadcast_presence, BroadcastReport};
pub use router::{route, RouteOutcome};
