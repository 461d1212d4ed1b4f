//! Point-to-point message router

use crate::protocol::{RoutedMessage, ServerMessage};
use crate::registry::{DeliveryError, Identity, PeerHandle, Registry};

/// What happened to a routed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Queued on the target's connection
    Delivered,
    /// No peer is registered under the target name
    TargetNotConnected,
    /// Target is registered but its queue refused the message
    DeliveryFailed(DeliveryError),
}

impl RouteOutcome {
    /// Whether the message reached the target's queue
    pub fn is_delivered(&self) -> bool {
        matches!(self, RouteOutcome::Delivered)
    }
}

/// Forward `message` to its target, replying to `reply_to` on failure
///
/// The frame is forwarded byte-for-byte as the sender wrote it. Failures
/// produce an `error` frame for the sender; that reply is itself best
/// effort.
pub async fn route(
    registry: &Registry,
    sender: &Identity,
    reply_to: &PeerHandle,
    message: &RoutedMessage,
) -> RouteOutcome {
    let Some(target) = registry.lookup(&message.target).await else {
        tracing::debug!(
            sender = %sender,
            target = %message.target,
            kind = %message.kind,
            "Target not connected"
        );
        reply_error(
            reply_to,
            format!("user '{}' is not connected", message.target),
        );
        return RouteOutcome::TargetNotConnected;
    };

    match target.try_send_text(message.raw.as_str()) {
        Ok(()) => {
            tracing::debug!(
                sender = %sender,
                target = %message.target,
                kind = %message.kind,
                "Message relayed"
            );
            RouteOutcome::Delivered
        }
        Err(e) => {
            tracing::warn!(
                sender = %sender,
                target = %message.target,
                kind = %message.kind,
                error = %e,
                "Relay delivery failed"
            );
            reply_error(
                reply_to,
                format!("delivery to '{}' failed: {}", message.target, e),
            );
            RouteOutcome::DeliveryFailed(e)
        }
    }
}

fn reply_error(reply_to: &PeerHandle, message: String) {
    let text = match ServerMessage::error(message).encode() {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode error reply");
            return;
        }
    };

    if let Err(e) = reply_to.try_send_text(text) {
        tracing::debug!(
            session_id = reply_to.session_id(),
            error = %e,
            "Error reply dropped"
        );
    }
}
