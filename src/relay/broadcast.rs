//! Presence broadcaster

use crate::protocol::ServerMessage;
use crate::registry::Registry;

/// Outcome of one presence fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers registered at snapshot time
    pub recipients: usize,
    /// Peers whose queue accepted the list
    pub delivered: usize,
    /// Peers skipped because their queue was full or closed
    pub dropped: usize,
}

/// Push the current presence list to every registered peer
///
/// The list and the recipients come from the same registry snapshot. Each
/// recipient is attempted independently; failures are logged and counted,
/// never returned.
pub async fn broadcast_presence(registry: &Registry) -> BroadcastReport {
    let entries = registry.entries().await;

    let users = entries
        .iter()
        .map(|(identity, _)| identity.as_str().to_string())
        .collect();

    let text = match (ServerMessage::UserList { users }).encode() {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode presence list");
            return BroadcastReport {
                recipients: entries.len(),
                dropped: entries.len(),
                ..Default::default()
            };
        }
    };

    let mut report = BroadcastReport {
        recipients: entries.len(),
        ..Default::default()
    };

    for (identity, handle) in &entries {
        match handle.try_send_text(text.as_str()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.dropped += 1;
                tracing::warn!(
                    identity = %identity,
                    session_id = handle.session_id(),
                    error = %e,
                    "Presence update dropped"
                );
            }
        }
    }

    tracing::debug!(
        recipients = report.recipients,
        delivered = report.delivered,
        dropped = report.dropped,
        "Presence broadcast"
    );

    report
}
