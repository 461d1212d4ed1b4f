//! Relay-wide counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::relay::{BroadcastReport, RouteOutcome};

/// Live counters shared by every session
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    total_connections: AtomicU64,
    active_connections: AtomicU64,
    rejected_connections: AtomicU64,
    logins: AtomicU64,
    failed_logins: AtomicU64,
    messages_routed: AtomicU64,
    routing_failures: AtomicU64,
    presence_broadcasts: AtomicU64,
    dropped_deliveries: AtomicU64,
    protocol_errors: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Connections accepted since start
    pub total_connections: u64,
    /// Connections currently open
    pub active_connections: u64,
    /// Connections refused by the connection limit
    pub rejected_connections: u64,
    /// Successful logins
    pub logins: u64,
    /// Refused logins
    pub failed_logins: u64,
    /// Messages queued on their target
    pub messages_routed: u64,
    /// Messages answered with an error instead of delivery
    pub routing_failures: u64,
    /// Presence fan-outs performed
    pub presence_broadcasts: u64,
    /// Presence updates skipped for unresponsive peers
    pub dropped_deliveries: u64,
    /// Frames that could not be parsed
    pub protocol_errors: u64,
    /// Time since the stats were created
    pub uptime: Duration,
}

impl RelayStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            rejected_connections: AtomicU64::new(0),
            logins: AtomicU64::new(0),
            failed_logins: AtomicU64::new(0),
            messages_routed: AtomicU64::new(0),
            routing_failures: AtomicU64::new(0),
            presence_broadcasts: AtomicU64::new(0),
            dropped_deliveries: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
        }
    }

    pub(crate) fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_rejected(&self) {
        self.rejected_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn login(&self, success: bool) {
        if success {
            self.logins.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_logins.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_route(&self, outcome: RouteOutcome) {
        if outcome.is_delivered() {
            self.messages_routed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.routing_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_broadcast(&self, report: &BroadcastReport) {
        self.presence_broadcasts.fetch_add(1, Ordering::Relaxed);
        self.dropped_deliveries
            .fetch_add(report.dropped as u64, Ordering::Relaxed);
    }

    /// Read every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            logins: self.logins.load(Ordering::Relaxed),
            failed_logins: self.failed_logins.load(Ordering::Relaxed),
            messages_routed: self.messages_routed.load(Ordering::Relaxed),
            routing_failures: self.routing_failures.load(Ordering::Relaxed),
            presence_broadcasts: self.presence_broadcasts.load(Ordering::Relaxed),
            dropped_deliveries: self.dropped_deliveries.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}
