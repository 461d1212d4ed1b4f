//! Shared services handed to every session

use std::sync::Arc;

use crate::directory::UserDirectory;
use crate::registry::Registry;
use crate::stats::RelayStats;

/// Process-wide state shared by all sessions
///
/// Cheap to clone; every field is reference counted.
#[derive(Clone)]
pub struct RelayContext {
    /// Live presence registry
    pub registry: Arc<Registry>,

    /// Account directory consulted at login, if any
    pub directory: Option<Arc<dyn UserDirectory>>,

    /// Relay-wide counters
    pub stats: Arc<RelayStats>,
}

impl RelayContext {
    /// Create a context around `registry` with fresh stats and no directory
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            directory: None,
            stats: Arc::new(RelayStats::new()),
        }
    }

    /// Require logins to exist in `directory`
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }
}

impl std::fmt::Debug for RelayContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayContext")
            .field("has_directory", &self.directory.is_some())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
