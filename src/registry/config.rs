//! Registry configuration

/// What happens when a name that is already connected logs in again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Evict the existing connection and adopt the new one.
    ///
    /// Recovers from stale entries left by peers that vanished without a
    /// close frame and have not yet hit the idle timeout.
    #[default]
    Replace,
    /// Refuse the new login while the name is held
    Reject,
}

/// Registry configuration
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Duplicate login handling
    pub duplicate_policy: DuplicatePolicy,
}

impl RegistryConfig {
    /// Set the duplicate login policy
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}
