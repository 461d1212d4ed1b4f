//! Registry error types

use thiserror::Error;

use super::identity::Identity;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Identity is empty or whitespace only
    #[error("name must not be empty")]
    EmptyIdentity,
    /// Identity exceeds the length limit
    #[error("name is too long ({len} bytes, max {max})")]
    IdentityTooLong { len: usize, max: usize },
    /// Identity is held by a live connection and the policy forbids takeover
    #[error("name already connected: {0}")]
    AlreadyRegistered(Identity),
}
