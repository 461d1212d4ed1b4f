//! User directory
//!
//! Account registration and lookup, separate from live presence. A name can
//! exist in the directory while nobody is connected under it, and the relay
//! only consults the directory at login time when one is attached to the
//! server.

pub mod memory;

use thiserror::Error;

pub use memory::MemoryDirectory;

/// Reason a directory operation was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// No name supplied
    #[error("a name is required")]
    MissingName,
    /// Another account already uses the name
    #[error("name already taken: {0}")]
    NameTaken(String),
    /// No account exists under the name
    #[error("unknown user: {0}")]
    UnknownUser(String),
}

/// Account store consulted during login
pub trait UserDirectory: Send + Sync {
    /// Create an account. Fails with [`DirectoryError::NameTaken`] on duplicates.
    fn register_user(&self, name: &str) -> Result<(), DirectoryError>;

    /// Check that an account exists
    fn login_user(&self, name: &str) -> Result<(), DirectoryError>;
}
