//! Peer identity
//!
//! The name a peer chooses at login. It keys the registry and is the value
//! other peers put in a message's `target` field.

use std::borrow::Borrow;
use std::fmt;

use super::error::RegistryError;

/// Maximum identity length in bytes
pub const MAX_IDENTITY_LEN: usize = 64;

/// Validated identity name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(String);

impl Identity {
    /// Validate and wrap a login name
    pub fn parse(name: impl Into<String>) -> Result<Self, RegistryError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(RegistryError::EmptyIdentity);
        }
        if name.len() > MAX_IDENTITY_LEN {
            return Err(RegistryError::IdentityTooLong {
                len: name.len(),
                max: MAX_IDENTITY_LEN,
            });
        }

        Ok(Self(name))
    }

    /// Borrow the name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let id = Identity::parse("Alice").unwrap();
        assert_eq!(id.as_str(), "Alice");
        assert_eq!(id.to_string(), "Alice");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Identity::parse(""), Err(RegistryError::EmptyIdentity));
        assert_eq!(Identity::parse("   "), Err(RegistryError::EmptyIdentity));
    }

    #[test]
    fn test_parse_too_long() {
        let name = "x".repeat(MAX_IDENTITY_LEN + 1);
        assert!(matches!(
            Identity::parse(name),
            Err(RegistryError::IdentityTooLong { len: 65, max: 64 })
        ));

        // Exactly at the limit is fine
        assert!(Identity::parse("x".repeat(MAX_IDENTITY_LEN)).is_ok());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert_ne!(Identity::parse("bob").unwrap(), Identity::parse("Bob").unwrap());
    }
}
