//! In-memory user directory

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{DirectoryError, UserDirectory};

/// Process-lifetime account set
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: Mutex<HashSet<String>>,
}

impl MemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory pre-populated with `names`
    pub fn with_users<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            users: Mutex::new(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.users().len()
    }

    /// Whether the directory has no accounts
    pub fn is_empty(&self) -> bool {
        self.users().is_empty()
    }

    fn users(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserDirectory for MemoryDirectory {
    fn register_user(&self, name: &str) -> Result<(), DirectoryError> {
        if name.trim().is_empty() {
            return Err(DirectoryError::MissingName);
        }

        if !self.users().insert(name.to_string()) {
            return Err(DirectoryError::NameTaken(name.to_string()));
        }

        tracing::info!(user = name, "User registered");
        Ok(())
    }

    fn login_user(&self, name: &str) -> Result<(), DirectoryError> {
        if name.trim().is_empty() {
            return Err(DirectoryError::MissingName);
        }

        if self.users().contains(name) {
            Ok(())
        } else {
            Err(DirectoryError::UnknownUser(name.to_string()))
        }
    }
}
