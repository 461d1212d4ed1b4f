//! Registry implementation
//!
//! The process-wide map from identity to peer handle. Every method takes the
//! lock for a single map read or mutation and never performs I/O while
//! holding it.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::config::{DuplicatePolicy, RegistryConfig};
use super::entry::{PeerHandle, RegistryEntry};
use super::error::RegistryError;
use super::identity::Identity;

/// Result of a successful registration
#[derive(Debug)]
pub enum Registration {
    /// Name was free
    Inserted,
    /// Name was held; the previous handle was evicted and is returned so the
    /// caller can tell that connection to close
    Replaced(PeerHandle),
}

/// Central registry for connected peers
///
/// Thread-safe via `RwLock`. Presence snapshots and routing lookups take the
/// read side, so they proceed concurrently with each other.
pub struct Registry {
    /// Map of identity to entry, ordered by name
    peers: RwLock<BTreeMap<Identity, RegistryEntry>>,

    /// Configuration
    config: RegistryConfig,
}

impl Registry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            peers: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a peer under `identity`
    ///
    /// If the name is held, the configured [`DuplicatePolicy`] decides
    /// between evicting the old handle and refusing the new one.
    pub async fn register(
        &self,
        identity: Identity,
        handle: PeerHandle,
    ) -> Result<Registration, RegistryError> {
        let mut peers = self.peers.write().await;

        if let Some(existing) = peers.get(&identity) {
            if self.config.duplicate_policy == DuplicatePolicy::Reject {
                return Err(RegistryError::AlreadyRegistered(identity));
            }

            let previous = existing.handle.clone();
            tracing::info!(
                identity = %identity,
                old_session = previous.session_id(),
                new_session = handle.session_id(),
                "Peer registered (replacing existing connection)"
            );
            peers.insert(identity, RegistryEntry::new(handle));
            return Ok(Registration::Replaced(previous));
        }

        tracing::info!(
            identity = %identity,
            session_id = handle.session_id(),
            "Peer registered"
        );
        peers.insert(identity, RegistryEntry::new(handle));

        Ok(Registration::Inserted)
    }

    /// Remove `identity` regardless of which session holds it
    ///
    /// Absent names are a no-op.
    pub async fn unregister(&self, identity: &str) -> Option<PeerHandle> {
        let removed = self.peers.write().await.remove(identity);

        if let Some(ref entry) = removed {
            tracing::info!(
                identity = identity,
                session_id = entry.handle.session_id(),
                connected_secs = entry.registered_at.elapsed().as_secs(),
                "Peer unregistered"
            );
        }

        removed.map(|entry| entry.handle)
    }

    /// Remove `identity` only if it is still held by `session_id`
    ///
    /// Returns true if an entry was removed. A session that was evicted by a
    /// newer login gets false here and leaves its successor in place.
    pub async fn release(&self, identity: &str, session_id: u64) -> bool {
        let mut peers = self.peers.write().await;

        match peers.get(identity) {
            Some(entry) if entry.handle.session_id() == session_id => {
                let connected_secs = entry.registered_at.elapsed().as_secs();
                peers.remove(identity);
                tracing::info!(
                    identity = identity,
                    session_id = session_id,
                    connected_secs = connected_secs,
                    "Peer released"
                );
                true
            }
            Some(entry) => {
                tracing::debug!(
                    identity = identity,
                    owner = entry.handle.session_id(),
                    session_id = session_id,
                    "Release skipped, name owned by another session"
                );
                false
            }
            None => false,
        }
    }

    /// Find the handle for `identity`
    pub async fn lookup(&self, identity: &str) -> Option<PeerHandle> {
        self.peers
            .read()
            .await
            .get(identity)
            .map(|entry| entry.handle.clone())
    }

    /// Check whether `identity` is registered
    pub async fn contains(&self, identity: &str) -> bool {
        self.peers.read().await.contains_key(identity)
    }

    /// Point-in-time list of registered identities, sorted by name
    pub async fn snapshot(&self) -> Vec<Identity> {
        self.peers.read().await.keys().cloned().collect()
    }

    /// Point-in-time copy of every identity with its handle, sorted by name
    pub async fn entries(&self) -> Vec<(Identity, PeerHandle)> {
        self.peers
            .read()
            .await
            .iter()
            .map(|(identity, entry)| (identity.clone(), entry.handle.clone()))
            .collect()
    }

    /// Number of registered peers
    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Whether no peers are registered
    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    fn id(name: &str) -> Identity {
        Identity::parse(name).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = Registry::new();
        let (handle, _rx) = PeerHandle::channel(1, 4);

        let result = registry.register(id("Alice"), handle).await.unwrap();
        assert!(matches!(result, Registration::Inserted));

        let found = registry.lookup("Alice").await.unwrap();
        assert_eq!(found.session_id(), 1);
        assert!(registry.lookup("Bob").await.is_none());
        assert!(registry.contains("Alice").await);
    }

    #[tokio::test]
    async fn test_duplicate_replaces_by_default() {
        let registry = Registry::new();
        let (first, _rx1) = PeerHandle::channel(1, 4);
        let (second, _rx2) = PeerHandle::channel(2, 4);

        registry.register(id("Alice"), first.clone()).await.unwrap();
        let result = registry.register(id("Alice"), second).await.unwrap();

        match result {
            Registration::Replaced(old) => assert!(old.same_peer(&first)),
            Registration::Inserted => panic!("expected eviction"),
        }
        assert_eq!(registry.lookup("Alice").await.unwrap().session_id(), 2);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_rejected_with_reject_policy() {
        let config = RegistryConfig::default().duplicate_policy(DuplicatePolicy::Reject);
        let registry = Registry::with_config(config);
        let (first, _rx1) = PeerHandle::channel(1, 4);
        let (second, _rx2) = PeerHandle::channel(2, 4);

        registry.register(id("Alice"), first).await.unwrap();
        let result = registry.register(id("Alice"), second).await;

        assert_eq!(result.unwrap_err(), RegistryError::AlreadyRegistered(id("Alice")));
        assert_eq!(registry.lookup("Alice").await.unwrap().session_id(), 1);
    }

    #[tokio::test]
    async fn test_unregister_absent_is_noop() {
        let registry = Registry::new();
        assert!(registry.unregister("ghost").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_release_checks_owner() {
        let registry = Registry::new();
        let (first, _rx1) = PeerHandle::channel(1, 4);
        let (second, _rx2) = PeerHandle::channel(2, 4);

        registry.register(id("Alice"), first).await.unwrap();
        registry.register(id("Alice"), second).await.unwrap();

        // Evicted session cleans up late
        assert!(!registry.release("Alice", 1).await);
        assert!(registry.contains("Alice").await);

        assert!(registry.release("Alice", 2).await);
        assert!(!registry.contains("Alice").await);
        assert!(!registry.release("Alice", 2).await);
    }

    #[tokio::test]
    async fn test_snapshot_sorted_and_unique() {
        let registry = Registry::new();
        let mut receivers = Vec::new();

        for (session_id, name) in ["Carol", "Alice", "Bob", "Alice"].into_iter().enumerate() {
            let (handle, rx) = PeerHandle::channel(session_id as u64, 4);
            receivers.push(rx);
            registry.register(id(name), handle).await.unwrap();
        }

        let names: Vec<String> = registry.snapshot().await.into_iter().map(String::from).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);

        registry.unregister("Bob").await;
        let names: Vec<String> = registry.snapshot().await.into_iter().map(String::from).collect();
        assert_eq!(names, vec!["Alice", "Carol"]);

        let entries = registry.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1.session_id(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_unregister() {
        const PEERS: usize = 200;

        let registry = Arc::new(Registry::new());
        let mut tasks = Vec::new();

        for i in 0..PEERS {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let (handle, rx) = PeerHandle::channel(i as u64, 1);
                registry
                    .register(Identity::parse(format!("peer-{i}")).unwrap(), handle)
                    .await
                    .unwrap();
                rx
            }));
        }

        let mut receivers = Vec::new();
        for task in tasks {
            receivers.push(task.await.unwrap());
        }

        let snapshot = registry.snapshot().await;
        let unique: HashSet<_> = snapshot.iter().collect();
        assert_eq!(snapshot.len(), PEERS);
        assert_eq!(unique.len(), PEERS);

        let mut tasks = Vec::new();
        for i in 0..PEERS {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry.release(&format!("peer-{i}"), i as u64).await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert!(registry.snapshot().await.is_empty());
        assert!(registry.is_empty().await);
    }
}
