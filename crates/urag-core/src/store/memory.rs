// # Memory Key/Value Store
//
// In-memory implementation of KeyValueStore.
//
// Nothing survives a restart, so every bulk source refetches its dataset on
// the first run. Useful for tests and for one-shot runs where that is fine.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::KeyValueStore;

/// In-memory key/value store
///
/// Clones share the same underlying map, so a test can keep a handle to a
/// store it passed to a source and inspect what was written.
///
/// # Example
///
/// ```rust,no_run
/// use urag_core::store::MemoryKvStore;
/// use urag_core::traits::KeyValueStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryKvStore::new();
///     store.set("urag-fishwatch", "{}").await?;
///     assert_eq!(store.get("urag-fishwatch").await?.as_deref(), Some("{}"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryKvStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of keys in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Number of `set` calls since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryKvStore::new();

        assert!(store.is_empty().await);
        assert_eq!(store.get("urag-dog-ceo").await.unwrap(), None);

        store.set("urag-dog-ceo", "first").await.unwrap();
        store.set("urag-dog-ceo", "second").await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.write_count(), 2);
        assert_eq!(
            store.get("urag-dog-ceo").await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_state() {
        let store = MemoryKvStore::new();
        let handle = store.clone();

        store.set("k", "v").await.unwrap();
        assert_eq!(handle.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(handle.write_count(), 1);
    }
}
