//! Per-source local cache for bulk datasets
//!
//! A bulk source fetches its whole dataset once and serves many draws from
//! it. [`LocalCache`] keeps that dataset in memory, persists it to a
//! [`KeyValueStore`] under `"urag-" + source_id`, and decides when it is
//! stale.
//!
//! ## Staleness
//!
//! An entry is stale iff `now - lastSavedAtEpochMs > 24h`. Staleness is
//! recomputed on every access and never stored.
//!
//! ## Stored Format
//!
//! ```json
//! { "payload": <provider-specific>, "lastSavedAtEpochMs": 1767225600000 }
//! ```
//!
//! Writes overwrite the whole entry. An undecodable entry is a cache miss.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::KeyValueStore;

/// Prefix of every cache key in the key/value store
pub const CACHE_KEY_PREFIX: &str = "urag-";

/// Age after which a cached dataset is stale (24 hours)
pub const STALE_AFTER_MS: i64 = 86_400_000;

/// Current time in epoch milliseconds
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whether an entry saved at `last_saved_at_epoch_ms` is stale at `now_ms`
///
/// Exactly [`STALE_AFTER_MS`] old is still fresh.
pub fn is_stale_at(now_ms: i64, last_saved_at_epoch_ms: i64) -> bool {
    now_ms - last_saved_at_epoch_ms > STALE_AFTER_MS
}

/// Whether an entry saved at `last_saved_at_epoch_ms` is stale now
pub fn is_stale(last_saved_at_epoch_ms: i64) -> bool {
    is_stale_at(now_epoch_ms(), last_saved_at_epoch_ms)
}

/// Store key for a source's cache entry
pub fn cache_key(source_id: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, source_id)
}

/// Persisted dataset plus its fetch timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Provider-specific dataset
    pub payload: T,
    /// When the payload was last written
    #[serde(rename = "lastSavedAtEpochMs")]
    pub last_saved_at_epoch_ms: i64,
}

impl<T> CacheEntry<T> {
    /// Whether this entry is stale now
    pub fn is_stale(&self) -> bool {
        is_stale(self.last_saved_at_epoch_ms)
    }
}

#[derive(Debug)]
struct CacheState<T> {
    entry: Option<CacheEntry<T>>,
    hydrated: bool,
}

/// Local cache for one source's bulk dataset
///
/// # Refresh De-duplication
///
/// [`refresh_if_stale`](LocalCache::refresh_if_stale) holds a per-cache
/// latch for the whole check-fetch-save sequence and re-checks staleness
/// after acquiring it. Concurrent stale triggers within a batch therefore
/// produce one upstream fetch; later callers find the fresh entry.
pub struct LocalCache<T> {
    key: String,
    store: Arc<dyn KeyValueStore>,
    state: RwLock<CacheState<T>>,
    refresh_latch: Mutex<()>,
}

impl<T> LocalCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Create an empty cache for `source_id`
    ///
    /// Nothing is read until the first access.
    pub fn new(source_id: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            key: cache_key(source_id),
            store,
            state: RwLock::new(CacheState {
                entry: None,
                hydrated: false,
            }),
            refresh_latch: Mutex::new(()),
        }
    }

    /// Store key of this cache
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Hydrate in-memory state from the store
    ///
    /// Absent entries leave the cache empty. Undecodable entries and store
    /// read failures are treated as a miss and logged, never returned.
    pub async fn load(&self) {
        let loaded = match self.read_entry().await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring cache entry {}: {}", self.key, e);
                None
            }
        };

        let mut state = self.state.write().await;
        if let Some(entry) = loaded {
            debug!(
                "Hydrated cache {} (saved at {})",
                self.key, entry.last_saved_at_epoch_ms
            );
            state.entry = Some(entry);
        }
        state.hydrated = true;
    }

    async fn read_entry(&self) -> Result<Option<CacheEntry<T>>> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::cache_corrupt(format!("{}: {}", self.key, e)))
    }

    async fn ensure_hydrated(&self) {
        if !self.state.read().await.hydrated {
            self.load().await;
        }
    }

    /// Stamp the current time and write the in-memory entry back
    ///
    /// No-op when the cache holds nothing.
    pub async fn save(&self) -> Result<()> {
        let raw = {
            let mut state = self.state.write().await;
            let Some(entry) = state.entry.as_mut() else {
                return Ok(());
            };
            entry.last_saved_at_epoch_ms = now_epoch_ms();
            serde_json::to_string(&*entry)?
        };
        self.store.set(&self.key, &raw).await
    }

    /// Replace the payload and persist it
    pub async fn replace(&self, payload: T) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.entry = Some(CacheEntry {
                payload,
                last_saved_at_epoch_ms: now_epoch_ms(),
            });
            state.hydrated = true;
        }
        self.save().await
    }

    /// Whether the cache is empty or its entry is older than 24 hours
    pub async fn is_stale(&self) -> bool {
        self.ensure_hydrated().await;
        self.state
            .read()
            .await
            .entry
            .as_ref()
            .is_none_or(CacheEntry::is_stale)
    }

    /// Refetch and persist the dataset if it is stale
    ///
    /// # Parameters
    ///
    /// - `fetch`: produces the full dataset; called at most once per stale
    ///   period regardless of how many callers race here
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the dataset was refreshed
    /// - `Ok(false)`: the cached dataset was fresh
    /// - `Err(Error)`: `fetch` failed; the previous payload is kept
    ///
    /// A failed store write is logged; the fresh payload still serves from
    /// memory for this process.
    pub async fn refresh_if_stale<F, Fut>(&self, fetch: F) -> Result<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _latch = self.refresh_latch.lock().await;

        if !self.is_stale().await {
            debug!("Cache {} is fresh, skipping refresh", self.key);
            return Ok(false);
        }

        info!("Cache {} is stale, refreshing dataset", self.key);
        let payload = fetch().await?;

        if let Err(e) = self.replace(payload).await {
            warn!("Failed to persist cache {}: {}", self.key, e);
        }
        Ok(true)
    }

    /// Run `f` against the cached payload
    ///
    /// Returns `None` when nothing is cached.
    pub async fn with_payload<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.ensure_hydrated().await;
        self.state.read().await.entry.as_ref().map(|entry| f(&entry.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entry_json(payload: &[u32], saved: i64) -> String {
        serde_json::to_string(&CacheEntry {
            payload: payload.to_vec(),
            last_saved_at_epoch_ms: saved,
        })
        .unwrap()
    }

    #[test]
    fn test_staleness_boundary() {
        let now = 1_767_225_600_000;
        assert!(!is_stale_at(now, now));
        assert!(!is_stale_at(now, now - STALE_AFTER_MS));
        assert!(is_stale_at(now, now - STALE_AFTER_MS - 1));
        assert!(is_stale_at(now, now - 90_000_000));
    }

    #[test]
    fn test_entry_uses_wire_field_name() {
        let json = entry_json(&[1], 42);
        assert!(json.contains("\"lastSavedAtEpochMs\":42"), "{}", json);
    }

    #[tokio::test]
    async fn test_empty_cache_is_stale() {
        let cache: LocalCache<Vec<u32>> = LocalCache::new("fish", Arc::new(MemoryKvStore::new()));
        assert!(cache.is_stale().await);
        assert_eq!(cache.with_payload(|p| p.len()).await, None);
    }

    #[tokio::test]
    async fn test_load_hydrates_fresh_entry() {
        let store = MemoryKvStore::new();
        store
            .set("urag-fish", &entry_json(&[1, 2, 3], now_epoch_ms()))
            .await
            .unwrap();

        let cache: LocalCache<Vec<u32>> = LocalCache::new("fish", Arc::new(store));
        assert!(!cache.is_stale().await);
        assert_eq!(cache.with_payload(|p| p.clone()).await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let store = MemoryKvStore::new();
        store.set("urag-fish", "not json at all").await.unwrap();

        let cache: LocalCache<Vec<u32>> = LocalCache::new("fish", Arc::new(store.clone()));
        assert!(cache.is_stale().await);

        let refreshed = cache.refresh_if_stale(|| async { Ok::<_, Error>(vec![7]) }).await.unwrap();
        assert!(refreshed);
        assert_eq!(cache.with_payload(|p| p.clone()).await, Some(vec![7]));

        let raw = store.get("urag-fish").await.unwrap().unwrap();
        let entry: CacheEntry<Vec<u32>> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entry.payload, vec![7]);
    }

    #[tokio::test]
    async fn test_stale_entry_refreshes_once_and_writes_once() {
        let store = MemoryKvStore::new();
        store
            .set("urag-fish", &entry_json(&[1], now_epoch_ms() - 90_000_000))
            .await
            .unwrap();
        let writes_before = store.write_count();

        let cache: LocalCache<Vec<u32>> = LocalCache::new("fish", Arc::new(store.clone()));
        let fetches = AtomicUsize::new(0);
        let counter = &fetches;

        let refreshed = cache
            .refresh_if_stale(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(vec![2])
            })
            .await
            .unwrap();

        assert!(refreshed);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.write_count() - writes_before, 1);
        assert!(!cache.is_stale().await);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_collapse() {
        let store = MemoryKvStore::new();
        let cache: LocalCache<Vec<u32>> = LocalCache::new("fish", Arc::new(store.clone()));
        let fetches = AtomicUsize::new(0);
        let counter = &fetches;

        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<_, Error>(vec![9])
        };

        let (a, b, c) = tokio::join!(
            cache.refresh_if_stale(fetch),
            cache.refresh_if_stale(fetch),
            cache.refresh_if_stale(fetch),
        );

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.write_count(), 1);
        let refreshed = [a.unwrap(), b.unwrap(), c.unwrap()];
        assert_eq!(refreshed.iter().filter(|r| **r).count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_payload() {
        let store = MemoryKvStore::new();
        store
            .set("urag-fish", &entry_json(&[1], now_epoch_ms() - 90_000_000))
            .await
            .unwrap();

        let cache: LocalCache<Vec<u32>> = LocalCache::new("fish", Arc::new(store));
        let result = cache
            .refresh_if_stale(|| async { Err(Error::upstream("fish", "HTTP 503")) })
            .await;

        assert!(matches!(result, Err(Error::Upstream { .. })));
        assert_eq!(cache.with_payload(|p| p.clone()).await, Some(vec![1]));
    }
}
