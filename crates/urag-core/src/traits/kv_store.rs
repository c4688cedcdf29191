// # Key/Value Store Trait
//
// Defines the durable store the local cache persists bulk datasets to.
//
// ## Contract
//
// - `get(key)` returns the last value written, or `None`
// - `set(key, value)` overwrites the whole value
// - No transactions and no expiry: staleness is computed by the caller
//
// ## Implementations
//
// - [`crate::store::MemoryKvStore`]: not persistent, for tests
// - [`crate::store::FileKvStore`]: JSON file with atomic writes

use async_trait::async_trait;

/// Trait for key/value store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: the stored value
    /// - `Ok(None)`: nothing stored
    /// - `Err(Error)`: storage error
    async fn get(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<(), crate::Error>;
}
