// # Memory Share Channel
//
// In-memory implementation of ShareChannel. The value is swapped under a
// lock, so a reader sees either the old string or the new one.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::ShareChannel;

/// In-memory share channel
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryShareChannel {
    inner: Arc<RwLock<Option<String>>>,
}

impl MemoryShareChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel holding `encoded`, as if a link had been opened
    pub fn with_value(encoded: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(encoded.into()))),
        }
    }
}

#[async_trait]
impl ShareChannel for MemoryShareChannel {
    async fn read(&self) -> Result<Option<String>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn write(&self, encoded: &str) -> Result<(), Error> {
        *self.inner.write().await = Some(encoded.to_string());
        Ok(())
    }
}
