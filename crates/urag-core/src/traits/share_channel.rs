// # Share Channel Trait
//
// The shareable-state channel: one encoded string (the URL fragment in a
// browser, a file for the command-line harness) that is replaced as a whole
// on every write.

use async_trait::async_trait;

/// Trait for share channel implementations
///
/// Readers must never observe a mix of an old and a new value.
#[async_trait]
pub trait ShareChannel: Send + Sync {
    /// Read the current encoded state, `None` when nothing was written
    async fn read(&self) -> Result<Option<String>, crate::Error>;

    /// Replace the encoded state
    async fn write(&self, encoded: &str) -> Result<(), crate::Error>;
}
