// # File Share Channel
//
// File-backed ShareChannel for the command-line harness. The file holds the
// encoded string and nothing else, so it can be pasted into a URL fragment.
//
// Writes go to a temp file that is then renamed over the target, so a
// reader never sees a half-written value.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Error;
use crate::traits::ShareChannel;

/// File-backed share channel
#[derive(Debug, Clone)]
pub struct FileShareChannel {
    path: PathBuf,
}

impl FileShareChannel {
    /// Create a channel at `path`; the file is created on first write
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the share file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl ShareChannel for FileShareChannel {
    async fn read(&self) -> Result<Option<String>, Error> {
        if !self.path.exists() {
            tracing::debug!("Share file does not exist: {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to read share file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let content = content.trim();
        Ok((!content.is_empty()).then(|| content.to_string()))
    }

    async fn write(&self, encoded: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, encoded).await.map_err(|e| {
            Error::store(format!(
                "Failed to write temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Share state written to file: {}", self.path.display());
        Ok(())
    }
}
