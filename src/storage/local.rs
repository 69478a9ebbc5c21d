//! Local filesystem key-value backend.
//!
//! Each key is one file under the root directory. Writes go to a temporary
//! file first and are renamed into place.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Relay configuration (optional)
//! └── processed_entries     # Dedup store value
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::KvStore;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a key.
    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(AppError::storage(format!("invalid key '{key}'")));
        }
        Ok(self.root_dir.join(key))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        self.ensure_dir(&path).await?;

        let tmp = self.root_dir.join(format!("{key}.tmp"));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl KvStore for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.read_bytes(key).await? {
            Some(bytes) => {
                let value = String::from_utf8(bytes).map_err(|e| {
                    AppError::storage(format!("value of '{key}' is not valid UTF-8: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.write_bytes(key, value.as_bytes()).await?;
        log::debug!("Wrote {} bytes to {}", value.len(), self.root_dir.join(key).display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
