//! Key-value storage for the dedup store.
//!
//! The relay keeps exactly one piece of persistent state: the list of
//! processed entry keys, stored as a comma-joined string under one
//! well-known key. The key is deleted instead of holding an empty string.
//!
//! ## Backends
//!
//! ```text
//! local   {dir}/{key}                  one file per key, atomic rename
//! memory  HashMap<String, String>      tests and dry runs
//! s3      s3://{bucket}/{prefix}/{key} Lambda deployments (feature "s3")
//! ```

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{StorageBackend, StorageConfig};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Separator between keys in the persisted value.
const SEPARATOR: &str = ",";

/// Trait for key-value backends.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value, `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Open the backend selected in configuration.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KvStore>> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalStorage::new(&config.dir))),
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        #[cfg(feature = "s3")]
        StorageBackend::S3 => Ok(Arc::new(
            s3::S3Storage::from_env(&config.bucket, &config.prefix).await?,
        )),
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => Err(crate::error::AppError::config(
            "storage.backend = \"s3\" requires the `s3` feature",
        )),
    }
}

/// Ordered set of processed entry keys.
///
/// Insertion order is preserved so the persisted string stays stable
/// between runs.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    keys: Vec<String>,
    index: HashSet<String>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from a stored value.
    ///
    /// An absent value and an empty string both mean "no keys". Empty tokens
    /// are dropped, so `""` never turns into a set holding one empty key.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut set = Self::new();
        if let Some(raw) = raw {
            for token in raw.split(SEPARATOR) {
                let token = token.trim();
                if !token.is_empty() {
                    set.insert(token);
                }
            }
        }
        set
    }

    /// Encode for storage, `None` when there is nothing to persist.
    pub fn encode(&self) -> Option<String> {
        if self.keys.is_empty() {
            None
        } else {
            Some(self.keys.join(SEPARATOR))
        }
    }

    /// Add a key. Returns `false` if it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.index.contains(&key) {
            return false;
        }
        self.index.insert(key.clone());
        self.keys.push(key);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl PartialEq for ProcessedSet {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl Eq for ProcessedSet {}

impl<S: Into<String>> FromIterator<S> for ProcessedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

/// The processed-entry list under one well-known key.
#[derive(Clone)]
pub struct DedupStore {
    store: Arc<dyn KvStore>,
    key: String,
}

impl DedupStore {
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current set. An absent key is an empty set.
    pub async fn load(&self) -> Result<ProcessedSet> {
        let raw = self.store.get(&self.key).await?;
        Ok(ProcessedSet::parse(raw.as_deref()))
    }

    /// Rewrite the stored value in full, deleting the key when the set is empty.
    pub async fn save(&self, set: &ProcessedSet) -> Result<()> {
        match set.encode() {
            Some(value) => {
                self.store.put(&self.key, &value).await?;
                log::info!("Dedup store '{}' now holds {} keys", self.key, set.len());
            }
            None => {
                self.store.delete(&self.key).await?;
                log::info!("Dedup store '{}' is empty, key removed", self.key);
            }
        }
        Ok(())
    }

    /// Forget every processed entry.
    pub async fn clear(&self) -> Result<()> {
        self.save(&ProcessedSet::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absent_and_empty() {
        assert!(ProcessedSet::parse(None).is_empty());
        assert!(ProcessedSet::parse(Some("")).is_empty());
        assert!(ProcessedSet::parse(Some(",,")).is_empty());
    }

    #[test]
    fn test_parse_drops_duplicates_and_keeps_order() {
        let set = ProcessedSet::parse(Some("42-1,7-2,42-1"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["42-1", "7-2"]);
    }

    #[test]
    fn test_encode_empty_is_none() {
        assert_eq!(ProcessedSet::new().encode(), None);
    }

    #[test]
    fn test_insert_reports_duplicates() {
        let mut set = ProcessedSet::new();
        assert!(set.insert("a-1"));
        assert!(!set.insert("a-1"));
        assert_eq!(set.len(), 1);
        assert!(set.contains("a-1"));
    }

    #[tokio::test]
    async fn test_round_trip_preserves_keys() {
        let store = DedupStore::new(Arc::new(MemoryStorage::new()), "processed");

        for n in 1..=5 {
            let set: ProcessedSet = (0..n).map(|i| format!("{i}-{}", 1000 + i)).collect();
            store.save(&set).await.unwrap();
            let loaded = store.load().await.unwrap();
            assert_eq!(loaded, set);
            assert_eq!(loaded.len(), n);
        }
    }

    #[tokio::test]
    async fn test_empty_set_removes_key() {
        let backend = Arc::new(MemoryStorage::new());
        let store = DedupStore::new(backend.clone(), "processed");

        store.save(&ProcessedSet::parse(Some("1-1"))).await.unwrap();
        assert!(backend.get("processed").await.unwrap().is_some());

        store.save(&ProcessedSet::new()).await.unwrap();
        assert_eq!(backend.get("processed").await.unwrap(), None);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.get("anything").await.unwrap(), None);
    }
}
