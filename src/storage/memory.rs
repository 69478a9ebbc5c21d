//! In-memory key-value backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::storage::KvStore;

/// Process-local storage, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }
}

#[async_trait]
impl KvStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
