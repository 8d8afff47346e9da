use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::Result;

/// What the cache remembers about one logical file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub content_hash: String,
    pub remote_file_id: String,
    #[serde(default)]
    pub updated_at_ms: i64,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>,
        content_hash: impl Into<String>,
        remote_file_id: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            content_hash: content_hash.into(),
            remote_file_id: remote_file_id.into(),
            updated_at_ms: now_millis(),
        }
    }
}

/// Persistent `key -> (content_hash, remote_file_id)` mapping used by
/// [`FileManager`](super::FileManager). Keys are unique; `put` replaces.
#[async_trait]
pub trait FileCacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    async fn put(&self, entry: CacheEntry) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Removes every entry pointing at `remote_file_id` and returns them.
    async fn remove_by_file_id(&self, remote_file_id: &str) -> Result<Vec<CacheEntry>>;

    /// All entries ordered by key.
    async fn entries(&self) -> Result<Vec<CacheEntry>>;

    async fn clear(&self) -> Result<()>;
}

/// Non-persistent store; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryFileCacheStore {
    entries: Mutex<BTreeMap<String, CacheEntry>>,
}

impl MemoryFileCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileCacheStore for MemoryFileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        self.entries.lock().await.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.lock().await.remove(key))
    }

    async fn remove_by_file_id(&self, remote_file_id: &str) -> Result<Vec<CacheEntry>> {
        let mut entries = self.entries.lock().await;
        let keys: Vec<String> = entries
            .values()
            .filter(|entry| entry.remote_file_id == remote_file_id)
            .map(|entry| entry.key.clone())
            .collect();
        Ok(keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .collect())
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.entries.lock().await.values().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}
