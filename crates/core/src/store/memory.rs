//! In-memory store with per-entry expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheOptions, Error, KeyValueStore};

/// Stored value with its optional deadline.
struct MemoryEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> MemoryEntry<V> {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Process-local store backed by a HashMap behind a tokio RwLock.
///
/// Clones share the same underlying map. Expired entries read as absent and
/// are dropped lazily on the next write or by [`MemoryStore::cleanup_expired`].
pub struct MemoryStore<V> {
    entries: Arc<RwLock<HashMap<String, MemoryEntry<V>>>>,
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        Self { entries: Arc::clone(&self.entries) }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.values().filter(|e| !e.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All live keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> =
            entries.iter().filter(|(_, e)| !e.is_expired()).map(|(k, _)| k.clone()).collect();
        keys.sort();
        keys
    }

    /// Drop expired entries.
    pub async fn cleanup_expired(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired());
    }
}

#[async_trait]
impl<V> KeyValueStore<V, CacheOptions> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, Error> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).filter(|entry| !entry.is_expired()).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: V, options: CacheOptions) -> Result<(), Error> {
        let expires_at = options.ttl_duration().and_then(|ttl| Instant::now().checked_add(ttl));
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired());
        entries.insert(key.to_string(), MemoryEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
