use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Snapshot of a cache's contents, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    pub size: usize,
    pub keys: Vec<String>,
}

/// In-memory lookup cache. Entries never expire; `clear` is the only way
/// to drop them.
#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let cache = self.inner.lock().await;
        let value = cache.get(key).cloned();
        if value.is_some() {
            debug!("Cache HIT");
        } else {
            debug!("Cache MISS");
        }
        value
    }

    pub async fn put(&self, key: K, value: V) {
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT");
        cache.insert(key, value);
    }

    pub async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        debug!(entries = cache.len(), "Cache CLEAR");
        cache.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + ToString,
    V: Clone + Send + Sync,
{
    /// Size and sorted keys of the cache.
    pub async fn info(&self) -> CacheInfo {
        let cache = self.inner.lock().await;
        let mut keys: Vec<String> = cache.keys().map(ToString::to_string).collect();
        keys.sort();
        CacheInfo {
            size: cache.len(),
            keys,
        }
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
