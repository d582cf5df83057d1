//! Test identity caches.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use boxscore_core::cache::IdentityCache;

/// In-memory identity cache that honors per-entry expiry. Suitable
/// both as a test double and as the cache for store integration tests
/// where no Redis server is available.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes an entry, simulating expiry or eviction.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    /// Number of live (possibly expired) entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the cache holds no entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        let (value, deadline) = entries.get(key)?;
        (Instant::now() < *deadline).then(|| value.clone())
    }
}

#[async_trait]
impl IdentityCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.live_value(key)
    }

    async fn set(&self, key: &str, id: &str, ttl: Duration) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), (id.to_owned(), Instant::now() + ttl));
    }

    async fn get_many(&self, keys: &[String]) -> HashMap<String, String> {
        keys.iter()
            .filter_map(|k| self.live_value(k).map(|v| (k.clone(), v)))
            .collect()
    }

    async fn set_many(&self, entries: &[(String, String)], ttl: Duration) {
        let deadline = Instant::now() + ttl;
        let mut map = self.entries.lock().unwrap();
        for (key, id) in entries {
            map.insert(key.clone(), (id.clone(), deadline));
        }
    }
}

/// A cache where every read misses and every write is dropped, as if
/// the cache backend were unreachable. The pipeline must behave
/// identically (minus latency) with this cache installed.
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl IdentityCache for FailingCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _id: &str, _ttl: Duration) {}

    async fn get_many(&self, _keys: &[String]) -> HashMap<String, String> {
        HashMap::new()
    }

    async fn set_many(&self, _entries: &[(String, String)], _ttl: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_round_trip_and_expiry() {
        let cache = MemoryCache::new();

        cache.set("team:Lakers", "t-1", Duration::from_secs(60)).await;
        assert_eq!(cache.get("team:Lakers").await.as_deref(), Some("t-1"));

        cache.set("team:Heat", "t-2", Duration::ZERO).await;
        assert_eq!(cache.get("team:Heat").await, None);
    }

    #[tokio::test]
    async fn test_memory_cache_batched_ops() {
        let cache = MemoryCache::new();
        cache
            .set_many(
                &[
                    ("a".to_owned(), "1".to_owned()),
                    ("b".to_owned(), "2".to_owned()),
                ],
                Duration::from_secs(60),
            )
            .await;

        let hits = cache
            .get_many(&["a".to_owned(), "b".to_owned(), "c".to_owned()])
            .await;

        assert_eq!(hits.len(), 2);
        assert_eq!(hits.get("a").map(String::as_str), Some("1"));
        assert_eq!(hits.get("b").map(String::as_str), Some("2"));
    }
}
