//! In-memory store implementation.
//!
//! Used as a test double and for storeless local runs. Entries record
//! their TTL and insertion instant so tests can assert on the expiry a
//! write requested; expiry itself is enforced lazily on read.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use reqlog_core::result::LogResult;
use reqlog_core::traits::store::LogStore;

/// A stored value with its requested expiry.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    ttl: Duration,
    stored_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// In-memory log store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    /// Expiring entries.
    entries: Arc<DashMap<String, StoredEntry>>,
    /// Counters stored separately for atomic incr; no expiry.
    counters: Arc<DashMap<String, AtomicI64>>,
}

impl MemoryLogStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The TTL requested for a live entry, if the key exists.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|e| !e.is_expired())
            .map(|e| e.ttl)
    }

    /// Number of live (non-counter) entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_expired()).count()
    }

    /// Whether the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn incr(&self, key: &str) -> LogResult<i64> {
        let entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| AtomicI64::new(0));
        let new_val = entry.value().fetch_add(1, Ordering::SeqCst) + 1;
        Ok(new_val)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> LogResult<()> {
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                ttl,
                stored_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> LogResult<()> {
        self.entries.remove(key);
        self.counters.remove(key);
        Ok(())
    }

    async fn get(&self, key: &str) -> LogResult<Option<String>> {
        if let Some(counter) = self.counters.get(key) {
            return Ok(Some(counter.value().load(Ordering::SeqCst).to_string()));
        }
        // The read guard must be released before removing an expired key,
        // otherwise remove() can deadlock on the same shard.
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn health_check(&self) -> LogResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get() {
        let store = MemoryLogStore::new();
        store
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        let val = store.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryLogStore::new();
        store
            .set("key2", "value2", Duration::from_secs(60))
            .await
            .unwrap();
        store.delete("key2").await.unwrap();
        let val = store.get("key2").await.unwrap();
        assert_eq!(val, None);
    }

    #[tokio::test]
    async fn test_incr_starts_at_one() {
        let store = MemoryLogStore::new();
        assert_eq!(store.incr("counter").await.unwrap(), 1);
        assert_eq!(store.incr("counter").await.unwrap(), 2);
        assert_eq!(store.get("counter").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_ttl_recorded() {
        let store = MemoryLogStore::new();
        store
            .set("key3", "value3", Duration::from_secs(86_400))
            .await
            .unwrap();
        assert_eq!(store.ttl_of("key3"), Some(Duration::from_secs(86_400)));
        assert_eq!(store.ttl_of("missing"), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let store = MemoryLogStore::new();
        store.set("key4", "value4", Duration::ZERO).await.unwrap();
        assert_eq!(store.get("key4").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let store = MemoryLogStore::new();
        assert!(store.health_check().await.unwrap());
    }
}
