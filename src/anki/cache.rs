//! Resource caching layer

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: String,
    stored_at: Instant,
}

/// Cache for rendered resource payloads with an entry limit and a time-to-live
pub struct ResourceCache {
    inner: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl ResourceCache {
    /// Create a cache holding at most `capacity` entries for `ttl` each
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Get a cached value. Expired entries are dropped on access.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();

        let expired = match inner.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.pop(key);
        }
        None
    }

    /// Store a value, evicting the least recently used entry when full
    pub fn put(&self, key: impl Into<String>, value: String) {
        self.inner.lock().put(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Check if a live entry exists for the key
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Get the number of stored entries, including expired ones not yet dropped
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
