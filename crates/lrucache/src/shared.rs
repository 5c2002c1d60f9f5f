//! SharedLruCache: LruCache behind a single lock

use std::borrow::Borrow;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::error::Result;
use crate::lru::LruCache;
use crate::stats::CacheStats;

/// Thread-safe wrapper around [`LruCache`] with hit/miss statistics
///
/// Every call holds one mutex for its whole duration. `get` reorders the
/// recency list, so there is no read-only path and no `RwLock`.
pub struct SharedLruCache<K, V> {
    /// Index and recency list, locked together
    cache: Mutex<LruCache<K, V>>,

    /// Cache statistics
    stats: CacheStats,

    /// Cache capacity
    capacity: usize,
}

impl<K, V> SharedLruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new shared cache with the given capacity
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of items in cache
    ///
    /// # Returns
    /// * `Result<SharedLruCache>` - `Error::InvalidCapacity` if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            cache: Mutex::new(LruCache::new(capacity)?),
            stats: CacheStats::new(),
            capacity,
        })
    }

    /// Get a copy of a value, marking it most-recently-used
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut cache = self.cache.lock();
        match cache.get(key) {
            Some(value) => {
                self.stats.record_hit();
                Some(value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Get a copy of a value without changing recency order
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.cache.lock().peek(key).cloned()
    }

    /// Check whether `key` is cached
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.lock().contains(key)
    }

    /// Insert or overwrite a key-value pair
    pub fn set(&self, key: K, value: V) {
        let mut cache = self.cache.lock();
        if cache.contains(&key) {
            self.stats.record_update();
        } else {
            if cache.len() == cache.capacity() {
                self.stats.record_eviction();
            }
            self.stats.record_insert();
        }
        cache.set(key, value);
    }

    /// Remove a key, returning its value
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.cache.lock().remove(key);
        if removed.is_some() {
            self.stats.record_removal();
        }
        removed
    }

    /// Keys from least- to most-recently-used
    pub fn keys(&self) -> Vec<K> {
        self.cache.lock().iter().map(|(key, _)| key.clone()).collect()
    }

    /// Run `f` with the lock held, for multi-step updates that must be atomic
    pub fn with_cache<R>(&self, f: impl FnOnce(&mut LruCache<K, V>) -> R) -> R {
        let mut cache = self.cache.lock();
        f(&mut cache)
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get current cache size
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear the cache and reset statistics
    pub fn clear(&self) {
        self.cache.lock().clear();
        self.stats.reset();
    }
}
