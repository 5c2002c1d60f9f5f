//! LRU (Least Recently Used) cache implementation
//!
//! A hash index maps each key to a handle into the recency list. The list
//! head is the least-recently-used entry, the tail the most-recently-used.
//! Every operation resolves the key once and then does O(1) work on the
//! list, so index and list always hold the same key set.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use ahash::RandomState;
use seqlist::{DoublyLinkedList, Handle};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Payload stored in the recency list
struct Entry<K, V> {
    key: K,
    value: V,
}

/// LRU cache with fixed capacity
///
/// Single-owner; share it across threads through
/// [`SharedLruCache`](crate::SharedLruCache) or another lock that covers
/// whole calls.
pub struct LruCache<K, V, S = RandomState> {
    index: HashMap<K, Handle, S>,
    order: DoublyLinkedList<Entry<K, V>>,
    capacity: usize,
}

impl<K, V> LruCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache holding at most `capacity` entries
    ///
    /// # Errors
    /// * `Error::InvalidCapacity` - `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Create a new LRU cache using `hasher` for the key index
    pub fn with_hasher(capacity: usize, hasher: S) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        debug!(capacity, "creating lru cache");
        Ok(Self {
            index: HashMap::with_capacity_and_hasher(capacity, hasher),
            order: DoublyLinkedList::with_capacity(capacity),
            capacity,
        })
    }

    /// Get a value from the cache, marking it most-recently-used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.index.get(key)?;
        self.touch(handle);
        Some(&self.entry(handle).value)
    }

    /// Get a mutable value from the cache, marking it most-recently-used
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.index.get(key)?;
        self.touch(handle);
        Some(&mut self.entry_mut(handle).value)
    }

    /// Get a value without changing recency order
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.index.get(key)?;
        Some(&self.entry(handle).value)
    }

    /// Check whether `key` is cached, without changing recency order
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Insert or overwrite a key-value pair, marking it most-recently-used
    ///
    /// Inserting a new key into a full cache evicts the least-recently-used
    /// entry first.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(&handle) = self.index.get(&key) {
            // Overwrite in place, the node and its handle stay the same
            self.entry_mut(handle).value = value;
            self.touch(handle);
            return;
        }

        if self.index.len() >= self.capacity {
            self.evict();
        }

        let handle = self.order.insert_at_tail(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, handle);
    }

    /// Remove a key from the cache
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        match self.order.remove(handle) {
            Ok(entry) => Some(entry.value),
            Err(err) => stale_handle(err),
        }
    }

    /// Least-recently-used entry, the next one to be evicted
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.order
            .peek_head()
            .ok()
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Most-recently-used entry
    pub fn peek_mru(&self) -> Option<(&K, &V)> {
        self.order
            .peek_tail()
            .ok()
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Iterate entries from least- to most-recently-used
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator + '_ {
        self.order.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }

    /// Panic if the index and the recency list disagree
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.order.debug_validate_invariants();
        assert_eq!(self.index.len(), self.order.len(), "index/order size mismatch");
        assert!(self.index.len() <= self.capacity, "over capacity");

        for entry in self.order.iter() {
            let handle = match self.index.get(&entry.key) {
                Some(&handle) => handle,
                None => panic!("listed key missing from index"),
            };
            assert!(
                self.order.get(handle).is_ok_and(|e| e.key == entry.key),
                "index points at the wrong node"
            );
        }
    }

    fn touch(&mut self, handle: Handle) {
        if let Err(err) = self.order.move_to_tail(handle) {
            stale_handle(err);
        }
    }

    fn evict(&mut self) {
        if let Ok(entry) = self.order.pop_head() {
            self.index.remove(&entry.key);
            trace!(len = self.index.len(), "evicted least-recently-used entry");
        }
    }

    fn entry(&self, handle: Handle) -> &Entry<K, V> {
        match self.order.get(handle) {
            Ok(entry) => entry,
            Err(err) => stale_handle(err),
        }
    }

    fn entry_mut(&mut self, handle: Handle) -> &mut Entry<K, V> {
        match self.order.get_mut(handle) {
            Ok(entry) => entry,
            Err(err) => stale_handle(err),
        }
    }
}

impl<K, V, S> fmt::Debug for LruCache<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.order.iter().map(|entry| (&entry.key, &entry.value)))
            .finish()
    }
}

/// The index only ever holds handles of live nodes; anything else is a bug.
#[cold]
fn stale_handle(err: seqlist::Error) -> ! {
    panic!("lru index out of sync with recency list: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<K: Clone, V, S>(cache: &LruCache<K, V, S>) -> Vec<K>
    where
        K: Hash + Eq,
        S: BuildHasher,
    {
        cache.order.iter().map(|entry| entry.key.clone()).collect()
    }

    #[test]
    fn test_lru_zero_capacity() {
        let result = LruCache::<u32, u32>::new(0);
        assert_eq!(result.err(), Some(Error::InvalidCapacity(0)));
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.len(), 2);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_lru_missing_key() {
        let mut cache: LruCache<&str, i32> = LruCache::new(4).unwrap();
        cache.set("a", 1);

        assert_eq!(cache.get("zzz"), None);
        // A miss does not reorder anything
        assert_eq!(keys(&cache), vec!["a"]);
    }

    #[test]
    fn test_lru_len_counts_distinct_keys() {
        let mut cache = LruCache::new(10).unwrap();
        for key in [1, 2, 3, 2, 1, 4] {
            cache.set(key, key * 10);
        }

        assert_eq!(cache.len(), 4);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3); // Should evict a

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(&2));
        assert_eq!(cache.get("c"), Some(&3));
        assert_eq!(cache.len(), 2);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_lru_get_protects_from_eviction() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.get("a"); // a becomes most recent
        cache.set("c", 3); // Should evict b

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.get("c"), Some(&3));
    }

    #[test]
    fn test_lru_overwrite_marks_recent() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 9);
        assert_eq!(cache.len(), 2);

        cache.set("c", 3); // Should evict b, not a

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(&9));
        assert_eq!(cache.get("c"), Some(&3));
    }

    #[test]
    fn test_lru_overwrite_keeps_node() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        let before = cache.index[&1];
        cache.set(1, "b");

        assert_eq!(cache.index[&1], before);
        assert_eq!(cache.get(&1), Some(&"b"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = LruCache::new(1).unwrap();

        cache.set("a", 1);
        cache.get("a");
        cache.set("b", 2);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(&2));
        assert_eq!(cache.len(), 1);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_lru_recency_order() {
        let mut cache = LruCache::new(4).unwrap();
        for key in 1..=4 {
            cache.set(key, ());
        }

        cache.get(&2);
        cache.set(1, ());
        cache.get(&3);

        assert_eq!(keys(&cache), vec![4, 2, 1, 3]);
        assert_eq!(cache.peek_lru(), Some((&4, &())));
        assert_eq!(cache.peek_mru(), Some((&3, &())));
    }

    #[test]
    fn test_lru_peek_does_not_reorder() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.peek("a"), Some(&1));
        assert!(cache.contains("a"));
        cache.set("c", 3);

        assert!(!cache.contains("a"));
        assert_eq!(cache.peek("b"), Some(&2));
    }

    #[test]
    fn test_lru_get_mut() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set("a", vec![1]);
        cache.set("b", vec![2]);
        if let Some(value) = cache.get_mut("a") {
            value.push(10);
        }
        cache.set("c", vec![3]);

        assert_eq!(cache.get("a"), Some(&vec![1, 10]));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(3, "c");

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.remove(&2), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert_eq!(keys(&cache), vec![1, 3]);
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_lru_remove_then_refill() {
        let mut cache = LruCache::new(2).unwrap();

        cache.set(1, 1);
        cache.set(2, 2);
        cache.remove(&1);
        cache.set(3, 3); // Spare slot, nothing evicted

        assert_eq!(cache.get(&2), Some(&2));
        assert_eq!(cache.get(&3), Some(&3));
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3).unwrap();

        cache.set(1, "a");
        cache.set(2, "b");
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.peek_lru(), None);

        cache.set(3, "c");
        assert_eq!(cache.get(&3), Some(&"c"));
        cache.debug_validate_invariants();
    }

    #[test]
    fn test_lru_iter() {
        let mut cache = LruCache::new(3).unwrap();
        cache.set("x", 1);
        cache.set("y", 2);
        cache.get("x");

        let entries: Vec<_> = cache.iter().collect();
        assert_eq!(entries, vec![(&"y", &2), (&"x", &1)]);
        assert_eq!(cache.iter().rev().next(), Some((&"x", &1)));
    }

    #[test]
    fn test_lru_string_keys_borrowed_lookup() {
        let mut cache: LruCache<String, usize> = LruCache::new(2).unwrap();
        cache.set("alpha".to_string(), 1);

        assert_eq!(cache.get("alpha"), Some(&1));
        assert_eq!(cache.remove("alpha"), Some(1));
    }

    #[test]
    fn test_lru_custom_hasher() {
        let hasher = std::collections::hash_map::RandomState::new();
        let mut cache = LruCache::with_hasher(2, hasher).unwrap();

        cache.set(1, 1);
        cache.set(2, 2);
        cache.set(3, 3);

        assert_eq!(keys(&cache), vec![2, 3]);
    }

    #[test]
    fn test_lru_debug_format() {
        let mut cache = LruCache::new(2).unwrap();
        cache.set(1, "a");
        cache.set(2, "b");

        assert_eq!(format!("{:?}", cache), r#"{1: "a", 2: "b"}"#);
    }

    #[test]
    fn test_lru_churn_matches_model() {
        // Compare against a Vec ordered least- to most-recent
        let mut cache = LruCache::new(5).unwrap();
        let mut model: Vec<(u32, u32)> = Vec::new();

        for step in 0..500u32 {
            let key = (step * 7 + step / 3) % 11;
            if step % 3 == 0 {
                let expected = model.iter().position(|(k, _)| *k == key).map(|pos| {
                    let entry = model.remove(pos);
                    model.push(entry);
                    entry.1
                });
                assert_eq!(cache.get(&key).copied(), expected);
            } else {
                if let Some(pos) = model.iter().position(|(k, _)| *k == key) {
                    model.remove(pos);
                } else if model.len() == 5 {
                    model.remove(0);
                }
                model.push((key, step));
                cache.set(key, step);
            }

            assert_eq!(keys(&cache), model.iter().map(|(k, _)| *k).collect::<Vec<_>>());
            cache.debug_validate_invariants();
        }
    }
}
