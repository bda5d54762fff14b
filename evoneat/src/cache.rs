//! A small least-recently-used cache, used to keep
//! decoded checkpoints around between loads.
use ahash::RandomState;

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// A map holding at most `capacity` entries. Inserting into a
/// full cache evicts the entry that was least recently inserted
/// or read through [`get`](LruCache::get).
///
/// # Examples
/// ```
/// use evoneat::cache::LruCache;
/// use std::num::NonZeroUsize;
///
/// let mut cache = LruCache::new(NonZeroUsize::new(2).unwrap());
/// cache.insert("a", 1);
/// cache.insert("b", 2);
/// cache.get(&"a");
///
/// assert_eq!(cache.insert("c", 3), Some(("b", 2)));
/// assert!(cache.contains_key(&"a"));
/// ```
pub struct LruCache<K, V> {
    inner: lru::LruCache<K, V, RandomState>,
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    pub fn new(capacity: NonZeroUsize) -> LruCache<K, V> {
        LruCache {
            inner: lru::LruCache::with_hasher(capacity, RandomState::new()),
        }
    }

    /// Returns the value of `key`, marking it as most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Returns the value of `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.inner.peek(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    /// Inserts a value, marking it as most recently used.
    ///
    /// Returns the entry evicted to make room for it, if any.
    /// Replacing the value of a present key evicts nothing.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.inner.contains(&key) {
            self.inner.put(key, value);
            None
        } else {
            self.inner.push(key, value)
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.inner.cap()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<K: Hash + Eq, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.inner.len())
            .field("capacity", &self.inner.cap())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruCache<usize, String> {
        LruCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut cache = cache(3);
        for i in 0..10 {
            cache.insert(i, i.to_string());
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert!((7..10).all(|i| cache.contains_key(&i)));
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = cache(2);
        assert_eq!(cache.insert(1, "one".into()), None);
        assert_eq!(cache.insert(2, "two".into()), None);
        assert_eq!(cache.insert(3, "three".into()), Some((1, "one".into())));
        assert_eq!(cache.insert(4, "four".into()), Some((2, "two".into())));
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = cache(2);
        cache.insert(1, "one".into());
        cache.insert(2, "two".into());
        assert_eq!(cache.get(&1).map(String::as_str), Some("one"));
        assert_eq!(cache.insert(3, "three".into()), Some((2, "two".into())));
        assert!(cache.contains_key(&1));
    }

    #[test]
    fn peek_does_not_refresh() {
        let mut cache = cache(2);
        cache.insert(1, "one".into());
        cache.insert(2, "two".into());
        assert!(cache.peek(&1).is_some());
        assert_eq!(cache.insert(3, "three".into()), Some((1, "one".into())));
    }

    #[test]
    fn replacing_a_value_evicts_nothing() {
        let mut cache = cache(2);
        cache.insert(1, "one".into());
        cache.insert(2, "two".into());
        assert_eq!(cache.insert(1, "uno".into()), None);
        assert_eq!(cache.peek(&1).map(String::as_str), Some("uno"));
        assert_eq!(cache.insert(3, "three".into()), Some((2, "two".into())));
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = cache(2);
        cache.insert(1, "one".into());
        cache.insert(2, "two".into());
        assert_eq!(cache.remove(&1), Some("one".into()));
        assert_eq!(cache.remove(&1), None);
        assert_eq!(cache.insert(3, "three".into()), None);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity().get(), 2);
    }
}
