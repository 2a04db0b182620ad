//! Thread-safe wrapper around [`LfuCache`].
//!
//! Single coarse [`Mutex`] over the whole cache. Every operation is a short
//! critical section; there is no per-entry locking and no lock-free path.
//! Suited for modest contention where correctness and simplicity beat
//! throughput. Clones share the same underlying cache.

use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::LfuCache;
use crate::error::Result;

/// `Arc<Mutex<LfuCache>>` with a closure-based access surface.
///
/// # Example
///
/// ```
/// use pagedvec::cache::SharedLfuCache;
///
/// let cache: SharedLfuCache<&str, u32> = SharedLfuCache::new();
/// cache.put("a", 1);
///
/// let doubled = cache.with(|c| c.try_get(&"a").map(|v| v * 2));
/// assert_eq!(doubled, Some(2));
/// ```
pub struct SharedLfuCache<K, V> {
    inner: Arc<Mutex<LfuCache<K, V>>>,
}

impl<K, V> SharedLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::from_cache(LfuCache::new())
    }

    pub fn with_thresholds(thresholds: &[u64]) -> Result<Self> {
        Ok(Self::from_cache(LfuCache::with_thresholds(thresholds)?))
    }

    pub fn from_cache(cache: LfuCache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Runs `f` under the lock with full access to the cache.
    pub fn with<R>(&self, f: impl FnOnce(&mut LfuCache<K, V>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn put(&self, key: K, value: V) -> bool {
        self.inner.lock().put(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear()
    }
}

impl<K, V> SharedLfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Clone-out lookup, counting the access.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().try_get(key).cloned()
    }
}

impl<K, V> Clone for SharedLfuCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> Default for SharedLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
