//! Bounded LRU cache
//!
//! Capacity is fixed at construction; inserting into a full cache evicts the
//! least recently used entry. Used for the entity-ID cache and available as
//! the `fixed` result backend.

use crate::backend::{CacheBackend, CacheError, CacheStats};
use crate::factory::CACHE_TYPE_FIXED;
use crate::key::CacheKey;
use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

struct Slot<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Slot<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// LRU cache with a fixed number of slots
pub struct FixedInMemoryCache<K: Hash + Eq, V> {
    slots: Mutex<LruCache<K, Slot<V>>>,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    deletes: AtomicU64,
}

impl<K: Hash + Eq, V: Clone> FixedInMemoryCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        FixedInMemoryCache {
            slots: Mutex::new(LruCache::new(capacity)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    /// Look up an entry, promoting it to most recently used
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut slots = self.slots.lock();

        let live = slots.get(key).map(|slot| slot.is_live(now));
        match live {
            Some(true) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                slots.get(key).map(|slot| slot.value.clone())
            }
            Some(false) => {
                slots.pop(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Whether a live entry exists; touches neither recency nor counters
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        self.slots
            .lock()
            .peek(key)
            .is_some_and(|slot| slot.is_live(now))
    }

    pub fn save(&self, key: K, value: V) {
        self.save_with_ttl(key, value, None);
    }

    pub fn save_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) {
        let slot = Slot {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.slots.lock().put(key, slot);
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove an entry; absent keys are a no-op
    pub fn delete(&self, key: &K) -> bool {
        let removed = self.slots.lock().pop(key).is_some();
        if removed {
            self.deletes.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.slots.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.inserts.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            count: self.len(),
            inserts: self.inserts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            max: Some(self.capacity.get()),
        }
    }
}

impl<K: Hash + Eq, V> fmt::Debug for FixedInMemoryCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedInMemoryCache")
            .field("len", &self.slots.lock().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl CacheBackend for FixedInMemoryCache<CacheKey, Vec<u8>> {
    fn name(&self) -> &str {
        CACHE_TYPE_FIXED
    }

    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(FixedInMemoryCache::get(self, key))
    }

    fn set(&self, key: CacheKey, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.save_with_ttl(key, value, ttl);
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(FixedInMemoryCache::delete(self, key))
    }

    fn clear(&self) -> Result<(), CacheError> {
        FixedInMemoryCache::clear(self);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        FixedInMemoryCache::stats(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_eviction() {
        let cache = FixedInMemoryCache::new(2);
        cache.save(1u64, "a".to_string());
        cache.save(2u64, "b".to_string());

        // Touch 1 so 2 becomes the eviction candidate
        assert_eq!(cache.get(&1), Some("a".to_string()));
        cache.save(3u64, "c".to_string());

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache: FixedInMemoryCache<u64, u64> = FixedInMemoryCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_contains_does_not_count() {
        let cache = FixedInMemoryCache::new(4);
        cache.save(7u64, 7u64);
        assert!(cache.contains(&7));
        assert!(!cache.contains(&8));

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_expired_slot_is_dropped() {
        let cache = FixedInMemoryCache::new(4);
        cache.save_with_ttl(1u64, 1u64, Some(Duration::ZERO));

        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_resets_counters() {
        let cache = FixedInMemoryCache::new(4);
        cache.save(1u64, 1u64);
        cache.get(&1);
        cache.get(&2);
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats, CacheStats { max: Some(4), ..CacheStats::default() });
    }

    #[test]
    fn test_as_backend() {
        let cache: Box<dyn CacheBackend> = Box::new(FixedInMemoryCache::<CacheKey, Vec<u8>>::new(8));
        let key = CacheKey::from_bytes(b"k");
        cache.set(key.clone(), vec![1, 2], None).unwrap();

        assert_eq!(cache.get(&key).unwrap(), Some(vec![1, 2]));
        assert_eq!(cache.name(), "fixed");
        assert_eq!(cache.stats().max, Some(8));
    }
}
