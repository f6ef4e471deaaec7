//! In-process hash cache with per-entry expiry
//!
//! The default result cache. Entries live until they expire, are deleted,
//! or are evicted to respect an optional byte budget.

use crate::backend::{CacheBackend, CacheError, CacheStats};
use crate::factory::CACHE_TYPE_HASH;
use crate::key::CacheKey;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// One stored payload and its timestamps
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Vec<u8>,
    pub created_at: Instant,

    /// `None` never expires
    pub expires_at: Option<Instant>,

    /// Updated on every hit; drives eviction order
    pub last_accessed: Instant,
}

impl CacheEntry {
    pub fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        CacheEntry {
            value,
            created_at: now,
            expires_at: ttl.map(|ttl| now + ttl),
            last_accessed: now,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn idle_time(&self) -> Duration {
        self.last_accessed.elapsed()
    }
}

/// Unbounded (or byte-bounded) in-memory cache
#[derive(Debug)]
pub struct HashCache {
    entries: DashMap<CacheKey, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    deletes: AtomicU64,

    /// Byte budget over all payloads; 0 disables eviction
    max_size_bytes: usize,
}

impl HashCache {
    pub fn new() -> Self {
        Self::with_max_size(0)
    }

    /// Cache that evicts idle entries once payloads exceed `max_size_bytes`
    pub fn with_max_size(max_size_bytes: usize) -> Self {
        HashCache {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            max_size_bytes,
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Sum of stored payload sizes in bytes
    pub fn total_size(&self) -> usize {
        self.entries.iter().map(|entry| entry.value.len()).sum()
    }

    /// Free at least `needed_bytes`, longest idle entries first
    fn evict_to_fit(&self, needed_bytes: usize) {
        let mut by_idle: Vec<(CacheKey, Duration)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().idle_time()))
            .collect();
        by_idle.sort_by(|a, b| b.1.cmp(&a.1));

        let mut freed = 0;
        for (key, _) in by_idle {
            if freed >= needed_bytes {
                break;
            }
            if let Some((_, evicted)) = self.entries.remove(&key) {
                freed += evicted.value.len();
                self.deletes.fetch_add(1, Ordering::Relaxed);
            }
        }
        tracing::debug!("Evicted {} bytes from hash cache", freed);
    }
}

impl Default for HashCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for HashCache {
    fn name(&self) -> &str {
        CACHE_TYPE_HASH
    }

    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();

        let expired = match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now) => {
                entry.last_accessed = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        // Re-checked under the shard lock; a fresh value set meanwhile stays
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    fn set(&self, key: CacheKey, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError> {
        if self.max_size_bytes > 0 && self.total_size() + value.len() > self.max_size_bytes {
            self.evict_to_fit(value.len());
        }

        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.inserts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.deletes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.inserts.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            count: self.entries.len(),
            inserts: self.inserts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            max: None,
        }
    }
}
