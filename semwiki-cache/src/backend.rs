//! The cache backend boundary
//!
//! Every backend answers `get`/`set`/`delete`/`clear` and reports
//! `{hits, misses, count}` statistics. Callers must treat any
//! [`CacheError`] as a miss: a cache is never a source of truth.

use crate::key::CacheKey;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of live entries
    pub count: usize,
    pub inserts: u64,
    pub deletes: u64,
    /// Capacity for bounded caches
    pub max: Option<usize>,
}

impl CacheStats {
    /// Get cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  Hits: {} | Misses: {} | Hit Rate: {:.1}%",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0
        )?;
        match self.max {
            Some(max) => writeln!(f, "  Entries: {} / {}", self.count, max)?,
            None => writeln!(f, "  Entries: {}", self.count)?,
        }
        writeln!(f, "  Inserts: {} | Deletes: {}", self.inserts, self.deletes)?;
        Ok(())
    }
}

/// Errors that can occur during caching
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to serialize value: {0}")]
    SerializationError(String),

    #[error("Failed to deserialize value: {0}")]
    DeserializationError(String),

    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

/// A key-value cache with per-entry expiry
pub trait CacheBackend: Send + Sync {
    /// Backend name as used in configuration
    fn name(&self) -> &str;

    /// Fetch a live entry; expired entries count as misses
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store an entry; `ttl = None` never expires
    fn set(&self, key: CacheKey, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Remove an entry, returning whether it existed
    fn delete(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Drop every entry and reset the counters
    fn clear(&self) -> Result<(), CacheError>;

    fn stats(&self) -> CacheStats;
}

impl fmt::Debug for dyn CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBackend")
            .field("name", &self.name())
            .field("stats", &self.stats())
            .finish()
    }
}

impl dyn CacheBackend {
    /// Get a JSON-encoded value
    pub fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        match self.get(key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::DeserializationError(e.to_string())),
            None => Ok(None),
        }
    }

    /// Put a JSON-encoded value
    pub fn set_json<T: Serialize>(
        &self,
        key: CacheKey,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let serialized =
            serde_json::to_vec(value).map_err(|e| CacheError::SerializationError(e.to_string()))?;
        self.set(key, serialized, ttl)
    }
}

/// Backend that stores nothing; every lookup is a miss
#[derive(Debug, Default)]
pub struct NullCache {
    misses: AtomicU64,
}

impl NullCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for NullCache {
    fn name(&self) -> &str {
        crate::factory::CACHE_TYPE_NONE
    }

    fn get(&self, _key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    fn set(&self, _key: CacheKey, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<(), CacheError> {
        Ok(())
    }

    fn delete(&self, _key: &CacheKey) -> Result<bool, CacheError> {
        Ok(false)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.misses.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let cache: Box<dyn CacheBackend> = Box::new(NullCache::new());
        let key = CacheKey::from_bytes(b"k");

        cache.set(key.clone(), b"v".to_vec(), None).unwrap();
        assert_eq!(cache.get(&key).unwrap(), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().count, 0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
