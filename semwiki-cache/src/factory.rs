//! Backend selection by configured name

use crate::backend::{CacheBackend, NullCache};
use crate::fixed::FixedInMemoryCache;
use crate::hash::HashCache;
use crate::key::CacheKey;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

pub const CACHE_TYPE_HASH: &str = "hash";
pub const CACHE_TYPE_FIXED: &str = "fixed";
pub const CACHE_TYPE_NONE: &str = "none";

/// Default slot count of `fixed` result backends
pub const DEFAULT_FIXED_CACHE_SIZE: usize = 1000;

/// Hands out shared cache backends by type name
///
/// Every call with the same name returns the same backend instance, so two
/// collectors built from one factory see each other's entries.
pub struct CacheFactory {
    backends: DashMap<String, Arc<dyn CacheBackend>>,
    fixed_cache_size: usize,
}

impl CacheFactory {
    pub fn new() -> Self {
        Self::with_fixed_size(DEFAULT_FIXED_CACHE_SIZE)
    }

    pub fn with_fixed_size(fixed_cache_size: usize) -> Self {
        CacheFactory {
            backends: DashMap::new(),
            fixed_cache_size,
        }
    }

    /// Resolve a backend; unknown names degrade to a cache that stores nothing
    pub fn backend(&self, name: &str) -> Arc<dyn CacheBackend> {
        if let Some(backend) = self.backends.get(name) {
            return backend.clone();
        }

        self.backends
            .entry(name.to_string())
            .or_insert_with(|| self.build(name))
            .clone()
    }

    /// Install a custom backend under `name`, replacing any existing one
    pub fn register(&self, name: impl Into<String>, backend: Arc<dyn CacheBackend>) {
        self.backends.insert(name.into(), backend);
    }

    /// Clear every backend created so far
    pub fn clear_all(&self) {
        for backend in self.backends.iter() {
            if let Err(err) = backend.clear() {
                tracing::warn!("Failed to clear cache backend {}: {}", backend.key(), err);
            }
        }
    }

    fn build(&self, name: &str) -> Arc<dyn CacheBackend> {
        match name {
            CACHE_TYPE_HASH => Arc::new(HashCache::new()),
            CACHE_TYPE_FIXED => {
                Arc::new(FixedInMemoryCache::<CacheKey, Vec<u8>>::new(self.fixed_cache_size))
            }
            CACHE_TYPE_NONE => Arc::new(NullCache::new()),
            other => {
                tracing::warn!("Unknown cache type '{}', caching disabled", other);
                Arc::new(NullCache::new())
            }
        }
    }
}

impl Default for CacheFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CacheFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.backends.iter().map(|b| b.key().clone()).collect();
        names.sort();
        f.debug_struct("CacheFactory")
            .field("backends", &names)
            .field("fixed_cache_size", &self.fixed_cache_size)
            .finish()
    }
}
