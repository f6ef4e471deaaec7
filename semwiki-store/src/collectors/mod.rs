//! Cached collectors
//!
//! A collector computes one listing (properties, wanted properties, ...)
//! from the store. [`ObjectCollector::get_results`] wraps the computation in
//! result caching: each collector only says how its cache is configured
//! ([`ObjectCollector::cache_setup`]) and how to compute the result
//! ([`ObjectCollector::do_collect`]).
//!
//! Cache failures never reach the caller. A backend that errors or holds
//! an undecodable payload is treated as a miss and the result is
//! recomputed.

pub mod properties;
pub mod statistics;
pub mod unused;
pub mod wanted;

pub use properties::PropertiesCollector;
pub use statistics::{StatisticsCollector, StatisticsSnapshot};
pub use unused::UnusedPropertiesCollector;
pub use wanted::WantedPropertiesCollector;

use crate::database::{ConnectionRef, Database};
use crate::error::Result;
use crate::property_tables::PropertyTables;
use crate::settings::{CollectorCacheSettings, Settings};
use crate::store::SqlStore;
use semwiki_cache::{CacheFactory, CollectorKey, CollectorMetrics};
use semwiki_types::RequestOptions;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How and where a collector result is cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSpec {
    pub key: CollectorKey,
    pub backend_type: String,
    pub enabled: bool,
    /// `None` never expires
    pub expiry: Option<Duration>,
}

/// State every collector carries
#[derive(Debug)]
pub struct CollectorContext {
    name: &'static str,
    db: Arc<dyn Database>,
    settings: Arc<Settings>,
    caches: Arc<CacheFactory>,
    tables: Arc<PropertyTables>,
    metrics: Arc<CollectorMetrics>,
    request_options: Option<RequestOptions>,
    cached: Cell<bool>,
}

impl CollectorContext {
    pub fn new(store: &SqlStore, connection: ConnectionRef, name: &'static str) -> Self {
        Self {
            name,
            db: store.connections().resolve(connection),
            settings: store.settings().clone(),
            caches: store.cache_factory().clone(),
            tables: store.property_tables().clone(),
            metrics: store.metrics().for_collector(name),
            request_options: None,
            cached: Cell::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tables(&self) -> &PropertyTables {
        &self.tables
    }

    pub fn request_options(&self) -> Option<&RequestOptions> {
        self.request_options.as_ref()
    }

    /// Base key: collector name, table prefix and request options
    pub fn collector_key(&self) -> CollectorKey {
        CollectorKey::new(self.name)
            .discriminator(self.settings.table_prefix.as_str())
            .options(self.request_options.as_ref())
    }

    /// Cache spec from the configured backend and a collector's settings
    pub fn cache_spec(&self, key: CollectorKey, cache: &CollectorCacheSettings) -> CacheSpec {
        CacheSpec {
            key,
            backend_type: self.settings.cache_type.clone(),
            enabled: cache.enabled,
            expiry: cache.expiry(),
        }
    }
}

/// A listing computed from the store under optional result caching
pub trait ObjectCollector {
    type Output: Serialize + DeserializeOwned;

    fn context(&self) -> &CollectorContext;

    fn context_mut(&mut self) -> &mut CollectorContext;

    /// Cache configuration for the current request options
    fn cache_setup(&self) -> CacheSpec;

    /// Compute the result from the store, bypassing any cache
    fn do_collect(&self) -> Result<Self::Output>;

    /// Cached result if enabled and live, freshly computed otherwise
    fn get_results(&self) -> Result<Self::Output> {
        let spec = self.cache_setup();
        let context = self.context();
        let metrics = &context.metrics;
        let key = spec.key.cache_key();
        let cache = context.caches.backend(&spec.backend_type);

        if spec.enabled {
            match cache.get_json::<Self::Output>(&key) {
                Ok(Some(results)) => {
                    tracing::debug!("{}: cache hit ({})", context.name, key);
                    metrics.record_hit();
                    context.cached.set(true);
                    return Ok(results);
                }
                Ok(None) => {
                    tracing::debug!("{}: cache miss ({})", context.name, key);
                    metrics.record_miss();
                }
                Err(err) => {
                    tracing::warn!("{}: cache read failed, recomputing: {}", context.name, err);
                    metrics.record_cache_failure();
                    metrics.record_miss();
                }
            }
        }

        context.cached.set(false);

        let start = Instant::now();
        let results = self.do_collect()?;
        metrics.record_execution(start.elapsed());

        if spec.enabled {
            if let Err(err) = cache.set_json(key, &results, spec.expiry) {
                tracing::warn!("{}: cache write failed: {}", context.name, err);
                metrics.record_cache_failure();
            }
        }

        Ok(results)
    }

    /// Options for the next computation; part of the cache key
    fn set_request_options(&mut self, options: RequestOptions) {
        self.context_mut().request_options = Some(options);
    }

    /// Whether the last `get_results` was served from cache
    fn is_cached(&self) -> bool {
        self.context().cached.get()
    }

    /// Drop the cached result for the current options
    fn clear_cache(&self) -> bool {
        let spec = self.cache_setup();
        let cache = self.context().caches.backend(&spec.backend_type);
        match cache.delete(&spec.key.cache_key()) {
            Ok(deleted) => deleted,
            Err(err) => {
                tracing::warn!("{}: cache delete failed: {}", self.context().name, err);
                false
            }
        }
    }
}
