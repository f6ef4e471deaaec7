//! Semwiki cache layer
//!
//! This crate provides the cache backend boundary used by the semwiki
//! store. Two kinds of caching live here:
//!
//! - **Entity caching**: a bounded [`FixedInMemoryCache`] maps integer
//!   entity IDs to their compact encoding. It sits on the hottest lookup
//!   path of the store and is invalidated explicitly by the write path.
//! - **Result caching**: collectors store whole computed listings in a
//!   [`CacheBackend`] chosen by name through the [`CacheFactory`], under a
//!   structured [`CollectorKey`] with a configured expiry.
//!
//! Expiry is checked lazily on read; there is no eviction thread.
//!
//! # Example
//!
//! ```rust
//! use semwiki_cache::{CacheFactory, CollectorKey};
//! use std::time::Duration;
//!
//! let factory = CacheFactory::new();
//! let cache = factory.backend("hash");
//! let key = CollectorKey::new("statistics").cache_key();
//!
//! cache.set_json(key.clone(), &vec![1u64, 2, 3], Some(Duration::from_secs(60))).unwrap();
//! let cached: Option<Vec<u64>> = cache.get_json(&key).unwrap();
//! assert_eq!(cached, Some(vec![1, 2, 3]));
//! ```

#![warn(missing_debug_implementations)]

pub mod backend;
pub mod factory;
pub mod fixed;
pub mod hash;
pub mod key;
pub mod metrics;

pub use backend::{CacheBackend, CacheError, CacheStats, NullCache};
pub use factory::{CacheFactory, CACHE_TYPE_FIXED, CACHE_TYPE_HASH, CACHE_TYPE_NONE};
pub use fixed::FixedInMemoryCache;
pub use hash::HashCache;
pub use key::{CacheKey, CollectorKey};
pub use metrics::{CollectorMetrics, MetricsRegistry, MetricsSnapshot};
