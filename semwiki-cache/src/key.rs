//! Cache keys
//!
//! Keys are blake3 digests. Collector keys are built from a structured
//! record (collector name, discriminators, request options) serialized to
//! JSON before hashing, so distinct option sets always hash apart.

use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bumped whenever the layout of cached payloads changes
const KEY_VERSION: &[u8] = b"semwiki:collector:v1";

/// A cache key based on content hash
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Blake3 hash of the cache key components
    pub content_hash: [u8; 32],
}

impl CacheKey {
    /// Create a cache key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(bytes);
        CacheKey {
            content_hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Create a cache key from multiple components
    ///
    /// Each component is length-prefixed so `["ab", "c"]` and `["a", "bc"]`
    /// produce different keys.
    pub fn from_components(components: &[&[u8]]) -> Self {
        let mut hasher = Hasher::new();
        for component in components {
            hasher.update(&(component.len() as u64).to_le_bytes());
            hasher.update(component);
        }
        CacheKey {
            content_hash: *hasher.finalize().as_bytes(),
        }
    }

    /// Get the hash as a hex string
    pub fn to_hex(&self) -> String {
        self.content_hash
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Structured key of a collector result
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectorKey {
    /// Collector name, e.g. `properties`
    pub collector: String,

    /// Extra settings the result depends on (e.g. the default property type)
    pub discriminators: Vec<String>,

    /// Serialized request options, `None` when the caller set none
    pub options: Option<String>,
}

impl CollectorKey {
    pub fn new(collector: impl Into<String>) -> Self {
        CollectorKey {
            collector: collector.into(),
            discriminators: Vec::new(),
            options: None,
        }
    }

    pub fn discriminator(mut self, value: impl Into<String>) -> Self {
        self.discriminators.push(value.into());
        self
    }

    /// Fold request options into the key
    pub fn options<O: Serialize + fmt::Debug>(mut self, options: Option<&O>) -> Self {
        self.options = options.map(|o| match serde_json::to_string(o) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!("Falling back to debug key for options: {}", err);
                format!("{:?}", o)
            }
        });
        self
    }

    /// Digest used by cache backends
    pub fn cache_key(&self) -> CacheKey {
        let discriminators = self.discriminators.join("\u{1f}");
        let options = self.options.as_deref().unwrap_or("");
        let has_options: &[u8] = if self.options.is_some() { b"1" } else { b"0" };

        CacheKey::from_components(&[
            KEY_VERSION,
            self.collector.as_bytes(),
            discriminators.as_bytes(),
            has_options,
            options.as_bytes(),
        ])
    }
}
