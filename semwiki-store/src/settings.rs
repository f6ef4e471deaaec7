//! Store settings.

use semwiki_cache::CACHE_TYPE_HASH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Result caching of one collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorCacheSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Lifetime of a cached result, 0 = never expires
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
}

impl CollectorCacheSettings {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            expiry_secs: default_expiry_secs(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            expiry_secs: default_expiry_secs(),
        }
    }

    pub fn expiry(&self) -> Option<Duration> {
        (self.expiry_secs > 0).then(|| Duration::from_secs(self.expiry_secs))
    }
}

impl Default for CollectorCacheSettings {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Everything the store and its collectors read from configuration
///
/// Loaded from a YAML file such as
///
/// ```yaml
/// cache_type: hash
/// statistics_cache:
///   enabled: true
///   expiry_secs: 600
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Result cache backend: `hash`, `fixed` or `none`
    #[serde(default = "default_cache_type")]
    pub cache_type: String,

    #[serde(default = "default_entity_id_cache_size")]
    pub entity_id_cache_size: usize,

    /// Slot count of the `fixed` result backend
    #[serde(default = "default_fixed_cache_size")]
    pub fixed_cache_size: usize,

    #[serde(default)]
    pub properties_cache: CollectorCacheSettings,

    #[serde(default)]
    pub wanted_properties_cache: CollectorCacheSettings,

    #[serde(default)]
    pub unused_properties_cache: CollectorCacheSettings,

    #[serde(default = "CollectorCacheSettings::enabled")]
    pub statistics_cache: CollectorCacheSettings,

    /// Type id assigned to properties without a declared type
    #[serde(default = "default_property_type")]
    pub default_property_type: String,

    /// Prepended to every table name
    #[serde(default)]
    pub table_prefix: String,
}

fn default_cache_type() -> String {
    CACHE_TYPE_HASH.to_string()
}

fn default_entity_id_cache_size() -> usize {
    500
}

fn default_fixed_cache_size() -> usize {
    1000
}

fn default_expiry_secs() -> u64 {
    3600
}

fn default_property_type() -> String {
    String::from("_wpg")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            entity_id_cache_size: default_entity_id_cache_size(),
            fixed_cache_size: default_fixed_cache_size(),
            properties_cache: CollectorCacheSettings::disabled(),
            wanted_properties_cache: CollectorCacheSettings::disabled(),
            unused_properties_cache: CollectorCacheSettings::disabled(),
            statistics_cache: CollectorCacheSettings::enabled(),
            default_property_type: default_property_type(),
            table_prefix: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, SettingsError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load settings if the file exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self, SettingsError> {
        match path {
            Some(path) if path.as_ref().exists() => Self::from_file(path),
            Some(path) => {
                tracing::debug!(
                    "Settings file {} not found, using defaults",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.cache_type, "hash");
        assert_eq!(settings.entity_id_cache_size, 500);
        assert!(settings.statistics_cache.enabled);
        assert!(!settings.properties_cache.enabled);
        assert_eq!(settings.default_property_type, "_wpg");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml(
            "cache_type: fixed\nwanted_properties_cache:\n  enabled: true\n  expiry_secs: 0\n",
        )
        .unwrap();

        assert_eq!(settings.cache_type, "fixed");
        assert!(settings.wanted_properties_cache.enabled);
        assert_eq!(settings.wanted_properties_cache.expiry(), None);
        assert_eq!(
            settings.statistics_cache.expiry(),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(settings.table_prefix, "");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let settings = Settings::load_or_default(Some("/nonexistent/semwiki.yml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
