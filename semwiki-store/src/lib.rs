//! # semwiki-store
//!
//! Relational storage for semantic wiki annotations.
//!
//! This crate provides the [`SqlStore`]: the ID table with its entity
//! cache, per-type property tables, property usage statistics and the
//! cached collectors behind the property listings and the statistics page.
//!
//! # Example
//!
//! ```rust
//! use semwiki_store::{ObjectCollector, Settings, SqlStore};
//! use semwiki_types::{DataItem, EntityDescriptor, Property, SemanticData, NS_MAIN};
//!
//! let store = SqlStore::open_in_memory(Settings::default()).unwrap();
//!
//! let mut data = SemanticData::new(EntityDescriptor::page("Berlin", NS_MAIN));
//! data.add(Property::new("Population").unwrap(), DataItem::Number(3_800_000.0));
//! store.update_data(&data).unwrap();
//!
//! let properties = store.properties_collector(false).get_results().unwrap();
//! let population = properties
//!     .iter()
//!     .find(|usage| usage.property.to_string() == "Population")
//!     .unwrap();
//! assert_eq!(population.usage_count, 1);
//!
//! let stats = store.statistics_collector(false).get_results().unwrap();
//! assert_eq!(stats.property_uses, 1);
//! ```

#![warn(missing_debug_implementations)]

pub mod collectors;
pub mod database;
pub mod error;
pub mod id_cache;
pub mod id_table;
pub mod property_statistics;
pub mod property_tables;
pub mod query_builder;
pub mod rebuilder;
pub mod schema;
pub mod settings;
pub mod store;
pub mod writer;

pub use collectors::{
    CacheSpec, CollectorContext, ObjectCollector, PropertiesCollector, StatisticsCollector,
    StatisticsSnapshot, UnusedPropertiesCollector, WantedPropertiesCollector,
};
pub use database::{Condition, ConnectionRef, Connections, Database, SqliteDatabase};
pub use error::{Result, StoreError};
pub use id_cache::EntityIdCache;
pub use id_table::IdTable;
pub use property_statistics::PropertyStatisticsTable;
pub use property_tables::{PropertyTableDefinition, PropertyTables};
pub use rebuilder::{PropertyStatisticsRebuilder, RebuildReport};
pub use settings::{CollectorCacheSettings, Settings, SettingsError};
pub use store::{SqlStore, SqlStoreBuilder};
pub use writer::StatementWriter;
