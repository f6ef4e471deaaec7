//! The store facade tying connections, caches and tables together.

use crate::collectors::{
    PropertiesCollector, StatisticsCollector, UnusedPropertiesCollector,
    WantedPropertiesCollector,
};
use crate::database::{ConnectionRef, Connections, Database, SqliteDatabase};
use crate::error::Result;
use crate::id_cache::EntityIdCache;
use crate::id_table::IdTable;
use crate::property_statistics::PropertyStatisticsTable;
use crate::property_tables::PropertyTables;
use crate::rebuilder::{PropertyStatisticsRebuilder, RebuildReport};
use crate::schema;
use crate::settings::Settings;
use crate::writer::StatementWriter;
use semwiki_cache::{CacheFactory, MetricsRegistry};
use semwiki_types::{DataItem, EntityDescriptor, Property, SemanticData};
use std::path::Path;
use std::sync::Arc;

/// A semantic store over a relational database
///
/// Cheap to clone; clones share connections, caches and metrics.
#[derive(Debug, Clone)]
pub struct SqlStore {
    connections: Connections,
    settings: Arc<Settings>,
    caches: Arc<CacheFactory>,
    tables: Arc<PropertyTables>,
    id_cache: Arc<EntityIdCache>,
    metrics: Arc<MetricsRegistry>,
}

impl SqlStore {
    pub fn builder(db: Arc<dyn Database>) -> SqlStoreBuilder {
        SqlStoreBuilder::new(db)
    }

    /// Open a SQLite file and install the schema if needed
    pub fn open<P: AsRef<Path>>(path: P, settings: Settings) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening store at {}", path.display());
        let db = SqliteDatabase::open(path)?.with_table_prefix(settings.table_prefix.as_str());
        let store = Self::builder(Arc::new(db)).settings(settings).build();
        store.install()?;
        Ok(store)
    }

    /// A fresh in-memory store with the schema installed
    pub fn open_in_memory(settings: Settings) -> Result<Self> {
        let db = SqliteDatabase::open_in_memory()?.with_table_prefix(settings.table_prefix.as_str());
        let store = Self::builder(Arc::new(db)).settings(settings).build();
        store.install()?;
        Ok(store)
    }

    /// Create missing tables on the primary connection
    pub fn install(&self) -> Result<()> {
        schema::install(self.connections.primary().as_ref(), &self.tables)
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn cache_factory(&self) -> &Arc<CacheFactory> {
        &self.caches
    }

    pub fn property_tables(&self) -> &Arc<PropertyTables> {
        &self.tables
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn entity_id_cache(&self) -> &Arc<EntityIdCache> {
        &self.id_cache
    }

    /// ID table on the primary connection, sharing the entity cache
    pub fn id_table(&self) -> IdTable {
        IdTable::new(self.connections.primary(), self.id_cache.clone())
    }

    pub fn statistics_table(&self) -> PropertyStatisticsTable {
        PropertyStatisticsTable::new(self.connections.primary())
    }

    pub fn writer(&self) -> StatementWriter {
        StatementWriter::new(self.connections.primary(), self.id_table(), self.tables.clone())
    }

    pub fn properties_collector(&self, connection: impl Into<ConnectionRef>) -> PropertiesCollector {
        PropertiesCollector::new_from_store(self, connection)
    }

    pub fn wanted_properties_collector(
        &self,
        connection: impl Into<ConnectionRef>,
    ) -> WantedPropertiesCollector {
        WantedPropertiesCollector::new_from_store(self, connection)
    }

    pub fn unused_properties_collector(
        &self,
        connection: impl Into<ConnectionRef>,
    ) -> UnusedPropertiesCollector {
        UnusedPropertiesCollector::new_from_store(self, connection)
    }

    pub fn statistics_collector(&self, connection: impl Into<ConnectionRef>) -> StatisticsCollector {
        StatisticsCollector::new_from_store(self, connection)
    }

    /// Replace all statements about a subject
    pub fn update_data(&self, data: &SemanticData) -> Result<()> {
        self.writer().update_data(data)
    }

    pub fn delete_subject(&self, subject: &EntityDescriptor) -> Result<bool> {
        self.writer().delete_subject(subject)
    }

    pub fn property_values(
        &self,
        subject: &EntityDescriptor,
        property: &Property,
    ) -> Result<Vec<DataItem>> {
        self.writer().property_values(subject, property)
    }

    /// Recount property usage from the value tables
    pub fn rebuild_property_statistics(&self) -> Result<RebuildReport> {
        PropertyStatisticsRebuilder::new(
            self.connections.primary(),
            self.id_table(),
            self.tables.clone(),
        )
        .rebuild()
    }
}

/// Configures a [`SqlStore`] over existing connections
#[derive(Debug)]
pub struct SqlStoreBuilder {
    primary: Arc<dyn Database>,
    replica: Option<Arc<dyn Database>>,
    settings: Settings,
    caches: Option<Arc<CacheFactory>>,
    tables: Option<Arc<PropertyTables>>,
}

impl SqlStoreBuilder {
    pub fn new(primary: Arc<dyn Database>) -> Self {
        Self {
            primary,
            replica: None,
            settings: Settings::default(),
            caches: None,
            tables: None,
        }
    }

    /// Separate read connection; defaults to the primary
    pub fn replica(mut self, replica: Arc<dyn Database>) -> Self {
        self.replica = Some(replica);
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Share result caches with other stores
    pub fn cache_factory(mut self, caches: Arc<CacheFactory>) -> Self {
        self.caches = Some(caches);
        self
    }

    pub fn property_tables(mut self, tables: PropertyTables) -> Self {
        self.tables = Some(Arc::new(tables));
        self
    }

    pub fn build(self) -> SqlStore {
        let connections = match self.replica {
            Some(replica) => Connections::new(replica, self.primary),
            None => Connections::single(self.primary),
        };

        let caches = self
            .caches
            .unwrap_or_else(|| Arc::new(CacheFactory::with_fixed_size(self.settings.fixed_cache_size)));
        let id_cache = Arc::new(EntityIdCache::new(
            connections.replica(),
            self.settings.entity_id_cache_size,
        ));

        SqlStore {
            connections,
            settings: Arc::new(self.settings),
            caches,
            tables: self.tables.unwrap_or_default(),
            id_cache,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }
}
