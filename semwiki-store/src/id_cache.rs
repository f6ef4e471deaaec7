//! Entity ID resolution cache
//!
//! Turning an integer ID back into its entity is the hottest lookup in the
//! store: every value row and every property reference needs it. Resolved
//! entities are kept in a bounded LRU as their compact
//! `title#namespace#interwiki#subobject` encoding and invalidated
//! explicitly by the write path.
//!
//! Unknown IDs are not cached, so a later insert is never masked.

use crate::database::{Condition, Database, Row, SelectOptions, TableRef, MAX_BOUND_PARAMETERS};
use crate::error::Result;
use crate::schema::ID_TABLE;
use semwiki_cache::{CacheStats, FixedInMemoryCache};
use semwiki_types::EntityDescriptor;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const ENTITY_COLUMNS: &[&str] = &["smw_id", "smw_title", "smw_namespace", "smw_iw", "smw_subobject"];

pub struct EntityIdCache {
    db: Arc<dyn Database>,
    cache: Arc<FixedInMemoryCache<i64, String>>,
}

impl EntityIdCache {
    pub fn new(db: Arc<dyn Database>, capacity: usize) -> Self {
        Self::with_cache(db, Arc::new(FixedInMemoryCache::new(capacity)))
    }

    /// Use an existing cache, e.g. one shared with another resolver
    pub fn with_cache(db: Arc<dyn Database>, cache: Arc<FixedInMemoryCache<i64, String>>) -> Self {
        Self { db, cache }
    }

    /// Resolve one ID; `None` for IDs the store does not know
    pub fn get_entity_for_id(&self, id: i64) -> Result<Option<EntityDescriptor>> {
        if let Some(encoded) = self.cache.get(&id) {
            match EntityDescriptor::decode(&encoded) {
                Ok(entity) => return Ok(Some(entity)),
                Err(err) => {
                    tracing::warn!("Dropping cached entity {}: {}", id, err);
                    self.cache.delete(&id);
                }
            }
        }

        let row = self.db.select_row(
            &TableRef::table(ID_TABLE),
            ENTITY_COLUMNS,
            &[Condition::eq("smw_id", id)],
        )?;

        match row {
            Some(row) => {
                let entity = entity_from_row(&row)?;
                self.cache.save(id, entity.encode());
                Ok(Some(entity))
            }
            None => {
                tracing::debug!("No entity for id {}", id);
                Ok(None)
            }
        }
    }

    /// Resolve many IDs, querying only for those not cached
    ///
    /// Returns encodings in input order. IDs the store does not know are
    /// omitted, so the result may be shorter than `ids`. Uncached IDs are
    /// fetched in one query, or in chunks of [`MAX_BOUND_PARAMETERS`] when
    /// there are more than SQLite can bind at once.
    pub fn get_entities_for_ids(&self, ids: &[i64]) -> Result<Vec<String>> {
        let mut resolved: HashMap<i64, String> = HashMap::with_capacity(ids.len());
        let mut seen = HashSet::with_capacity(ids.len());
        let mut missing = Vec::new();

        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            match self.cache.get(&id) {
                Some(encoded) if EntityDescriptor::decode(&encoded).is_ok() => {
                    resolved.insert(id, encoded);
                }
                Some(encoded) => {
                    tracing::warn!("Dropping malformed cached entity {}: {:?}", id, encoded);
                    self.cache.delete(&id);
                    missing.push(id);
                }
                None => missing.push(id),
            }
        }

        if !missing.is_empty() {
            tracing::debug!("Resolving {} uncached entity ids", missing.len());
        }

        for chunk in missing.chunks(MAX_BOUND_PARAMETERS) {
            let rows = self.db.select(
                &TableRef::table(ID_TABLE),
                ENTITY_COLUMNS,
                &[Condition::is_in("smw_id", chunk.iter().copied())],
                &SelectOptions::new(),
            )?;

            for row in rows {
                let id = row.get_i64("smw_id")?;
                let encoded = entity_from_row(&row)?.encode();
                self.cache.save(id, encoded.clone());
                resolved.insert(id, encoded);
            }
        }

        Ok(ids
            .iter()
            .filter_map(|id| resolved.get(id).cloned())
            .collect())
    }

    pub fn save_to_cache(&self, id: i64, encoded: impl Into<String>) {
        self.cache.save(id, encoded.into());
    }

    pub fn delete_from_cache(&self, id: i64) {
        self.cache.delete(&id);
    }

    /// Drop every entry and reset the statistics
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl std::fmt::Debug for EntityIdCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityIdCache")
            .field("cache", &self.cache)
            .finish()
    }
}

fn entity_from_row(row: &Row) -> Result<EntityDescriptor> {
    Ok(EntityDescriptor::new(
        row.get_str("smw_title")?,
        row.get_i64("smw_namespace")? as i32,
        row.get_str("smw_iw")?,
        row.get_str("smw_subobject")?,
    ))
}
