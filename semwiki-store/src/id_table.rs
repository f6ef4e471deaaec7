//! Entity → ID assignment.

use crate::database::{Condition, Database, TableRef};
use crate::error::Result;
use crate::id_cache::EntityIdCache;
use crate::schema::ID_TABLE;
use semwiki_types::{EntityDescriptor, Property};
use std::sync::Arc;

/// Writes and looks up rows of the entity ID table
#[derive(Debug, Clone)]
pub struct IdTable {
    db: Arc<dyn Database>,
    cache: Arc<EntityIdCache>,
}

impl IdTable {
    pub fn new(db: Arc<dyn Database>, cache: Arc<EntityIdCache>) -> Self {
        Self { db, cache }
    }

    pub fn entity_cache(&self) -> &Arc<EntityIdCache> {
        &self.cache
    }

    pub fn find_id(&self, entity: &EntityDescriptor) -> Result<Option<i64>> {
        let row = self.db.select_row(
            &TableRef::table(ID_TABLE),
            &["smw_id"],
            &[
                Condition::eq("smw_title", entity.title.as_str()),
                Condition::eq("smw_namespace", entity.namespace),
                Condition::eq("smw_iw", entity.interwiki.as_str()),
                Condition::eq("smw_subobject", entity.subobject.as_str()),
            ],
        )?;

        row.map(|row| row.get_i64("smw_id")).transpose()
    }

    /// ID of the entity, creating the row when it does not exist yet
    pub fn make_id(&self, entity: &EntityDescriptor) -> Result<i64> {
        if let Some(id) = self.find_id(entity)? {
            return Ok(id);
        }

        let id = self.db.insert(
            ID_TABLE,
            &[
                ("smw_namespace", entity.namespace.into()),
                ("smw_title", entity.title.as_str().into()),
                ("smw_iw", entity.interwiki.as_str().into()),
                ("smw_subobject", entity.subobject.as_str().into()),
                ("smw_sortkey", entity.sort_key().into()),
            ],
        )?;

        tracing::debug!("Assigned id {} to {}", id, entity);
        self.cache.save_to_cache(id, entity.encode());
        Ok(id)
    }

    pub fn property_id(&self, property: &Property) -> Result<Option<i64>> {
        if let Some(id) = property.predefined_id() {
            return Ok(Some(id));
        }
        self.find_id(&property.declaration_page())
    }

    pub fn make_property_id(&self, property: &Property) -> Result<i64> {
        match property.predefined_id() {
            Some(id) => Ok(id),
            None => self.make_id(&property.declaration_page()),
        }
    }

    /// Remove an ID row and invalidate its cached entity
    pub fn delete_id(&self, id: i64) -> Result<bool> {
        let deleted = self
            .db
            .delete(ID_TABLE, &[Condition::eq("smw_id", id)])?;
        self.cache.delete_from_cache(id);
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::SqliteDatabase;
    use crate::property_tables::PropertyTables;
    use crate::schema;
    use semwiki_types::{NS_MAIN, PREDEFINED_ID_BOUNDARY};

    fn id_table() -> IdTable {
        let db: Arc<dyn Database> = Arc::new(SqliteDatabase::open_in_memory().unwrap());
        schema::install(db.as_ref(), &PropertyTables::standard()).unwrap();
        let cache = Arc::new(EntityIdCache::new(db.clone(), 16));
        IdTable::new(db, cache)
    }

    #[test]
    fn test_make_id_is_stable() {
        let ids = id_table();
        let foo = EntityDescriptor::page("Foo", NS_MAIN);

        let first = ids.make_id(&foo).unwrap();
        assert!(first > PREDEFINED_ID_BOUNDARY);
        assert_eq!(ids.make_id(&foo).unwrap(), first);
        assert_eq!(ids.find_id(&foo).unwrap(), Some(first));
    }

    #[test]
    fn test_make_id_primes_cache() {
        let ids = id_table();
        let sub = EntityDescriptor::page("Foo", NS_MAIN).with_subobject("_1");
        let id = ids.make_id(&sub).unwrap();

        let entity = ids.entity_cache().get_entity_for_id(id).unwrap();
        assert_eq!(entity, Some(sub));
        assert_eq!(ids.entity_cache().stats().misses, 0);
    }

    #[test]
    fn test_delete_id_invalidates() {
        let ids = id_table();
        let id = ids.make_id(&EntityDescriptor::page("Gone", NS_MAIN)).unwrap();

        assert!(ids.delete_id(id).unwrap());
        assert_eq!(ids.entity_cache().get_entity_for_id(id).unwrap(), None);
        assert!(!ids.delete_id(id).unwrap());
    }

    #[test]
    fn test_predefined_property_ids() {
        let ids = id_table();
        let mdat = Property::new("_MDAT").unwrap();
        assert_eq!(ids.make_property_id(&mdat).unwrap(), 27);
        assert_eq!(ids.property_id(&Property::new("Unknown").unwrap()).unwrap(), None);
    }
}
