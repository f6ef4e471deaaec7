//! Declared properties nothing refers to.

use super::{CacheSpec, CollectorContext, ObjectCollector};
use crate::database::{Condition, ConnectionRef, TableRef};
use crate::error::Result;
use crate::query_builder::{sql_conditions, sql_options};
use crate::schema::{ID_TABLE, STATS_TABLE};
use crate::store::SqlStore;
use semwiki_types::{PropertyOrError, SortOrder, NS_PROPERTY, PREDEFINED_ID_BOUNDARY};

/// User-defined properties with a zero or missing usage count
#[derive(Debug)]
pub struct UnusedPropertiesCollector {
    context: CollectorContext,
}

impl UnusedPropertiesCollector {
    pub const NAME: &'static str = "unused_properties";

    pub fn new_from_store(store: &SqlStore, connection: impl Into<ConnectionRef>) -> Self {
        Self {
            context: CollectorContext::new(store, connection.into(), Self::NAME),
        }
    }
}

impl ObjectCollector for UnusedPropertiesCollector {
    type Output = Vec<PropertyOrError>;

    fn context(&self) -> &CollectorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut CollectorContext {
        &mut self.context
    }

    fn cache_setup(&self) -> CacheSpec {
        let settings = &self.context.settings().unused_properties_cache;
        self.context
            .cache_spec(self.context.collector_key(), settings)
    }

    fn do_collect(&self) -> Result<Self::Output> {
        let db = self.context.db();
        let request = self.context.request_options();

        let from = format!(
            "{} LEFT JOIN {} ON smw_id = p_id",
            db.table_name(ID_TABLE),
            db.table_name(STATS_TABLE)
        );

        let mut options = sql_options(request, "smw_sortkey");
        if request.map_or(true, |r| r.sort == SortOrder::Unsorted) {
            options = options.order_by("smw_sortkey");
        }

        let mut conditions = vec![
            Condition::eq("smw_namespace", NS_PROPERTY),
            Condition::eq("smw_iw", ""),
            Condition::eq("smw_subobject", ""),
            Condition::gt("smw_id", PREDEFINED_ID_BOUNDARY),
            Condition::any(vec![
                Condition::is_null("usage_count"),
                Condition::eq("usage_count", 0),
            ]),
        ];
        conditions.extend(sql_conditions(request, "smw_title"));

        let rows = db.select(&TableRef::Join(from), &["smw_title"], &conditions, &options)?;

        rows.iter()
            .map(|row| Ok(PropertyOrError::from_title(row.get_str("smw_title")?)))
            .collect()
    }
}
