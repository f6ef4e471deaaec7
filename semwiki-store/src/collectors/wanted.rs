//! Properties used in statements but lacking a declaration page.

use super::{CacheSpec, CollectorContext, ObjectCollector};
use crate::database::{Condition, ConnectionRef, TableRef};
use crate::error::Result;
use crate::query_builder::sql_options;
use crate::schema::{ID_TABLE, PAGE_TABLE};
use crate::store::SqlStore;
use semwiki_types::{PropertyOrError, PropertyUsage, NS_PROPERTY, PREDEFINED_ID_BOUNDARY};

/// Undeclared properties of the default type, most used first
///
/// Counts rows of the default-type property table grouped by property and
/// keeps those without a page in the property namespace. This is a full
/// scan with a join, so results are best served from cache.
#[derive(Debug)]
pub struct WantedPropertiesCollector {
    context: CollectorContext,
}

impl WantedPropertiesCollector {
    pub const NAME: &'static str = "wanted_properties";

    pub fn new_from_store(store: &SqlStore, connection: impl Into<ConnectionRef>) -> Self {
        Self {
            context: CollectorContext::new(store, connection.into(), Self::NAME),
        }
    }

    fn query(&self, table_name: &str) -> Result<Vec<PropertyUsage>> {
        let db = self.context.db();

        let from = format!(
            "{} INNER JOIN {} ON p_id = smw_id LEFT JOIN {} ON (page_namespace = {} AND page_title = smw_title)",
            db.table_name(table_name),
            db.table_name(ID_TABLE),
            db.table_name(PAGE_TABLE),
            NS_PROPERTY
        );

        let mut options = sql_options(self.context.request_options(), "smw_title");
        options.order_by.clear();
        let options = options
            .group_by("smw_title")
            .order_by_desc("count")
            .order_by("smw_title");

        let rows = db.select(
            &TableRef::Join(from),
            &["smw_title", "COUNT(*) AS count"],
            &[
                Condition::gt("smw_id", PREDEFINED_ID_BOUNDARY),
                Condition::is_null("page_id"),
            ],
            &options,
        )?;

        rows.iter()
            .map(|row| {
                let property = PropertyOrError::from_title(row.get_str("smw_title")?);
                let count = row.get_i64("count")?.max(0) as u64;
                Ok(PropertyUsage::new(property, count))
            })
            .collect()
    }
}

impl ObjectCollector for WantedPropertiesCollector {
    type Output = Vec<PropertyUsage>;

    fn context(&self) -> &CollectorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut CollectorContext {
        &mut self.context
    }

    fn cache_setup(&self) -> CacheSpec {
        let settings = self.context.settings();
        let key = self
            .context
            .collector_key()
            .discriminator(settings.default_property_type.as_str());
        self.context.cache_spec(key, &settings.wanted_properties_cache)
    }

    fn do_collect(&self) -> Result<Self::Output> {
        let default_type = &self.context.settings().default_property_type;
        let table = self.context.tables().default_table(default_type)?;

        // A fixed table only ever holds its own, predefined property
        if table.is_fixed() {
            tracing::debug!(
                "Default table {} is fixed, no wanted properties",
                table.name()
            );
            return Ok(Vec::new());
        }

        self.query(table.name())
    }
}
