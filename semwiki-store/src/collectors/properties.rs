//! Declared properties with their usage counts.

use super::{CacheSpec, CollectorContext, ObjectCollector};
use crate::database::{Condition, ConnectionRef, TableRef};
use crate::error::Result;
use crate::property_statistics::PropertyStatisticsTable;
use crate::query_builder::{sql_conditions, sql_options};
use crate::schema::ID_TABLE;
use crate::store::SqlStore;
use semwiki_types::{PropertyOrError, PropertyUsage, SortOrder, NS_PROPERTY};

/// Every local property in the ID table, ordered by sort key
///
/// Titles that are not valid property names become error placeholders;
/// properties without a statistics row are listed with a count of zero.
#[derive(Debug)]
pub struct PropertiesCollector {
    context: CollectorContext,
    statistics: PropertyStatisticsTable,
}

impl PropertiesCollector {
    pub const NAME: &'static str = "properties";

    pub fn new_from_store(store: &SqlStore, connection: impl Into<ConnectionRef>) -> Self {
        let context = CollectorContext::new(store, connection.into(), Self::NAME);
        let statistics = PropertyStatisticsTable::new(context.db.clone());
        Self {
            context,
            statistics,
        }
    }
}

impl ObjectCollector for PropertiesCollector {
    type Output = Vec<PropertyUsage>;

    fn context(&self) -> &CollectorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut CollectorContext {
        &mut self.context
    }

    fn cache_setup(&self) -> CacheSpec {
        let settings = &self.context.settings().properties_cache;
        self.context
            .cache_spec(self.context.collector_key(), settings)
    }

    fn do_collect(&self) -> Result<Self::Output> {
        let request = self.context.request_options();

        // Filtering happens in the query so that LIMIT counts listed rows
        let mut options = sql_options(request, "smw_sortkey");
        if request.map_or(true, |r| r.sort == SortOrder::Unsorted) {
            options = options.order_by("smw_sortkey");
        }

        let mut conditions = vec![
            Condition::eq("smw_namespace", NS_PROPERTY),
            Condition::eq("smw_iw", ""),
            Condition::eq("smw_subobject", ""),
        ];
        conditions.extend(sql_conditions(request, "smw_title"));

        let rows = self.context.db().select(
            &TableRef::table(ID_TABLE),
            &["smw_id", "smw_title"],
            &conditions,
            &options,
        )?;

        let ids = rows
            .iter()
            .map(|row| row.get_i64("smw_id"))
            .collect::<Result<Vec<_>>>()?;
        let usage_counts = self.statistics.usage_counts(&ids)?;

        let mut results = Vec::with_capacity(rows.len());
        for (row, id) in rows.iter().zip(ids) {
            let title = row.get_str("smw_title")?;
            let property = PropertyOrError::from_title(title);
            if property.is_error() {
                tracing::debug!("Listing invalid property title {:?}", title);
            }

            let count = usage_counts.get(&id).copied().unwrap_or(0);
            results.push(PropertyUsage::new(property, count));
        }

        Ok(results)
    }
}
