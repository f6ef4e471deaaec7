//! Wiki-wide semantic statistics.

use super::{CacheSpec, CollectorContext, ObjectCollector};
use crate::database::{Condition, ConnectionRef, SelectOptions, TableRef};
use crate::error::Result;
use crate::schema::{ID_TABLE, PAGE_TABLE, STATS_TABLE};
use crate::store::SqlStore;
use semwiki_types::NS_PROPERTY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Counters shown on the statistics page
///
/// Each counter comes from its own query; there is no transaction across
/// them, so two counters may reflect slightly different store states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Pages in the property namespace
    #[serde(rename = "OWNPAGE")]
    pub property_pages: u64,

    #[serde(rename = "QUERY")]
    pub queries: u64,

    /// Sum of recorded query sizes
    #[serde(rename = "QUERYSIZE")]
    pub query_size: u64,

    /// Queries per result format
    #[serde(rename = "QUERYFORMATS")]
    pub query_formats: BTreeMap<String, u64>,

    #[serde(rename = "CONCEPTS")]
    pub concepts: u64,

    #[serde(rename = "SUBOBJECTS")]
    pub subobjects: u64,

    /// Properties with a declared type
    #[serde(rename = "DECLPROPS")]
    pub declared_properties: u64,

    /// Properties with at least one use
    #[serde(rename = "USEDPROPS")]
    pub used_properties: u64,

    /// Total number of property values
    #[serde(rename = "PROPUSES")]
    pub property_uses: u64,
}

impl StatisticsSnapshot {
    /// Scalar counters under their display names
    pub fn counters(&self) -> [(&'static str, u64); 8] {
        [
            ("OWNPAGE", self.property_pages),
            ("QUERY", self.queries),
            ("QUERYSIZE", self.query_size),
            ("CONCEPTS", self.concepts),
            ("SUBOBJECTS", self.subobjects),
            ("DECLPROPS", self.declared_properties),
            ("USEDPROPS", self.used_properties),
            ("PROPUSES", self.property_uses),
        ]
    }
}

impl fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.counters() {
            writeln!(f, "{:<12} {}", name, value)?;
        }
        for (format, count) in &self.query_formats {
            writeln!(f, "{:<12} {} ({})", "QUERYFORMAT", count, format)?;
        }
        Ok(())
    }
}

/// Computes a [`StatisticsSnapshot`], cached as a whole
#[derive(Debug)]
pub struct StatisticsCollector {
    context: CollectorContext,
}

impl StatisticsCollector {
    pub const NAME: &'static str = "statistics";

    pub fn new_from_store(store: &SqlStore, connection: impl Into<ConnectionRef>) -> Self {
        Self {
            context: CollectorContext::new(store, connection.into(), Self::NAME),
        }
    }

    pub fn property_page_count(&self) -> Result<u64> {
        self.count(
            TableRef::table(PAGE_TABLE),
            "COUNT(*)",
            &[Condition::eq("page_namespace", NS_PROPERTY)],
        )
    }

    pub fn query_count(&self) -> Result<u64> {
        self.count_fixed("_ASK", "COUNT(*)")
    }

    pub fn query_size(&self) -> Result<u64> {
        self.count_fixed("_ASKSI", "SUM(o_sortkey)")
    }

    pub fn query_formats_count(&self) -> Result<BTreeMap<String, u64>> {
        let Some(table) = self.context.tables().fixed_table("_ASKFO") else {
            return Ok(BTreeMap::new());
        };

        let rows = self.context.db().select(
            &TableRef::table(table.name()),
            &["o_hash", "COUNT(*) AS count"],
            &[],
            &SelectOptions::new().group_by("o_hash"),
        )?;

        rows.iter()
            .map(|row| {
                let format = row.get_str("o_hash")?.to_string();
                Ok((format, row.get_i64("count")?.max(0) as u64))
            })
            .collect()
    }

    pub fn concept_count(&self) -> Result<u64> {
        self.count_fixed("_CONC", "COUNT(*)")
    }

    pub fn subobject_count(&self) -> Result<u64> {
        self.count(
            TableRef::table(ID_TABLE),
            "COUNT(*)",
            &[Condition::eq("smw_iw", ""), Condition::not_eq("smw_subobject", "")],
        )
    }

    pub fn declared_properties_count(&self) -> Result<u64> {
        self.count_fixed("_TYPE", "COUNT(DISTINCT s_id)")
    }

    pub fn used_properties_count(&self) -> Result<u64> {
        self.count(
            TableRef::table(STATS_TABLE),
            "COUNT(*)",
            &[Condition::gt("usage_count", 0)],
        )
    }

    pub fn property_usage_count(&self) -> Result<u64> {
        self.count(TableRef::table(STATS_TABLE), "SUM(usage_count)", &[])
    }

    /// Single aggregate; NULL (no rows to sum) reads as zero
    fn count(&self, from: TableRef, aggregate: &str, conditions: &[Condition]) -> Result<u64> {
        let column = format!("{} AS total", aggregate);
        let row = self
            .context
            .db()
            .select_row(&from, &[column.as_str()], conditions)?;

        match row {
            Some(row) => Ok(row.get_i64_or_zero("total")?.max(0) as u64),
            None => Ok(0),
        }
    }

    /// Aggregate over the fixed table of a predefined property
    fn count_fixed(&self, property_key: &str, aggregate: &str) -> Result<u64> {
        match self.context.tables().fixed_table(property_key) {
            Some(table) => self.count(TableRef::table(table.name()), aggregate, &[]),
            None => {
                tracing::debug!("No fixed table for {}, counting 0", property_key);
                Ok(0)
            }
        }
    }
}

impl ObjectCollector for StatisticsCollector {
    type Output = StatisticsSnapshot;

    fn context(&self) -> &CollectorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut CollectorContext {
        &mut self.context
    }

    fn cache_setup(&self) -> CacheSpec {
        let settings = &self.context.settings().statistics_cache;
        self.context
            .cache_spec(self.context.collector_key(), settings)
    }

    fn do_collect(&self) -> Result<Self::Output> {
        Ok(StatisticsSnapshot {
            property_pages: self.property_page_count()?,
            queries: self.query_count()?,
            query_size: self.query_size()?,
            query_formats: self.query_formats_count()?,
            concepts: self.concept_count()?,
            subobjects: self.subobject_count()?,
            declared_properties: self.declared_properties_count()?,
            used_properties: self.used_properties_count()?,
            property_uses: self.property_usage_count()?,
        })
    }
}
