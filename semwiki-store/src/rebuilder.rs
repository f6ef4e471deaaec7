//! Recomputes property usage counts from the property tables.

use crate::database::{in_transaction, Condition, Database, SelectOptions, TableRef};
use crate::error::Result;
use crate::id_table::IdTable;
use crate::property_statistics::PropertyStatisticsTable;
use crate::property_tables::PropertyTables;
use crate::schema::ID_TABLE;
use crate::writer::count_uses;
use semwiki_types::{NS_PROPERTY, PREDEFINED_ID_BOUNDARY};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of a rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Properties with a statistics row after the rebuild
    pub properties: usize,
    /// Sum of all usage counts
    pub uses: u64,
}

#[derive(Debug)]
pub struct PropertyStatisticsRebuilder {
    db: Arc<dyn Database>,
    ids: IdTable,
    tables: Arc<PropertyTables>,
}

impl PropertyStatisticsRebuilder {
    pub fn new(db: Arc<dyn Database>, ids: IdTable, tables: Arc<PropertyTables>) -> Self {
        Self { db, ids, tables }
    }

    /// Overwrite the statistics table with counts taken from the value tables
    ///
    /// Every user-defined property gets a row, unused ones with a count of
    /// zero. Predefined properties only get a row when they are used.
    pub fn rebuild(&self) -> Result<RebuildReport> {
        let mut counts: BTreeMap<i64, u64> = BTreeMap::new();

        for row in self.db.select(
            &TableRef::table(ID_TABLE),
            &["smw_id"],
            &[
                Condition::eq("smw_namespace", NS_PROPERTY),
                Condition::eq("smw_iw", ""),
                Condition::eq("smw_subobject", ""),
                Condition::gt("smw_id", PREDEFINED_ID_BOUNDARY),
            ],
            &SelectOptions::new(),
        )? {
            counts.insert(row.get_i64("smw_id")?, 0);
        }

        for table in self.tables.iter() {
            let uses = count_uses(self.db.as_ref(), &self.ids, table, &[])?;
            tracing::info!("Counted {} properties in {}", uses.len(), table.name());
            for (p_id, count) in uses {
                *counts.entry(p_id).or_insert(0) += count;
            }
        }

        let stats = PropertyStatisticsTable::new(self.db.clone());
        in_transaction(self.db.as_ref(), || {
            stats.delete_all()?;
            for (&id, &count) in &counts {
                stats.set_usage_count(id, count)?;
            }
            Ok(())
        })?;

        let report = RebuildReport {
            properties: counts.len(),
            uses: counts.values().sum(),
        };
        tracing::info!(
            "Rebuilt usage counts of {} properties ({} uses)",
            report.properties,
            report.uses
        );
        Ok(report)
    }
}
