//! Property usage counts.

use crate::database::{
    Assignment, Condition, Database, SelectOptions, TableRef, MAX_BOUND_PARAMETERS,
};
use crate::error::Result;
use crate::schema::STATS_TABLE;
use std::collections::HashMap;
use std::sync::Arc;

/// Access to the per-property usage count table
#[derive(Debug, Clone)]
pub struct PropertyStatisticsTable {
    db: Arc<dyn Database>,
}

impl PropertyStatisticsTable {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Usage counts of `ids`; absent IDs are missing from the map
    ///
    /// One query per [`MAX_BOUND_PARAMETERS`] IDs.
    pub fn usage_counts(&self, ids: &[i64]) -> Result<HashMap<i64, u64>> {
        let mut counts = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_BOUND_PARAMETERS) {
            let rows = self.db.select(
                &TableRef::table(STATS_TABLE),
                &["p_id", "usage_count"],
                &[Condition::is_in("p_id", chunk.iter().copied())],
                &SelectOptions::new(),
            )?;

            for row in &rows {
                counts.insert(row.get_i64("p_id")?, clamp(row.get_i64("usage_count")?));
            }
        }

        Ok(counts)
    }

    pub fn usage_count(&self, id: i64) -> Result<u64> {
        let row = self.db.select_row(
            &TableRef::table(STATS_TABLE),
            &["usage_count"],
            &[Condition::eq("p_id", id)],
        )?;

        match row {
            Some(row) => Ok(clamp(row.get_i64("usage_count")?)),
            None => Ok(0),
        }
    }

    /// Add `delta` to a count, creating the row if needed; never below zero
    pub fn add_to_usage_count(&self, id: i64, delta: i64) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }

        let changed = self.db.update(
            STATS_TABLE,
            &[Assignment::Increment("usage_count".into(), delta)],
            &[Condition::eq("p_id", id)],
        )?;

        if changed == 0 {
            self.db.insert(
                STATS_TABLE,
                &[("p_id", id.into()), ("usage_count", delta.max(0).into())],
            )?;
        } else if delta < 0 {
            self.db.update(
                STATS_TABLE,
                &[Assignment::Set("usage_count".into(), 0i64.into())],
                &[Condition::eq("p_id", id), Condition::lt("usage_count", 0)],
            )?;
        }
        Ok(())
    }

    pub fn add_to_usage_counts(&self, deltas: &HashMap<i64, i64>) -> Result<()> {
        for (&id, &delta) in deltas {
            self.add_to_usage_count(id, delta)?;
        }
        Ok(())
    }

    pub fn set_usage_count(&self, id: i64, count: u64) -> Result<()> {
        let changed = self.db.update(
            STATS_TABLE,
            &[Assignment::Set("usage_count".into(), count.into())],
            &[Condition::eq("p_id", id)],
        )?;

        if changed == 0 {
            self.db
                .insert(STATS_TABLE, &[("p_id", id.into()), ("usage_count", count.into())])?;
        }
        Ok(())
    }

    pub fn delete_all(&self) -> Result<usize> {
        self.db.delete(STATS_TABLE, &[])
    }
}

fn clamp(count: i64) -> u64 {
    count.max(0) as u64
}
