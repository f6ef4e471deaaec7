//! Statement storage
//!
//! Writes replace everything stored about a subject: rows of the subject
//! and of its subobjects are removed from every property table, the new
//! statements inserted, and usage counts adjusted by the difference.

use crate::database::{in_transaction, Condition, Database, Row, SelectOptions, SqlValue, TableRef};
use crate::error::{Result, StoreError};
use crate::id_table::IdTable;
use crate::property_statistics::PropertyStatisticsTable;
use crate::property_tables::{PropertyTableDefinition, PropertyTables};
use crate::schema::PAGE_TABLE;
use semwiki_types::{
    ConceptDescription, DataItem, DataItemType, EntityDescriptor, Property, SemanticData,
    Statement,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Blob values longer than this are indexed by digest instead of verbatim
const BLOB_HASH_THRESHOLD: usize = 72;

const SUBOBJECT_PROPERTY: &str = "_SOBJ";

#[derive(Debug, Clone)]
pub struct StatementWriter {
    db: Arc<dyn Database>,
    ids: IdTable,
    stats: PropertyStatisticsTable,
    tables: Arc<PropertyTables>,
}

impl StatementWriter {
    pub fn new(db: Arc<dyn Database>, ids: IdTable, tables: Arc<PropertyTables>) -> Self {
        let stats = PropertyStatisticsTable::new(db.clone());
        Self {
            db,
            ids,
            stats,
            tables,
        }
    }

    /// Replace every statement about `data.subject` and its subobjects
    pub fn update_data(&self, data: &SemanticData) -> Result<()> {
        let result = in_transaction(self.db.as_ref(), || {
            let subject_id = self.ids.make_id(&data.subject)?;
            self.register_page(&data.subject)?;

            let old_subobjects = self.subobject_ids(subject_id)?;
            let mut deltas = HashMap::new();
            let mut cleared = vec![subject_id];
            cleared.extend(old_subobjects.iter().copied());
            self.remove_statements(&cleared, &mut deltas)?;

            self.insert_statements(subject_id, &data.statements, &mut deltas)?;

            let sobj = Property::new(SUBOBJECT_PROPERTY)?;
            let mut kept = HashSet::new();
            for subobject in &data.subobjects {
                let name = subobject.subject.subobject.as_str();
                if name.is_empty() {
                    tracing::warn!("Skipping unnamed subobject of {}", data.subject);
                    continue;
                }
                if !subobject.subobjects.is_empty() {
                    tracing::warn!("Nested subobjects of {}#{} are not stored", data.subject, name);
                }

                let entity = data.subject.with_subobject(name);
                let sub_id = self.ids.make_id(&entity)?;
                kept.insert(sub_id);

                self.insert_value(subject_id, &sobj, &DataItem::WikiPage(entity), &mut deltas)?;
                self.insert_statements(sub_id, &subobject.statements, &mut deltas)?;
            }

            for old in old_subobjects.into_iter().filter(|id| !kept.contains(id)) {
                self.ids.delete_id(old)?;
            }

            self.stats.add_to_usage_counts(&deltas)?;
            tracing::debug!(
                "Stored {} statements for {}",
                data.statements.len(),
                data.subject
            );
            Ok(())
        });

        if result.is_err() {
            // IDs assigned inside the rolled back transaction may be cached
            self.ids.entity_cache().clear();
        }
        result
    }

    /// Remove everything stored about `subject`; false if it was unknown
    pub fn delete_subject(&self, subject: &EntityDescriptor) -> Result<bool> {
        let Some(subject_id) = self.ids.find_id(subject)? else {
            return Ok(false);
        };

        in_transaction(self.db.as_ref(), || {
            let subobjects = self.subobject_ids(subject_id)?;
            let mut deltas = HashMap::new();
            let mut cleared = vec![subject_id];
            cleared.extend(subobjects.iter().copied());
            self.remove_statements(&cleared, &mut deltas)?;

            for id in subobjects {
                self.ids.delete_id(id)?;
            }
            if subject.is_page() {
                self.db.delete(
                    PAGE_TABLE,
                    &[
                        Condition::eq("page_namespace", subject.namespace),
                        Condition::eq("page_title", subject.title.as_str()),
                    ],
                )?;
            }

            self.stats.add_to_usage_counts(&deltas)?;
            Ok(true)
        })
    }

    /// Stored values of one property of a subject
    pub fn property_values(
        &self,
        subject: &EntityDescriptor,
        property: &Property,
    ) -> Result<Vec<DataItem>> {
        let Some(s_id) = self.ids.find_id(subject)? else {
            return Ok(Vec::new());
        };
        let Some(p_id) = self.ids.property_id(property)? else {
            return Ok(Vec::new());
        };

        let candidates: Vec<&PropertyTableDefinition> = match self.tables.fixed_table(property.key()) {
            Some(table) => vec![table],
            None => self.tables.shared().collect(),
        };

        let mut values = Vec::new();
        for table in candidates {
            let mut conditions = vec![Condition::eq("s_id", s_id)];
            if !table.is_fixed() {
                conditions.push(Condition::eq("p_id", p_id));
            }
            let columns: Vec<&str> = table.value_columns().iter().map(|(c, _)| *c).collect();

            let rows = self.db.select(
                &TableRef::table(table.name()),
                &columns,
                &conditions,
                &SelectOptions::new().order_by("rowid"),
            )?;

            if table.di_type() == DataItemType::WikiPage {
                let object_ids = rows
                    .iter()
                    .map(|row| row.get_i64("o_id"))
                    .collect::<Result<Vec<_>>>()?;
                for encoded in self.ids.entity_cache().get_entities_for_ids(&object_ids)? {
                    values.push(DataItem::WikiPage(EntityDescriptor::decode(&encoded)?));
                }
            } else {
                for row in &rows {
                    values.push(item_from_row(table.di_type(), row)?);
                }
            }
        }

        Ok(values)
    }

    fn insert_statements(
        &self,
        s_id: i64,
        statements: &[Statement],
        deltas: &mut HashMap<i64, i64>,
    ) -> Result<()> {
        for statement in statements {
            self.insert_value(s_id, &statement.property, &statement.value, deltas)?;
        }
        Ok(())
    }

    fn insert_value(
        &self,
        s_id: i64,
        property: &Property,
        value: &DataItem,
        deltas: &mut HashMap<i64, i64>,
    ) -> Result<()> {
        if property.is_inverse() {
            tracing::warn!("Ignoring value for inverse property {}", property);
            return Ok(());
        }

        let table = self.tables.for_statement(property, value.item_type())?;
        let p_id = self.ids.make_property_id(property)?;

        let mut row: Vec<(&str, SqlValue)> = vec![("s_id", s_id.into())];
        if !table.is_fixed() {
            row.push(("p_id", p_id.into()));
        }

        match value {
            DataItem::WikiPage(entity) => row.push(("o_id", self.ids.make_id(entity)?.into())),
            DataItem::Blob(text) => {
                row.push(("o_blob", text.as_str().into()));
                row.push(("o_hash", blob_hash(text).into()));
            }
            DataItem::Number(number) => {
                row.push(("o_serialized", number.to_string().into()));
                row.push(("o_sortkey", (*number).into()));
            }
            DataItem::Boolean(flag) => row.push(("o_value", (*flag).into())),
            DataItem::Uri(uri) => row.push(("o_serialized", uri.as_str().into())),
            DataItem::Concept(concept) => {
                row.push(("concept_txt", concept.description.as_str().into()));
                row.push(("concept_docu", concept.documentation.as_str().into()));
                row.push(("concept_features", concept.features.into()));
                row.push(("concept_size", concept.size.into()));
                row.push(("concept_depth", concept.depth.into()));
            }
        }

        self.db.insert(table.name(), &row)?;
        *deltas.entry(p_id).or_insert(0) += 1;
        Ok(())
    }

    /// Delete rows of `subjects` from every table, subtracting their uses
    fn remove_statements(&self, subjects: &[i64], deltas: &mut HashMap<i64, i64>) -> Result<()> {
        let conditions = [Condition::is_in("s_id", subjects.iter().copied())];

        for table in self.tables.iter() {
            for (p_id, count) in count_uses(self.db.as_ref(), &self.ids, table, &conditions)? {
                *deltas.entry(p_id).or_insert(0) -= count as i64;
            }
            self.db.delete(table.name(), &conditions)?;
        }
        Ok(())
    }

    fn subobject_ids(&self, subject_id: i64) -> Result<Vec<i64>> {
        let sobj = Property::new(SUBOBJECT_PROPERTY)?;
        let table = self.tables.for_statement(&sobj, DataItemType::WikiPage)?;

        let mut conditions = vec![Condition::eq("s_id", subject_id)];
        if !table.is_fixed() {
            conditions.push(Condition::eq("p_id", self.ids.make_property_id(&sobj)?));
        }

        self.db
            .select(
                &TableRef::table(table.name()),
                &["o_id"],
                &conditions,
                &SelectOptions::new(),
            )?
            .iter()
            .map(|row| row.get_i64("o_id"))
            .collect()
    }

    /// Record the subject page in the host page table
    fn register_page(&self, subject: &EntityDescriptor) -> Result<()> {
        if !subject.is_page() {
            return Ok(());
        }

        let existing = self.db.select_row(
            &TableRef::table(PAGE_TABLE),
            &["page_id"],
            &[
                Condition::eq("page_namespace", subject.namespace),
                Condition::eq("page_title", subject.title.as_str()),
            ],
        )?;

        if existing.is_none() {
            self.db.insert(
                PAGE_TABLE,
                &[
                    ("page_namespace", subject.namespace.into()),
                    ("page_title", subject.title.as_str().into()),
                ],
            )?;
        }
        Ok(())
    }
}

/// Number of rows per property ID in `table` matching `conditions`
pub(crate) fn count_uses(
    db: &dyn Database,
    ids: &IdTable,
    table: &PropertyTableDefinition,
    conditions: &[Condition],
) -> Result<Vec<(i64, u64)>> {
    let from = TableRef::table(table.name());

    if let Some(key) = table.fixed_property() {
        let row = db.select_row(&from, &["COUNT(*) AS count"], conditions)?;
        let count = match row {
            Some(row) => row.get_i64_or_zero("count")?.max(0) as u64,
            None => 0,
        };
        if count == 0 {
            return Ok(Vec::new());
        }
        let p_id = ids.make_property_id(&Property::new(key)?)?;
        return Ok(vec![(p_id, count)]);
    }

    db.select(
        &from,
        &["p_id", "COUNT(*) AS count"],
        conditions,
        &SelectOptions::new().group_by("p_id"),
    )?
    .iter()
    .map(|row| Ok((row.get_i64("p_id")?, row.get_i64("count")?.max(0) as u64)))
    .collect()
}

fn blob_hash(text: &str) -> String {
    if text.len() <= BLOB_HASH_THRESHOLD {
        text.to_string()
    } else {
        blake3::hash(text.as_bytes()).to_hex().to_string()
    }
}

fn item_from_row(di_type: DataItemType, row: &Row) -> Result<DataItem> {
    Ok(match di_type {
        // Page values are resolved in batches through the entity cache
        DataItemType::WikiPage => {
            return Err(StoreError::InvalidRow {
                column: "o_id".to_string(),
                reason: "page values need entity resolution".to_string(),
            })
        }
        DataItemType::Blob => DataItem::Blob(row.get_str("o_blob")?.to_string()),
        DataItemType::Number => DataItem::Number(row.get_f64("o_sortkey")?),
        DataItemType::Boolean => DataItem::Boolean(row.get_i64("o_value")? != 0),
        DataItemType::Uri => DataItem::Uri(row.get_str("o_serialized")?.to_string()),
        DataItemType::Concept => DataItem::Concept(ConceptDescription {
            description: row.get_str("concept_txt")?.to_string(),
            documentation: row.get_str("concept_docu")?.to_string(),
            features: row.get_i64_or_zero("concept_features")?,
            size: row.get_i64_or_zero("concept_size")?,
            depth: row.get_i64_or_zero("concept_depth")?,
        }),
    })
}
