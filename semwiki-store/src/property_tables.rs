//! Property value tables
//!
//! Statements are stored in one table per data-item type. High-frequency
//! predefined properties get a fixed table of their own, which has no
//! `p_id` column since every row belongs to the same property.

use crate::error::{Result, StoreError};
use semwiki_types::{DataItemType, Property};

/// Layout of one property value table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTableDefinition {
    name: String,
    di_type: DataItemType,
    fixed_property: Option<String>,
}

impl PropertyTableDefinition {
    /// A table shared by every property of `di_type`
    pub fn new(name: impl Into<String>, di_type: DataItemType) -> Self {
        Self {
            name: name.into(),
            di_type,
            fixed_property: None,
        }
    }

    /// A table dedicated to a single property
    pub fn fixed(name: impl Into<String>, di_type: DataItemType, property_key: &str) -> Self {
        Self {
            name: name.into(),
            di_type,
            fixed_property: Some(property_key.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn di_type(&self) -> DataItemType {
        self.di_type
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_property.is_some()
    }

    pub fn fixed_property(&self) -> Option<&str> {
        self.fixed_property.as_deref()
    }

    /// Value columns and their SQLite types
    pub fn value_columns(&self) -> &'static [(&'static str, &'static str)] {
        value_columns(self.di_type)
    }

    /// `CREATE TABLE` statement for this table under `physical_name`
    pub fn create_sql(&self, physical_name: &str) -> String {
        let mut columns = vec!["s_id INTEGER NOT NULL".to_string()];
        if !self.is_fixed() {
            columns.push("p_id INTEGER NOT NULL".to_string());
        }
        columns.extend(
            self.value_columns()
                .iter()
                .map(|(column, ty)| format!("{} {}", column, ty)),
        );

        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({});\nCREATE INDEX IF NOT EXISTS {}_s ON {} (s_id);",
            physical_name,
            columns.join(", "),
            physical_name,
            physical_name
        );
        if !self.is_fixed() {
            sql.push_str(&format!(
                "\nCREATE INDEX IF NOT EXISTS {}_p ON {} (p_id);",
                physical_name, physical_name
            ));
        }
        sql
    }
}

fn value_columns(di_type: DataItemType) -> &'static [(&'static str, &'static str)] {
    match di_type {
        DataItemType::WikiPage => &[("o_id", "INTEGER NOT NULL")],
        DataItemType::Blob => &[("o_blob", "TEXT"), ("o_hash", "TEXT NOT NULL")],
        DataItemType::Number => &[("o_serialized", "TEXT NOT NULL"), ("o_sortkey", "REAL NOT NULL")],
        DataItemType::Boolean => &[("o_value", "INTEGER NOT NULL")],
        DataItemType::Uri => &[("o_serialized", "TEXT NOT NULL")],
        DataItemType::Concept => &[
            ("concept_txt", "TEXT"),
            ("concept_docu", "TEXT"),
            ("concept_features", "INTEGER"),
            ("concept_size", "INTEGER"),
            ("concept_depth", "INTEGER"),
        ],
    }
}

/// The set of property tables a store writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTables {
    tables: Vec<PropertyTableDefinition>,
}

impl PropertyTables {
    pub fn new(tables: Vec<PropertyTableDefinition>) -> Self {
        Self { tables }
    }

    /// Default layout: one table per type plus fixed tables for the
    /// predefined properties the statistics read
    pub fn standard() -> Self {
        use DataItemType::*;

        Self::new(vec![
            PropertyTableDefinition::new("smw_di_wikipage", WikiPage),
            PropertyTableDefinition::new("smw_di_blob", Blob),
            PropertyTableDefinition::new("smw_di_number", Number),
            PropertyTableDefinition::new("smw_di_bool", Boolean),
            PropertyTableDefinition::new("smw_di_uri", Uri),
            PropertyTableDefinition::fixed("smw_fpt_type", Uri, "_TYPE"),
            PropertyTableDefinition::fixed("smw_fpt_sobj", WikiPage, "_SOBJ"),
            PropertyTableDefinition::fixed("smw_fpt_ask", WikiPage, "_ASK"),
            PropertyTableDefinition::fixed("smw_fpt_asksi", Number, "_ASKSI"),
            PropertyTableDefinition::fixed("smw_fpt_askfo", Blob, "_ASKFO"),
            PropertyTableDefinition::fixed("smw_fpt_conc", Concept, "_CONC"),
            PropertyTableDefinition::fixed("smw_fpt_mdat", Number, "_MDAT"),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyTableDefinition> {
        self.tables.iter()
    }

    pub fn by_name(&self, name: &str) -> Option<&PropertyTableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table storing `di_type`, preferring a shared table over a fixed one
    pub fn for_type(&self, di_type: DataItemType) -> Option<&PropertyTableDefinition> {
        self.tables
            .iter()
            .filter(|t| t.di_type == di_type)
            .min_by_key(|t| t.is_fixed())
    }

    /// The fixed table dedicated to a property key
    pub fn fixed_table(&self, property_key: &str) -> Option<&PropertyTableDefinition> {
        self.tables
            .iter()
            .find(|t| t.fixed_property.as_deref() == Some(property_key))
    }

    /// Table of the configured default property type
    pub fn default_table(&self, default_type: &str) -> Result<&PropertyTableDefinition> {
        let di_type = DataItemType::from_type_id(default_type)?;
        self.for_type(di_type)
            .ok_or_else(|| StoreError::UnknownPropertyTable(default_type.to_string()))
    }

    /// Table a value of `di_type` for `property` goes to
    pub fn for_statement(
        &self,
        property: &Property,
        di_type: DataItemType,
    ) -> Result<&PropertyTableDefinition> {
        if let Some(table) = self.fixed_table(property.key()) {
            if table.di_type != di_type {
                return Err(StoreError::UnknownPropertyTable(format!(
                    "{} holding {}",
                    property.key(),
                    di_type
                )));
            }
            return Ok(table);
        }

        self.tables
            .iter()
            .find(|t| t.di_type == di_type && !t.is_fixed())
            .ok_or_else(|| StoreError::UnknownPropertyTable(di_type.to_string()))
    }

    /// Shared (non-fixed) tables
    pub fn shared(&self) -> impl Iterator<Item = &PropertyTableDefinition> {
        self.tables.iter().filter(|t| !t.is_fixed())
    }
}

impl Default for PropertyTables {
    fn default() -> Self {
        Self::standard()
    }
}
