//! Data items and the semantic data container written to the store.

use crate::entity::EntityDescriptor;
use crate::property::Property;
use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage class of a value; selects the property table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataItemType {
    WikiPage,
    Blob,
    Number,
    Boolean,
    Uri,
    Concept,
}

impl DataItemType {
    /// Map a datatype id (`_wpg`, `_txt`, ...) to its storage class
    pub fn from_type_id(type_id: &str) -> Result<Self, TypeError> {
        match type_id {
            "_wpg" => Ok(DataItemType::WikiPage),
            "_txt" | "_cod" | "_str" => Ok(DataItemType::Blob),
            "_num" | "_qty" | "_tem" => Ok(DataItemType::Number),
            "_boo" => Ok(DataItemType::Boolean),
            "_uri" | "_ema" | "_tel" | "__typ" => Ok(DataItemType::Uri),
            "__con" => Ok(DataItemType::Concept),
            other => Err(TypeError::UnknownDataItemType(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataItemType::WikiPage => "wikipage",
            DataItemType::Blob => "blob",
            DataItemType::Number => "number",
            DataItemType::Boolean => "boolean",
            DataItemType::Uri => "uri",
            DataItemType::Concept => "concept",
        }
    }
}

impl fmt::Display for DataItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored description of a concept page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDescription {
    pub description: String,

    #[serde(default)]
    pub documentation: String,

    #[serde(default)]
    pub features: i64,

    #[serde(default)]
    pub size: i64,

    #[serde(default)]
    pub depth: i64,
}

/// A single typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DataItem {
    WikiPage(EntityDescriptor),
    Blob(String),
    Number(f64),
    Boolean(bool),
    Uri(String),
    Concept(ConceptDescription),
}

impl DataItem {
    pub fn item_type(&self) -> DataItemType {
        match self {
            DataItem::WikiPage(_) => DataItemType::WikiPage,
            DataItem::Blob(_) => DataItemType::Blob,
            DataItem::Number(_) => DataItemType::Number,
            DataItem::Boolean(_) => DataItemType::Boolean,
            DataItem::Uri(_) => DataItemType::Uri,
            DataItem::Concept(_) => DataItemType::Concept,
        }
    }
}

/// One property-value pair of a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub property: Property,
    pub value: DataItem,
}

/// All statements about one subject, including its subobjects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticData {
    pub subject: EntityDescriptor,

    #[serde(default)]
    pub statements: Vec<Statement>,

    #[serde(default)]
    pub subobjects: Vec<SemanticData>,
}

impl SemanticData {
    pub fn new(subject: EntityDescriptor) -> Self {
        Self {
            subject,
            statements: Vec::new(),
            subobjects: Vec::new(),
        }
    }

    /// Add a statement (builder style)
    pub fn with(mut self, property: Property, value: DataItem) -> Self {
        self.add(property, value);
        self
    }

    pub fn add(&mut self, property: Property, value: DataItem) {
        self.statements.push(Statement { property, value });
    }

    /// Get or create the subobject container with the given name
    pub fn subobject(&mut self, name: &str) -> &mut SemanticData {
        let index = match self
            .subobjects
            .iter()
            .position(|s| s.subject.subobject == name)
        {
            Some(index) => index,
            None => {
                let subject = self.subject.with_subobject(name);
                self.subobjects.push(SemanticData::new(subject));
                self.subobjects.len() - 1
            }
        };
        &mut self.subobjects[index]
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.subobjects.iter().all(SemanticData::is_empty)
    }
}
