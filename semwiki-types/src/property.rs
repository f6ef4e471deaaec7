//! Properties, the predefined-property registry and listing records.

use crate::entity::EntityDescriptor;
use crate::TypeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// IDs up to and including this value are reserved for predefined properties
pub const PREDEFINED_ID_BOUNDARY: i64 = 50;

/// Message key used when a stored title is not a valid property name
pub const NO_PROPERTY_MESSAGE: &str = "smw_noproperty";

/// Characters a title may not contain (plus ASCII control characters)
static ILLEGAL_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#<>\[\]|{}\x00-\x1f\x7f]").expect("valid title pattern"));

/// A built-in property with a reserved ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredefinedProperty {
    pub key: &'static str,
    pub label: &'static str,
    pub id: i64,
    pub type_id: &'static str,
}

/// Registry of predefined properties known to the store
pub const PREDEFINED_PROPERTIES: &[PredefinedProperty] = &[
    PredefinedProperty { key: "_TYPE", label: "Has type", id: 1, type_id: "__typ" },
    PredefinedProperty { key: "_URI", label: "Equivalent URI", id: 2, type_id: "_uri" },
    PredefinedProperty { key: "_INST", label: "Category", id: 4, type_id: "_wpg" },
    PredefinedProperty { key: "_UNIT", label: "Display units", id: 7, type_id: "_txt" },
    PredefinedProperty { key: "_IMPO", label: "Imported from", id: 8, type_id: "_txt" },
    PredefinedProperty { key: "_CONV", label: "Corresponds to", id: 12, type_id: "_txt" },
    PredefinedProperty { key: "_SERV", label: "Provides service", id: 13, type_id: "_txt" },
    PredefinedProperty { key: "_PVAL", label: "Allows value", id: 14, type_id: "_txt" },
    PredefinedProperty { key: "_REDI", label: "Redirects to", id: 15, type_id: "_wpg" },
    PredefinedProperty { key: "_SUBP", label: "Subproperty of", id: 17, type_id: "_wpg" },
    PredefinedProperty { key: "_SUBC", label: "Subcategory of", id: 18, type_id: "_wpg" },
    PredefinedProperty { key: "_CONC", label: "Concept description", id: 19, type_id: "__con" },
    PredefinedProperty { key: "_ERRP", label: "Has improper value for", id: 22, type_id: "_wpg" },
    PredefinedProperty { key: "_LIST", label: "Has fields", id: 26, type_id: "_txt" },
    PredefinedProperty { key: "_MDAT", label: "Modification date", id: 27, type_id: "_num" },
    PredefinedProperty { key: "_SOBJ", label: "Has subobject", id: 31, type_id: "_wpg" },
    PredefinedProperty { key: "_ASK", label: "Has query", id: 32, type_id: "_wpg" },
    PredefinedProperty { key: "_ASKST", label: "Query string", id: 33, type_id: "_txt" },
    PredefinedProperty { key: "_ASKFO", label: "Query format", id: 34, type_id: "_txt" },
    PredefinedProperty { key: "_ASKSI", label: "Query size", id: 35, type_id: "_num" },
    PredefinedProperty { key: "_ASKDE", label: "Query depth", id: 36, type_id: "_num" },
];

/// Look up a predefined property by key
pub fn predefined(key: &str) -> Option<&'static PredefinedProperty> {
    PREDEFINED_PROPERTIES.iter().find(|p| p.key == key)
}

/// A property identifier, either user-defined or predefined
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Property {
    key: String,

    #[serde(default)]
    inverse: bool,
}

impl Property {
    /// Build a property from its key (`Has_author`, `_MDAT`, `-Has_part`)
    pub fn new(key: &str) -> Result<Self, TypeError> {
        let trimmed = key.trim();
        let (inverse, key) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let invalid = |reason: &str| TypeError::InvalidProperty {
            title: trimmed.to_string(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(invalid("empty property name"));
        }

        if key.starts_with('_') {
            if predefined(key).is_none() {
                return Err(invalid("unknown predefined property"));
            }
        } else if ILLEGAL_TITLE.is_match(key) {
            return Err(invalid("title contains illegal characters"));
        }

        Ok(Self {
            key: key.to_string(),
            inverse,
        })
    }

    /// Build a property from display text, resolving predefined labels
    pub fn from_label(label: &str) -> Result<Self, TypeError> {
        let label = label.trim();
        if let Some(p) = PREDEFINED_PROPERTIES
            .iter()
            .find(|p| p.label.eq_ignore_ascii_case(label))
        {
            return Self::new(p.key);
        }
        Self::new(&label.replace(' ', "_"))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    pub fn is_predefined(&self) -> bool {
        self.key.starts_with('_')
    }

    pub fn is_user_defined(&self) -> bool {
        !self.is_predefined()
    }

    /// Reserved ID of a predefined property
    pub fn predefined_id(&self) -> Option<i64> {
        predefined(&self.key).map(|p| p.id)
    }

    /// Type id of a predefined property (`_wpg`, `_num`, ...)
    pub fn predefined_type(&self) -> Option<&'static str> {
        predefined(&self.key).map(|p| p.type_id)
    }

    /// Human readable label
    pub fn label(&self) -> String {
        match predefined(&self.key) {
            Some(p) => p.label.to_string(),
            None => self.key.replace('_', " "),
        }
    }

    /// The entity that represents this property in the ID table
    pub fn declaration_page(&self) -> EntityDescriptor {
        EntityDescriptor::property_page(self.key.clone())
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverse {
            write!(f, "-{}", self.label())
        } else {
            f.write_str(&self.label())
        }
    }
}

/// A localizable message reference, rendered by the host wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub key: String,

    #[serde(default)]
    pub params: Vec<String>,
}

impl Message {
    pub fn new(key: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            key: key.into(),
            params,
        }
    }
}

/// Stand-in for a stored property whose title is not a valid property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPlaceholder {
    pub message: Message,
    pub title: String,
}

impl ErrorPlaceholder {
    /// Placeholder for an invalid property title
    pub fn no_property(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            message: Message::new(NO_PROPERTY_MESSAGE, vec![title.clone()]),
            title,
        }
    }
}

/// Listing entry: a valid property or an error placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PropertyOrError {
    Property(Property),
    Error(ErrorPlaceholder),
}

impl PropertyOrError {
    /// Parse a stored title, substituting a placeholder on failure
    pub fn from_title(title: &str) -> Self {
        match Property::new(title) {
            Ok(property) => PropertyOrError::Property(property),
            Err(_) => PropertyOrError::Error(ErrorPlaceholder::no_property(title)),
        }
    }

    pub fn property(&self) -> Option<&Property> {
        match self {
            PropertyOrError::Property(p) => Some(p),
            PropertyOrError::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PropertyOrError::Error(_))
    }
}

impl fmt::Display for PropertyOrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyOrError::Property(p) => write!(f, "{}", p),
            PropertyOrError::Error(e) => write!(f, "<{}: {}>", e.message.key, e.title),
        }
    }
}

/// A property together with how often it is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyUsage {
    pub property: PropertyOrError,
    pub usage_count: u64,
}

impl PropertyUsage {
    pub fn new(property: PropertyOrError, usage_count: u64) -> Self {
        Self {
            property,
            usage_count,
        }
    }
}
