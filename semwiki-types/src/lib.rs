//! Shared types for semwiki
//!
//! This crate provides the semantic data model shared by the cache, the
//! store and the command line tool: entity descriptors, properties,
//! data items and the request options that drive every listing.

pub mod data_item;
pub mod entity;
pub mod property;
pub mod request;

pub use data_item::{ConceptDescription, DataItem, DataItemType, SemanticData, Statement};
pub use entity::EntityDescriptor;
pub use property::{
    predefined, ErrorPlaceholder, Message, PredefinedProperty, Property, PropertyOrError,
    PropertyUsage, PREDEFINED_ID_BOUNDARY, PREDEFINED_PROPERTIES,
};
pub use request::{RequestOptions, SortOrder, StringCondition, StringConditionKind};

use thiserror::Error;

/// Main namespace of the host wiki
pub const NS_MAIN: i32 = 0;

/// Category namespace of the host wiki
pub const NS_CATEGORY: i32 = 14;

/// Namespace holding property declaration pages
pub const NS_PROPERTY: i32 = 102;

/// Namespace holding concept pages
pub const NS_CONCEPT: i32 = 108;

/// Errors raised while building or decoding domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Invalid property title {title:?}: {reason}")]
    InvalidProperty { title: String, reason: String },

    #[error("Malformed entity encoding: {0:?}")]
    MalformedEntity(String),

    #[error("Unknown data item type: {0}")]
    UnknownDataItemType(String),
}
