//! Request options shared by every listing.

use serde::{Deserialize, Serialize};

/// Ordering requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Unsorted,
    Ascending,
    Descending,
}

/// Where a string filter has to match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringConditionKind {
    Prefix,
    Suffix,
    Contains,
}

/// A string filter on a title column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringCondition {
    pub value: String,
    pub kind: StringConditionKind,
}

/// Pagination, ordering and filtering of a listing
///
/// A `limit` of zero means "no limit". Options take part in collector
/// cache keys, so two different option sets never share a cached result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub limit: u64,

    #[serde(default)]
    pub offset: u64,

    #[serde(default)]
    pub sort: SortOrder,

    #[serde(default)]
    pub string_conditions: Vec<StringCondition>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_string_condition(mut self, value: impl Into<String>, kind: StringConditionKind) -> Self {
        self.string_conditions.push(StringCondition {
            value: value.into(),
            kind,
        });
        self
    }

    pub fn has_limit(&self) -> bool {
        self.limit > 0
    }
}
