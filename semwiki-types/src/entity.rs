//! Entity descriptors and their compact string encoding.

use crate::{TypeError, NS_PROPERTY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical description of a stored entity
///
/// An entity is a wiki page, a subobject of a page, or an imported
/// (interwiki) reference. Together with its integer ID the tuple
/// `(title, namespace, interwiki, subobject)` is unique in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Title in database-key form (underscores instead of spaces)
    pub title: String,

    /// Namespace number of the host wiki
    pub namespace: i32,

    /// Interwiki prefix, empty for local entities
    #[serde(default)]
    pub interwiki: String,

    /// Subobject name, empty for the page itself
    #[serde(default)]
    pub subobject: String,
}

impl EntityDescriptor {
    pub fn new(
        title: impl Into<String>,
        namespace: i32,
        interwiki: impl Into<String>,
        subobject: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            namespace,
            interwiki: interwiki.into(),
            subobject: subobject.into(),
        }
    }

    /// An ordinary local page
    pub fn page(title: impl Into<String>, namespace: i32) -> Self {
        Self::new(title, namespace, "", "")
    }

    /// A page built from display text ("Has author" becomes "Has_author")
    pub fn from_text(text: &str, namespace: i32) -> Self {
        Self::page(text.trim().replace(' ', "_"), namespace)
    }

    /// The declaration page of a property key
    pub fn property_page(key: impl Into<String>) -> Self {
        Self::page(key, NS_PROPERTY)
    }

    /// A subobject of this entity's page
    pub fn with_subobject(&self, name: impl Into<String>) -> Self {
        Self {
            subobject: name.into(),
            ..self.clone()
        }
    }

    /// The page this entity belongs to (drops the subobject)
    pub fn base_page(&self) -> Self {
        Self {
            subobject: String::new(),
            ..self.clone()
        }
    }

    /// True for a local wiki page (no interwiki, no subobject)
    pub fn is_page(&self) -> bool {
        self.interwiki.is_empty() && self.subobject.is_empty()
    }

    pub fn is_subobject(&self) -> bool {
        !self.subobject.is_empty()
    }

    /// Normalized form used for stable ordering
    pub fn sort_key(&self) -> String {
        self.title.replace('_', " ")
    }

    /// Compact `title#namespace#interwiki#subobject` encoding
    ///
    /// Used as cache payload and as row encoding; stable for the lifetime
    /// of a cache entry.
    pub fn encode(&self) -> String {
        format!(
            "{}#{}#{}#{}",
            self.title, self.namespace, self.interwiki, self.subobject
        )
    }

    /// Decode the compact encoding produced by [`EntityDescriptor::encode`]
    ///
    /// Titles never contain `#`, so the first three separators are
    /// structural and the subobject keeps any remaining text.
    pub fn decode(encoded: &str) -> Result<Self, TypeError> {
        let mut parts = encoded.splitn(4, '#');
        let (Some(title), Some(namespace), Some(interwiki), Some(subobject)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TypeError::MalformedEntity(encoded.to_string()));
        };

        let namespace = namespace
            .parse::<i32>()
            .map_err(|_| TypeError::MalformedEntity(encoded.to_string()))?;

        Ok(Self::new(title, namespace, interwiki, subobject))
    }
}

impl fmt::Display for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for EntityDescriptor {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
