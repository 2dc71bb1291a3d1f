//! Tag queries.
//!
//! A [`TagQuery`] is a disjunction of [`TagQueryItem`]s: a fact matches
//! the query if it matches any item. Item semantics (see the query
//! engine):
//!
//! - `TagOnly`: OR across the listed tags — a fact matches if it carries
//!   **any** of them.
//! - `TagType` with both types and tags: a fact matches if its type is in
//!   `types` AND it carries **every** tag in `tags`.
//! - `TagType` with only types: OR across types.
//! - `TagType` with only tags: OR across tags, same as `TagOnly`.
//!
//! The OR-across-tags / AND-across-tags asymmetry between `TagOnly` and
//! `TagType` is intentional: `TagOnly` broadens, `TagType` narrows.
//!
//! Items with neither types nor tags are rejected at construction, so the
//! resolution path never sees an empty item.

use crate::error::{FactStoreError, FactStoreResult};
use crate::fact::Tag;
use serde::{Deserialize, Serialize};

/// A single disjunct of a tag query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagQueryItem {
    /// Match facts carrying any of the listed tags.
    TagOnly {
        /// Tag predicates, OR-combined.
        tags: Vec<Tag>,
    },
    /// Match facts by type, optionally narrowed by tags.
    TagType {
        /// Fact types, OR-combined.
        types: Vec<String>,
        /// Tag predicates, AND-combined within each type. May be empty,
        /// in which case the item matches on type alone.
        tags: Vec<Tag>,
    },
}

impl TagQueryItem {
    /// Item matching facts that carry any of `tags`.
    pub fn tags(tags: Vec<Tag>) -> FactStoreResult<Self> {
        if tags.is_empty() {
            return Err(FactStoreError::EmptyQueryItem);
        }
        Ok(TagQueryItem::TagOnly { tags })
    }

    /// Item matching facts of any of `types`.
    pub fn types(types: Vec<String>) -> FactStoreResult<Self> {
        if types.is_empty() {
            return Err(FactStoreError::EmptyQueryItem);
        }
        Ok(TagQueryItem::TagType {
            types,
            tags: Vec::new(),
        })
    }

    /// Item matching facts whose type is in `types` and which carry every
    /// tag in `tags`. At least one of the lists must be nonempty.
    pub fn types_and_tags(types: Vec<String>, tags: Vec<Tag>) -> FactStoreResult<Self> {
        if types.is_empty() && tags.is_empty() {
            return Err(FactStoreError::EmptyQueryItem);
        }
        Ok(TagQueryItem::TagType { types, tags })
    }
}

/// A disjunctive query over fact types and tags.
///
/// An empty query is valid and resolves to no facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagQuery {
    items: Vec<TagQueryItem>,
}

impl TagQuery {
    /// Build a query from its disjuncts.
    pub fn new(items: Vec<TagQueryItem>) -> Self {
        TagQuery { items }
    }

    /// Query with a single item.
    pub fn single(item: TagQueryItem) -> Self {
        TagQuery { items: vec![item] }
    }

    /// The query's items.
    pub fn items(&self) -> &[TagQueryItem] {
        &self.items
    }

    /// Whether the query has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
