//! Fact, subject and identifier types.
//!
//! A `Fact` is an immutable record of something that happened: once
//! committed it is never mutated or deleted. The payload is opaque bytes;
//! interpretation and schema validation are the caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Globally unique identifier of a fact.
///
/// Ids must be unique across the entire store; appends colliding with an
/// existing id are rejected wholesale (see `DuplicateFactIds`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactId(Uuid);

impl FactId {
    /// Generate a new random id.
    pub fn generate() -> Self {
        FactId(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        FactId(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifies the subject a fact belongs to.
///
/// Subjects group facts into an ordering and consistency boundary,
/// commonly modelling an entity or aggregate. A subject has no lifecycle
/// of its own; it exists only as an attribute of facts and as an index
/// key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    /// The subject type, e.g. `"user"`.
    pub subject_type: String,
    /// The subject id, unique within its type.
    pub id: String,
}

impl SubjectRef {
    /// Build a subject reference.
    pub fn new(subject_type: impl Into<String>, id: impl Into<String>) -> Self {
        SubjectRef {
            subject_type: subject_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.subject_type, self.id)
    }
}

/// A single tag predicate: key/value pair used in queries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Build a tag pair.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An immutable, append-only fact.
///
/// `metadata` is carried with the record but never indexed; `tags` are
/// indexed and drive the query algebra. Tag and metadata maps use
/// `BTreeMap` so index writes iterate in a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Globally unique identifier.
    pub id: FactId,
    /// Logical type label, e.g. `"USER_ONBOARDED"`.
    pub fact_type: String,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
    /// The subject this fact belongs to.
    pub subject: SubjectRef,
    /// Wall-clock creation time (indexed for time-range queries; global
    /// ordering is by commit position, not by this timestamp).
    pub appended_at: DateTime<Utc>,
    /// Unindexed key/value annotations.
    pub metadata: BTreeMap<String, String>,
    /// Indexed key/value classification tags.
    pub tags: BTreeMap<String, String>,
}

impl Fact {
    /// Build a fact with a freshly generated id and `appended_at = now`.
    pub fn new(fact_type: impl Into<String>, payload: impl Into<Vec<u8>>, subject: SubjectRef) -> Self {
        Fact {
            id: FactId::generate(),
            fact_type: fact_type.into(),
            payload: payload.into(),
            subject,
            appended_at: Utc::now(),
            metadata: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Replace the generated id with an explicit one.
    pub fn with_id(mut self, id: FactId) -> Self {
        self.id = id;
        self
    }

    /// Add a single tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Replace the full tag map.
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Add a single metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Override the creation timestamp.
    pub fn with_appended_at(mut self, at: DateTime<Utc>) -> Self {
        self.appended_at = at;
        self
    }
}

/// Idempotency key carried alongside an append request.
///
/// The store logs it for correlation but does not enforce idempotency
/// through it; deduplication is keyed on fact ids alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Wrap a caller-provided key.
    pub fn new(key: impl Into<String>) -> Self {
        IdempotencyKey(key.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
