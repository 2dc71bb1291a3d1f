//! # factstore
//!
//! An append-only fact store with conditionally-atomic batch appends,
//! derived indexes and a tag/type query algebra, built on an ordered
//! transactional keyspace with optimistic concurrency.
//!
//! Facts are immutable records attached to a subject. Appends go through
//! one optimistic transaction per batch: duplicate-id rejection,
//! precondition evaluation and all record/index writes commit together
//! or not at all. Every committed fact gets a [`Position`] — commit
//! sequence plus intra-batch offset — which totally orders the store and
//! drives replay.
//!
//! ## Example
//!
//! ```
//! use factstore::{AppendCondition, Fact, FactStore, SubjectRef};
//!
//! let store = FactStore::in_memory();
//! let subject = SubjectRef::new("user", "u1");
//!
//! let onboarded = Fact::new("USER_ONBOARDED", br#"{"username":"peter"}"#.to_vec(), subject.clone())
//!     .with_tag("username", "peter");
//! let id = onboarded.id;
//! store.append(&[onboarded], &AppendCondition::None)?;
//!
//! // Optimistic lock: append only if the subject's head is still `id`.
//! let renamed = Fact::new("USER_RENAMED", br#"{"username":"petra"}"#.to_vec(), subject.clone());
//! store.append(
//!     &[renamed],
//!     &AppendCondition::expected_last_fact(subject.clone(), Some(id)),
//! )?;
//!
//! assert_eq!(store.find_by_subject(&subject)?.len(), 2);
//! # Ok::<(), factstore::FactStoreError>(())
//! ```
//!
//! The heavy lifting lives in the workspace crates: `factstore-core`
//! (domain types, queries, errors), `factstore-substrate` (the ordered
//! transactional keyspace) and `factstore-engine` (keys, records,
//! indexes, append/query/stream). This crate re-exports the public
//! surface.

pub use factstore_core::{
    AppendCondition, Fact, FactId, FactStoreError, FactStoreResult, IdempotencyKey, Position,
    SubjectRef, SubstrateError, Tag, TagQuery, TagQueryItem,
};
pub use factstore_engine::{FactStore, FactStream, StoreConfig, StoredFact};
pub use factstore_substrate::{Database, DatabaseConfig};

pub use uuid::Uuid;
