//! Core types for the fact store.
//!
//! This crate is the leaf of the workspace: domain types (facts, subjects,
//! positions, append conditions, tag queries), the closed error taxonomy,
//! and the order-preserving tuple encoding used to build substrate keys.
//!
//! Nothing in here touches storage. The substrate and engine crates build
//! on these types; callers normally use the `factstore` facade crate.

pub mod condition;
pub mod error;
pub mod fact;
pub mod position;
pub mod query;
pub mod tuple;

pub use condition::AppendCondition;
pub use error::{FactStoreError, FactStoreResult, SubstrateError};
pub use fact::{Fact, FactId, IdempotencyKey, SubjectRef, Tag};
pub use position::Position;
pub use query::{TagQuery, TagQueryItem};
