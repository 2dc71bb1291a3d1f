//! Ordered transactional key-value substrate.
//!
//! This crate provides the storage capability the fact-store engine is
//! built on: an ordered byte-key space with scoped subspaces, range scans,
//! and optimistic-concurrency transactions carrying a commit-time
//! monotonic counter.
//!
//! # Concurrency model
//!
//! Transactions never block each other while running. Every read a
//! transaction performs (point or range) is recorded as a footprint; at
//! commit, footprints are validated against per-key commit versions under
//! a single write lock. A footprint touched by a concurrent commit aborts
//! the transaction with [`SubstrateError::Conflict`], and
//! [`Database::transact`] re-runs the closure against fresh state up to a
//! bounded retry count. First committer wins; blind writes do not
//! conflict.
//!
//! Read-only access goes through [`Database::read`], which holds a shared
//! snapshot for the whole closure: readers never block readers and
//! register no footprints.
//!
//! # Commit versions
//!
//! Every commit increments a global sequence. Keys written with
//! [`Transaction::set_versionstamped_key`] (or values with
//! [`Transaction::set_versionstamped_value`]) contain a placeholder that
//! the commit path fills with this sequence, which is how callers obtain
//! commit-ordered keys without knowing the sequence in advance.

pub mod database;
pub mod subspace;
pub mod transaction;

pub use database::{Committed, Database, DatabaseConfig};
pub use factstore_core::error::SubstrateError;
pub use subspace::Subspace;
pub use transaction::{ReadContext, ReadView, Transaction};
