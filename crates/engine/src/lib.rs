//! The append-and-index engine and query-resolution algebra.
//!
//! This crate holds the core of the fact store:
//!
//! - `keys` — the subspace layout and index key shapes
//! - `record` — the primary fact record store (existence marker, record,
//!   position stamp)
//! - `index` — the derived index set maintained alongside every record
//! - `append` — the append coordinator: dedup, precondition evaluation
//!   and writes, all in one substrate transaction
//! - `query` — tag/type query resolution into fact-id sets and
//!   materialization
//! - `stream` — global-order replay
//! - `store` — the `FactStore` facade wiring the above together
//!
//! Callers normally depend on the `factstore` facade crate rather than
//! this one directly.

pub mod append;
pub mod index;
pub mod keys;
pub mod query;
pub mod record;
pub mod store;
pub mod stream;

pub use append::Appender;
pub use query::Finder;
pub use record::StoredFact;
pub use store::{FactStore, StoreConfig};
pub use stream::{FactStream, Streamer};
