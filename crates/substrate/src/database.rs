//! The in-memory ordered keyspace and its transaction entry points.

use crate::transaction::{ReadView, Transaction};
use factstore_core::error::SubstrateError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::warn;

/// Substrate tuning knobs.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// How many times [`Database::transact`] re-runs a conflicting
    /// transaction before surfacing `RetryLimitExceeded`.
    pub max_transaction_retries: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            max_transaction_retries: 8,
        }
    }
}

/// A stored entry: value bytes plus the commit sequence that last wrote
/// the key. Versions drive conflict validation.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) value: Vec<u8>,
    pub(crate) version: u64,
}

/// Mutable state behind the lock: the ordered map and the commit counter.
#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub(crate) map: BTreeMap<Vec<u8>, Entry>,
    pub(crate) commit_seq: u64,
}

/// Result of a committed transaction: the closure's value plus the commit
/// sequence the substrate assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    /// Value returned by the transaction closure.
    pub value: T,
    /// Commit sequence assigned to this transaction's writes.
    pub version: u64,
}

/// An ordered, transactional byte keyspace.
///
/// Shared across components behind an `Arc`; all methods take `&self`.
pub struct Database {
    pub(crate) inner: RwLock<Inner>,
    config: DatabaseConfig,
}

impl Database {
    /// Empty database with default configuration.
    pub fn new() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    /// Empty database with explicit configuration.
    pub fn with_config(config: DatabaseConfig) -> Self {
        Database {
            inner: RwLock::new(Inner::default()),
            config,
        }
    }

    /// Current commit sequence (the version the next read snapshot sees).
    pub fn commit_seq(&self) -> u64 {
        self.inner.read().commit_seq
    }

    /// Begin a bare optimistic transaction.
    ///
    /// Most callers want [`Database::transact`], which adds the retry
    /// loop; `begin` exists for tests and for callers managing retries
    /// themselves.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Run `f` inside an optimistic transaction, retrying on conflict.
    ///
    /// The closure may run multiple times, so it must be idempotent up to
    /// its reads: every retry re-executes reads against fresh state.
    /// Errors returned by the closure abort immediately without retry;
    /// only commit-time conflicts re-run it. Past the retry bound the
    /// conflict surfaces as [`SubstrateError::RetryLimitExceeded`].
    pub fn transact<T, E, F>(&self, mut f: F) -> Result<Committed<T>, E>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T, E>,
        E: From<SubstrateError>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut txn = self.begin();
            let value = f(&mut txn)?;
            match txn.commit() {
                Ok(version) => return Ok(Committed { value, version }),
                Err(SubstrateError::Conflict { snapshot })
                    if attempts <= self.config.max_transaction_retries =>
                {
                    warn!(attempts, snapshot, "transaction conflict, retrying");
                }
                Err(SubstrateError::Conflict { .. }) => {
                    return Err(SubstrateError::RetryLimitExceeded { attempts }.into());
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Run `f` against a snapshot-consistent read-only view.
    ///
    /// The view holds a shared lock for the closure's duration: all reads
    /// inside observe the same commit sequence, readers never block
    /// readers, and no footprints are registered.
    pub fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&mut ReadView<'_>) -> T,
    {
        let guard = self.inner.read();
        let mut view = ReadView::new(guard);
        f(&mut view)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Database")
            .field("entries", &inner.map.len())
            .field("commit_seq", &inner.commit_seq)
            .finish()
    }
}
