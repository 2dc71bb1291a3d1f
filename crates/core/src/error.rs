//! Error taxonomy for the fact store.
//!
//! The taxonomy is closed on purpose: every failure the engine can surface
//! is one of the variants below, so transport layers can map them
//! exhaustively. The classes are:
//!
//! - **Validation** (`EmptyBatch`, `EmptyQueryItem`): malformed request,
//!   rejected before any substrate access. Never retried.
//! - **Duplicate identifier** (`DuplicateFactIds`): permanent; the caller
//!   must regenerate ids or treat the append as already applied.
//! - **Precondition failure** (`SubjectPreconditionFailed`,
//!   `QueryPreconditionFailed`): the append condition did not hold at
//!   commit time. No writes occurred; re-read state before retrying.
//! - **Transient substrate** (`Substrate`): optimistic-concurrency retries
//!   were exhausted. Safe to retry from scratch.
//! - **Corruption** (`CorruptRecord`): a primary record failed to encode
//!   or decode.

use crate::fact::{FactId, SubjectRef};
use thiserror::Error;

/// Result alias used throughout the workspace.
pub type FactStoreResult<T> = Result<T, FactStoreError>;

/// Errors reported by the substrate's transaction machinery.
///
/// `Conflict` is internal to the retry loop; callers normally only see
/// `RetryLimitExceeded` once the bounded retries are spent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstrateError {
    /// A read footprint was invalidated by a concurrent commit.
    #[error("transaction conflict: read footprint invalidated past snapshot {snapshot}")]
    Conflict {
        /// Commit sequence the transaction's reads were taken at.
        snapshot: u64,
    },

    /// The transaction conflicted on every attempt up to the retry bound.
    #[error("transaction retry limit exceeded after {attempts} attempts")]
    RetryLimitExceeded {
        /// Number of attempts made before giving up.
        attempts: usize,
    },
}

/// The closed error taxonomy surfaced by appenders, finders and streamers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactStoreError {
    /// An append batch contained no facts.
    #[error("append batch must contain at least one fact")]
    EmptyBatch,

    /// A tag query item defined neither types nor tags.
    #[error("query item must define at least one type or tag")]
    EmptyQueryItem,

    /// One or more fact ids already exist (in the store or repeated within
    /// the batch). The whole batch was rejected; no writes occurred.
    #[error("fact id(s) already exist: {ids:?}")]
    DuplicateFactIds {
        /// Every colliding id in the rejected batch.
        ids: Vec<FactId>,
    },

    /// A subject-head expectation did not hold at commit time.
    #[error("precondition not met for subject {subject}: expected last fact {expected:?}, found {actual:?}")]
    SubjectPreconditionFailed {
        /// The subject whose expectation failed.
        subject: SubjectRef,
        /// Expected last fact id (`None` = subject must have no facts).
        expected: Option<FactId>,
        /// Actual last fact id observed in the same transaction.
        actual: Option<FactId>,
    },

    /// A `TagQueryBased` guard matched facts it required to be absent.
    #[error("precondition not met: {matches} fact(s) match the guard query")]
    QueryPreconditionFailed {
        /// Number of matching facts found past the `after` position.
        matches: usize,
    },

    /// A primary record could not be encoded or decoded.
    #[error("fact record for {id} could not be encoded or decoded")]
    CorruptRecord {
        /// Id of the undecodable record.
        id: FactId,
    },

    /// Transient substrate failure (conflict retries exhausted).
    #[error(transparent)]
    Substrate(#[from] SubstrateError),
}

impl FactStoreError {
    /// Whether the caller may retry the operation unchanged.
    ///
    /// Only transient substrate failures are retryable; validation,
    /// duplicate-id and precondition failures require the caller to change
    /// the request (or re-read state) first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FactStoreError::Substrate(_))
    }
}
