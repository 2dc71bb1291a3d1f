//! Append preconditions.
//!
//! An [`AppendCondition`] is evaluated inside the same substrate
//! transaction that writes the batch, so it observes a consistent
//! snapshot and is protected by the substrate's conflict detection: if a
//! concurrent commit invalidates what the condition read, the whole
//! append re-executes and the condition re-evaluates against fresh state.

use crate::fact::{FactId, SubjectRef};
use crate::position::Position;
use crate::query::TagQuery;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Precondition that must hold before an append commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppendCondition {
    /// Unconditional append.
    None,

    /// Single-subject optimistic lock: the subject's current last fact id
    /// must equal the expectation. `None` means the subject must
    /// currently have no facts.
    ExpectedLastFact {
        /// The subject being locked.
        subject: SubjectRef,
        /// Expected last fact id (`None` = no facts yet).
        expected_last_fact_id: Option<FactId>,
    },

    /// Atomic multi-subject lock: the single-subject rule above must hold
    /// independently for every entry; the first failing subject aborts
    /// the append.
    ExpectedMultiSubjectLastFact {
        /// Expected last fact id per subject.
        expectations: BTreeMap<SubjectRef, Option<FactId>>,
    },

    /// Fail the append if any fact matching `fail_if_matches` exists with
    /// position strictly greater than `after` (all positions when `after`
    /// is `None`).
    TagQueryBased {
        /// Guard query; matches must be absent for the append to pass.
        fail_if_matches: TagQuery,
        /// Exclusive lower position bound for the guard.
        after: Option<Position>,
    },
}

impl AppendCondition {
    /// Single-subject optimistic lock.
    pub fn expected_last_fact(subject: SubjectRef, expected: Option<FactId>) -> Self {
        AppendCondition::ExpectedLastFact {
            subject,
            expected_last_fact_id: expected,
        }
    }

    /// Multi-subject optimistic lock.
    pub fn expected_multi_subject(expectations: BTreeMap<SubjectRef, Option<FactId>>) -> Self {
        AppendCondition::ExpectedMultiSubjectLastFact { expectations }
    }

    /// Guard-query condition.
    pub fn fail_if_matches(query: TagQuery, after: Option<Position>) -> Self {
        AppendCondition::TagQueryBased {
            fail_if_matches: query,
            after,
        }
    }

    /// Short variant name, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            AppendCondition::None => "none",
            AppendCondition::ExpectedLastFact { .. } => "expected_last_fact",
            AppendCondition::ExpectedMultiSubjectLastFact { .. } => "expected_multi_subject",
            AppendCondition::TagQueryBased { .. } => "tag_query",
        }
    }
}
