//! The append coordinator.
//!
//! One substrate transaction per batch: duplicate-id checks, condition
//! evaluation, record writes and index writes all share the snapshot, so
//! either the whole batch commits or nothing does. Condition reads record
//! footprints, which makes preconditions safe under concurrency: a
//! concurrent commit that invalidates them forces a retry with fresh
//! reads, and a condition that genuinely fails aborts without retry.

use crate::index::IndexSet;
use crate::query;
use crate::record::RecordStore;
use factstore_core::{
    AppendCondition, Fact, FactId, FactStoreError, FactStoreResult, IdempotencyKey, Position,
    SubjectRef,
};
use factstore_substrate::{Database, Transaction};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Write-side facade: conditionally-atomic batch appends.
///
/// Clone is cheap; all state is shared.
#[derive(Clone)]
pub struct Appender {
    db: Arc<Database>,
    records: RecordStore,
    indexes: IndexSet,
}

impl Appender {
    pub(crate) fn new(db: Arc<Database>, records: RecordStore, indexes: IndexSet) -> Self {
        Appender {
            db,
            records,
            indexes,
        }
    }

    /// Append `facts` as one atomic batch, guarded by `condition`.
    ///
    /// Returns the position of the last fact in the batch. Fails without
    /// writing anything if the batch is empty, any id already exists (in
    /// the store or repeated within the batch), or the condition does not
    /// hold.
    pub fn append(&self, facts: &[Fact], condition: &AppendCondition) -> FactStoreResult<Position> {
        self.append_with_key(facts, condition, None)
    }

    /// [`Appender::append`] with an idempotency key carried for logging
    /// and caller-side correlation. The key is not enforced; duplicate
    /// suppression rides on fact ids.
    pub fn append_with_key(
        &self,
        facts: &[Fact],
        condition: &AppendCondition,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> FactStoreResult<Position> {
        if facts.is_empty() {
            return Err(FactStoreError::EmptyBatch);
        }

        debug!(
            count = facts.len(),
            condition = condition.kind(),
            idempotency_key = idempotency_key.map(|k| k.as_str()),
            "appending batch"
        );

        let committed = self.db.transact(|txn| -> FactStoreResult<()> {
            self.check_duplicates(txn, facts)?;
            self.check_condition(txn, condition)?;
            for (i, fact) in facts.iter().enumerate() {
                let batch = i as u32;
                self.records.store(txn, fact, batch)?;
                self.indexes.write_entries(txn, fact, batch);
            }
            Ok(())
        })?;

        let position = Position::new(committed.version, (facts.len() - 1) as u32);
        debug!(%position, "batch committed");
        Ok(position)
    }

    /// Reject the batch if any id exists in the store or repeats within
    /// the batch. All colliding ids are reported, not just the first.
    fn check_duplicates(&self, txn: &mut Transaction<'_>, facts: &[Fact]) -> FactStoreResult<()> {
        let mut seen: HashSet<FactId> = HashSet::with_capacity(facts.len());
        let mut duplicates = Vec::new();
        for fact in facts {
            if !seen.insert(fact.id) || self.records.exists(txn, &fact.id) {
                duplicates.push(fact.id);
            }
        }
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(FactStoreError::DuplicateFactIds { ids: duplicates })
        }
    }

    fn check_condition(
        &self,
        txn: &mut Transaction<'_>,
        condition: &AppendCondition,
    ) -> FactStoreResult<()> {
        match condition {
            AppendCondition::None => Ok(()),
            AppendCondition::ExpectedLastFact {
                subject,
                expected_last_fact_id,
            } => self.check_subject_head(txn, subject, expected_last_fact_id),
            AppendCondition::ExpectedMultiSubjectLastFact { expectations } => {
                for (subject, expected) in expectations {
                    self.check_subject_head(txn, subject, expected)?;
                }
                Ok(())
            }
            AppendCondition::TagQueryBased {
                fail_if_matches,
                after,
            } => {
                let matched = query::resolve_query(&self.indexes, txn, fail_if_matches);
                let matches = match after {
                    None => matched.len(),
                    Some(after) => matched.values().filter(|p| **p > *after).count(),
                };
                if matches == 0 {
                    Ok(())
                } else {
                    Err(FactStoreError::QueryPreconditionFailed { matches })
                }
            }
        }
    }

    fn check_subject_head(
        &self,
        txn: &mut Transaction<'_>,
        subject: &SubjectRef,
        expected: &Option<FactId>,
    ) -> FactStoreResult<()> {
        let actual = self.indexes.last_fact_id(txn, subject);
        if actual == *expected {
            Ok(())
        } else {
            Err(FactStoreError::SubjectPreconditionFailed {
                subject: subject.clone(),
                expected: *expected,
                actual,
            })
        }
    }
}

impl std::fmt::Debug for Appender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Appender").finish_non_exhaustive()
    }
}
