//! Global-order replay.
//!
//! A stream is a snapshot of the global index taken at creation, then
//! lazily materialized: each `next()` loads one record. Facts committed
//! after the snapshot are not observed; ids whose record has vanished
//! are skipped, matching the query engine's materialization rules.

use crate::index::IndexSet;
use crate::record::{RecordStore, StoredFact};
use factstore_core::{FactId, FactStoreResult, Position};
use factstore_substrate::Database;
use std::sync::Arc;
use std::vec;

/// Produces replay streams over the store's global order.
#[derive(Clone)]
pub struct Streamer {
    db: Arc<Database>,
    records: RecordStore,
    indexes: IndexSet,
}

impl Streamer {
    pub(crate) fn new(db: Arc<Database>, records: RecordStore, indexes: IndexSet) -> Self {
        Streamer {
            db,
            records,
            indexes,
        }
    }

    /// Stream every fact in commit order.
    pub fn stream_all(&self) -> FactStream {
        let entries = self.db.read(|view| self.indexes.scan_global(view));
        FactStream {
            db: self.db.clone(),
            records: self.records.clone(),
            entries: entries.into_iter(),
        }
    }

    /// Stream facts with position strictly greater than `after`, in
    /// commit order. Drives catch-up consumers that track the position of
    /// the last fact they processed.
    pub fn stream_after(&self, after: Position) -> FactStream {
        let entries = self.db.read(|view| self.indexes.scan_global(view));
        let remaining: Vec<(Position, FactId)> = entries
            .into_iter()
            .filter(|(position, _)| *position > after)
            .collect();
        FactStream {
            db: self.db.clone(),
            records: self.records.clone(),
            entries: remaining.into_iter(),
        }
    }
}

impl std::fmt::Debug for Streamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streamer").finish_non_exhaustive()
    }
}

/// Iterator over facts in global commit order.
///
/// The id/position listing is fixed at stream creation; record loads
/// happen per step. Decode failures surface as errors; missing records
/// are skipped.
pub struct FactStream {
    db: Arc<Database>,
    records: RecordStore,
    entries: vec::IntoIter<(Position, FactId)>,
}

impl FactStream {
    /// Number of entries not yet yielded (upper bound on remaining facts;
    /// records deleted since the snapshot reduce the actual count).
    pub fn remaining_hint(&self) -> usize {
        self.entries.len()
    }
}

impl Iterator for FactStream {
    type Item = FactStoreResult<StoredFact>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (_, id) = self.entries.next()?;
            let loaded = self.db.read(|view| self.records.load(view, &id));
            match loaded {
                Ok(Some(stored)) => return Some(Ok(stored)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.entries.len()))
    }
}
