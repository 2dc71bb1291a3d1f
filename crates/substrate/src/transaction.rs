//! Optimistic transactions and snapshot read views.
//!
//! Conflict detection is footprint-based: every point read records the
//! key it touched, every range read records its bounds. At commit, a
//! transaction is valid only if no key inside any footprint carries a
//! commit version newer than the transaction's snapshot sequence. Writes
//! are buffered until commit and record no footprints, so blind writes
//! never conflict.

use crate::database::{Database, Entry, Inner};
use factstore_core::error::SubstrateError;
use factstore_core::tuple::VersionstampedKey;
use parking_lot::RwLockReadGuard;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Read operations shared by transactions and read-only views.
///
/// Engine-level scans are written against this trait so the same code
/// serves precondition evaluation (inside a write transaction, recording
/// footprints) and query resolution (against a snapshot view).
pub trait ReadContext {
    /// Point read.
    fn get(&mut self, key: &[u8]) -> Option<Vec<u8>>;

    /// Ordered scan of `[begin, end)`.
    fn get_range(&mut self, begin: &[u8], end: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    /// Last entry of `[begin, end)`, i.e. a reverse scan with limit 1.
    fn last_in_range(&mut self, begin: &[u8], end: &[u8]) -> Option<(Vec<u8>, Vec<u8>)>;
}

/// A read the transaction performed, re-validated at commit.
#[derive(Debug, Clone)]
enum Footprint {
    Point(Vec<u8>),
    Range(Vec<u8>, Vec<u8>),
}

/// A buffered write carrying an incomplete versionstamp.
#[derive(Debug)]
enum StampedWrite {
    /// Key contains the placeholder; value is literal.
    Key { key: VersionstampedKey, value: Vec<u8> },
    /// Key is literal; value contains the placeholder at `offset`.
    Value {
        key: Vec<u8>,
        value: Vec<u8>,
        offset: usize,
    },
}

/// An optimistic write transaction.
///
/// Reads go to live state under a short shared lock and are recorded as
/// footprints; writes are buffered locally. Point and range reads observe
/// the transaction's own buffered writes (read-your-writes), except for
/// versionstamped writes, whose keys are unknowable before commit.
pub struct Transaction<'db> {
    db: &'db Database,
    snapshot: u64,
    footprints: Vec<Footprint>,
    writes: BTreeMap<Vec<u8>, Vec<u8>>,
    stamped: Vec<StampedWrite>,
    clears: Vec<(Vec<u8>, Vec<u8>)>,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        let snapshot = db.inner.read().commit_seq;
        Transaction {
            db,
            snapshot,
            footprints: Vec::new(),
            writes: BTreeMap::new(),
            stamped: Vec::new(),
            clears: Vec::new(),
        }
    }

    /// Commit sequence this transaction's reads are validated against.
    pub fn snapshot_seq(&self) -> u64 {
        self.snapshot
    }

    /// Buffer a plain write.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, value);
    }

    /// Buffer a write whose key's versionstamp is completed at commit.
    pub fn set_versionstamped_key(&mut self, key: VersionstampedKey, value: Vec<u8>) {
        self.stamped.push(StampedWrite::Key { key, value });
    }

    /// Buffer a write whose value holds an incomplete 12-byte stamp at
    /// `offset`; the 8 commit bytes are filled at commit.
    pub fn set_versionstamped_value(&mut self, key: Vec<u8>, value: Vec<u8>, offset: usize) {
        self.stamped.push(StampedWrite::Value { key, value, offset });
    }

    /// Buffer removal of every key in `[begin, end)`.
    ///
    /// Maintenance-only (store reset): cleared ranges are not tracked for
    /// conflict purposes.
    pub fn clear_range(&mut self, begin: Vec<u8>, end: Vec<u8>) {
        self.clears.push((begin, end));
    }

    /// Validate footprints and apply buffered writes.
    ///
    /// Returns the commit sequence assigned to this transaction's writes.
    pub(crate) fn commit(self) -> Result<u64, SubstrateError> {
        let mut inner = self.db.inner.write();

        for footprint in &self.footprints {
            let invalidated = match footprint {
                Footprint::Point(key) => inner
                    .map
                    .get(key)
                    .is_some_and(|entry| entry.version > self.snapshot),
                Footprint::Range(begin, end) => range_of(&inner, begin, end)
                    .any(|(_, entry)| entry.version > self.snapshot),
            };
            if invalidated {
                return Err(SubstrateError::Conflict {
                    snapshot: self.snapshot,
                });
            }
        }

        let version = inner.commit_seq + 1;

        for (begin, end) in &self.clears {
            let doomed: Vec<Vec<u8>> = range_of(&inner, begin, end)
                .map(|(key, _)| key.clone())
                .collect();
            for key in doomed {
                inner.map.remove(&key);
            }
        }

        for (key, value) in self.writes {
            inner.map.insert(key, Entry { value, version });
        }

        for write in self.stamped {
            match write {
                StampedWrite::Key { key, value } => {
                    let VersionstampedKey { mut bytes, offset } = key;
                    bytes[offset..offset + 8].copy_from_slice(&version.to_be_bytes());
                    inner.map.insert(bytes, Entry { value, version });
                }
                StampedWrite::Value {
                    key,
                    mut value,
                    offset,
                } => {
                    value[offset..offset + 8].copy_from_slice(&version.to_be_bytes());
                    inner.map.insert(key, Entry { value, version });
                }
            }
        }

        inner.commit_seq = version;
        Ok(version)
    }
}

fn range_of<'a>(
    inner: &'a Inner,
    begin: &[u8],
    end: &[u8],
) -> impl DoubleEndedIterator<Item = (&'a Vec<u8>, &'a Entry)> {
    inner
        .map
        .range::<[u8], _>((Bound::Included(begin), Bound::Excluded(end)))
}

impl ReadContext for Transaction<'_> {
    fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(value) = self.writes.get(key) {
            return Some(value.clone());
        }
        self.footprints.push(Footprint::Point(key.to_vec()));
        let inner = self.db.inner.read();
        inner.map.get(key).map(|entry| entry.value.clone())
    }

    fn get_range(&mut self, begin: &[u8], end: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.footprints
            .push(Footprint::Range(begin.to_vec(), end.to_vec()));
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = {
            let inner = self.db.inner.read();
            range_of(&inner, begin, end)
                .map(|(key, entry)| (key.clone(), entry.value.clone()))
                .collect()
        };
        for (key, value) in self
            .writes
            .range::<[u8], _>((Bound::Included(begin), Bound::Excluded(end)))
        {
            merged.insert(key.clone(), value.clone());
        }
        merged.into_iter().collect()
    }

    fn last_in_range(&mut self, begin: &[u8], end: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        // Conservative: the footprint covers the whole range, matching
        // the conflict semantics of a reverse scan with limit 1.
        self.get_range(begin, end).into_iter().next_back()
    }
}

/// Snapshot-consistent read-only view.
///
/// Holds a shared lock on the keyspace for its lifetime, so every read
/// through it observes the same commit sequence.
pub struct ReadView<'db> {
    guard: RwLockReadGuard<'db, Inner>,
}

impl<'db> ReadView<'db> {
    pub(crate) fn new(guard: RwLockReadGuard<'db, Inner>) -> Self {
        ReadView { guard }
    }

    /// Commit sequence this view observes.
    pub fn version(&self) -> u64 {
        self.guard.commit_seq
    }
}

impl ReadContext for ReadView<'_> {
    fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.guard.map.get(key).map(|entry| entry.value.clone())
    }

    fn get_range(&mut self, begin: &[u8], end: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        range_of(&self.guard, begin, end)
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    fn last_in_range(&mut self, begin: &[u8], end: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        range_of(&self.guard, begin, end)
            .next_back()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
    }
}
