//! The primary fact record store.
//!
//! Each fact owns three entries, written atomically within the caller's
//! transaction: an empty existence marker (the dedup anchor), the
//! bincode-encoded record, and a versionstamped position stamp completed
//! by the substrate at commit. Index maintenance is the index set's
//! responsibility, invoked from the same transaction.
//!
//! Retries are not this module's concern; the append coordinator owns
//! the retry policy.

use crate::keys::{self, StoreSpaces};
use factstore_core::position::STAMP_LEN;
use factstore_core::{Fact, FactId, FactStoreError, FactStoreResult, Position};
use factstore_substrate::{ReadContext, Transaction};
use std::sync::Arc;

/// A fact together with its committed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFact {
    /// The decoded fact.
    pub fact: Fact,
    /// The position recorded at commit time.
    pub position: Position,
}

/// Stateless facade over the primary record subspaces.
///
/// Clone is cheap; instances sharing the same subspace family see the
/// same data.
#[derive(Debug, Clone)]
pub struct RecordStore {
    spaces: Arc<StoreSpaces>,
}

impl RecordStore {
    /// Build a record store over the given subspace family.
    pub fn new(spaces: Arc<StoreSpaces>) -> Self {
        RecordStore { spaces }
    }

    /// Write the fact's three primary entries into `txn`.
    ///
    /// `batch` is the fact's index within its append batch and becomes
    /// the batch component of its position stamp.
    pub fn store(&self, txn: &mut Transaction<'_>, fact: &Fact, batch: u32) -> FactStoreResult<()> {
        let encoded = bincode::serialize(fact)
            .map_err(|_| FactStoreError::CorruptRecord { id: fact.id })?;

        txn.set(keys::fact_id_key(&self.spaces, &fact.id), Vec::new());
        txn.set(keys::record_key(&self.spaces, &fact.id), encoded);

        // Incomplete stamp: commit bytes zeroed, batch already in place.
        let mut stamp = vec![0u8; STAMP_LEN];
        stamp[8..].copy_from_slice(&batch.to_be_bytes());
        txn.set_versionstamped_value(keys::position_key(&self.spaces, &fact.id), stamp, 0);

        Ok(())
    }

    /// Load a fact and its position; `None` if the id is unknown.
    pub fn load<R: ReadContext>(&self, ctx: &mut R, id: &FactId) -> FactStoreResult<Option<StoredFact>> {
        let Some(encoded) = ctx.get(&keys::record_key(&self.spaces, id)) else {
            return Ok(None);
        };
        let fact: Fact = bincode::deserialize(&encoded)
            .map_err(|_| FactStoreError::CorruptRecord { id: *id })?;

        // Record and stamp are written in one transaction; a present
        // record with a missing or malformed stamp is corruption.
        let position = ctx
            .get(&keys::position_key(&self.spaces, id))
            .as_deref()
            .and_then(Position::from_bytes)
            .ok_or(FactStoreError::CorruptRecord { id: *id })?;

        Ok(Some(StoredFact { fact, position }))
    }

    /// Point existence check against the dedup anchor.
    pub fn exists<R: ReadContext>(&self, ctx: &mut R, id: &FactId) -> bool {
        ctx.get(&keys::fact_id_key(&self.spaces, id)).is_some()
    }
}
