//! Commit positions.
//!
//! A `Position` totally orders facts across the store's lifetime: the
//! `commit` component is the substrate's commit-time counter, the `batch`
//! component the fact's index within its append batch. The order is the
//! substrate's commit order, not wall-clock time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an encoded position stamp: 8 bytes commit + 4 bytes batch.
pub const STAMP_LEN: usize = 12;

/// The total-order stamp assigned to a fact at commit time.
///
/// Derived ordering is `(commit, batch)`, which matches the byte order of
/// the encoded stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Substrate commit sequence; assigned when the transaction commits.
    pub commit: u64,
    /// Index of the fact within its append batch.
    pub batch: u32,
}

impl Position {
    /// Build a position from its components.
    pub fn new(commit: u64, batch: u32) -> Self {
        Position { commit, batch }
    }

    /// Encode as a 12-byte big-endian stamp (order-preserving).
    pub fn to_bytes(&self) -> [u8; STAMP_LEN] {
        let mut out = [0u8; STAMP_LEN];
        out[..8].copy_from_slice(&self.commit.to_be_bytes());
        out[8..].copy_from_slice(&self.batch.to_be_bytes());
        out
    }

    /// Decode a 12-byte stamp; `None` if the slice has the wrong length.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != STAMP_LEN {
            return None;
        }
        let mut commit = [0u8; 8];
        let mut batch = [0u8; 4];
        commit.copy_from_slice(&bytes[..8]);
        batch.copy_from_slice(&bytes[8..]);
        Some(Position {
            commit: u64::from_be_bytes(commit),
            batch: u32::from_be_bytes(batch),
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.commit, self.batch)
    }
}
