//! Subspace layout and key shapes.
//!
//! All store data lives under a root tuple `("fact-store", <name>)`,
//! split into nine subspaces:
//!
//! ```text
//! id/{fact_id}                                          = ∅  (existence / dedup anchor)
//! record/{fact_id}                                      = bincode(Fact)
//! position/{fact_id}                                    = 12-byte position stamp
//! global/{stamp}/{fact_id}                              = ∅
//! subject/{subject_type}/{subject_id}/{stamp}/{fact_id} = ∅
//! type/{fact_type}/{stamp}/{fact_id}                    = ∅
//! tag/{tag_key}/{tag_value}/{stamp}/{fact_id}           = ∅
//! type-tag/{fact_type}/{tag_key}/{tag_value}/{stamp}/{fact_id} = ∅
//! time/{epoch_seconds}/{nanos}/{fact_id}                = ∅
//! ```
//!
//! Every index key ends in `{stamp}/{fact_id}`: the stamp makes entries
//! sort in commit order within their grouping prefix, and the id breaks
//! ties while letting scans recover the fact without reading values.
//! Stamps are incomplete versionstamps completed by the substrate at
//! commit time.

use chrono::{DateTime, Utc};
use factstore_core::fact::FactId;
use factstore_core::tuple::{Element, VersionstampedKey};
use factstore_core::{Position, SubjectRef};
use factstore_substrate::Subspace;

const ROOT: &str = "fact-store";

const FACT_ID: &str = "id";
const RECORD: &str = "record";
const POSITION: &str = "position";
const GLOBAL: &str = "global";
const SUBJECT: &str = "subject";
const TYPE: &str = "type";
const TAG: &str = "tag";
const TYPE_TAG: &str = "type-tag";
const TIME: &str = "time";

/// The store's named subspaces.
#[derive(Debug, Clone)]
pub struct StoreSpaces {
    /// Existence / dedup markers.
    pub fact_id: Subspace,
    /// Primary fact records.
    pub record: Subspace,
    /// Per-fact position stamps.
    pub position: Subspace,
    /// Global position index.
    pub global: Subspace,
    /// Per-subject history index.
    pub subject: Subspace,
    /// Type index.
    pub fact_type: Subspace,
    /// Tag index.
    pub tag: Subspace,
    /// Composite type+tag index.
    pub type_tag: Subspace,
    /// Creation-time index.
    pub time: Subspace,
}

impl StoreSpaces {
    /// Open the subspace family for a named store.
    pub fn open(name: &str) -> Self {
        let root = Subspace::from_elements(&[Element::Str(ROOT.into()), Element::Str(name.into())]);
        let space = |label: &str| root.child(&[Element::Str(label.into())]);
        StoreSpaces {
            fact_id: space(FACT_ID),
            record: space(RECORD),
            position: space(POSITION),
            global: space(GLOBAL),
            subject: space(SUBJECT),
            fact_type: space(TYPE),
            tag: space(TAG),
            type_tag: space(TYPE_TAG),
            time: space(TIME),
        }
    }

    /// Every subspace, for whole-store maintenance.
    pub fn all(&self) -> [&Subspace; 9] {
        [
            &self.fact_id,
            &self.record,
            &self.position,
            &self.global,
            &self.subject,
            &self.fact_type,
            &self.tag,
            &self.type_tag,
            &self.time,
        ]
    }
}

// =============================================================================
// Primary record keys
// =============================================================================

/// Existence marker key for a fact id.
pub fn fact_id_key(spaces: &StoreSpaces, id: &FactId) -> Vec<u8> {
    spaces.fact_id.pack(&[Element::Uuid(id.as_uuid())])
}

/// Primary record key for a fact id.
pub fn record_key(spaces: &StoreSpaces, id: &FactId) -> Vec<u8> {
    spaces.record.pack(&[Element::Uuid(id.as_uuid())])
}

/// Position stamp key for a fact id.
pub fn position_key(spaces: &StoreSpaces, id: &FactId) -> Vec<u8> {
    spaces.position.pack(&[Element::Uuid(id.as_uuid())])
}

// =============================================================================
// Index keys (versionstamped)
// =============================================================================

/// Global position index key.
pub fn global_index_key(spaces: &StoreSpaces, batch: u32, id: &FactId) -> VersionstampedKey {
    spaces
        .global
        .pack_versionstamped(&[], batch, &[Element::Uuid(id.as_uuid())])
}

/// Subject history index key.
pub fn subject_index_key(
    spaces: &StoreSpaces,
    subject: &SubjectRef,
    batch: u32,
    id: &FactId,
) -> VersionstampedKey {
    spaces.subject.pack_versionstamped(
        &[
            Element::Str(subject.subject_type.clone()),
            Element::Str(subject.id.clone()),
        ],
        batch,
        &[Element::Uuid(id.as_uuid())],
    )
}

/// Type index key.
pub fn type_index_key(
    spaces: &StoreSpaces,
    fact_type: &str,
    batch: u32,
    id: &FactId,
) -> VersionstampedKey {
    spaces.fact_type.pack_versionstamped(
        &[Element::Str(fact_type.into())],
        batch,
        &[Element::Uuid(id.as_uuid())],
    )
}

/// Tag index key.
pub fn tag_index_key(
    spaces: &StoreSpaces,
    tag_key: &str,
    tag_value: &str,
    batch: u32,
    id: &FactId,
) -> VersionstampedKey {
    spaces.tag.pack_versionstamped(
        &[Element::Str(tag_key.into()), Element::Str(tag_value.into())],
        batch,
        &[Element::Uuid(id.as_uuid())],
    )
}

/// Composite type+tag index key.
pub fn type_tag_index_key(
    spaces: &StoreSpaces,
    fact_type: &str,
    tag_key: &str,
    tag_value: &str,
    batch: u32,
    id: &FactId,
) -> VersionstampedKey {
    spaces.type_tag.pack_versionstamped(
        &[
            Element::Str(fact_type.into()),
            Element::Str(tag_key.into()),
            Element::Str(tag_value.into()),
        ],
        batch,
        &[Element::Uuid(id.as_uuid())],
    )
}

/// Creation-time index key: `(epoch_seconds, nanos, id)`.
pub fn time_index_key(spaces: &StoreSpaces, at: &DateTime<Utc>, id: &FactId) -> Vec<u8> {
    spaces.time.pack(&[
        Element::I64(at.timestamp()),
        Element::U64(u64::from(at.timestamp_subsec_nanos())),
        Element::Uuid(id.as_uuid()),
    ])
}

/// Scan bound tuple for a time-index position (no id component, so it
/// excludes every entry at exactly this instant when used as an end
/// bound and includes them all when used as a begin bound).
pub fn time_index_bound(spaces: &StoreSpaces, at: &DateTime<Utc>) -> Vec<u8> {
    spaces.time.pack(&[
        Element::I64(at.timestamp()),
        Element::U64(u64::from(at.timestamp_subsec_nanos())),
    ])
}

// =============================================================================
// Index key decoding
// =============================================================================

/// Decode `(position, fact_id)` from the tail of an index key.
///
/// Malformed keys yield `None`; scans skip them rather than failing the
/// whole read (index entries are engine-written, so this is a
/// corruption signal, not an expected path).
pub fn decode_index_entry(space: &Subspace, key: &[u8]) -> Option<(Position, FactId)> {
    let elements = space.unpack(key).ok()?;
    if elements.len() < 2 {
        return None;
    }
    let position = elements[elements.len() - 2].as_position()?;
    let id = elements[elements.len() - 1].as_uuid()?;
    Some((position, FactId::from_uuid(id)))
}

/// Decode the fact id from the tail of a time-index key.
pub fn decode_time_entry(space: &Subspace, key: &[u8]) -> Option<FactId> {
    let elements = space.unpack(key).ok()?;
    let id = elements.last()?.as_uuid()?;
    Some(FactId::from_uuid(id))
}
