//! Scoped key subspaces.
//!
//! A `Subspace` prefixes every key packed through it, so independent
//! index families share one ordered keyspace without colliding. Range
//! bounds rely on a tuple-encoding invariant: no element encoding begins
//! with 0xFF, so `prefix + 0xFF` is strictly greater than every key in
//! the subspace.

use factstore_core::tuple::{self, Element, TupleError, VersionstampedKey};

/// A contiguous, prefix-scoped region of the keyspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subspace {
    prefix: Vec<u8>,
}

impl Subspace {
    /// Subspace rooted at a raw prefix.
    pub fn new(prefix: Vec<u8>) -> Self {
        Subspace { prefix }
    }

    /// Subspace rooted at a packed tuple.
    pub fn from_elements(elements: &[Element]) -> Self {
        Subspace {
            prefix: tuple::pack(elements),
        }
    }

    /// Child subspace under additional tuple elements.
    pub fn child(&self, elements: &[Element]) -> Self {
        Subspace {
            prefix: tuple::pack_onto(&self.prefix, elements),
        }
    }

    /// The raw prefix bytes.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Pack a tuple under this subspace's prefix.
    pub fn pack(&self, elements: &[Element]) -> Vec<u8> {
        tuple::pack_onto(&self.prefix, elements)
    }

    /// Pack a key containing an incomplete versionstamp; see
    /// [`tuple::pack_versionstamped`].
    pub fn pack_versionstamped(
        &self,
        before: &[Element],
        batch: u32,
        after: &[Element],
    ) -> VersionstampedKey {
        tuple::pack_versionstamped(&self.prefix, before, batch, after)
    }

    /// Decode a key from this subspace back into tuple elements.
    pub fn unpack(&self, key: &[u8]) -> Result<Vec<Element>, TupleError> {
        let rest = key
            .strip_prefix(self.prefix.as_slice())
            .ok_or(TupleError::OutsideSubspace)?;
        tuple::unpack(rest)
    }

    /// Scan bounds covering every key in this subspace.
    pub fn range(&self) -> (Vec<u8>, Vec<u8>) {
        let begin = self.prefix.clone();
        let mut end = self.prefix.clone();
        end.push(0xFF);
        (begin, end)
    }

    /// Scan bounds covering every key extending the given tuple prefix.
    pub fn range_of(&self, elements: &[Element]) -> (Vec<u8>, Vec<u8>) {
        let begin = self.pack(elements);
        let mut end = begin.clone();
        end.push(0xFF);
        (begin, end)
    }
}
