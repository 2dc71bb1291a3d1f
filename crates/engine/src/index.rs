//! The derived index set.
//!
//! Six indexes are maintained alongside every record write: global,
//! subject, type, tag, composite type+tag, and creation time. All index
//! entries carry empty values; everything a scan needs is in the key.

use crate::keys::{self, StoreSpaces};
use chrono::{DateTime, Utc};
use factstore_core::tuple::Element;
use factstore_core::{Fact, FactId, Position, SubjectRef};
use factstore_substrate::{ReadContext, Transaction};
use std::sync::Arc;

/// Stateless facade over the index subspaces.
#[derive(Debug, Clone)]
pub struct IndexSet {
    spaces: Arc<StoreSpaces>,
}

impl IndexSet {
    /// Build an index set over the given subspace family.
    pub fn new(spaces: Arc<StoreSpaces>) -> Self {
        IndexSet { spaces }
    }

    /// Buffer every index entry for `fact` into `txn`.
    ///
    /// Global, subject, type, and time entries are unconditional; tag and
    /// type+tag entries are written once per tag pair. Must run in the
    /// same transaction as the record write.
    pub fn write_entries(&self, txn: &mut Transaction<'_>, fact: &Fact, batch: u32) {
        let id = &fact.id;

        txn.set_versionstamped_key(keys::global_index_key(&self.spaces, batch, id), Vec::new());
        txn.set_versionstamped_key(
            keys::subject_index_key(&self.spaces, &fact.subject, batch, id),
            Vec::new(),
        );
        txn.set_versionstamped_key(
            keys::type_index_key(&self.spaces, &fact.fact_type, batch, id),
            Vec::new(),
        );
        txn.set(keys::time_index_key(&self.spaces, &fact.appended_at, id), Vec::new());

        for (tag_key, tag_value) in &fact.tags {
            txn.set_versionstamped_key(
                keys::tag_index_key(&self.spaces, tag_key, tag_value, batch, id),
                Vec::new(),
            );
            txn.set_versionstamped_key(
                keys::type_tag_index_key(&self.spaces, &fact.fact_type, tag_key, tag_value, batch, id),
                Vec::new(),
            );
        }
    }

    /// Id of the most recent fact for `subject`, or `None` if the subject
    /// has no history.
    ///
    /// A reverse scan with limit 1 over the subject's index range; inside
    /// a transaction this records a footprint over the whole range, which
    /// is exactly the conflict surface an optimistic lock needs.
    pub fn last_fact_id<R: ReadContext>(&self, ctx: &mut R, subject: &SubjectRef) -> Option<FactId> {
        let (begin, end) = self.spaces.subject.range_of(&[
            Element::Str(subject.subject_type.clone()),
            Element::Str(subject.id.clone()),
        ]);
        let (key, _) = ctx.last_in_range(&begin, &end)?;
        keys::decode_index_entry(&self.spaces.subject, &key).map(|(_, id)| id)
    }

    /// All entries for `subject`, in position order.
    pub fn scan_subject<R: ReadContext>(
        &self,
        ctx: &mut R,
        subject: &SubjectRef,
    ) -> Vec<(Position, FactId)> {
        let (begin, end) = self.spaces.subject.range_of(&[
            Element::Str(subject.subject_type.clone()),
            Element::Str(subject.id.clone()),
        ]);
        self.scan(ctx, &self.spaces.subject, &begin, &end)
    }

    /// All entries for a fact type, in position order.
    pub fn scan_type<R: ReadContext>(&self, ctx: &mut R, fact_type: &str) -> Vec<(Position, FactId)> {
        let (begin, end) = self
            .spaces
            .fact_type
            .range_of(&[Element::Str(fact_type.into())]);
        self.scan(ctx, &self.spaces.fact_type, &begin, &end)
    }

    /// All entries for a tag pair, in position order.
    pub fn scan_tag<R: ReadContext>(
        &self,
        ctx: &mut R,
        tag_key: &str,
        tag_value: &str,
    ) -> Vec<(Position, FactId)> {
        let (begin, end) = self
            .spaces
            .tag
            .range_of(&[Element::Str(tag_key.into()), Element::Str(tag_value.into())]);
        self.scan(ctx, &self.spaces.tag, &begin, &end)
    }

    /// All entries for a (type, tag pair) combination, in position order.
    pub fn scan_type_tag<R: ReadContext>(
        &self,
        ctx: &mut R,
        fact_type: &str,
        tag_key: &str,
        tag_value: &str,
    ) -> Vec<(Position, FactId)> {
        let (begin, end) = self.spaces.type_tag.range_of(&[
            Element::Str(fact_type.into()),
            Element::Str(tag_key.into()),
            Element::Str(tag_value.into()),
        ]);
        self.scan(ctx, &self.spaces.type_tag, &begin, &end)
    }

    /// Every entry in the global index, in commit order.
    pub fn scan_global<R: ReadContext>(&self, ctx: &mut R) -> Vec<(Position, FactId)> {
        let (begin, end) = self.spaces.global.range();
        self.scan(ctx, &self.spaces.global, &begin, &end)
    }

    /// Fact ids appended in `[start, end)` by creation time.
    pub fn scan_time_range<R: ReadContext>(
        &self,
        ctx: &mut R,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> Vec<FactId> {
        let begin = keys::time_index_bound(&self.spaces, start);
        let until = keys::time_index_bound(&self.spaces, end);
        ctx.get_range(&begin, &until)
            .into_iter()
            .filter_map(|(key, _)| keys::decode_time_entry(&self.spaces.time, &key))
            .collect()
    }

    fn scan<R: ReadContext>(
        &self,
        ctx: &mut R,
        space: &factstore_substrate::Subspace,
        begin: &[u8],
        end: &[u8],
    ) -> Vec<(Position, FactId)> {
        ctx.get_range(begin, end)
            .into_iter()
            .filter_map(|(key, _)| keys::decode_index_entry(space, &key))
            .collect()
    }
}
