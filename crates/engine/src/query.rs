//! Query resolution and materialization.
//!
//! Resolution turns a [`TagQuery`] into a set of `(fact id, position)`
//! pairs using only index scans; materialization then loads the records
//! and sorts them by position. The two halves are split so append
//! preconditions can reuse resolution inside a write transaction.
//!
//! Item semantics:
//!
//! - `TagOnly` unions the tag index across its tags (OR).
//! - `TagType` with both types and tags intersects the composite index
//!   per type (AND across tags) and unions across types (OR).
//! - `TagType` without tags unions the type index across its types.
//! - `TagType` without types unions the tag index across its tags, same
//!   as `TagOnly`.
//!
//! Items union into the final set. During materialization, ids whose
//! record has since vanished are dropped silently; a record that exists
//! but fails to decode is an error.

use crate::index::IndexSet;
use crate::record::{RecordStore, StoredFact};
use chrono::{DateTime, Utc};
use factstore_core::{Fact, FactId, FactStoreResult, Position, SubjectRef, TagQuery, TagQueryItem};
use factstore_substrate::{Database, ReadContext};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Resolve one query item into `(id, position)` pairs.
pub(crate) fn resolve_item<R: ReadContext>(
    indexes: &IndexSet,
    ctx: &mut R,
    item: &TagQueryItem,
) -> HashMap<FactId, Position> {
    match item {
        TagQueryItem::TagOnly { tags } => {
            let mut matched = HashMap::new();
            for tag in tags {
                for (position, id) in indexes.scan_tag(ctx, &tag.key, &tag.value) {
                    matched.insert(id, position);
                }
            }
            matched
        }
        TagQueryItem::TagType { types, tags } if tags.is_empty() => {
            let mut matched = HashMap::new();
            for fact_type in types {
                for (position, id) in indexes.scan_type(ctx, fact_type) {
                    matched.insert(id, position);
                }
            }
            matched
        }
        TagQueryItem::TagType { types, tags } if types.is_empty() => {
            // No type restriction: plain tag-index union, same as
            // `TagOnly`. The AND narrowing only applies under a type.
            let mut matched = HashMap::new();
            for tag in tags {
                for (position, id) in indexes.scan_tag(ctx, &tag.key, &tag.value) {
                    matched.insert(id, position);
                }
            }
            matched
        }
        TagQueryItem::TagType { types, tags } => {
            let mut matched = HashMap::new();
            for fact_type in types {
                let mut per_type: Option<HashMap<FactId, Position>> = None;
                for tag in tags {
                    let hits: HashMap<FactId, Position> = indexes
                        .scan_type_tag(ctx, fact_type, &tag.key, &tag.value)
                        .into_iter()
                        .map(|(position, id)| (id, position))
                        .collect();
                    per_type = Some(match per_type {
                        None => hits,
                        Some(mut acc) => {
                            acc.retain(|id, _| hits.contains_key(id));
                            acc
                        }
                    });
                    if per_type.as_ref().is_some_and(HashMap::is_empty) {
                        break;
                    }
                }
                matched.extend(per_type.unwrap_or_default());
            }
            matched
        }
    }
}

/// Resolve a whole query: the union of its items.
pub(crate) fn resolve_query<R: ReadContext>(
    indexes: &IndexSet,
    ctx: &mut R,
    query: &TagQuery,
) -> HashMap<FactId, Position> {
    let mut matched = HashMap::new();
    for item in query.items() {
        matched.extend(resolve_item(indexes, ctx, item));
    }
    matched
}

/// Read-side facade: lookups by id, subject, tag query, and time window.
///
/// Every method runs against a single snapshot view, so multi-key reads
/// are mutually consistent. Clone is cheap.
#[derive(Clone)]
pub struct Finder {
    db: Arc<Database>,
    records: RecordStore,
    indexes: IndexSet,
}

impl Finder {
    pub(crate) fn new(db: Arc<Database>, records: RecordStore, indexes: IndexSet) -> Self {
        Finder {
            db,
            records,
            indexes,
        }
    }

    /// Load a fact by id, with its position.
    pub fn find_by_id(&self, id: &FactId) -> FactStoreResult<Option<StoredFact>> {
        self.db.read(|view| self.records.load(view, id))
    }

    /// Whether a fact with `id` exists.
    pub fn exists_by_id(&self, id: &FactId) -> bool {
        self.db.read(|view| self.records.exists(view, id))
    }

    /// Every fact for `subject`, in position order.
    pub fn find_by_subject(&self, subject: &SubjectRef) -> FactStoreResult<Vec<Fact>> {
        self.db.read(|view| {
            let entries = self.indexes.scan_subject(view, subject);
            self.materialize_ordered(view, entries.into_iter().map(|(_, id)| id))
        })
    }

    /// Id of the most recent fact for `subject`.
    pub fn last_fact_id(&self, subject: &SubjectRef) -> Option<FactId> {
        self.db.read(|view| self.indexes.last_fact_id(view, subject))
    }

    /// Every fact matching `query`, sorted by position.
    pub fn find_by_tag_query(&self, query: &TagQuery) -> FactStoreResult<Vec<Fact>> {
        self.db.read(|view| {
            let matched = resolve_query(&self.indexes, view, query);
            debug!(items = query.items().len(), matched = matched.len(), "resolved tag query");

            let mut entries: Vec<(Position, FactId)> =
                matched.into_iter().map(|(id, position)| (position, id)).collect();
            entries.sort_unstable();
            self.materialize_ordered(view, entries.into_iter().map(|(_, id)| id))
        })
    }

    /// Every fact carrying any of the given `(key, value)` tag pairs,
    /// sorted by position.
    pub fn find_by_tags(&self, tags: &[(String, String)]) -> FactStoreResult<Vec<Fact>> {
        self.db.read(|view| {
            let mut matched: HashMap<FactId, Position> = HashMap::new();
            for (key, value) in tags {
                for (position, id) in self.indexes.scan_tag(view, key, value) {
                    matched.insert(id, position);
                }
            }
            let mut entries: Vec<(Position, FactId)> =
                matched.into_iter().map(|(id, position)| (position, id)).collect();
            entries.sort_unstable();
            self.materialize_ordered(view, entries.into_iter().map(|(_, id)| id))
        })
    }

    /// Every fact appended in `[start, end)` by creation time, in
    /// creation-time order.
    pub fn find_in_time_range(
        &self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> FactStoreResult<Vec<Fact>> {
        self.db.read(|view| {
            let ids = self.indexes.scan_time_range(view, start, end);
            self.materialize_ordered(view, ids.into_iter())
        })
    }

    /// Load each id in iteration order, dropping ids whose record is
    /// absent and propagating decode failures.
    fn materialize_ordered<R: ReadContext>(
        &self,
        ctx: &mut R,
        ids: impl Iterator<Item = FactId>,
    ) -> FactStoreResult<Vec<Fact>> {
        let mut facts = Vec::new();
        for id in ids {
            if let Some(stored) = self.records.load(ctx, &id)? {
                facts.push(stored.fact);
            }
        }
        Ok(facts)
    }
}

impl std::fmt::Debug for Finder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finder").finish_non_exhaustive()
    }
}
