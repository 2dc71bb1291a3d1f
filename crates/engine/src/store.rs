//! The `FactStore` facade.
//!
//! Wires the substrate, record store, index set, appender, finder and
//! streamer together over one shared keyspace. The store is cheap to
//! clone and safe to share across threads; all state lives behind the
//! substrate's lock.

use crate::append::Appender;
use crate::index::IndexSet;
use crate::keys::StoreSpaces;
use crate::query::Finder;
use crate::record::{RecordStore, StoredFact};
use crate::stream::{FactStream, Streamer};
use chrono::{DateTime, Utc};
use factstore_core::error::SubstrateError;
use factstore_core::{
    AppendCondition, Fact, FactId, FactStoreResult, IdempotencyKey, Position, SubjectRef, TagQuery,
};
use factstore_substrate::{Database, DatabaseConfig};
use std::sync::Arc;
use tracing::info;

/// Store construction knobs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store name; namespaces the keyspace so several stores can share a
    /// substrate without colliding.
    pub name: String,
    /// Bound on optimistic-transaction retries per append.
    pub max_transaction_retries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: "fact-store".into(),
            max_transaction_retries: 8,
        }
    }
}

/// An append-only fact store over an in-memory transactional keyspace.
#[derive(Debug, Clone)]
pub struct FactStore {
    db: Arc<Database>,
    spaces: Arc<StoreSpaces>,
    appender: Appender,
    finder: Finder,
    streamer: Streamer,
}

impl FactStore {
    /// Open a store with default configuration on a fresh substrate.
    pub fn in_memory() -> Self {
        Self::open(StoreConfig::default())
    }

    /// Open a store with explicit configuration on a fresh substrate.
    pub fn open(config: StoreConfig) -> Self {
        let db = Arc::new(Database::with_config(DatabaseConfig {
            max_transaction_retries: config.max_transaction_retries,
        }));
        Self::on_database(db, &config.name)
    }

    /// Open a named store on a shared substrate.
    pub fn on_database(db: Arc<Database>, name: &str) -> Self {
        let spaces = Arc::new(StoreSpaces::open(name));
        let records = RecordStore::new(spaces.clone());
        let indexes = IndexSet::new(spaces.clone());
        info!(store = name, "opening fact store");
        FactStore {
            appender: Appender::new(db.clone(), records.clone(), indexes.clone()),
            finder: Finder::new(db.clone(), records.clone(), indexes.clone()),
            streamer: Streamer::new(db.clone(), records, indexes),
            db,
            spaces,
        }
    }

    // -------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------

    /// Append a batch atomically under `condition`; returns the position
    /// of the batch's last fact.
    pub fn append(&self, facts: &[Fact], condition: &AppendCondition) -> FactStoreResult<Position> {
        self.appender.append(facts, condition)
    }

    /// [`FactStore::append`] carrying an idempotency key for logging.
    pub fn append_with_key(
        &self,
        facts: &[Fact],
        condition: &AppendCondition,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> FactStoreResult<Position> {
        self.appender.append_with_key(facts, condition, idempotency_key)
    }

    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    /// Load a fact and its position by id.
    pub fn find_by_id(&self, id: &FactId) -> FactStoreResult<Option<StoredFact>> {
        self.finder.find_by_id(id)
    }

    /// Whether a fact with `id` exists.
    pub fn exists_by_id(&self, id: &FactId) -> bool {
        self.finder.exists_by_id(id)
    }

    /// Every fact for `subject`, in position order.
    pub fn find_by_subject(&self, subject: &SubjectRef) -> FactStoreResult<Vec<Fact>> {
        self.finder.find_by_subject(subject)
    }

    /// Id of the most recent fact for `subject`; the expectation input
    /// for optimistic-lock appends.
    pub fn last_fact_id(&self, subject: &SubjectRef) -> Option<FactId> {
        self.finder.last_fact_id(subject)
    }

    /// Every fact matching `query`, sorted by position.
    pub fn find_by_tag_query(&self, query: &TagQuery) -> FactStoreResult<Vec<Fact>> {
        self.finder.find_by_tag_query(query)
    }

    /// Every fact carrying any of the tag pairs, sorted by position.
    pub fn find_by_tags(&self, tags: &[(String, String)]) -> FactStoreResult<Vec<Fact>> {
        self.finder.find_by_tags(tags)
    }

    /// Every fact appended in `[start, end)` by creation time.
    pub fn find_in_time_range(
        &self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> FactStoreResult<Vec<Fact>> {
        self.finder.find_in_time_range(start, end)
    }

    // -------------------------------------------------------------------
    // Streaming
    // -------------------------------------------------------------------

    /// Replay every fact in commit order.
    pub fn stream_all(&self) -> FactStream {
        self.streamer.stream_all()
    }

    /// Replay facts with position strictly greater than `after`.
    pub fn stream_after(&self, after: Position) -> FactStream {
        self.streamer.stream_after(after)
    }

    // -------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------

    /// Delete everything in this store's keyspace, in one transaction.
    ///
    /// Other stores sharing the substrate are untouched. Test and tooling
    /// affordance; production data is append-only.
    pub fn reset(&self) -> FactStoreResult<()> {
        self.db
            .transact(|txn| -> Result<(), SubstrateError> {
                for space in self.spaces.all() {
                    let (begin, end) = space.range();
                    txn.clear_range(begin, end);
                }
                Ok(())
            })
            .map_err(factstore_core::FactStoreError::from)?;
        info!("store reset");
        Ok(())
    }

    /// The underlying substrate, for sharing with other stores.
    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}
