//! Dictionary-like access to a document collection.
//!
//! [`MappedStore`] treats one collection as a map from an arbitrary serializable key type
//! to an arbitrary serializable value type. Each entry is stored as a
//! [`Record`](crate::record::Record) under an identifier derived from its key by a
//! [`KeyIdentity`] that is fixed when the store is built.
//!
//! # Example
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryStore};
//! use futures::TryStreamExt;
//!
//! let backend = InMemoryStore::new();
//! let scores = MappedStore::<_, String, u32>::builder(&backend, "scores")
//!     .build()
//!     .await?;
//!
//! scores.store_or_update(&"alice".to_string(), &10).await?;
//! assert_eq!(scores.get(&"alice".to_string()).await?, Some(10));
//! assert_eq!(scores.count(), 1);
//!
//! let all: Vec<u32> = scores.values().try_collect().await?;
//! ```
//!
//! # Count
//!
//! The element count is cached and read in O(1). It is adjusted from what the backend
//! reports for each write (insert vs replace, documents actually deleted), so concurrent
//! callers going through the same store cannot make it drift. Writes that bypass the store
//! can; use [`MappedStore::recount`] or [`MappedStore::verify_count`] when that matters.

use futures::{Stream, TryStreamExt, stream};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    borrow::Borrow,
    collections::{BTreeSet, VecDeque},
    hash::Hash,
    marker::PhantomData,
    sync::atomic::{AtomicUsize, Ordering},
};
use tracing::{debug, warn};

use crate::{
    backend::{StoreBackend, UpsertOutcome},
    collection::Collection,
    config::MappedStoreConfig,
    error::{StoreError, StoreResult},
    identity::{IdentityStrategy, KeyIdentity},
    query::{Filter, Query},
    record::{IDENTIFIER_FIELD, Record},
};

/// Per-outcome tally of a successful [`MappedStore::store_batch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub inserted: usize,
    pub replaced: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.inserted + self.replaced
    }
}

/// A typed key/value view over one backend collection.
///
/// # Type Parameters
///
/// * `B` - The storage backend (use `&B` to share a backend between stores)
/// * `K` - The key type; must serialize and hash deterministically
/// * `V` - The value type
#[derive(Debug)]
pub struct MappedStore<B: StoreBackend, K, V> {
    collection: Collection<B>,
    identity: KeyIdentity,
    page_size: usize,
    count: AtomicUsize,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<B: StoreBackend, K, V> MappedStore<B, K, V> {
    /// Starts building a store over the collection `name` of `backend`.
    pub fn builder(backend: B, name: impl Into<String>) -> MappedStoreBuilder<B, K, V> {
        MappedStoreBuilder::new(backend, name)
    }

    async fn open(collection: Collection<B>, config: MappedStoreConfig) -> StoreResult<Self> {
        let count = collection.count().await?;

        debug!(
            collection = collection.name(),
            strategy = ?config.strategy,
            count,
            "opened mapped store"
        );

        Ok(Self {
            collection,
            identity: KeyIdentity::new(config.strategy),
            page_size: config.page_size.max(1),
            count: AtomicUsize::new(count),
            _marker: PhantomData,
        })
    }

    /// Returns the name of the underlying collection.
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    pub fn strategy(&self) -> IdentityStrategy {
        self.identity.strategy()
    }

    pub fn collection(&self) -> &Collection<B> {
        &self.collection
    }

    /// Number of records in the collection, as tracked by this store.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Reloads the cached count from the backend and returns it.
    pub async fn recount(&self) -> StoreResult<usize> {
        let actual = self.collection.count().await?;
        let cached = self.count.swap(actual, Ordering::AcqRel);

        debug!(collection = self.name(), cached, actual, "recounted mapped store");

        Ok(actual)
    }

    /// Checks the cached count against the backend without correcting it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvariantViolation`] if the two disagree.
    pub async fn verify_count(&self) -> StoreResult<()> {
        let actual = self.collection.count().await?;
        let cached = self.count();

        if cached != actual {
            warn!(collection = self.name(), cached, actual, "cached count out of sync");
            return Err(StoreError::InvariantViolation { cached, actual });
        }

        Ok(())
    }

    /// Drops every record and resets the count to zero.
    pub async fn clear(&self) -> StoreResult<()> {
        self.collection.drop_collection().await?;
        self.count.store(0, Ordering::Release);

        debug!(collection = self.name(), "cleared mapped store");

        Ok(())
    }

    fn record_removed(&self, removed: usize) {
        if removed == 0 {
            return;
        }

        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                Some(count.saturating_sub(removed))
            })
            .unwrap_or_else(|count| count);

        if previous < removed {
            warn!(
                collection = self.name(),
                cached = previous,
                removed,
                "removed more records than were counted"
            );
        }
    }
}

impl<B, K, V> MappedStore<B, K, V>
where
    B: StoreBackend,
    K: Serialize + DeserializeOwned + Hash,
    V: Serialize + DeserializeOwned,
{
    /// Returns the identifier `key` is stored under.
    pub fn identifier(&self, key: &K) -> StoreResult<String> {
        self.identity.encode(key)
    }

    /// Returns the value stored for `key`, or `None` if there is none.
    pub async fn get(&self, key: &K) -> StoreResult<Option<V>> {
        Ok(self.get_record(key).await?.map(Record::into_value))
    }

    /// Returns the full stored record for `key`, including the key as it was written.
    pub async fn get_record(&self, key: &K) -> StoreResult<Option<Record<K, V>>> {
        let id = self.identity.encode(key)?;

        self.collection
            .get_one(id)
            .await?
            .map(Record::from_bson)
            .transpose()
    }

    /// Same lookup as [`get`](Self::get), without decoding the record.
    pub async fn contains(&self, key: &K) -> StoreResult<bool> {
        let id = self.identity.encode(key)?;

        Ok(self.collection.get_one(id).await?.is_some())
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// The count grows only when the backend reports a new insert.
    pub async fn store_or_update(&self, key: &K, value: &V) -> StoreResult<UpsertOutcome> {
        let id = self.identity.encode(key)?;
        let document = Record::new(id.clone(), key, value).to_bson()?;
        let outcome = self.collection.upsert(id, document).await?;

        if outcome.is_insert() {
            self.count.fetch_add(1, Ordering::AcqRel);
        }

        Ok(outcome)
    }

    /// Shorthand for [`store_or_update`](Self::store_or_update) that discards the outcome.
    pub async fn set(&self, key: &K, value: &V) -> StoreResult<()> {
        self.store_or_update(key, value).await.map(|_| ())
    }

    /// Removes the record for `key`. Returns whether one was present.
    pub async fn remove(&self, key: &K) -> StoreResult<bool> {
        let id = self.identity.encode(key)?;
        let removed = self.collection.delete(vec![id]).await?;
        self.record_removed(removed);

        Ok(removed > 0)
    }

    /// Removes the records of all `keys` in one backend call.
    ///
    /// Duplicate keys count once. Returns the number of records actually removed, which
    /// is also what the count is reduced by.
    pub async fn remove_batch<'k, I>(&self, keys: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = &'k K>,
        K: 'k,
    {
        let ids = keys
            .into_iter()
            .map(|key| self.identity.encode(key))
            .collect::<StoreResult<BTreeSet<String>>>()?;

        let removed = self.collection.delete(ids.into_iter().collect()).await?;
        self.record_removed(removed);

        Ok(removed)
    }

    /// Stores every pair, one write each.
    ///
    /// A failing pair does not stop the others. When any pair fails the successful writes
    /// stay applied and counted, and [`StoreError::Batch`] is returned carrying the first
    /// failure.
    pub async fn store_batch<I, Q, W>(&self, pairs: I) -> StoreResult<BatchReport>
    where
        I: IntoIterator<Item = (Q, W)>,
        Q: Borrow<K>,
        W: Borrow<V>,
    {
        let mut report = BatchReport::default();
        let mut failed = 0;
        let mut first = None;

        for (key, value) in pairs {
            match self.store_or_update(key.borrow(), value.borrow()).await {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Replaced) => report.replaced += 1,
                Err(err) => {
                    warn!(collection = self.name(), error = %err, "batch write failed");
                    failed += 1;
                    first.get_or_insert(err);
                }
            }
        }

        match first {
            None => Ok(report),
            Some(first) => Err(StoreError::Batch {
                failed,
                attempted: report.total() + failed,
                first: Box::new(first),
            }),
        }
    }

    /// Lazily enumerates every record in the collection.
    ///
    /// Records are fetched `page_size` at a time in identifier order. Each call starts a
    /// fresh scan. Records written or removed while a scan is running may or may not be
    /// seen, but no record is yielded twice.
    pub fn records(&self) -> impl Stream<Item = StoreResult<Record<K, V>>> + '_ {
        stream::try_unfold(Scan::default(), move |scan| self.advance(scan))
    }

    /// Lazily enumerates every value. See [`records`](Self::records).
    pub fn values(&self) -> impl Stream<Item = StoreResult<V>> + '_ {
        self.records().map_ok(Record::into_value)
    }

    /// Lazily enumerates every key. See [`records`](Self::records).
    pub fn keys(&self) -> impl Stream<Item = StoreResult<K>> + '_ {
        self.records().map_ok(|record| record.key)
    }

    /// Lazily enumerates every key/value pair. See [`records`](Self::records).
    pub fn entries(&self) -> impl Stream<Item = StoreResult<(K, V)>> + '_ {
        self.records().map_ok(Record::into_key_value)
    }

    async fn advance(&self, mut scan: Scan) -> StoreResult<Option<(Record<K, V>, Scan)>> {
        loop {
            if let Some(document) = scan.buffer.pop_front() {
                let record = Record::<K, V>::from_bson(document)?;
                scan.after = Some(record.identifier.clone());
                return Ok(Some((record, scan)));
            }

            if scan.exhausted {
                return Ok(None);
            }

            let mut query = Query::builder()
                .sort_by(IDENTIFIER_FIELD)
                .limit(self.page_size);
            if let Some(after) = &scan.after {
                query = query.filter(Filter::gt(IDENTIFIER_FIELD, after.as_str()));
            }

            let page = self.collection.query(query.build()).await?;
            scan.exhausted = page.len() < self.page_size;
            scan.buffer.extend(page);
        }
    }
}

/// Keyset cursor over a collection: resume after the last identifier seen.
#[derive(Default)]
struct Scan {
    after: Option<String>,
    buffer: VecDeque<bson::Bson>,
    exhausted: bool,
}

/// Builder for [`MappedStore`].
///
/// ```ignore
/// let store = MappedStore::<_, (String, u32), Vec<u8>>::builder(&backend, "blobs")
///     .with_strategy(IdentityStrategy::StableHash)
///     .with_page_size(64)
///     .build()
///     .await?;
/// ```
pub struct MappedStoreBuilder<B: StoreBackend, K, V> {
    backend: B,
    name: String,
    config: MappedStoreConfig,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<B: StoreBackend, K, V> MappedStoreBuilder<B, K, V> {
    pub fn new(backend: B, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: name.into(),
            config: MappedStoreConfig::default(),
            _marker: PhantomData,
        }
    }

    /// Replaces every setting with `config`.
    pub fn with_config(mut self, config: MappedStoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_strategy(mut self, strategy: IdentityStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Opens the store, loading the initial count from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend cannot be reached.
    pub async fn build(self) -> StoreResult<MappedStore<B, K, V>> {
        MappedStore::open(Collection::new(self.name, self.backend), self.config).await
    }
}
