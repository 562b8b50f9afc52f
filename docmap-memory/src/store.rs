//! In-memory storage implementation for mapped stores.
//!
//! Documents live in ordered maps keyed by document id, behind an async-aware read-write
//! lock, so unfiltered scans come back in id order.

use std::{collections::{BTreeMap, HashMap}, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::Bson;
use tracing::trace;

use docmap_core::{
    query::Query,
    error::StoreResult,
    backend::{StoreBackend, StoreBackendBuilder, UpsertOutcome},
};

use crate::evaluator::{DocumentEvaluator, Comparable};

type CollectionMap = BTreeMap<String, Bson>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data. Every operation holds the lock for its whole
/// duration, so an upsert's insert-vs-replace report is exact.
///
/// # Performance
///
/// Id lookups are logarithmic; filtered queries scan the whole collection.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryStore;
/// use docmap::backend::{StoreBackend, UpsertOutcome};
/// use bson::{Bson, doc};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     let doc = Bson::Document(doc! { "Identifier": "\"a\"", "Value": 1 });
///     let outcome = store.upsert_document("\"a\"".into(), doc, "letters").await?;
///     assert_eq!(outcome, UpsertOutcome::Inserted);
///     assert_eq!(store.count_documents("letters").await?, 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (document_id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn sort_key<'a>(document: &'a Bson, field: &str) -> Comparable<'a> {
    document
        .as_document()
        .and_then(|doc| doc.get(field))
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn upsert_document(&self, id: String, document: Bson, collection: &str) -> StoreResult<UpsertOutcome> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        let outcome = match collection_map.insert(id, document) {
            Some(_) => UpsertOutcome::Replaced,
            None => UpsertOutcome::Inserted,
        };

        trace!(collection, ?outcome, "upserted document");

        Ok(outcome)
    }

    async fn delete_documents(&self, ids: Vec<String>, collection: &str) -> StoreResult<usize> {
        let mut store = self.store.write().await;
        let Some(collection_map) = store.get_mut(collection) else {
            return Ok(0);
        };

        let removed = ids
            .iter()
            .filter(|id| collection_map.remove(id.as_str()).is_some())
            .count();

        trace!(collection, requested = ids.len(), removed, "deleted documents");

        Ok(removed)
    }

    async fn get_documents(&self, ids: Vec<String>, collection: &str) -> StoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        Ok(
            ids.iter()
                .filter_map(|id| collection_map.get(id).cloned())
                .collect()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> StoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut documents = match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(collection_map.values(), filter)?,
            None => collection_map.values().cloned().collect(),
        };

        if let Some(field) = &query.sort {
            documents.sort_by(|a, b| sort_key(a, field).sort_cmp(&sort_key(b, field)));
        }
        if let Some(limit) = query.limit {
            documents.truncate(limit);
        }

        Ok(documents)
    }

    async fn count_documents(&self, collection: &str) -> StoreResult<usize> {
        Ok(
            self.store
                .read()
                .await
                .get(collection)
                .map_or(0, BTreeMap::len)
        )
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        if self.store.write().await.remove(name).is_some() {
            trace!(collection = name, "dropped collection");
        }

        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let mut names = self.store
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryStore;
/// use docmap::backend::StoreBackendBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder().build().await.unwrap();
/// }
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
