//! Handle to one named collection of a backend.
//!
//! A [`Collection`] pairs a backend with a collection name so callers don't have to thread
//! the name through every call. It works on raw BSON documents; typed access is layered on
//! top by [`MappedStore`](crate::map::MappedStore).
//!
//! # Example
//!
//! ```ignore
//! use docmap::collection::Collection;
//! use docmap::memory::InMemoryStore;
//!
//! let numbers = Collection::new("numbers", InMemoryStore::new());
//! numbers.upsert("\"a\"".into(), bson::bson!({ "Identifier": "\"a\"" })).await?;
//! assert_eq!(numbers.count().await?, 1);
//! ```

use bson::Bson;

use crate::{
    backend::{StoreBackend, UpsertOutcome},
    error::StoreResult,
    query::Query,
};

/// A named collection bound to a storage backend.
///
/// The backend is held by value; pass `&backend` to share one backend between several
/// collections.
#[derive(Debug)]
pub struct Collection<B: StoreBackend> {
    name: String,
    backend: B,
}

impl<B: StoreBackend> Collection<B> {
    pub fn new(name: impl Into<String>, backend: B) -> Self {
        Self { name: name.into(), backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Inserts or replaces the document stored under `id`.
    pub async fn upsert(&self, id: String, document: Bson) -> StoreResult<UpsertOutcome> {
        self.backend
            .upsert_document(id, document, &self.name)
            .await
    }

    /// Deletes the documents with the given ids, returning how many were removed.
    pub async fn delete(&self, ids: Vec<String>) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.backend
            .delete_documents(ids, &self.name)
            .await
    }

    /// Retrieves documents by id; ids that are not present are omitted.
    pub async fn get(&self, ids: Vec<String>) -> StoreResult<Vec<Bson>> {
        self.backend
            .get_documents(ids, &self.name)
            .await
    }

    /// Retrieves the document stored under `id`, if any.
    pub async fn get_one(&self, id: String) -> StoreResult<Option<Bson>> {
        Ok(self.get(vec![id]).await?.into_iter().next())
    }

    /// Queries documents in the collection using a structured query.
    pub async fn query(&self, query: Query) -> StoreResult<Vec<Bson>> {
        self.backend
            .query_documents(query, &self.name)
            .await
    }

    /// Counts the documents currently stored in the collection.
    pub async fn count(&self) -> StoreResult<usize> {
        self.backend.count_documents(&self.name).await
    }

    /// Removes the collection and all of its documents.
    pub async fn drop_collection(&self) -> StoreResult<()> {
        self.backend.drop_collection(&self.name).await
    }
}
