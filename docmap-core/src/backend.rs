//! Storage backend abstraction for mapped stores.
//!
//! A backend is the document store underneath a mapped collection. It only ever sees
//! string document ids and BSON documents; key identity, record layout and the cached
//! count all live above it, in [`MappedStore`](crate::map::MappedStore).
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use docmap::backend::{StoreBackend, UpsertOutcome};
//! use bson::{Bson, doc};
//!
//! let backend = MyBackendImpl::new();
//!
//! let doc = Bson::Document(doc! { "Identifier": "\"a\"", "Key": "a", "Value": 1 });
//! let outcome = backend.upsert_document("\"a\"".into(), doc, "numbers").await?;
//! assert_eq!(outcome, UpsertOutcome::Inserted);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Bson;
use std::fmt::Debug;

use crate::{error::StoreResult, query::Query};

/// What an upsert did to the collection.
///
/// Backends must decide this within the same atomic step as the write itself, so that
/// callers can keep an exact element count without a separate existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No document with the id existed; one was added.
    Inserted,
    /// A document with the id existed and was replaced.
    Replaced,
}

impl UpsertOutcome {
    pub fn is_insert(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted)
    }
}

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks. Each individual method must be atomic with respect to the documents it
/// touches; nothing spanning several calls is guaranteed.
///
/// # Error Handling
///
/// Driver and I/O failures are reported as
/// [`StoreError::Unavailable`](crate::error::StoreError::Unavailable). Missing documents are
/// never errors.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts `document` under `id`, replacing any document already stored under that id.
    ///
    /// The collection is created if it doesn't exist.
    async fn upsert_document(
        &self,
        id: String,
        document: Bson,
        collection: &str,
    ) -> StoreResult<UpsertOutcome>;

    /// Deletes every document whose id is in `ids`.
    ///
    /// Ids that are not present, and a collection that does not exist, are skipped.
    ///
    /// # Returns
    ///
    /// The number of documents actually removed.
    async fn delete_documents(&self, ids: Vec<String>, collection: &str) -> StoreResult<usize>;

    /// Retrieves documents by id. Ids that are not present are omitted from the result.
    async fn get_documents(&self, ids: Vec<String>, collection: &str) -> StoreResult<Vec<Bson>>;

    /// Returns the documents of a collection matching `query`.
    ///
    /// The filter is applied before the sort, the sort before the limit. A missing
    /// collection yields no documents.
    async fn query_documents(&self, query: Query, collection: &str) -> StoreResult<Vec<Bson>>;

    /// Counts the documents currently stored in a collection (0 if it doesn't exist).
    async fn count_documents(&self, collection: &str) -> StoreResult<usize>;

    /// Creates an empty collection. Creating an existing collection is a no-op.
    async fn create_collection(&self, name: &str) -> StoreResult<()>;

    /// Drops a collection and every document in it.
    ///
    /// Dropping a collection that doesn't exist is a no-op.
    async fn drop_collection(&self, name: &str) -> StoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> StoreResult<Vec<String>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> StoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn upsert_document(
        &self,
        id: String,
        document: Bson,
        collection: &str,
    ) -> StoreResult<UpsertOutcome> {
        (*self).upsert_document(id, document, collection).await
    }

    async fn delete_documents(&self, ids: Vec<String>, collection: &str) -> StoreResult<usize> {
        (*self).delete_documents(ids, collection).await
    }

    async fn get_documents(&self, ids: Vec<String>, collection: &str) -> StoreResult<Vec<Bson>> {
        (*self).get_documents(ids, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> StoreResult<Vec<Bson>> {
        (*self).query_documents(query, collection).await
    }

    async fn count_documents(&self, collection: &str) -> StoreResult<usize> {
        (*self).count_documents(collection).await
    }

    async fn create_collection(&self, name: &str) -> StoreResult<()> {
        (*self).create_collection(name).await
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        (*self).drop_collection(name).await
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        (*self).list_collections().await
    }
}

/// Factory trait for backends that need asynchronous setup (connecting, opening files).
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
