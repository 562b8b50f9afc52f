//! Entry point tying a backend to any number of mapped collections.
//!
//! [`DocumentStore`] owns a backend and hands out [`MappedStore`] builders that borrow it,
//! so one connection serves every collection.
//!
//! # Example
//!
//! ```ignore
//! use docmap::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let sessions = store.mapped_store::<SessionId, Session>("sessions").build().await?;
//! let settings = store.mapped_store::<String, serde_json::Value>("settings").build().await?;
//! ```

use crate::{
    backend::StoreBackend,
    collection::Collection,
    error::StoreResult,
    map::{MappedStore, MappedStoreBuilder},
};

/// A document store bound to a specific backend implementation.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Starts building a mapped view over the collection `name`.
    pub fn mapped_store<K, V>(&self, name: &str) -> MappedStoreBuilder<&B, K, V> {
        MappedStore::builder(&self.backend, name)
    }

    /// Gets an untyped handle to the collection `name`.
    pub fn collection(&self, name: &str) -> Collection<&B> {
        Collection::new(name, &self.backend)
    }

    /// Creates an empty collection if it doesn't exist yet.
    pub async fn create_collection(&self, name: &str) -> StoreResult<()> {
        self.backend.create_collection(name).await
    }

    /// Drops a collection with the given name.
    ///
    /// Mapped stores open on that collection keep their cached count; call
    /// [`MappedStore::recount`] on them afterwards.
    pub async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> StoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> StoreResult<()> {
        self.backend.shutdown().await
    }
}
