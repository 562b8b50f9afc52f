//! Typed key-value maps persisted in document stores.
//!
//! This crate is the primary entry point for docmap. It re-exports the core types from
//! `docmap-core` and gives access to the available storage backends.
//!
//! # Features
//!
//! - **Any key, any value** - Keys and values only need to implement Serde's traits
//! - **Stable identities** - Keys are turned into identifiers by a canonical JSON encoding
//!   or a seeded 64-bit hash, chosen per store
//! - **O(1) count** - The element count is cached and kept exact across upserts and removals
//! - **Lazy enumeration** - Values, keys and entries are streamed page by page
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryStore};
//! use futures::TryStreamExt;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Hash, Serialize, Deserialize)]
//! struct Route {
//!     method: String,
//!     path: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StoreError> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!
//!     let hits = store
//!         .mapped_store::<Route, u64>("hits")
//!         .with_strategy(IdentityStrategy::StableHash)
//!         .build()
//!         .await?;
//!
//!     let route = Route { method: "GET".into(), path: "/".into() };
//!     hits.store_or_update(&route, &1).await?;
//!     hits.store_or_update(&route, &2).await?;
//!     assert_eq!(hits.count(), 1);
//!
//!     let all: Vec<u64> = hits.values().try_collect().await?;
//!     assert_eq!(all, vec![2]);
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docmap_core::{backend, collection, config, error, identity, map, query, record, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmap_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmap_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
