//! Typed key-value mapping over JSON document stores.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Key identity** ([`identity`]) - Stable identifiers for arbitrary serializable keys
//! - **Records** ([`record`]) - The persisted `{Identifier, Key, Value}` layout
//! - **Mapped stores** ([`map`]) - Dictionary-like access to one collection
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Query and filtering API** ([`query`]) - Predicates backends execute on our behalf
//! - **Collections** ([`collection`]) - A backend bound to one collection name
//! - **Document store** ([`store`]) - A backend shared by several mapped stores
//! - **Configuration** ([`config`]) - Settings fixed when a mapped store is built
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let letters = store
//!     .mapped_store::<String, u32>("letters")
//!     .with_strategy(IdentityStrategy::CanonicalSerialize)
//!     .build()
//!     .await?;
//!
//! letters.store_or_update(&"a".to_string(), &1).await?;
//! assert_eq!(letters.get(&"a".to_string()).await?, Some(1));
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmap_core;

pub mod backend;
pub mod collection;
pub mod config;
pub mod error;
pub mod identity;
pub mod map;
pub mod query;
pub mod record;
pub mod store;
