//! Convenient re-exports of commonly used types from docmap.
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```

pub use docmap_core::{
    backend::{StoreBackend, StoreBackendBuilder, UpsertOutcome},
    collection::Collection,
    config::MappedStoreConfig,
    error::{StoreError, StoreResult},
    identity::{IdentityStrategy, KeyIdentity},
    map::{BatchReport, MappedStore, MappedStoreBuilder},
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor},
    record::Record,
    store::DocumentStore,
};
