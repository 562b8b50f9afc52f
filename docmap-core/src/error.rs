//! Error types and result types for mapped store operations.
//!
//! Use [`StoreResult<T>`] as the return type for fallible operations. Lookups that
//! find nothing are not errors; they surface as `Ok(None)`.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a mapped store
/// or its underlying backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting a record to or from BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A key could not be turned into a stable identifier.
    #[error("Key encoding failed: {0}")]
    Encoding(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The underlying collection could not be reached or the driver reported an I/O failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// A stored document does not have the expected shape.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The backend cannot express the given query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// The cached element count no longer matches the backend.
    #[error("Count invariant violated: cached {cached}, backend reports {actual}")]
    InvariantViolation {
        cached: usize,
        actual: usize,
    },
    /// One or more writes of a batch failed. The remaining writes were applied.
    #[error("{failed} of {attempted} batch writes failed, first error: {first}")]
    Batch {
        failed: usize,
        attempted: usize,
        first: Box<StoreError>,
    },
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
