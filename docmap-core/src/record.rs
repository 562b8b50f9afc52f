//! The persisted shape of one key/value mapping.
//!
//! A record is the document actually written to the backend. Its layout is fixed:
//!
//! ```text
//! { "Identifier": <string>, "Key": <K>, "Value": <V> }
//! ```
//!
//! `Identifier` is derived from `Key` by [`KeyIdentity`](crate::identity::KeyIdentity) and
//! is the only field ever used as a lookup predicate. `Key` is kept verbatim for
//! introspection.

use bson::{Bson, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{StoreError, StoreResult};

/// Name of the identifier field in a stored record.
pub const IDENTIFIER_FIELD: &str = "Identifier";

/// A single stored `{Identifier, Key, Value}` triple.
///
/// Records are built on every write and rebuilt on every read; nothing holds on to them
/// between calls. Writes serialize a borrowed `Record<&K, &V>` so callers keep ownership of
/// their keys and values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record<K, V> {
    pub identifier: String,
    pub key: K,
    pub value: V,
}

impl<K, V> Record<K, V> {
    pub fn new(identifier: String, key: K, value: V) -> Self {
        Self { identifier, key, value }
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn into_key_value(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: Serialize, V: Serialize> Record<K, V> {
    /// Converts this record to a BSON document for storage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the key or value cannot be represented in
    /// BSON, or [`StoreError::InvalidDocument`] if the result is not a document.
    pub fn to_bson(&self) -> StoreResult<Bson> {
        match serialize_to_bson(self)? {
            doc @ Bson::Document(_) => Ok(doc),
            other => Err(StoreError::InvalidDocument(format!(
                "record serialized to {:?} instead of a document",
                other.element_type()
            ))),
        }
    }
}

impl<K: DeserializeOwned, V: DeserializeOwned> Record<K, V> {
    /// Rebuilds a record from a stored BSON document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the document does not match the record
    /// layout or the key/value types.
    pub fn from_bson(bson: Bson) -> StoreResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }
}
