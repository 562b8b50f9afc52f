//! Field name escaping for MongoDB.
//!
//! MongoDB rejects or misreads document keys containing `.`, `$` or NUL. Record keys can be
//! arbitrary maps, so every key is percent-escaped on the way in and restored on the way
//! out. `%` itself is escaped first, which keeps the mapping reversible for any key.
//! String *values* are never touched: identifiers must reach the server byte for byte so
//! that range scans and equality lookups see the same text that was written.

use bson::{Bson, Document};


pub(crate) struct ValueSanitizer;

impl ValueSanitizer {
    // Order matters: `%` is escaped first and restored last.
    const REPLACEMENTS: [(&'static str, &'static str); 4] = [
        ("%", "%25"),
        (".", "%2E"),
        ("$", "%24"),
        ("\0", "%00"),
    ];

    /// Escapes the keys of every document nested in `value`.
    pub(crate) fn sanitize_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(values) => Bson::Array(values.iter().map(Self::sanitize_value).collect()),
            Bson::Document(doc) => Bson::Document(Self::sanitize_document(doc)),
            _ => value.clone(),
        }
    }

    pub(crate) fn sanitize_document(doc: &Document) -> Document {
        doc.iter()
            .map(|(k, v)| (Self::sanitize_string(k), Self::sanitize_value(v)))
            .collect()
    }

    pub(crate) fn sanitize_string(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .fold(input.to_string(), |acc, (target, replacement)| acc.replace(target, replacement))
    }

    /// Inverse of [`sanitize_value`](Self::sanitize_value).
    pub(crate) fn restore_value(value: &Bson) -> Bson {
        match value {
            Bson::Array(values) => Bson::Array(values.iter().map(Self::restore_value).collect()),
            Bson::Document(doc) => Bson::Document(Self::restore_document(doc)),
            _ => value.clone(),
        }
    }

    pub(crate) fn restore_document(doc: &Document) -> Document {
        doc.iter()
            .map(|(k, v)| (Self::restore_string(k), Self::restore_value(v)))
            .collect()
    }

    pub(crate) fn restore_string(input: &str) -> String {
        Self::REPLACEMENTS
            .iter()
            .rev()
            .fold(input.to_string(), |acc, (target, replacement)| acc.replace(replacement, target))
    }
}
