//! Construction-time settings for mapped stores.

use serde::{Deserialize, Serialize};

use crate::identity::IdentityStrategy;

/// Number of records fetched per backend round trip when enumerating a store.
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// Settings fixed for the lifetime of a [`MappedStore`](crate::map::MappedStore).
///
/// Every field has a default, so a partial configuration deserializes cleanly:
///
/// ```ignore
/// let config: MappedStoreConfig = serde_json::from_str(r#"{ "strategy": "stable_hash" }"#)?;
/// assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappedStoreConfig {
    /// How keys are turned into identifiers.
    pub strategy: IdentityStrategy,
    /// Records fetched per page by `values`, `keys` and `entries`. Zero is treated as one.
    pub page_size: usize,
}

impl Default for MappedStoreConfig {
    fn default() -> Self {
        Self {
            strategy: IdentityStrategy::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: MappedStoreConfig =
            serde_json::from_str(r#"{ "strategy": "stable_hash" }"#).unwrap();

        assert_eq!(config.strategy, IdentityStrategy::StableHash);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn empty_config_is_default() {
        let config: MappedStoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MappedStoreConfig::default());
        assert_eq!(config.strategy, IdentityStrategy::CanonicalSerialize);
    }
}
