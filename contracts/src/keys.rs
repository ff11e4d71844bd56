//! # Key Scheme
//!
//! Assets and history records share one flat, ordered keyspace:
//!
//! | Record   | Key                                  |
//! |----------|--------------------------------------|
//! | Asset    | `id`                                 |
//! | History  | `HISTORY_` + `assetId` + `_` + `txId` |
//!
//! Classification is a byte-prefix test on the raw key. Asset ids may not
//! start with the prefix, which keeps the two namespaces disjoint; history
//! keys from different invocations differ by `txId`.

use crate::error::{AssetError, AssetResult};

/// Reserved prefix marking history keys.
pub const HISTORY_PREFIX: &str = "HISTORY_";

/// Separator between `assetId` and `txId` in a history key.
pub const HISTORY_SEPARATOR: &str = "_";

/// Which record kind a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Asset,
    History,
}

impl KeyKind {
    /// Classify a raw key. Keys shorter than the prefix are asset keys.
    pub fn classify(key: &str) -> Self {
        if is_history_key(key) {
            KeyKind::History
        } else {
            KeyKind::Asset
        }
    }
}

pub fn is_history_key(key: &str) -> bool {
    key.as_bytes().starts_with(HISTORY_PREFIX.as_bytes())
}

/// Reject ids that cannot be used as asset keys.
pub fn validate_asset_id(id: &str) -> AssetResult<()> {
    if id.is_empty() {
        return Err(AssetError::InvalidAssetId {
            id: id.to_string(),
            reason: "id must not be empty",
        });
    }
    if is_history_key(id) {
        return Err(AssetError::InvalidAssetId {
            id: id.to_string(),
            reason: "id must not start with the reserved HISTORY_ prefix",
        });
    }
    Ok(())
}

/// World-state key of an asset: the id itself, once validated.
pub fn asset_key(id: &str) -> AssetResult<&str> {
    validate_asset_id(id)?;
    Ok(id)
}

/// World-state key of the history record written by `tx_id` for `asset_id`.
pub fn history_key(asset_id: &str, tx_id: &str) -> String {
    let mut key =
        String::with_capacity(HISTORY_PREFIX.len() + asset_id.len() + 1 + tx_id.len());
    key.push_str(HISTORY_PREFIX);
    key.push_str(asset_id);
    key.push_str(HISTORY_SEPARATOR);
    key.push_str(tx_id);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_key_is_the_id() {
        assert_eq!(asset_key("asset1").unwrap(), "asset1");
    }

    #[test]
    fn history_key_layout() {
        assert_eq!(history_key("asset1", "abc123"), "HISTORY_asset1_abc123");
    }

    #[test]
    fn classification_by_prefix() {
        assert_eq!(KeyKind::classify("asset1"), KeyKind::Asset);
        assert_eq!(KeyKind::classify("HISTORY_asset1_tx"), KeyKind::History);
        assert_eq!(KeyKind::classify("HISTORY_"), KeyKind::History);
        // Shorter than the prefix, and case matters.
        assert_eq!(KeyKind::classify("HIST"), KeyKind::Asset);
        assert_eq!(KeyKind::classify("history_asset1_tx"), KeyKind::Asset);
        assert_eq!(KeyKind::classify(""), KeyKind::Asset);
    }

    #[test]
    fn reserved_and_empty_ids_rejected() {
        assert!(matches!(
            validate_asset_id(""),
            Err(AssetError::InvalidAssetId { .. })
        ));
        assert!(matches!(
            asset_key("HISTORY_asset1_tx"),
            Err(AssetError::InvalidAssetId { .. })
        ));
        assert!(validate_asset_id("HISTORY").is_ok());
    }

    #[test]
    fn history_keys_never_classify_as_assets() {
        for (asset, tx) in [("asset1", "t1"), ("", ""), ("a_b", "c_d")] {
            assert_eq!(KeyKind::classify(&history_key(asset, tx)), KeyKind::History);
        }
    }
}
