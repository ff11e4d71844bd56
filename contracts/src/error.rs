//! Failure kinds surfaced by the contract operations.

use asset_ledger_protocol::StateError;
use thiserror::Error;

/// Errors returned by registry, history, and query operations.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Create targeted an id that is already live.
    #[error("the asset {0} already exists")]
    AlreadyExists(String),

    /// Read, update, delete, or transfer targeted a missing id.
    #[error("the asset {0} does not exist")]
    NotFound(String),

    /// The id is empty or collides with the reserved history namespace.
    #[error("invalid asset id {id:?}: {reason}")]
    InvalidAssetId {
        /// The rejected id.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The world state failed to read, write, or scan.
    #[error("world state failure: {0}")]
    Store(#[from] StateError),

    /// A stored value did not decode into the expected record.
    #[error("failed to decode record at key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type AssetResult<T> = Result<T, AssetError>;
