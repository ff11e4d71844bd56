//! # Asset Records
//!
//! The two record kinds stored in the world state. Field names on the wire
//! are fixed by the external JSON contract, hence the serde renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A registered asset, stored as JSON under its own `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Unique, immutable identifier. Also the asset's world-state key.
    #[serde(rename = "ID")]
    pub id: String,
    pub color: String,
    /// Unit-less size.
    pub size: i64,
    /// Current owner identifier. Changed by update and transfer.
    pub owner: String,
    pub appraised_value: i64,
    /// Set once at creation, never rewritten.
    pub created_at: DateTime<Utc>,
    /// Set on every mutation, including transfer.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// The mutation that produced a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HistoryAction {
    Create,
    Update,
    Transfer,
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryAction::Create => write!(f, "CREATE"),
            HistoryAction::Update => write!(f, "UPDATE"),
            HistoryAction::Transfer => write!(f, "TRANSFER"),
        }
    }
}

/// One immutable audit entry.
///
/// `asset_id` is a plain reference: deleting the asset leaves its history in
/// place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetHistory {
    pub asset_id: String,
    pub action: HistoryAction,
    /// Owner as of this action.
    pub owner: String,
    /// Invocation that produced the record.
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
}
