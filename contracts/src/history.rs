//! # History Recorder
//!
//! Appends one immutable [`AssetHistory`] entry per mutation. The recorder
//! never reads before writing: uniqueness of the history key rests on the
//! invocation's `txId`, which the execution environment guarantees.

use asset_ledger_protocol::WorldState;
use chrono::{DateTime, Utc};

use crate::asset::{AssetHistory, HistoryAction};
use crate::error::{AssetError, AssetResult};
use crate::keys;

/// Write a history entry for `asset_id` under `history_key(asset_id, tx_id)`.
pub fn record_history(
    ctx: &mut dyn WorldState,
    asset_id: &str,
    action: HistoryAction,
    owner: &str,
    tx_id: &str,
    timestamp: DateTime<Utc>,
) -> AssetResult<AssetHistory> {
    let entry = AssetHistory {
        asset_id: asset_id.to_string(),
        action,
        owner: owner.to_string(),
        tx_id: tx_id.to_string(),
        timestamp,
    };
    let bytes = serde_json::to_vec(&entry).map_err(AssetError::Encode)?;
    ctx.put_state(&keys::history_key(asset_id, tx_id), bytes)?;

    tracing::debug!(asset_id, %action, tx_id, "history recorded");
    Ok(entry)
}

/// [`record_history`] using the invocation's own `txId` and timestamp.
pub fn record_for_invocation(
    ctx: &mut dyn WorldState,
    asset_id: &str,
    action: HistoryAction,
    owner: &str,
) -> AssetResult<AssetHistory> {
    let tx_id = ctx.tx_id().to_string();
    let timestamp = ctx.timestamp();
    record_history(ctx, asset_id, action, owner, &tx_id, timestamp)
}
