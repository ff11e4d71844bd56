//! # Query Engine
//!
//! Aggregate reads over the whole keyspace. There is no secondary index:
//! each query walks `("", "")` once, classifies every key with
//! [`KeyKind`], and decodes only the entries of the kind it is after.
//!
//! An entry of the right kind that fails to decode is skipped with a
//! warning rather than failing the query, so one malformed value cannot
//! take down the listings. Store failures are never skipped.
//!
//! Results come back in key order. For history that is *not* chronological
//! order; use [`sort_chronologically`] when it matters.

use asset_ledger_protocol::{KeyValue, WorldState};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::asset::{Asset, AssetHistory};
use crate::error::AssetResult;
use crate::keys::KeyKind;
use crate::registry::AssetContract;

/// Full scan, decoding entries of `kind` as `T` and skipping the rest.
fn scan<T: DeserializeOwned>(ctx: &dyn WorldState, kind: KeyKind) -> AssetResult<Vec<T>> {
    let entries = ctx.get_state_by_range("", "")?;
    Ok(entries
        .into_iter()
        .filter(|kv| KeyKind::classify(&kv.key) == kind)
        .filter_map(decode_or_skip)
        .collect())
}

fn decode_or_skip<T: DeserializeOwned>(kv: KeyValue) -> Option<T> {
    match serde_json::from_slice(&kv.value) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(key = %kv.key, error = %e, "skipping undecodable entry during scan");
            None
        }
    }
}

impl AssetContract {
    /// Every decodable asset, in key order.
    pub fn get_all_assets(&self, ctx: &dyn WorldState) -> AssetResult<Vec<Asset>> {
        scan(ctx, KeyKind::Asset)
    }

    /// Assets whose `owner` equals `owner` exactly (case-sensitive).
    pub fn get_assets_by_owner(&self, ctx: &dyn WorldState, owner: &str) -> AssetResult<Vec<Asset>> {
        let mut assets: Vec<Asset> = scan(ctx, KeyKind::Asset)?;
        assets.retain(|a| a.owner == owner);
        Ok(assets)
    }

    /// History entries whose `assetId` equals `asset_id`, in key order.
    ///
    /// Entries for deleted assets are still returned.
    pub fn get_asset_history(
        &self,
        ctx: &dyn WorldState,
        asset_id: &str,
    ) -> AssetResult<Vec<AssetHistory>> {
        let mut history: Vec<AssetHistory> = scan(ctx, KeyKind::History)?;
        history.retain(|h| h.asset_id == asset_id);
        Ok(history)
    }

    /// Number of asset-kind keys holding a decodable asset. History entries
    /// never count.
    pub fn get_asset_count(&self, ctx: &dyn WorldState) -> AssetResult<usize> {
        let entries = ctx.get_state_by_range("", "")?;
        Ok(entries
            .into_iter()
            .filter(|kv| KeyKind::classify(&kv.key) == KeyKind::Asset)
            .filter(|kv| serde_json::from_slice::<Asset>(&kv.value).is_ok())
            .count())
    }

    /// Newest timestamp on record: the latest `updatedAt` of a live asset or
    /// `timestamp` of a history entry. `None` on an empty ledger.
    ///
    /// A restarted executor resumes its clock after this value.
    pub fn latest_timestamp(&self, ctx: &dyn WorldState) -> AssetResult<Option<DateTime<Utc>>> {
        let assets: Vec<Asset> = scan(ctx, KeyKind::Asset)?;
        let history: Vec<AssetHistory> = scan(ctx, KeyKind::History)?;
        Ok(assets
            .iter()
            .map(|a| a.updated_at)
            .chain(history.iter().map(|h| h.timestamp))
            .max())
    }
}

/// Order history oldest first by timestamp, ties broken by `txId`.
pub fn sort_chronologically(history: &mut [AssetHistory]) {
    history.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.tx_id.cmp(&b.tx_id))
    });
}
