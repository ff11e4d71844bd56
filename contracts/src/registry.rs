//! # Asset Registry
//!
//! CRUD and transfer over [`Asset`] records. Every mutation that changes an
//! asset also appends a history entry through [`crate::history`], staged in
//! the same invocation so both land in one commit.
//!
//! ## Lifecycle
//!
//! ```text
//! create ──▶ live ──update/transfer──▶ live ──delete──▶ gone
//!   │                   │                                (no entry)
//!   └─ CREATE entry     └─ UPDATE / TRANSFER entry
//! ```
//!
//! Deletion is a hard delete and is not recorded in the history.

use asset_ledger_protocol::WorldState;

use crate::asset::{Asset, HistoryAction};
use crate::error::{AssetError, AssetResult};
use crate::history;
use crate::keys;

/// Seed assets written by [`AssetContract::init_ledger`]:
/// `(id, color, size, owner, appraised_value)`.
pub const SEED_ASSETS: [(&str, &str, i64, &str, i64); 10] = [
    ("asset1", "blue", 5, "Tomoko", 300),
    ("asset2", "red", 5, "Brad", 400),
    ("asset3", "green", 10, "Jin Soo", 500),
    ("asset4", "yellow", 10, "Max", 600),
    ("asset5", "black", 15, "Adriana", 700),
    ("asset6", "white", 15, "Michel", 800),
    ("asset7", "purple", 20, "Aarav", 900),
    ("asset8", "orange", 20, "Lili", 1000),
    ("asset9", "pink", 25, "Yu", 1100),
    ("asset10", "brown", 25, "Karim", 1200),
];

/// The asset contract. Stateless: all state lives in the [`WorldState`]
/// handed to each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetContract;

impl AssetContract {
    pub fn new() -> Self {
        Self
    }

    /// Seeds the ledger with [`SEED_ASSETS`], returning how many were written.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::AlreadyExists`] if any seed id is already live.
    pub fn init_ledger(&self, ctx: &mut dyn WorldState) -> AssetResult<usize> {
        for (id, color, size, owner, appraised_value) in SEED_ASSETS {
            self.create_asset(ctx, id, color, size, owner, appraised_value)?;
        }
        tracing::info!(count = SEED_ASSETS.len(), "ledger seeded");
        Ok(SEED_ASSETS.len())
    }

    /// Issues a new asset with `createdAt = updatedAt =` the invocation
    /// timestamp and records a `CREATE` entry.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::InvalidAssetId`] for an empty or reserved id.
    /// Returns [`AssetError::AlreadyExists`] if `id` is live.
    pub fn create_asset(
        &self,
        ctx: &mut dyn WorldState,
        id: &str,
        color: &str,
        size: i64,
        owner: &str,
        appraised_value: i64,
    ) -> AssetResult<()> {
        let key = keys::asset_key(id)?;
        if ctx.get_state(key)?.is_some() {
            return Err(AssetError::AlreadyExists(id.to_string()));
        }

        let now = ctx.timestamp();
        let asset = Asset {
            id: id.to_string(),
            color: color.to_string(),
            size,
            owner: owner.to_string(),
            appraised_value,
            created_at: now,
            updated_at: now,
        };
        put_asset(ctx, &asset)?;
        history::record_for_invocation(ctx, id, HistoryAction::Create, owner)?;

        tracing::debug!(asset_id = id, owner, "asset created");
        Ok(())
    }

    /// Returns the asset stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NotFound`] if absent and [`AssetError::Decode`]
    /// if the stored value is not an asset.
    pub fn read_asset(&self, ctx: &dyn WorldState, id: &str) -> AssetResult<Asset> {
        let key = keys::asset_key(id)?;
        let bytes = ctx
            .get_state(key)?
            .ok_or_else(|| AssetError::NotFound(id.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|source| AssetError::Decode {
            key: key.to_string(),
            source,
        })
    }

    /// Overwrites every field but `createdAt`, sets `updatedAt`, and records
    /// an `UPDATE` entry carrying the new owner (changed or not).
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NotFound`] if `id` is absent.
    pub fn update_asset(
        &self,
        ctx: &mut dyn WorldState,
        id: &str,
        color: &str,
        size: i64,
        owner: &str,
        appraised_value: i64,
    ) -> AssetResult<()> {
        let existing = self.read_asset(ctx, id)?;

        let asset = Asset {
            id: id.to_string(),
            color: color.to_string(),
            size,
            owner: owner.to_string(),
            appraised_value,
            created_at: existing.created_at,
            updated_at: ctx.timestamp(),
        };
        put_asset(ctx, &asset)?;
        history::record_for_invocation(ctx, id, HistoryAction::Update, owner)?;

        tracing::debug!(asset_id = id, owner, "asset updated");
        Ok(())
    }

    /// Removes the asset. Its history entries stay; no entry is added.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::InvalidAssetId`] for empty or reserved ids and
    /// [`AssetError::NotFound`] if `id` is absent.
    pub fn delete_asset(&self, ctx: &mut dyn WorldState, id: &str) -> AssetResult<()> {
        let key = keys::asset_key(id)?;
        if ctx.get_state(key)?.is_none() {
            return Err(AssetError::NotFound(id.to_string()));
        }
        ctx.del_state(key)?;

        tracing::debug!(asset_id = id, "asset deleted");
        Ok(())
    }

    /// Changes only `owner` and `updatedAt`, then records a `TRANSFER` entry.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NotFound`] if `id` is absent.
    pub fn transfer_asset(
        &self,
        ctx: &mut dyn WorldState,
        id: &str,
        new_owner: &str,
    ) -> AssetResult<()> {
        let mut asset = self.read_asset(ctx, id)?;
        let previous_owner = std::mem::replace(&mut asset.owner, new_owner.to_string());
        asset.updated_at = ctx.timestamp();

        put_asset(ctx, &asset)?;
        history::record_for_invocation(ctx, id, HistoryAction::Transfer, new_owner)?;

        tracing::debug!(asset_id = id, from = %previous_owner, to = new_owner, "asset transferred");
        Ok(())
    }

    /// True when a value is stored under `id`. Ids that can never be asset
    /// keys (empty or reserved) report `false`.
    pub fn asset_exists(&self, ctx: &dyn WorldState, id: &str) -> AssetResult<bool> {
        if keys::validate_asset_id(id).is_err() {
            return Ok(false);
        }
        Ok(ctx.get_state(id)?.is_some())
    }
}

fn put_asset(ctx: &mut dyn WorldState, asset: &Asset) -> AssetResult<()> {
    let bytes = serde_json::to_vec(asset).map_err(AssetError::Encode)?;
    ctx.put_state(&asset.id, bytes)?;
    Ok(())
}
