// Copyright (c) 2026 Asset Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Asset Registry Contract
//!
//! Business logic of the asset ledger, written against the
//! [`WorldState`](asset_ledger_protocol::WorldState) stub so it runs the same
//! under the node, under tests, or under any other executor.
//!
//! - **Registry**: create, read, update, delete, and transfer assets.
//! - **History**: one append-only audit entry per create, update, and
//!   transfer, stored in the same keyspace under `HISTORY_` keys.
//! - **Queries**: full-scan listings, owner filters, history lookups, and
//!   counts.
//! - **Dispatch**: the string-argument entry point used by the node.
//!
//! ## Design Principles
//!
//! 1. The contract holds no state of its own; everything goes through the
//!    world state handed to each call.
//! 2. A mutation and its history entry are staged in one invocation and
//!    commit together.
//! 3. Asset keys and history keys never overlap: ids starting with
//!    `HISTORY_` are rejected.
//! 4. Scans tolerate undecodable entries; point reads do not.

pub mod asset;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod keys;
pub mod query;
pub mod registry;

pub use asset::{Asset, AssetHistory, HistoryAction};
pub use dispatch::{DispatchError, Function};
pub use error::{AssetError, AssetResult};
pub use query::sort_chronologically;
pub use registry::{AssetContract, SEED_ASSETS};
