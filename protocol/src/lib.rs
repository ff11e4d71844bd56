// Copyright (c) 2026 Asset Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Asset Ledger Protocol: World State & Invocation Boundary
//!
//! The contract layer in `asset-ledger-contracts` only knows how to read and
//! write keys. Everything it assumes about the environment it runs in lives
//! here:
//!
//! - **storage**: an ordered, durable key-value
//!   world state with atomic batch application. Two backends: an in-memory
//!   `BTreeMap` for tests and a sled tree for real deployments.
//! - **ledger**: the invocation boundary. Every contract call runs inside an
//!   [`ledger::Invocation`] that reads a consistent view, buffers its writes,
//!   and commits them as one unit (or not at all) through the
//!   [`ledger::Ledger`] executor. Each invocation carries a unique `txId` and a
//!   timestamp.
//! - **config**: defaults shared by the node and the contracts.
//!
//! ## Guarantees
//!
//! 1. Submitted invocations are serialized; no two mutations interleave.
//! 2. Reads inside an invocation observe the last committed state only.
//! 3. A failed invocation leaves the world state untouched.
//! 4. Invocation timestamps are strictly increasing per ledger.

pub mod config;
pub mod ledger;
pub mod storage;

pub use ledger::{Invocation, Ledger, WorldState};
pub use storage::{KeyValue, MemoryStore, SledStore, StateError, StateResult, StateStore, WriteBatch};
