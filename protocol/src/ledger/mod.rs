//! # Invocation Boundary
//!
//! Contract code runs against [`WorldState`], a narrow stub with four state
//! operations plus the invocation's `txId` and timestamp. The concrete
//! [`Invocation`] reads the committed store and buffers writes; the
//! [`Ledger`] executor decides whether that buffer is committed.
//!
//! ```text
//!   caller ──submit(f)──▶ Ledger ──lock──▶ Invocation ──f(&mut inv)──▶ contract
//!                            │                  │
//!                            │◀── Ok: apply(WriteBatch) ──┘
//!                            └─── Err: drop the batch, store untouched
//! ```

pub mod executor;
pub mod txid;

use chrono::{DateTime, Utc};

use crate::storage::{KeyValue, StateError, StateResult, StateStore, WriteBatch};

pub use executor::{Ledger, TxReceipt};

// ---------------------------------------------------------------------------
// WorldState
// ---------------------------------------------------------------------------

/// The view of the world state handed to contract code.
///
/// Implementations must give every read in one invocation the same
/// committed snapshot, and must apply all writes of the invocation together
/// or not at all.
pub trait WorldState {
    /// Committed value of `key`, or `None` if absent.
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>>;

    /// Stage a write of `value` under `key`.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StateResult<()>;

    /// Stage a delete of `key`.
    fn del_state(&mut self, key: &str) -> StateResult<()>;

    /// Committed entries with keys in `[start, end)`, in key order. Empty
    /// bounds are open-ended.
    fn get_state_by_range(&self, start: &str, end: &str) -> StateResult<Vec<KeyValue>>;

    /// Unique identifier of this invocation.
    fn tx_id(&self) -> &str;

    /// Timestamp assigned to this invocation.
    fn timestamp(&self) -> DateTime<Utc>;
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// One execution of contract code against a [`StateStore`].
///
/// Reads never observe the invocation's own staged writes; they see only
/// what was committed before the invocation started.
pub struct Invocation<'a> {
    store: &'a dyn StateStore,
    tx_id: String,
    timestamp: DateTime<Utc>,
    writes: WriteBatch,
}

impl<'a> Invocation<'a> {
    pub fn new(store: &'a dyn StateStore, tx_id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            store,
            tx_id,
            timestamp,
            writes: WriteBatch::new(),
        }
    }

    /// Writes staged so far.
    pub fn writes(&self) -> &WriteBatch {
        &self.writes
    }

    /// Consume the invocation, returning its staged writes.
    pub fn into_writes(self) -> WriteBatch {
        self.writes
    }
}

fn check_key(key: &str) -> StateResult<()> {
    if key.is_empty() {
        return Err(StateError::InvalidKey("key must not be empty".into()));
    }
    Ok(())
}

impl WorldState for Invocation<'_> {
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        self.store.get(key)
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> StateResult<()> {
        check_key(key)?;
        self.writes.put(key, value);
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> StateResult<()> {
        check_key(key)?;
        self.writes.delete(key);
        Ok(())
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> StateResult<Vec<KeyValue>> {
        self.store.range(start, end)
    }

    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
