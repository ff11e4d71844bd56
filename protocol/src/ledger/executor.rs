//! # Ledger Executor
//!
//! Runs contract code inside invocations and owns the commit decision.
//!
//! ## Serialization
//!
//! A single `RwLock` guards the store. `submit` takes it exclusively for the
//! whole read-execute-commit sequence, so mutations never interleave and
//! every read inside a submission sees one consistent state. `evaluate`
//! takes it shared: concurrent queries are fine, but none of them can
//! observe a half-applied commit.
//!
//! ## Timestamps
//!
//! The lock also protects the last issued timestamp. A submission whose
//! wall-clock time is not after the previous one is moved forward by
//! [`TIMESTAMP_STEP_MICROS`], which keeps `updatedAt` strictly increasing.
//!
//! The clock lives in memory. A process that reopens an existing store
//! should call [`Ledger::resume_after`] with the newest timestamp on record,
//! otherwise a wall clock that stepped back between runs would hand out an
//! earlier timestamp.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::fmt::Display;

use super::{txid, Invocation, WorldState};
use crate::config::{DEFAULT_CREATOR, TIMESTAMP_STEP_MICROS};
use crate::storage::{StateError, StateStore};

/// Result of a committed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TxReceipt<T> {
    /// Transaction ID the invocation ran under.
    pub tx_id: String,
    /// Timestamp the invocation ran under.
    pub timestamp: DateTime<Utc>,
    /// Number of keys written or deleted by the commit.
    pub writes: usize,
    /// Value returned by the contract code.
    pub result: T,
}

/// Last timestamp handed to a submission.
#[derive(Debug, Default)]
struct Clock {
    last: Option<DateTime<Utc>>,
}

impl Clock {
    fn next(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ts = match self.last {
            Some(last) if now <= last => last + Duration::microseconds(TIMESTAMP_STEP_MICROS),
            _ => now,
        };
        self.last = Some(ts);
        ts
    }

    fn observe(&mut self, ts: DateTime<Utc>) {
        if self.last.map_or(true, |last| ts > last) {
            self.last = Some(ts);
        }
    }
}

/// Executes invocations against a [`StateStore`] with atomic commit.
pub struct Ledger<S: StateStore> {
    store: S,
    creator: String,
    clock: RwLock<Clock>,
}

impl<S: StateStore> Ledger<S> {
    /// Wrap `store`, signing transaction IDs as [`DEFAULT_CREATOR`].
    pub fn new(store: S) -> Self {
        Self::with_creator(store, DEFAULT_CREATOR)
    }

    /// Wrap `store`, folding `creator` into every transaction ID.
    pub fn with_creator(store: S, creator: impl Into<String>) -> Self {
        Self {
            store,
            creator: creator.into(),
            clock: RwLock::new(Clock::default()),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// Make every later submission's timestamp come after `ts`.
    pub fn resume_after(&self, ts: DateTime<Utc>) {
        self.clock.write().observe(ts);
    }

    /// Run `f` as a mutating invocation with a fresh `txId` and timestamp.
    ///
    /// Writes are applied atomically if `f` returns `Ok`, and discarded
    /// otherwise.
    pub fn submit<T, E, F>(&self, f: F) -> Result<TxReceipt<T>, E>
    where
        F: FnOnce(&mut Invocation<'_>) -> Result<T, E>,
        E: From<StateError> + Display,
    {
        let mut clock = self.clock.write();
        let timestamp = clock.next(Utc::now());
        let tx_id = txid::generate(&self.creator);
        self.execute(tx_id, timestamp, f)
    }

    /// Like [`submit`](Self::submit) but with a caller-supplied context.
    ///
    /// The caller is responsible for `tx_id` uniqueness. Used for replay and
    /// deterministic tests.
    pub fn submit_with<T, E, F>(
        &self,
        tx_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        f: F,
    ) -> Result<TxReceipt<T>, E>
    where
        F: FnOnce(&mut Invocation<'_>) -> Result<T, E>,
        E: From<StateError> + Display,
    {
        let mut clock = self.clock.write();
        clock.observe(timestamp);
        self.execute(tx_id.into(), timestamp, f)
    }

    /// Run `f` as a read-only invocation. Any writes it stages are dropped.
    pub fn evaluate<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Invocation<'_>) -> Result<T, E>,
    {
        let _guard = self.clock.read();
        let tx_id = txid::generate(&self.creator);
        let mut inv = Invocation::new(&self.store, tx_id, Utc::now());
        let result = f(&mut inv);

        let discarded = inv.writes().len();
        if discarded > 0 {
            tracing::warn!(
                tx_id = inv.tx_id(),
                discarded,
                "read-only invocation staged writes; discarding"
            );
        }
        result
    }

    // Caller holds the write lock.
    fn execute<T, E, F>(
        &self,
        tx_id: String,
        timestamp: DateTime<Utc>,
        f: F,
    ) -> Result<TxReceipt<T>, E>
    where
        F: FnOnce(&mut Invocation<'_>) -> Result<T, E>,
        E: From<StateError> + Display,
    {
        let mut inv = Invocation::new(&self.store, tx_id.clone(), timestamp);
        tracing::debug!(tx_id = %tx_id, %timestamp, "invocation started");

        let result = match f(&mut inv) {
            Ok(value) => value,
            Err(e) => {
                tracing::info!(
                    tx_id = %tx_id,
                    staged = inv.writes().len(),
                    error = %e,
                    "invocation failed; writes discarded"
                );
                return Err(e);
            }
        };

        let batch = inv.into_writes();
        let writes = batch.len();
        let deletes = batch.delete_count();
        if !batch.is_empty() {
            self.store.apply(batch).map_err(|e| {
                tracing::error!(tx_id = %tx_id, error = %e, "commit failed");
                E::from(e)
            })?;
        }

        tracing::info!(tx_id = %tx_id, writes, deletes, "invocation committed");
        Ok(TxReceipt {
            tx_id,
            timestamp,
            writes,
            result,
        })
    }
}
