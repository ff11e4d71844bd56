//! # Storage Module
//!
//! The State Store Interface: a flat, lexicographically ordered key-value
//! world state. The contract layer never talks to a backend directly; it
//! goes through a [`crate::ledger::Invocation`], which reads from a
//! [`StateStore`] and hands its buffered writes back as one [`WriteBatch`].
//!
//! ## Architecture
//!
//! ```text
//! memory.rs: BTreeMap behind a RwLock; the fake used by tests
//! db.rs:     sled-backed durable store, one tree for the whole keyspace
//! ```
//!
//! ## Contract
//!
//! 1. `range` yields keys in ascending byte order.
//! 2. `apply` lands every entry of a batch or none of them.
//! 3. Once `apply` returns `Ok`, the batch is visible to every later read.

pub mod db;
pub mod memory;

use std::collections::btree_map;
use std::collections::BTreeMap;

pub use db::SledStore;
pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by a state store backend.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

pub type StateResult<T> = Result<T, StateError>;

// ---------------------------------------------------------------------------
// Key/Value Pair
// ---------------------------------------------------------------------------

/// One entry yielded by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Write Batch
// ---------------------------------------------------------------------------

/// Writes buffered by one invocation, applied atomically on commit.
///
/// `Some(bytes)` is a put, `None` a delete. A later write to the same key
/// replaces an earlier one, so the batch holds at most one entry per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    entries: BTreeMap<String, Option<Vec<u8>>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a put of `value` under `key`.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), Some(value.into()));
    }

    /// Stage a delete of `key`.
    pub fn delete(&mut self, key: impl Into<String>) {
        self.entries.insert(key.into(), None);
    }

    /// The staged write for `key`: `Some(Some(_))` put, `Some(None)` delete,
    /// `None` untouched.
    pub fn get(&self, key: &str) -> Option<Option<&[u8]>> {
        self.entries.get(key).map(|v| v.as_deref())
    }

    /// Number of distinct keys touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of staged deletes.
    pub fn delete_count(&self) -> usize {
        self.entries.values().filter(|v| v.is_none()).count()
    }
}

impl IntoIterator for WriteBatch {
    type Item = (String, Option<Vec<u8>>);
    type IntoIter = btree_map::IntoIter<String, Option<Vec<u8>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// A durable, ordered key-value world state.
///
/// Implementations must be safe to share across threads. Serializing
/// read-modify-write sequences is the executor's job, not the store's.
pub trait StateStore: Send + Sync {
    /// Read the committed value of `key`.
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>>;

    /// Scan keys in `[start, end)` in ascending order.
    ///
    /// An empty `end` means "to the last key", so `range("", "")` walks the
    /// whole keyspace. A `start` at or past a non-empty `end` yields nothing.
    fn range(&self, start: &str, end: &str) -> StateResult<Vec<KeyValue>>;

    /// Apply every put and delete in `batch` as a single atomic write.
    fn apply(&self, batch: WriteBatch) -> StateResult<()>;

    /// Number of live keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// True when `[start, end)` cannot contain any key.
pub(crate) fn is_empty_range(start: &str, end: &str) -> bool {
    !end.is_empty() && start >= end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_write_to_same_key_wins() {
        let mut batch = WriteBatch::new();
        batch.put("a", b"1".to_vec());
        batch.delete("a");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get("a"), Some(None));

        batch.put("a", b"2".to_vec());
        assert_eq!(batch.get("a"), Some(Some(&b"2"[..])));
        assert_eq!(batch.delete_count(), 0);
    }

    #[test]
    fn untouched_key_is_none() {
        let batch = WriteBatch::new();
        assert!(batch.get("missing").is_none());
        assert!(batch.is_empty());
    }

    #[test]
    fn empty_range_detection() {
        assert!(!is_empty_range("", ""));
        assert!(!is_empty_range("a", ""));
        assert!(!is_empty_range("a", "b"));
        assert!(is_empty_range("b", "a"));
        assert!(is_empty_range("a", "a"));
    }
}
