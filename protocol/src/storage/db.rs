//! # SledStore: Persistent World State
//!
//! The durable backend for the ledger, built on sled's embedded key-value
//! store. The whole world state lives in one named tree so that a range scan
//! over `("", "")` walks assets and history records together in key order,
//! exactly as the contract layer expects.
//!
//! ## Tree Layout
//!
//! | Tree          | Key                       | Value              |
//! |---------------|---------------------------|--------------------|
//! | `world_state` | asset id or history key   | JSON record bytes  |
//!
//! Keys are stored as their UTF-8 bytes. sled orders keys bytewise, which
//! for UTF-8 matches `str` ordering. A key written by something other than
//! this store may not be UTF-8; range scans skip such entries with a
//! warning instead of failing.
//!
//! ## Atomicity
//!
//! A committed invocation becomes a single `sled::Batch`. Either every put
//! and delete lands or none does, and the tree is flushed before `apply`
//! returns.

use sled::{Batch, Db, IVec, Tree};
use std::path::Path;

use super::{is_empty_range, KeyValue, StateResult, StateStore, WriteBatch};
use crate::config::WORLD_STATE_TREE;

/// Persistent world state backed by sled.
///
/// sled handles are cheap to clone and thread-safe, so a `SledStore` can be
/// shared through an `Arc` without extra locking.
#[derive(Debug, Clone)]
pub struct SledStore {
    /// The underlying sled database handle.
    db: Db,
    /// The flat world-state keyspace.
    state: Tree,
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StateResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a store that lives in a temporary location and is removed
    /// when dropped. Meant for tests.
    pub fn open_temporary() -> StateResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StateResult<Self> {
        let state = db.open_tree(WORLD_STATE_TREE)?;
        Ok(Self { db, state })
    }

    /// Block until all pending writes are durable.
    pub fn flush(&self) -> StateResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// `None` when the stored key is not UTF-8.
fn decode_entry(key: IVec, value: IVec) -> Option<KeyValue> {
    match std::str::from_utf8(&key) {
        Ok(k) => Some(KeyValue::new(k, value.to_vec())),
        Err(_) => {
            tracing::warn!(key = %hex::encode(&key), "skipping non-UTF-8 key in world state");
            None
        }
    }
}

impl StateStore for SledStore {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        Ok(self.state.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn range(&self, start: &str, end: &str) -> StateResult<Vec<KeyValue>> {
        if is_empty_range(start, end) {
            return Ok(Vec::new());
        }

        let iter = if end.is_empty() {
            self.state.range(start.as_bytes()..)
        } else {
            self.state.range(start.as_bytes()..end.as_bytes())
        };

        // The iterator is dropped on every exit path, including `?`.
        let mut entries = Vec::new();
        for result in iter {
            let (key, value) = result?;
            entries.extend(decode_entry(key, value));
        }
        Ok(entries)
    }

    fn apply(&self, batch: WriteBatch) -> StateResult<()> {
        let mut sled_batch = Batch::default();
        for (key, value) in batch {
            match value {
                Some(bytes) => sled_batch.insert(key.as_bytes(), bytes),
                None => sled_batch.remove(key.as_bytes()),
            }
        }
        self.state.apply_batch(sled_batch)?;
        self.db.flush()?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.state.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_of(pairs: &[(&str, &str)]) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (k, v) in pairs {
            batch.put(*k, v.as_bytes().to_vec());
        }
        batch
    }

    #[test]
    fn open_temporary_store_is_empty() {
        let store = SledStore::open_temporary().expect("should create temp store");
        assert!(store.is_empty());
        assert!(store.range("", "").unwrap().is_empty());
    }

    #[test]
    fn persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = SledStore::open(dir.path()).expect("should open store");
            store.apply(batch_of(&[("asset1", "{}")])).unwrap();
        }

        let reopened = SledStore::open(dir.path()).expect("should reopen store");
        assert_eq!(reopened.get("asset1").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn range_is_lexicographic() {
        let store = SledStore::open_temporary().unwrap();
        store
            .apply(batch_of(&[
                ("asset2", "2"),
                ("asset10", "10"),
                ("HISTORY_asset2_tx", "h"),
                ("asset1", "1"),
            ]))
            .unwrap();

        let keys: Vec<_> = store
            .range("", "")
            .unwrap()
            .into_iter()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["HISTORY_asset2_tx", "asset1", "asset10", "asset2"]);
    }

    #[test]
    fn bounded_range() {
        let store = SledStore::open_temporary().unwrap();
        store
            .apply(batch_of(&[("a", "1"), ("b", "2"), ("c", "3")]))
            .unwrap();

        let mid = store.range("b", "c").unwrap();
        assert_eq!(mid, vec![KeyValue::new("b", b"2".to_vec())]);
        assert!(store.range("c", "b").unwrap().is_empty());
    }

    #[test]
    fn batch_applies_puts_and_deletes_together() {
        let store = SledStore::open_temporary().unwrap();
        store.apply(batch_of(&[("a", "1"), ("b", "2")])).unwrap();

        let mut batch = WriteBatch::new();
        batch.delete("a");
        batch.put("c", b"3".to_vec());
        store.apply(batch).unwrap();

        assert!(store.get("a").unwrap().is_none());
        assert_eq!(store.get("b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get("c").unwrap(), Some(b"3".to_vec()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn range_skips_non_utf8_keys() {
        let store = SledStore::open_temporary().unwrap();
        store.apply(batch_of(&[("a", "1"), ("b", "2")])).unwrap();
        store.state.insert([0xff, 0xfe], b"junk".to_vec()).unwrap();

        let keys: Vec<_> = store
            .range("", "")
            .unwrap()
            .into_iter()
            .map(|kv| kv.key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn flush_does_not_error() {
        let store = SledStore::open_temporary().unwrap();
        store.apply(batch_of(&[("a", "1")])).unwrap();
        store.flush().expect("flush should succeed");
    }
}
