//! In-memory world state.
//!
//! A `BTreeMap` gives the same lexicographic ordering sled does, so range
//! scans behave identically across backends. Nothing survives a drop.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

use super::{is_empty_range, KeyValue, StateResult, StateStore, WriteBatch};

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw entry, bypassing the invocation boundary.
    ///
    /// Test fixtures use this to plant foreign or malformed values.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.write().insert(key.into(), value.into());
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn range(&self, start: &str, end: &str) -> StateResult<Vec<KeyValue>> {
        if is_empty_range(start, end) {
            return Ok(Vec::new());
        }
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };

        let entries = self.entries.read();
        Ok(entries
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
            .collect())
    }

    fn apply(&self, batch: WriteBatch) -> StateResult<()> {
        // One write guard for the whole batch: readers see all of it or none.
        let mut entries = self.entries.write();
        for (key, value) in batch {
            match value {
                Some(bytes) => {
                    entries.insert(key, bytes);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
