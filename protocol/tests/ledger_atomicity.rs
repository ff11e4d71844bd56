//! Integration tests for the invocation boundary over the durable backend.
//!
//! Each test opens its own sled store, so there is no shared state and no
//! ordering dependency between tests.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use asset_ledger_protocol::{
    KeyValue, Ledger, MemoryStore, SledStore, StateError, StateResult, StateStore, WorldState,
    WriteBatch,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum TestError {
    State(StateError),
    Rejected,
}

impl From<StateError> for TestError {
    fn from(e: StateError) -> Self {
        TestError::State(e)
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::State(e) => write!(f, "state: {e}"),
            TestError::Rejected => write!(f, "rejected"),
        }
    }
}

fn sled_ledger() -> Ledger<SledStore> {
    Ledger::new(SledStore::open_temporary().expect("temp store"))
}

/// Memory store whose `apply` fails once `fail_commits` is set.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_commits: AtomicBool,
}

impl StateStore for FlakyStore {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn range(&self, start: &str, end: &str) -> StateResult<Vec<KeyValue>> {
        self.inner.range(start, end)
    }

    fn apply(&self, batch: WriteBatch) -> StateResult<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            let io = io::Error::new(io::ErrorKind::Other, "disk full");
            return Err(StateError::Sled(sled::Error::Io(io)));
        }
        self.inner.apply(batch)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn committed_writes_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let ledger = Ledger::new(SledStore::open(dir.path()).unwrap());
        ledger
            .submit(|inv| -> Result<_, TestError> {
                inv.put_state("asset1", b"{\"ID\":\"asset1\"}".to_vec())?;
                let key = format!("HISTORY_asset1_{}", inv.tx_id());
                inv.put_state(&key, b"{}".to_vec())?;
                Ok(())
            })
            .unwrap();
    }

    let store = SledStore::open(dir.path()).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.get("asset1").unwrap().is_some());
}

#[test]
fn rejected_invocation_commits_nothing() {
    let ledger = sled_ledger();
    let result = ledger.submit(|inv| -> Result<(), TestError> {
        inv.put_state("asset1", b"{}".to_vec())?;
        inv.put_state("HISTORY_asset1_tx", b"{}".to_vec())?;
        Err(TestError::Rejected)
    });

    assert!(matches!(result, Err(TestError::Rejected)));
    assert!(ledger.store().is_empty());
}

#[test]
fn delete_and_put_in_one_invocation() {
    let ledger = sled_ledger();
    ledger
        .submit(|inv| -> Result<_, TestError> {
            inv.put_state("old", b"1".to_vec())?;
            Ok(())
        })
        .unwrap();

    let receipt = ledger
        .submit(|inv| -> Result<_, TestError> {
            inv.del_state("old")?;
            inv.put_state("new", b"2".to_vec())?;
            Ok(())
        })
        .unwrap();

    assert_eq!(receipt.writes, 2);
    let keys: Vec<_> = ledger
        .store()
        .range("", "")
        .unwrap()
        .into_iter()
        .map(|kv| kv.key)
        .collect();
    assert_eq!(keys, vec!["new"]);
}

#[test]
fn concurrent_submissions_are_serialized() {
    let ledger = Arc::new(sled_ledger());

    // Every thread increments the same counter with a read-modify-write.
    // Lost updates would show up as a final value below the total.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..25 {
                    ledger
                        .submit(|inv| -> Result<_, TestError> {
                            let current = inv
                                .get_state("counter")?
                                .map(|b| String::from_utf8(b).unwrap().parse::<u64>().unwrap())
                                .unwrap_or(0);
                            inv.put_state("counter", (current + 1).to_string().into_bytes())?;
                            Ok(())
                        })
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread should not panic");
    }

    let value = ledger.store().get("counter").unwrap().unwrap();
    assert_eq!(String::from_utf8(value).unwrap(), "100");
}

#[test]
fn evaluate_sees_committed_state_only() {
    let ledger = sled_ledger();
    ledger
        .submit(|inv| -> Result<_, TestError> {
            inv.put_state("k", b"v".to_vec())?;
            Ok(())
        })
        .unwrap();

    let entries = ledger
        .evaluate(|inv| -> Result<_, TestError> {
            inv.put_state("ignored", b"x".to_vec())?;
            Ok(inv.get_state_by_range("", "")?)
        })
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert!(ledger.store().get("ignored").unwrap().is_none());
}

#[test]
fn failed_commit_surfaces_store_error_and_changes_nothing() {
    let ledger = Ledger::new(FlakyStore::default());
    ledger
        .submit(|inv| -> Result<_, TestError> {
            inv.put_state("asset1", b"v1".to_vec())?;
            Ok(())
        })
        .unwrap();

    ledger.store().fail_commits.store(true, Ordering::SeqCst);
    let result = ledger.submit(|inv| -> Result<_, TestError> {
        inv.put_state("asset1", b"v2".to_vec())?;
        inv.put_state("HISTORY_asset1_tx", b"{}".to_vec())?;
        Ok(())
    });

    assert!(matches!(result, Err(TestError::State(StateError::Sled(_)))));
    assert_eq!(ledger.store().len(), 1);
    assert_eq!(ledger.store().get("asset1").unwrap(), Some(b"v1".to_vec()));

    // The ledger keeps working once the backend recovers.
    ledger.store().fail_commits.store(false, Ordering::SeqCst);
    ledger
        .submit(|inv| -> Result<_, TestError> {
            inv.put_state("asset1", b"v3".to_vec())?;
            Ok(())
        })
        .unwrap();
    assert_eq!(ledger.store().get("asset1").unwrap(), Some(b"v3".to_vec()));
}
