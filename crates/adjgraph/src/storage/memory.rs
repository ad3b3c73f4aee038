//! In-memory storage engine.
//!
//! **Note**: All data is lost when the engine is dropped.
//!
//! Every committed key carries the sequence number of the commit that wrote it.
//! A transaction captures the committed map and sequence when it begins, reads
//! from that snapshot, and at commit rejects itself if any key it read or wrote
//! now carries a newer sequence.
//!
//! Snapshots share the committed map through an `Arc`. A commit updates the map
//! in place when no other transaction holds it, but while any snapshot is alive
//! the commit copies the whole map first, so its cost grows with the store size.

use super::{KvEngine, KvTransaction, TxnMode};
use crate::error::{GraphError, Result};
use log::trace;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Value plus the commit sequence that produced it.
#[derive(Debug, Clone)]
struct Versioned {
    value: Vec<u8>,
    version: u64,
}

type Snapshot = Arc<BTreeMap<Vec<u8>, Versioned>>;

#[derive(Debug, Default)]
struct Committed {
    data: Snapshot,
    sequence: u64,
}

/// In-memory optimistic transactional engine.
///
/// Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    state: Arc<Mutex<Committed>>,
}

impl MemoryEngine {
    /// Create a new empty in-memory engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of keys stored.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.data.len())
    }

    /// Check if the engine holds no keys.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.data.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Committed>> {
        self.state
            .lock()
            .map_err(|_| GraphError::storage("Memory engine lock poisoned", None::<std::io::Error>))
    }
}

impl KvEngine for MemoryEngine {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn begin(&self, mode: TxnMode) -> Result<MemoryTransaction<'_>> {
        let state = self.lock()?;
        trace!("Begin {mode} transaction at sequence {}", state.sequence);
        Ok(MemoryTransaction {
            engine: self,
            mode,
            snapshot: Arc::clone(&state.data),
            read_version: state.sequence,
            reads: BTreeSet::new(),
            writes: HashMap::new(),
        })
    }
}

/// Transaction over a [`MemoryEngine`] snapshot.
#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    engine: &'a MemoryEngine,
    mode: TxnMode,
    snapshot: Snapshot,
    read_version: u64,
    reads: BTreeSet<Vec<u8>>,
    writes: HashMap<Vec<u8>, Vec<u8>>,
}

impl KvTransaction for MemoryTransaction<'_> {
    fn mode(&self) -> TxnMode {
        self.mode
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(pending) = self.writes.get(key) {
            return Ok(Some(pending.clone()));
        }
        if self.mode.is_writable() {
            self.reads.insert(key.to_vec());
        }
        Ok(self.snapshot.get(key).map(|v| v.value.clone()))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if !self.mode.is_writable() {
            return Err(GraphError::InvalidOperation {
                message: "cannot write in a read-only transaction".to_string(),
            });
        }
        self.writes.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn commit(self) -> Result<()> {
        if self.writes.is_empty() {
            return Ok(());
        }

        let MemoryTransaction {
            engine,
            snapshot,
            read_version,
            reads,
            writes,
            ..
        } = self;
        // Release our own snapshot so an uncontended commit does not copy the map.
        drop(snapshot);
        let mut state = engine.lock()?;

        let touched = reads.iter().chain(writes.keys());
        for key in touched {
            if let Some(current) = state.data.get(key) {
                if current.version > read_version {
                    return Err(GraphError::conflict(format!(
                        "key '{}' was modified by a concurrent transaction",
                        String::from_utf8_lossy(key)
                    )));
                }
            }
        }

        state.sequence += 1;
        let version = state.sequence;
        let data = Arc::make_mut(&mut state.data);
        for (key, value) in writes {
            data.insert(key, Versioned { value, version });
        }
        trace!("Committed transaction at sequence {version}");

        Ok(())
    }

    fn discard(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_engine_is_empty() {
        let engine = MemoryEngine::new();
        assert!(engine.is_empty().unwrap());
        assert_eq!(engine.len().unwrap(), 0);
    }

    #[test]
    fn test_set_and_get_after_commit() {
        let engine = MemoryEngine::new();
        let mut txn = engine.begin(TxnMode::ReadWrite).unwrap();
        txn.set(b"key1", b"value1").unwrap();
        txn.commit().unwrap();

        let mut read = engine.begin(TxnMode::ReadOnly).unwrap();
        assert_eq!(read.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(engine.len().unwrap(), 1);
    }

    #[test]
    fn test_get_nonexistent_key() {
        let engine = MemoryEngine::new();
        let mut txn = engine.begin(TxnMode::ReadOnly).unwrap();
        assert_eq!(txn.get(b"missing").unwrap(), None);
    }

    #[test]
    fn test_reads_see_own_writes() {
        let engine = MemoryEngine::new();
        let mut txn = engine.begin(TxnMode::ReadWrite).unwrap();
        txn.set(b"key1", b"pending").unwrap();
        assert_eq!(txn.get(b"key1").unwrap(), Some(b"pending".to_vec()));
    }

    #[test]
    fn test_uncommitted_writes_are_invisible() {
        let engine = MemoryEngine::new();
        let mut writer = engine.begin(TxnMode::ReadWrite).unwrap();
        writer.set(b"key1", b"value1").unwrap();

        let mut reader = engine.begin(TxnMode::ReadOnly).unwrap();
        assert_eq!(reader.get(b"key1").unwrap(), None);
        writer.discard();
        assert!(engine.is_empty().unwrap());
    }

    #[test]
    fn test_snapshot_ignores_later_commits() {
        let engine = MemoryEngine::new();
        let mut reader = engine.begin(TxnMode::ReadOnly).unwrap();

        let mut writer = engine.begin(TxnMode::ReadWrite).unwrap();
        writer.set(b"key1", b"value1").unwrap();
        writer.commit().unwrap();

        assert_eq!(reader.get(b"key1").unwrap(), None);
    }

    #[test]
    fn test_commit_copies_map_only_while_snapshot_is_alive() {
        let engine = MemoryEngine::new();
        let data = |engine: &MemoryEngine| Arc::clone(&engine.lock().unwrap().data);

        let mut writer = engine.begin(TxnMode::ReadWrite).unwrap();
        writer.set(b"key1", b"value1").unwrap();
        writer.commit().unwrap();
        let before = Arc::as_ptr(&data(&engine));

        let mut writer = engine.begin(TxnMode::ReadWrite).unwrap();
        writer.set(b"key2", b"value2").unwrap();
        writer.commit().unwrap();
        assert_eq!(Arc::as_ptr(&data(&engine)), before);

        let mut reader = engine.begin(TxnMode::ReadOnly).unwrap();
        let mut writer = engine.begin(TxnMode::ReadWrite).unwrap();
        writer.set(b"key3", b"value3").unwrap();
        writer.commit().unwrap();
        assert_ne!(Arc::as_ptr(&data(&engine)), before);
        assert_eq!(reader.get(b"key3").unwrap(), None);
        assert_eq!(engine.len().unwrap(), 3);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let engine = MemoryEngine::new();
        let mut txn = engine.begin(TxnMode::ReadOnly).unwrap();
        let err = txn.set(b"key1", b"value1").unwrap_err();
        assert!(matches!(err, GraphError::InvalidOperation { .. }));
    }

    #[test]
    fn test_concurrent_write_to_read_key_conflicts() {
        let engine = MemoryEngine::new();
        let mut first = engine.begin(TxnMode::ReadWrite).unwrap();
        let mut second = engine.begin(TxnMode::ReadWrite).unwrap();

        first.get(b"a").unwrap();
        second.get(b"a").unwrap();
        first.set(b"a", b"1").unwrap();
        second.set(b"a", b"2").unwrap();

        first.commit().unwrap();
        let err = second.commit().unwrap_err();
        assert!(err.is_retryable());

        let mut read = engine.begin(TxnMode::ReadOnly).unwrap();
        assert_eq!(read.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_disjoint_keys_do_not_conflict() {
        let engine = MemoryEngine::new();
        let mut first = engine.begin(TxnMode::ReadWrite).unwrap();
        let mut second = engine.begin(TxnMode::ReadWrite).unwrap();

        first.get(b"a").unwrap();
        first.set(b"a", b"1").unwrap();
        second.get(b"c").unwrap();
        second.set(b"c", b"2").unwrap();

        first.commit().unwrap();
        second.commit().unwrap();
        assert_eq!(engine.len().unwrap(), 2);
    }

    #[test]
    fn test_blind_write_conflicts_with_concurrent_commit() {
        let engine = MemoryEngine::new();
        let mut first = engine.begin(TxnMode::ReadWrite).unwrap();
        let mut second = engine.begin(TxnMode::ReadWrite).unwrap();

        first.set(b"a", b"1").unwrap();
        second.set(b"a", b"2").unwrap();

        first.commit().unwrap();
        assert!(second.commit().unwrap_err().is_retryable());
    }

    #[test]
    fn test_read_only_commit_never_conflicts() {
        let engine = MemoryEngine::new();
        let mut reader = engine.begin(TxnMode::ReadOnly).unwrap();
        reader.get(b"a").unwrap();

        let mut writer = engine.begin(TxnMode::ReadWrite).unwrap();
        writer.set(b"a", b"1").unwrap();
        writer.commit().unwrap();

        reader.commit().unwrap();
    }

    #[test]
    fn test_clone_shares_data() {
        let engine = MemoryEngine::new();
        let handle = engine.clone();

        let mut txn = engine.begin(TxnMode::ReadWrite).unwrap();
        txn.set(b"key1", b"value1").unwrap();
        txn.commit().unwrap();

        assert_eq!(handle.len().unwrap(), 1);
    }
}
