//! RocksDB storage engine.
//!
//! Built on RocksDB's `OptimisticTransactionDB`: transactions take no locks,
//! track every key they read or write, and are validated at commit. A commit
//! that loses a race comes back from RocksDB as `Busy` (or `TryAgain` when the
//! memtable history is too short to decide) and is reported as
//! [`GraphError::Conflict`].

use super::{KvEngine, KvTransaction, TxnMode};
use crate::error::{GraphError, Result};
use log::{info, trace};
use rocksdb::{
    Env, ErrorKind, OptimisticTransactionDB, OptimisticTransactionOptions, Options, ReadOptions,
    SnapshotWithThreadMode, Transaction, WriteOptions,
};
use std::path::Path;
use std::sync::Arc;

/// Virtual directory used by in-memory databases.
const MEMORY_DB_PATH: &str = "adjgraph-memory";

/// RocksDB-backed transactional engine.
///
/// Cloning yields another handle to the same database.
#[derive(Clone)]
pub struct RocksDBEngine {
    db: Arc<OptimisticTransactionDB>,
}

impl RocksDBEngine {
    /// Open or create a RocksDB database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        Self::open_with_options(path, opts)
    }

    /// Open a RocksDB database with custom options.
    ///
    /// For advanced use cases where specific RocksDB tuning is needed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the database cannot be opened.
    pub fn open_with_options<P: AsRef<Path>>(path: P, opts: Options) -> Result<Self> {
        info!("Opening RocksDB engine at {:?}", path.as_ref());
        let db = OptimisticTransactionDB::open(&opts, path.as_ref()).map_err(|e| {
            GraphError::storage(
                format!("Failed to open RocksDB at {:?}", path.as_ref()),
                Some(e),
            )
        })?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Create an ephemeral database backed by RocksDB's in-memory environment.
    ///
    /// Nothing touches the filesystem; all data is lost when the last handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the environment or database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let env = Env::mem_env()
            .map_err(|e| GraphError::storage("Failed to create in-memory env", Some(e)))?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_env(&env);
        Self::open_with_options(MEMORY_DB_PATH, opts)
    }

    /// Get the underlying RocksDB database handle.
    ///
    /// Useful for advanced operations not exposed by the engine trait.
    pub fn db(&self) -> &Arc<OptimisticTransactionDB> {
        &self.db
    }
}

impl KvEngine for RocksDBEngine {
    type Transaction<'a> = RocksDBTransaction<'a>;

    fn begin(&self, mode: TxnMode) -> Result<RocksDBTransaction<'_>> {
        trace!("Begin {mode} RocksDB transaction");
        let inner = match mode {
            TxnMode::ReadWrite => {
                let mut txn_opts = OptimisticTransactionOptions::new();
                txn_opts.set_snapshot(true);
                TxnInner::ReadWrite(self.db.transaction_opt(&WriteOptions::default(), &txn_opts))
            }
            TxnMode::ReadOnly => TxnInner::ReadOnly(self.db.snapshot()),
        };
        Ok(RocksDBTransaction { inner })
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| GraphError::storage("Failed to flush database", Some(e)))
    }
}

/// Transaction over a [`RocksDBEngine`].
pub struct RocksDBTransaction<'a> {
    inner: TxnInner<'a>,
}

enum TxnInner<'a> {
    ReadWrite(Transaction<'a, OptimisticTransactionDB>),
    ReadOnly(SnapshotWithThreadMode<'a, OptimisticTransactionDB>),
}

impl KvTransaction for RocksDBTransaction<'_> {
    fn mode(&self) -> TxnMode {
        match self.inner {
            TxnInner::ReadWrite(_) => TxnMode::ReadWrite,
            TxnInner::ReadOnly(_) => TxnMode::ReadOnly,
        }
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = match &self.inner {
            // Tracked read at the begin snapshot: a concurrent commit to this
            // key fails our commit.
            TxnInner::ReadWrite(txn) => {
                let snapshot = txn.snapshot();
                let mut opts = ReadOptions::default();
                opts.set_snapshot(&snapshot);
                txn.get_for_update_opt(key, true, &opts)
            }
            TxnInner::ReadOnly(snapshot) => snapshot.get(key),
        };
        value.map_err(|e| GraphError::storage("Failed to get value", Some(e)))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        match &self.inner {
            TxnInner::ReadWrite(txn) => txn
                .put(key, value)
                .map_err(|e| GraphError::storage("Failed to put key-value pair", Some(e))),
            TxnInner::ReadOnly(_) => Err(GraphError::InvalidOperation {
                message: "cannot write in a read-only transaction".to_string(),
            }),
        }
    }

    fn commit(self) -> Result<()> {
        match self.inner {
            TxnInner::ReadWrite(txn) => txn.commit().map_err(map_commit_error),
            TxnInner::ReadOnly(_) => Ok(()),
        }
    }

    fn discard(self) {
        // Dropping an uncommitted RocksDB transaction rolls it back.
        trace!("Discarding {} RocksDB transaction", self.mode());
    }
}

fn map_commit_error(err: rocksdb::Error) -> GraphError {
    match err.kind() {
        ErrorKind::Busy | ErrorKind::TryAgain => GraphError::conflict(err.to_string()),
        _ => GraphError::storage("Failed to commit transaction", Some(err)),
    }
}
