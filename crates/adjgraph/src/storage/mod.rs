//! Storage engine abstractions and implementations.
//!
//! This module defines the [`KvEngine`] / [`KvTransaction`] traits and provides implementations:
//! - [`RocksDBEngine`]: RocksDB optimistic transactions, on disk or in memory
//! - [`MemoryEngine`]: process-local optimistic engine for tests and ephemeral graphs
//!
//! ## Contract
//!
//! - Every transaction reads from a consistent snapshot taken when it began.
//! - Writes are private to the transaction until [`KvTransaction::commit`].
//! - Commit fails with [`GraphError::Conflict`](crate::GraphError::Conflict) when a
//!   key this transaction read or wrote was committed by someone else in the meantime.
//! - Dropping an uncommitted transaction discards it.

mod memory;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use memory::{MemoryEngine, MemoryTransaction};
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::{RocksDBEngine, RocksDBTransaction};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnMode {
    /// Reads only; cannot conflict.
    ReadOnly,
    /// Reads and writes; validated at commit.
    ReadWrite,
}

impl TxnMode {
    /// Whether writes are permitted.
    pub fn is_writable(self) -> bool {
        matches!(self, TxnMode::ReadWrite)
    }
}

impl std::fmt::Display for TxnMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxnMode::ReadOnly => write!(f, "read-only"),
            TxnMode::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// A transactional key-value engine.
///
/// The engine handle is shared freely between threads. Transactions borrow it
/// and belong to the thread that began them.
pub trait KvEngine: Send + Sync {
    /// The transaction type for this engine.
    type Transaction<'a>: KvTransaction
    where
        Self: 'a;

    /// Begin a transaction in the given mode.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the engine
    /// cannot start a transaction.
    fn begin(&self, mode: TxnMode) -> Result<Self::Transaction<'_>>;

    /// Flush buffered writes to durable storage.
    ///
    /// Engines without durable storage treat this as a no-op.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// A single transaction against a [`KvEngine`].
pub trait KvTransaction {
    /// Mode the transaction was opened with.
    fn mode(&self) -> TxnMode;

    /// Read a value, seeing this transaction's own pending writes.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the read fails.
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Stage a write, visible only inside this transaction until commit.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidOperation`](crate::GraphError::InvalidOperation)
    /// in a read-only transaction, or
    /// [`GraphError::Storage`](crate::GraphError::Storage) if staging fails.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Validate and apply all staged writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Conflict`](crate::GraphError::Conflict) on a
    /// concurrent modification, [`GraphError::Storage`](crate::GraphError::Storage)
    /// for any other engine failure.
    fn commit(self) -> Result<()>;

    /// Drop all staged writes. Never fails.
    fn discard(self);
}
