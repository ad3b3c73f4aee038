//! Main GraphStore interface for adjacency operations.

use super::types::EdgeSet;
use crate::codec;
use crate::error::{GraphError, Result};
use crate::retry::{retry, RetryPolicy};
use crate::storage::{KvEngine, KvTransaction, TxnMode};
use log::{debug, info, trace};

/// Directed-graph adjacency store over a transactional key-value engine.
///
/// Each source node's outgoing edges live in one record keyed by the node
/// identifier. Every operation comes in two forms:
///
/// - a single-shot form (`add_edge`, `remove_edge`, `get_edges`) that opens,
///   commits, and on failure discards its own transaction;
/// - a composable form (`*_in`) that works inside a caller-owned transaction
///   and leaves commit and rollback to the caller.
///
/// The store holds no locks. It is `Send + Sync` whenever the engine is, so it
/// can be shared across threads by reference or `Arc`; transactions cannot.
pub struct GraphStore<E: KvEngine> {
    engine: E,
    retry_policy: RetryPolicy,
}

impl<E: KvEngine> GraphStore<E> {
    /// Wrap an engine with the default retry policy.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy used by [`update`](Self::update).
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// The underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The retry policy used by [`update`](Self::update).
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Begin a caller-owned read-write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the engine cannot start a transaction.
    pub fn begin(&self) -> Result<E::Transaction<'_>> {
        self.engine.begin(TxnMode::ReadWrite)
    }

    /// Begin a caller-owned read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the engine cannot start a transaction.
    pub fn begin_read(&self) -> Result<E::Transaction<'_>> {
        self.engine.begin(TxnMode::ReadOnly)
    }

    /// Add the edge `from -> to` in its own transaction.
    ///
    /// Creates the adjacency record of `from` if needed. Adding an existing
    /// edge is a no-op. Does not retry.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Conflict`] if a concurrent commit touched `from`,
    /// [`GraphError::Storage`] for engine failures.
    pub fn add_edge(&self, from: impl AsRef<[u8]>, to: impl AsRef<[u8]>) -> Result<()> {
        let mut txn = self.begin()?;
        let result = self.add_edge_in(&mut txn, from, to);
        finish(txn, result)
    }

    /// Add the edge `from -> to` inside a caller-owned transaction.
    ///
    /// Stages exactly one write; nothing is committed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the read or write fails, or
    /// [`GraphError::InvalidOperation`] for a read-only transaction.
    pub fn add_edge_in<T: KvTransaction>(
        &self,
        txn: &mut T,
        from: impl AsRef<[u8]>,
        to: impl AsRef<[u8]>,
    ) -> Result<()> {
        let (from, to) = (from.as_ref(), to.as_ref());
        debug!(
            "Adding edge: from={}, to={}",
            String::from_utf8_lossy(from),
            String::from_utf8_lossy(to)
        );

        let mut edges = match txn.get(from)? {
            Some(bytes) => codec::decode(&bytes),
            None => {
                trace!("No record for {}, starting empty", String::from_utf8_lossy(from));
                EdgeSet::new()
            }
        };

        edges.insert(to.to_vec());
        txn.set(from, &codec::encode(&edges))
    }

    /// Remove the edge `from -> to` in its own transaction.
    ///
    /// Removing an edge that is not present is a no-op. Does not retry.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `from` has no adjacency record,
    /// [`GraphError::Conflict`] on a concurrent commit, or
    /// [`GraphError::Storage`] for engine failures.
    pub fn remove_edge(&self, from: impl AsRef<[u8]>, to: impl AsRef<[u8]>) -> Result<()> {
        let mut txn = self.begin()?;
        let result = self.remove_edge_in(&mut txn, from, to);
        finish(txn, result)
    }

    /// Remove the edge `from -> to` inside a caller-owned transaction.
    ///
    /// Removing the last edge leaves an empty record rather than deleting it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `from` has no adjacency record,
    /// [`GraphError::Storage`] if the read or write fails.
    pub fn remove_edge_in<T: KvTransaction>(
        &self,
        txn: &mut T,
        from: impl AsRef<[u8]>,
        to: impl AsRef<[u8]>,
    ) -> Result<()> {
        let (from, to) = (from.as_ref(), to.as_ref());
        debug!(
            "Removing edge: from={}, to={}",
            String::from_utf8_lossy(from),
            String::from_utf8_lossy(to)
        );

        let bytes = txn.get(from)?.ok_or_else(|| GraphError::not_found(from))?;
        let mut edges = codec::decode(&bytes);

        if !edges.remove(to) {
            trace!("Edge to {} not present, nothing to remove", String::from_utf8_lossy(to));
        }
        txn.set(from, &codec::encode(&edges))
    }

    /// Get the destinations of `from` in a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `from` has no adjacency record, or
    /// [`GraphError::Storage`] for engine failures.
    pub fn get_edges(&self, from: impl AsRef<[u8]>) -> Result<EdgeSet> {
        let mut txn = self.begin_read()?;
        let result = self.get_edges_in(&mut txn, from);
        finish(txn, result)
    }

    /// Get the destinations of `from` inside a caller-owned transaction.
    ///
    /// Sees the transaction's own uncommitted edits.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `from` has no adjacency record, or
    /// [`GraphError::Storage`] if the read fails.
    pub fn get_edges_in<T: KvTransaction>(
        &self,
        txn: &mut T,
        from: impl AsRef<[u8]>,
    ) -> Result<EdgeSet> {
        let from = from.as_ref();
        let bytes = txn.get(from)?.ok_or_else(|| GraphError::not_found(from))?;
        Ok(codec::decode(&bytes))
    }

    /// Get the destinations of `from`, treating a missing record as no edges.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] for engine failures.
    pub fn neighbors(&self, from: impl AsRef<[u8]>) -> Result<EdgeSet> {
        match self.get_edges(from) {
            Err(GraphError::NotFound { .. }) => Ok(EdgeSet::new()),
            other => other,
        }
    }

    /// In-transaction form of [`neighbors`](Self::neighbors).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] for engine failures.
    pub fn neighbors_in<T: KvTransaction>(
        &self,
        txn: &mut T,
        from: impl AsRef<[u8]>,
    ) -> Result<EdgeSet> {
        match self.get_edges_in(txn, from) {
            Err(GraphError::NotFound { .. }) => Ok(EdgeSet::new()),
            other => other,
        }
    }

    /// Run `op` in a fresh read-write transaction and commit, retrying on conflict.
    ///
    /// Every attempt begins a new transaction and calls `op` from scratch, so
    /// `op` must derive everything it writes from reads made through the
    /// transaction it is given. Only [`GraphError::Conflict`] is retried, up to
    /// the store's [`RetryPolicy`]; the last conflict is returned on exhaustion.
    ///
    /// ```
    /// use adjgraph::{edge_set, GraphStore, MemoryEngine};
    ///
    /// let store = GraphStore::new(MemoryEngine::new());
    /// store.add_edge("a", "b")?;
    ///
    /// let remaining = store.update(|txn| {
    ///     store.add_edge_in(txn, "a", "c")?;
    ///     store.remove_edge_in(txn, "a", "b")?;
    ///     store.get_edges_in(txn, "a")
    /// })?;
    /// assert_eq!(remaining, edge_set(["c"]));
    /// # Ok::<(), adjgraph::GraphError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error from `op` or commit, or the last
    /// [`GraphError::Conflict`] once the retry budget is spent.
    pub fn update<'s, T, F>(&'s self, mut op: F) -> Result<T>
    where
        F: FnMut(&mut E::Transaction<'s>) -> Result<T>,
    {
        retry(self.retry_policy, GraphError::is_retryable, |attempt| {
            if attempt > 1 {
                debug!("Conflict on update, starting attempt {attempt}");
            }
            let mut txn = self.engine.begin(TxnMode::ReadWrite)?;
            let result = op(&mut txn);
            finish(txn, result)
        })
    }

    /// Run `op` in a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns any error from `op` or from the engine.
    pub fn view<'s, T, F>(&'s self, op: F) -> Result<T>
    where
        F: FnOnce(&mut E::Transaction<'s>) -> Result<T>,
    {
        let mut txn = self.engine.begin(TxnMode::ReadOnly)?;
        let result = op(&mut txn);
        finish(txn, result)
    }

    /// Flush the engine and release it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the final flush fails.
    pub fn close(self) -> Result<()> {
        info!("Closing graph store");
        self.engine.flush()
    }
}

#[cfg(feature = "rocksdb-backend")]
mod rocksdb_store {
    use super::GraphStore;
    use crate::config::StoreConfig;
    use crate::error::{GraphError, Result};
    use crate::storage::RocksDBEngine;
    use log::info;
    use std::path::Path;

    impl GraphStore<RocksDBEngine> {
        /// Open or create a persistent store at the given path.
        ///
        /// # Example
        ///
        /// ```no_run
        /// use adjgraph::GraphStore;
        ///
        /// let store = GraphStore::open("./edges.db").unwrap();
        /// store.add_edge("a", "b").unwrap();
        /// ```
        ///
        /// # Errors
        ///
        /// Returns [`GraphError::Storage`] if the database cannot be opened.
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            info!("Opening graph store at path: {:?}", path.as_ref());
            Ok(Self::new(RocksDBEngine::open(path)?))
        }

        /// Create an ephemeral store in RocksDB's in-memory environment.
        ///
        /// **Warning**: All data is lost when the store is dropped.
        ///
        /// # Errors
        ///
        /// Returns [`GraphError::Storage`] if the database cannot be created.
        pub fn in_memory() -> Result<Self> {
            info!("Opening in-memory graph store");
            Ok(Self::new(RocksDBEngine::in_memory()?))
        }

        /// Open a store as described by `config`.
        ///
        /// # Errors
        ///
        /// Returns [`GraphError::Config`] for an incomplete config, or
        /// [`GraphError::Storage`] if the database cannot be opened.
        pub fn open_with_config(config: &StoreConfig) -> Result<Self> {
            config.validate()?;

            let engine = if config.in_memory {
                RocksDBEngine::in_memory()?
            } else {
                let path = config.path.as_deref().ok_or_else(|| {
                    GraphError::config("Persistent store requires a path", None::<std::io::Error>)
                })?;
                let mut opts = rocksdb::Options::default();
                opts.create_if_missing(config.create_if_missing);
                RocksDBEngine::open_with_options(path, opts)?
            };

            Ok(Self::new(engine).with_retry_policy(config.retry_policy()))
        }
    }
}

/// Commit on success, discard on failure.
fn finish<X: KvTransaction, T>(txn: X, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            txn.commit()?;
            Ok(value)
        }
        Err(err) => {
            txn.discard();
            Err(err)
        }
    }
}
