//! # adjgraph
//!
//! A directed-graph adjacency store on top of a transactional key-value engine.
//!
//! ## Core Principles
//!
//! - **One record per source**: a node's outgoing edges are a single encoded set
//!   stored under the node's identifier
//! - **Optimistic concurrency**: no locks in the store; the engine validates each
//!   transaction at commit and reports conflicts
//! - **Explicit transactions**: every operation has a self-committing form and a
//!   form that composes inside a caller-owned transaction
//! - **Bounded retry**: conflicts are retried from scratch, a fixed number of times
//!
//! ## Architecture
//!
//! ```text
//! Callers
//!     ↓
//! GraphStore (add_edge / remove_edge / get_edges, update / view)
//!     ↓                       ↓
//! Edge-set codec        Retry combinator
//!     ↓
//! Storage engine (RocksDB optimistic transactions, memory)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use adjgraph::{edge_set, GraphStore, MemoryEngine};
//!
//! let store = GraphStore::new(MemoryEngine::new());
//! store.add_edge("a", "b")?;
//! store.add_edge("a", "c")?;
//! assert_eq!(store.get_edges("a")?, edge_set(["b", "c"]));
//!
//! // Several edits, one atomic commit, retried on conflict
//! store.update(|txn| {
//!     store.remove_edge_in(txn, "a", "b")?;
//!     store.add_edge_in(txn, "c", "a")
//! })?;
//! assert_eq!(store.get_edges("a")?, edge_set(["c"]));
//! # Ok::<(), adjgraph::GraphError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod graph;
pub mod retry;
pub mod storage;

// Re-export main types
pub use config::StoreConfig;
pub use error::{GraphError, Result};
pub use graph::{edge_set, EdgeSet, GraphStore, NodeId};
pub use retry::RetryPolicy;
pub use storage::{KvEngine, KvTransaction, MemoryEngine, TxnMode};
#[cfg(feature = "rocksdb-backend")]
pub use storage::RocksDBEngine;
