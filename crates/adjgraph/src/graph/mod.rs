//! Core graph types and operations.
//!
//! This module defines the fundamental building blocks:
//! - [`NodeId`] and [`EdgeSet`]: identifiers and decoded adjacency records
//! - [`GraphStore`]: edge mutation and neighbor lookup over a transactional engine

mod store;
mod types;

pub use store::GraphStore;
pub use types::{edge_set, EdgeSet, NodeId};
