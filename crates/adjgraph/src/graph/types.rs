//! Core graph types: node identifiers and adjacency sets.

use std::collections::BTreeSet;

/// Opaque node identifier.
///
/// Doubles as the storage key of the node's adjacency record and as a member
/// of other nodes' edge sets. No length or character restrictions apply.
pub type NodeId = Vec<u8>;

/// Destinations reachable by one outgoing edge from a source node.
///
/// Ordered only so that encoding is deterministic; the order carries no meaning.
pub type EdgeSet = BTreeSet<NodeId>;

/// Build an [`EdgeSet`] from anything byte-like.
///
/// ```
/// use adjgraph::edge_set;
///
/// let set = edge_set(["b", "c"]);
/// assert!(set.contains(b"b".as_slice()));
/// assert_eq!(set.len(), 2);
/// ```
pub fn edge_set<I, T>(members: I) -> EdgeSet
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    members.into_iter().map(|m| m.as_ref().to_vec()).collect()
}
