//! Basic usage example for adjgraph
//!
//! This example demonstrates:
//! - Building adjacency records with single-shot edits
//! - Reading a node's neighbors
//! - Two threads editing in their own transactions, retried on conflict

use adjgraph::{GraphStore, Result};
use std::thread;

fn show(label: &str, edges: &adjgraph::EdgeSet) {
    let names: Vec<_> = edges.iter().map(|n| String::from_utf8_lossy(n)).collect();
    println!("{label}: {names:?}");
}

fn main() -> Result<()> {
    env_logger::init();

    // Ephemeral store (use GraphStore::open(path) for a persistent one)
    let store = GraphStore::in_memory()?;

    store.add_edge("a", "b")?;
    store.add_edge("a", "c")?;
    store.add_edge("c", "d")?;
    store.add_edge("c", "e")?;

    show("Neighbors of a", &store.get_edges("a")?);
    show("Neighbors of c", &store.get_edges("c")?);

    println!("\nEditing concurrently...");
    thread::scope(|s| -> Result<()> {
        let first = s.spawn(|| {
            store.update(|txn| {
                store.remove_edge_in(txn, "a", "b")?;
                store.get_edges_in(txn, "a")
            })
        });
        let second = s.spawn(|| {
            store.update(|txn| {
                store.remove_edge_in(txn, "c", "e")?;
                store.get_edges_in(txn, "c")
            })
        });

        show("[first] neighbors of a", &first.join().expect("first editor panicked")?);
        show("[second] neighbors of c", &second.join().expect("second editor panicked")?);
        Ok(())
    })?;

    println!();
    show("Neighbors of a", &store.get_edges("a")?);
    show("Neighbors of c", &store.get_edges("c")?);

    store.close()
}
