//! # Graph Builder
//!
//! Converts ranked preference records into relationship graphs.
//!
//! - One directed edge per (person, rank) with the rank's weight
//! - Repeated directed edges accumulate
//! - Undirected graph merges both directions of a pair by summation
//! - No validation: records are assumed to be clean (see `roster`)

use crate::graph::{DirectedGraph, UndirectedGraph, WeightedEdges};
use crate::PreferenceRecord;

/// Build the who-chose-whom graph.
///
/// Every person and every choice becomes a node. For each record the edges
/// `person -> first (3)`, `person -> second (2)` and `person -> third (1)` are
/// added.
#[must_use]
pub fn build_directed(records: &[PreferenceRecord]) -> DirectedGraph {
    let mut graph = DirectedGraph::new();
    for record in records {
        graph.insert_node(record.person);
        for (choice, rank) in record.ranked_choices() {
            graph.add_edge(record.person, choice, rank.weight());
        }
    }
    graph
}

/// Collapse a directed graph into the symmetric graph used by the search.
///
/// If both `u -> v` and `v -> u` exist their weights are summed into one edge;
/// otherwise the single direction's weight is kept. No weight is dropped or
/// doubled, so `total_weight` is preserved.
#[must_use]
pub fn build_undirected(directed: &DirectedGraph) -> UndirectedGraph {
    let mut graph = UndirectedGraph::new();
    for (from, to, weight) in directed.weighted_edges() {
        graph.add_edge(from, to, weight);
    }
    graph
}

// =============================================================================
// TESTS
// =============================================================================
