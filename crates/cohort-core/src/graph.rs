//! # Relationship Graphs
//!
//! The deterministic graph storage for the Cohort engine.
//!
//! Two shapes are kept: the `DirectedGraph` that mirrors who chose whom, and
//! the `UndirectedGraph` the search runs on, where both directions of a pair
//! are merged into one edge. Both implement `WeightedEdges` so the evaluator
//! can score a partition against either.
//!
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::{EdgeWeight, PersonId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// WEIGHTEDEDGES TRAIT
// =============================================================================

/// Read access shared by every graph shape.
///
/// Edges are yielded once each, in deterministic order. For undirected graphs
/// the endpoints of an edge are yielded as `(low, high)`.
pub trait WeightedEdges {
    /// All nodes in ascending id order.
    fn node_ids(&self) -> impl Iterator<Item = PersonId> + '_;

    /// All edges with their weights.
    fn weighted_edges(&self) -> impl Iterator<Item = (PersonId, PersonId, EdgeWeight)> + '_;

    /// Sum of every edge weight (saturating).
    fn total_weight(&self) -> i64 {
        self.weighted_edges()
            .fold(0i64, |acc, (_, _, w)| acc.saturating_add(w.value()))
    }
}

// =============================================================================
// DIRECTED GRAPH
// =============================================================================

/// Who-chose-whom graph built from preference records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectedGraph {
    /// Every person mentioned as chooser or as choice.
    nodes: BTreeSet<PersonId>,

    /// Adjacency list: from -> (to -> weight)
    outgoing: BTreeMap<PersonId, BTreeMap<PersonId, EdgeWeight>>,
}

impl DirectedGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node without edges.
    pub fn insert_node(&mut self, person: PersonId) {
        self.nodes.insert(person);
    }

    /// Add `weight` to the edge `from -> to`, creating it (and both nodes)
    /// when missing. Repeated calls accumulate, they never overwrite.
    pub fn add_edge(&mut self, from: PersonId, to: PersonId, weight: EdgeWeight) {
        self.nodes.insert(from);
        self.nodes.insert(to);
        let slot = self
            .outgoing
            .entry(from)
            .or_default()
            .entry(to)
            .or_default();
        *slot = slot.accumulate(weight);
    }

    /// Multiply an existing edge's weight. Returns `false` if the edge is
    /// missing or its weight did not change.
    pub fn scale_edge(&mut self, from: PersonId, to: PersonId, multiplier: i64) -> bool {
        let Some(slot) = self.outgoing.get_mut(&from).and_then(|t| t.get_mut(&to)) else {
            return false;
        };
        let scaled = slot.scaled(multiplier);
        let changed = scaled != *slot;
        *slot = scaled;
        changed
    }

    /// Weight of `from -> to`.
    #[must_use]
    pub fn edge(&self, from: PersonId, to: PersonId) -> Option<EdgeWeight> {
        self.outgoing.get(&from)?.get(&to).copied()
    }

    /// Outgoing edges of a node.
    pub fn successors(&self, node: PersonId) -> impl Iterator<Item = (PersonId, EdgeWeight)> + '_ {
        self.outgoing
            .get(&node)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(k, v)| (*k, *v)))
    }

    /// Number of edges pointing at each node (every node present, zero
    /// included). Counts edges, not weight.
    #[must_use]
    pub fn in_degrees(&self) -> BTreeMap<PersonId, usize> {
        let mut degrees: BTreeMap<PersonId, usize> =
            self.nodes.iter().map(|n| (*n, 0usize)).collect();
        for targets in self.outgoing.values() {
            for to in targets.keys() {
                if let Some(count) = degrees.get_mut(to) {
                    *count = count.saturating_add(1);
                }
            }
        }
        degrees
    }

    /// Check if the graph contains a node.
    #[must_use]
    pub fn contains_node(&self, person: PersonId) -> bool {
        self.nodes.contains(&person)
    }

    /// Total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(BTreeMap::len).sum()
    }
}

impl WeightedEdges for DirectedGraph {
    fn node_ids(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.nodes.iter().copied()
    }

    fn weighted_edges(&self) -> impl Iterator<Item = (PersonId, PersonId, EdgeWeight)> + '_ {
        self.outgoing.iter().flat_map(|(from, targets)| {
            targets
                .iter()
                .map(move |(to, weight)| (*from, *to, *weight))
        })
    }
}

// =============================================================================
// UNDIRECTED GRAPH
// =============================================================================

/// Symmetric affinity graph the search runs on.
///
/// The adjacency map is kept symmetric: `u -> v` and `v -> u` always carry the
/// same weight. A self-loop is stored once under its own node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UndirectedGraph {
    nodes: BTreeSet<PersonId>,
    adjacency: BTreeMap<PersonId, BTreeMap<PersonId, EdgeWeight>>,
}

impl UndirectedGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the edge `{a, b}`, accumulating.
    pub fn add_edge(&mut self, a: PersonId, b: PersonId, weight: EdgeWeight) {
        self.nodes.insert(a);
        self.nodes.insert(b);

        let forward = self.adjacency.entry(a).or_default().entry(b).or_default();
        *forward = forward.accumulate(weight);
        let merged = *forward;

        if a != b {
            self.adjacency.entry(b).or_default().insert(a, merged);
        }
    }

    /// Weight of `{a, b}`, in either orientation.
    #[must_use]
    pub fn weight_between(&self, a: PersonId, b: PersonId) -> Option<EdgeWeight> {
        self.adjacency.get(&a)?.get(&b).copied()
    }

    /// Whether `{a, b}` carries positive weight.
    #[must_use]
    pub fn has_affinity(&self, a: PersonId, b: PersonId) -> bool {
        self.weight_between(a, b).is_some_and(EdgeWeight::is_positive)
    }

    /// Neighbors of a node with edge weights.
    pub fn neighbors(&self, node: PersonId) -> impl Iterator<Item = (PersonId, EdgeWeight)> + '_ {
        self.adjacency
            .get(&node)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(k, v)| (*k, *v)))
    }

    /// Sum of the weights of all edges incident to `node`.
    #[must_use]
    pub fn weighted_degree(&self, node: PersonId) -> i64 {
        self.neighbors(node)
            .fold(0i64, |acc, (_, w)| acc.saturating_add(w.value()))
    }

    /// Check if the graph contains a node.
    #[must_use]
    pub fn contains_node(&self, person: PersonId) -> bool {
        self.nodes.contains(&person)
    }

    /// Total number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of undirected edges (self-loops included).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.weighted_edges().count()
    }
}

impl WeightedEdges for UndirectedGraph {
    fn node_ids(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.nodes.iter().copied()
    }

    fn weighted_edges(&self) -> impl Iterator<Item = (PersonId, PersonId, EdgeWeight)> + '_ {
        self.adjacency.iter().flat_map(|(a, targets)| {
            targets
                .range(*a..)
                .map(move |(b, weight)| (*a, *b, *weight))
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
