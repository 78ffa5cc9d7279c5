//! # Partition Search
//!
//! Backtracking search for the size-constrained partition with the largest
//! intra-group weight.
//!
//! ## Algorithm
//!
//! 1. Nodes are visited in descending weighted degree (ties: ascending id).
//! 2. Each node is tried in every group that still has capacity, in group
//!    order. An empty group always accepts; an occupied group accepts only a
//!    node with a positive-weight edge to one of its members.
//! 3. Placements are undone on the way back up so sibling branches see a
//!    clean state.
//! 4. Every complete assignment is scored; the best is replaced only on a
//!    strictly larger intra weight, so the first one found wins ties.
//!
//! No bound beyond rule 2 prunes the tree. The cost is exponential in the
//! population size and only meant for rosters of tens of people.

use crate::evaluator;
use crate::graph::{UndirectedGraph, WeightedEdges};
use crate::{CohortError, Partition, PersonId, Score, TargetSizes};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// INTERRUPT
// =============================================================================

/// Cooperative cancellation flag shared between a host and a running search.
///
/// The search checks the flag before every placement and unwinds with
/// `CohortError::SearchInterrupted` once it is raised.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Create a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every search holding a clone of this flag to stop.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the flag has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Counters describing how much of the tree a search explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Placements attempted (nodes entering a group).
    pub placements: u64,
    /// Complete assignments reached and scored.
    pub complete_assignments: u64,
    /// Times the best-so-far was replaced.
    pub improvements: u64,
}

/// Best partition found by a search, with its score on the searched graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub partition: Partition,
    pub score: Score,
    pub stats: SearchStats,
}

// =============================================================================
// OPTIMIZER
// =============================================================================

/// Entry point for the search, optionally wired to an `Interrupt`.
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    interrupt: Option<Interrupt>,
}

impl Optimizer {
    /// Optimizer with no cancellation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation flag.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Find the partition of `graph` into groups of `sizes` that maximizes
    /// intra-group weight.
    ///
    /// # Errors
    /// - `TargetSizeMismatch` if the sizes do not add up to the node count
    /// - `NoFeasiblePartition` if affinity pruning rules out every assignment
    /// - `SearchInterrupted` if the interrupt flag was raised
    pub fn optimize(
        &self,
        graph: &UndirectedGraph,
        sizes: &TargetSizes,
    ) -> Result<Solution, CohortError> {
        if sizes.total() != graph.node_count() {
            return Err(CohortError::TargetSizeMismatch {
                expected: sizes.total(),
                actual: graph.node_count(),
            });
        }

        let mut state = SearchState {
            graph,
            capacities: sizes.as_slice(),
            order: visit_order(graph),
            groups: vec![Vec::new(); sizes.group_count()],
            best: None,
            stats: SearchStats::default(),
            interrupt: self.interrupt.as_ref(),
        };

        state.descend(0)?;

        let stats = state.stats;
        state
            .best
            .map(|(partition, score)| Solution {
                partition,
                score,
                stats,
            })
            .ok_or(CohortError::NoFeasiblePartition)
    }
}

/// Run the search without cancellation.
pub fn optimize(graph: &UndirectedGraph, sizes: &TargetSizes) -> Result<Solution, CohortError> {
    Optimizer::new().optimize(graph, sizes)
}

/// Well-connected nodes first: they are the most constrained by partial
/// assignments.
fn visit_order(graph: &UndirectedGraph) -> Vec<PersonId> {
    let mut order: Vec<(Reverse<i64>, PersonId)> = graph
        .node_ids()
        .map(|node| (Reverse(graph.weighted_degree(node)), node))
        .collect();
    order.sort();
    order.into_iter().map(|(_, node)| node).collect()
}

// =============================================================================
// SEARCH STATE
// =============================================================================

/// Mutable state of one search, owned by the call that started it.
struct SearchState<'a> {
    graph: &'a UndirectedGraph,
    capacities: &'a [usize],
    order: Vec<PersonId>,
    /// Partial assignment: members of each group in placement order.
    groups: Vec<Vec<PersonId>>,
    best: Option<(Partition, Score)>,
    stats: SearchStats,
    interrupt: Option<&'a Interrupt>,
}

impl SearchState<'_> {
    fn descend(&mut self, depth: usize) -> Result<(), CohortError> {
        if self.interrupt.is_some_and(Interrupt::is_raised) {
            return Err(CohortError::SearchInterrupted);
        }

        let Some(&node) = self.order.get(depth) else {
            self.record_complete();
            return Ok(());
        };

        for index in 0..self.groups.len() {
            if !self.can_place(node, index) {
                continue;
            }

            self.groups[index].push(node);
            self.stats.placements = self.stats.placements.saturating_add(1);

            let outcome = self.descend(depth.saturating_add(1));

            self.groups[index].pop();
            outcome?;
        }

        Ok(())
    }

    /// Capacity left, and either an empty group or an affinity to a member.
    fn can_place(&self, node: PersonId, index: usize) -> bool {
        let (Some(members), Some(&capacity)) = (self.groups.get(index), self.capacities.get(index))
        else {
            return false;
        };
        if members.len() >= capacity {
            return false;
        }
        members.is_empty()
            || members
                .iter()
                .any(|member| self.graph.has_affinity(node, *member))
    }

    fn record_complete(&mut self) {
        self.stats.complete_assignments = self.stats.complete_assignments.saturating_add(1);

        let partition = Partition::from_groups(
            self.groups
                .iter()
                .map(|members| members.iter().copied().collect::<BTreeSet<_>>())
                .collect(),
        );
        let score = evaluator::score(&partition, self.graph);

        let improves = self
            .best
            .as_ref()
            .is_none_or(|(_, best)| score.intra > best.intra);
        if improves {
            self.stats.improvements = self.stats.improvements.saturating_add(1);
            self.best = Some((partition, score));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
