//! # cohort-core
//!
//! The deterministic partition engine for Cohort - THE LOGIC.
//!
//! Turns ranked preference records ("I would like to be with A, then B, then
//! C") into a weighted relationship graph and searches for the grouping of
//! fixed sizes that keeps the most preference weight inside groups.
//!
//! ## Pipeline
//!
//! - `builder`: records -> directed graph -> undirected graph
//! - `search`: backtracking search with affinity pruning
//! - `evaluator`: intra/inter weight of a partition
//! - `reweight`: minority / isolation boosts with bounded re-solving
//! - `palette`: colour labels for groups
//! - `roster` and `planner`: validation and per-population orchestration
//!
//! ## Architectural Constraints
//!
//! - Integer weights only, `BTreeMap`/`BTreeSet` only: same input, same output
//! - No async, no I/O, no logging (callers log the returned statistics)
//! - Every engine call is a pure function of (graph, target sizes, mode)

// =============================================================================
// MODULES
// =============================================================================

pub mod builder;
pub mod evaluator;
pub mod graph;
pub mod palette;
pub mod planner;
pub mod primitives;
pub mod reweight;
pub mod roster;
pub mod search;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use types::{
    CohortError, EdgeWeight, Partition, PersonId, PreferenceRecord, Rank, Score, TargetSizes,
};

pub use builder::{build_directed, build_undirected};
pub use evaluator::score;
pub use graph::{DirectedGraph, UndirectedGraph, WeightedEdges};
pub use palette::{Color, PALETTE, colors};
pub use planner::{FairnessOutcome, Placement, Plan, Planner, PopulationOutcome, PopulationPlan};
pub use reweight::{FairnessController, FairnessMode, Reweighted, UnchangedReason};
pub use roster::{
    PopulationRange, PopulationSpec, Roster, ValidationIssue, ValidationReport, parse_target_sizes,
};
pub use search::{Interrupt, Optimizer, SearchStats, Solution, optimize};
