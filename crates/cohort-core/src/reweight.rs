//! # Fairness Re-weighting
//!
//! A bounded perturb-and-re-solve loop that nudges the search toward people
//! the primary optimum tends to leave behind.
//!
//! - `MinorityBoost`: outgoing edges from members of the smallest group(s)
//!   toward people outside that group are multiplied.
//! - `IsolationBoost`: outgoing edges of the least-chosen people (minimum
//!   in-degree) are multiplied.
//!
//! The multiplier starts at `BOOST_START_MULTIPLIER`, grows by `BOOST_STEP`
//! per round and the loop gives up after `MAX_BOOST_ROUNDS`. The first round
//! whose re-solved partition differs from the baseline wins. The two modes are
//! never mixed in one run and the multiplier never decreases.

use crate::builder::build_undirected;
use crate::graph::DirectedGraph;
use crate::primitives::{BOOST_START_MULTIPLIER, BOOST_STEP, MAX_BOOST_ROUNDS};
use crate::search::Optimizer;
use crate::{CohortError, Partition, PersonId, TargetSizes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// MODES & RESULTS
// =============================================================================

/// Which objective the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairnessMode {
    /// Plain intra-weight maximization, no re-weighting.
    #[default]
    Primary,
    /// Favor members of the smallest group(s).
    MinorityBoost,
    /// Favor the people chosen least often.
    IsolationBoost,
}

/// Why the controller kept the baseline partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnchangedReason {
    /// The mode was `Primary`; nothing was attempted.
    NotRequested,
    /// The boost set was empty, so the graph could not change.
    NothingToBoost,
    /// Every round re-solved to the baseline (or to nothing).
    Exhausted { rounds: usize },
}

/// Outcome of a re-weighting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reweighted {
    /// A round produced a partition different from the baseline.
    Improved {
        partition: Partition,
        multiplier: i64,
        rounds: usize,
    },
    /// The baseline stands.
    Unchanged(UnchangedReason),
}

impl Reweighted {
    /// The partition to use: the improved one, or `baseline`.
    #[must_use]
    pub fn resolve<'a>(&'a self, baseline: &'a Partition) -> &'a Partition {
        match self {
            Reweighted::Improved { partition, .. } => partition,
            Reweighted::Unchanged(_) => baseline,
        }
    }
}

// =============================================================================
// GRAPH PERTURBATIONS
// =============================================================================

/// Multiply every edge leaving a smallest group toward someone outside it.
///
/// If every group has the same size there is no minority and the graph is
/// returned unchanged.
#[must_use]
pub fn boost_smallest_groups(
    directed: &DirectedGraph,
    partition: &Partition,
    multiplier: i64,
) -> DirectedGraph {
    let mut boosted = directed.clone();

    let sizes = partition.sizes();
    let Some(&smallest) = sizes.iter().min() else {
        return boosted;
    };
    let minority: Vec<&BTreeSet<PersonId>> = partition
        .groups()
        .iter()
        .filter(|members| members.len() == smallest)
        .collect();
    if minority.len() == partition.group_count() {
        return boosted;
    }

    for members in minority {
        for &member in members {
            let outward: Vec<PersonId> = directed
                .successors(member)
                .map(|(to, _)| to)
                .filter(|to| !members.contains(to))
                .collect();
            for to in outward {
                boosted.scale_edge(member, to, multiplier);
            }
        }
    }

    boosted
}

/// Multiply every outgoing edge of the people with the lowest in-degree.
///
/// If everyone is chosen equally often the graph is returned unchanged.
#[must_use]
pub fn boost_least_chosen(directed: &DirectedGraph, multiplier: i64) -> DirectedGraph {
    let mut boosted = directed.clone();

    let in_degrees = directed.in_degrees();
    let (Some(&lowest), Some(&highest)) = (in_degrees.values().min(), in_degrees.values().max())
    else {
        return boosted;
    };
    if lowest == highest {
        return boosted;
    }

    for (&person, _) in in_degrees.iter().filter(|(_, d)| **d == lowest) {
        let targets: Vec<PersonId> = directed.successors(person).map(|(to, _)| to).collect();
        for to in targets {
            boosted.scale_edge(person, to, multiplier);
        }
    }

    boosted
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Runs the re-weighting loop for one population.
#[derive(Debug, Clone)]
pub struct FairnessController {
    mode: FairnessMode,
    optimizer: Optimizer,
    start_multiplier: i64,
    step: i64,
    max_rounds: usize,
}

impl FairnessController {
    /// Controller with the default boost schedule.
    #[must_use]
    pub fn new(mode: FairnessMode) -> Self {
        Self {
            mode,
            optimizer: Optimizer::new(),
            start_multiplier: BOOST_START_MULTIPLIER,
            step: BOOST_STEP,
            max_rounds: MAX_BOOST_ROUNDS,
        }
    }

    /// Use a specific optimizer (e.g. one wired to an interrupt).
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Override the boost schedule: first multiplier, growth per round, and
    /// the round limit.
    #[must_use]
    pub fn with_schedule(mut self, start_multiplier: i64, step: i64, max_rounds: usize) -> Self {
        self.start_multiplier = start_multiplier;
        self.step = step;
        self.max_rounds = max_rounds;
        self
    }

    /// The mode this controller runs.
    #[must_use]
    pub fn mode(&self) -> FairnessMode {
        self.mode
    }

    /// Re-weight `directed`, re-solve, and report whether the partition moved
    /// away from `baseline`.
    ///
    /// A round whose boosted graph has no feasible partition counts as a round
    /// that did not move; the loop carries on with a larger multiplier.
    ///
    /// # Errors
    /// Propagates `SearchInterrupted` and `TargetSizeMismatch` from the search.
    pub fn rebalance(
        &self,
        directed: &DirectedGraph,
        sizes: &TargetSizes,
        baseline: &Partition,
    ) -> Result<Reweighted, CohortError> {
        if self.mode == FairnessMode::Primary {
            return Ok(Reweighted::Unchanged(UnchangedReason::NotRequested));
        }

        let mut multiplier = self.start_multiplier;
        for round in 1..=self.max_rounds {
            let boosted = match self.mode {
                FairnessMode::MinorityBoost => boost_smallest_groups(directed, baseline, multiplier),
                FairnessMode::IsolationBoost => boost_least_chosen(directed, multiplier),
                FairnessMode::Primary => directed.clone(),
            };

            if boosted == *directed {
                return Ok(Reweighted::Unchanged(UnchangedReason::NothingToBoost));
            }

            match self.optimizer.optimize(&build_undirected(&boosted), sizes) {
                Ok(solution) if solution.partition != *baseline => {
                    return Ok(Reweighted::Improved {
                        partition: solution.partition,
                        multiplier,
                        rounds: round,
                    });
                }
                Ok(_) | Err(CohortError::NoFeasiblePartition) => {}
                Err(e) => return Err(e),
            }

            multiplier = multiplier.saturating_add(self.step);
        }

        Ok(Reweighted::Unchanged(UnchangedReason::Exhausted {
            rounds: self.max_rounds,
        }))
    }
}

// =============================================================================
// TESTS
// =============================================================================
