//! # Planner
//!
//! Runs the whole pipeline for every population of a roster:
//!
//! ```text
//! validate -> split by range -> build graphs -> optimize
//!          -> fairness re-weighting (optional) -> score -> colour
//! ```
//!
//! Each population is solved independently. A population without a feasible
//! partition is reported as such; the others are still grouped. Interruption
//! aborts the whole plan.

use crate::builder::{build_directed, build_undirected};
use crate::evaluator;
use crate::palette::{self, Color};
use crate::reweight::{FairnessController, FairnessMode, Reweighted, UnchangedReason};
use crate::roster::{PopulationSpec, Roster};
use crate::search::{Interrupt, Optimizer, SearchStats};
use crate::{CohortError, Partition, PersonId, Score, TargetSizes};
use serde::Serialize;

// =============================================================================
// PLAN TYPES
// =============================================================================

/// What the fairness step did for one population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FairnessOutcome {
    NotRequested,
    NothingToBoost,
    Exhausted { rounds: usize },
    Improved { multiplier: i64, rounds: usize },
}

impl From<&Reweighted> for FairnessOutcome {
    fn from(result: &Reweighted) -> Self {
        match result {
            Reweighted::Improved {
                multiplier, rounds, ..
            } => Self::Improved {
                multiplier: *multiplier,
                rounds: *rounds,
            },
            Reweighted::Unchanged(UnchangedReason::NotRequested) => Self::NotRequested,
            Reweighted::Unchanged(UnchangedReason::NothingToBoost) => Self::NothingToBoost,
            Reweighted::Unchanged(UnchangedReason::Exhausted { rounds }) => {
                Self::Exhausted { rounds: *rounds }
            }
        }
    }
}

/// A grouped population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulationPlan {
    pub name: String,
    pub sizes: TargetSizes,
    pub partition: Partition,
    /// Score of `partition` on the unboosted graph.
    pub score: Score,
    /// One colour per group, in group order.
    pub colors: Vec<Color>,
    pub fairness: FairnessOutcome,
    /// Statistics of the primary search.
    pub stats: SearchStats,
}

/// Result for one population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PopulationOutcome {
    Grouped(PopulationPlan),
    Infeasible { name: String, sizes: TargetSizes },
}

impl PopulationOutcome {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Grouped(plan) => &plan.name,
            Self::Infeasible { name, .. } => name,
        }
    }

    #[must_use]
    pub fn grouped(&self) -> Option<&PopulationPlan> {
        match self {
            Self::Grouped(plan) => Some(plan),
            Self::Infeasible { .. } => None,
        }
    }
}

/// Where one person ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub person: PersonId,
    pub population: String,
    /// Zero-based group index within the population.
    pub group: usize,
    pub color: Color,
}

/// Outcome of planning a whole roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub mode: FairnessMode,
    pub populations: Vec<PopulationOutcome>,
}

impl Plan {
    /// True when every population was grouped.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.populations
            .iter()
            .all(|outcome| outcome.grouped().is_some())
    }

    /// Group and colour of `person`, if they were grouped.
    #[must_use]
    pub fn lookup(&self, person: PersonId) -> Option<Placement> {
        self.populations
            .iter()
            .filter_map(PopulationOutcome::grouped)
            .find_map(|plan| placement_in(plan, person))
    }

    /// Every grouped person, ordered by id.
    #[must_use]
    pub fn placements(&self) -> Vec<Placement> {
        let mut all: Vec<Placement> = self
            .populations
            .iter()
            .filter_map(PopulationOutcome::grouped)
            .flat_map(|plan| {
                plan.partition
                    .assignment()
                    .into_keys()
                    .filter_map(move |person| placement_in(plan, person))
            })
            .collect();
        all.sort_by_key(|placement| placement.person);
        all
    }
}

fn placement_in(plan: &PopulationPlan, person: PersonId) -> Option<Placement> {
    let group = plan.partition.group_of(person)?;
    let color = plan.colors.get(group).copied()?;
    Some(Placement {
        person,
        population: plan.name.clone(),
        group,
        color,
    })
}

// =============================================================================
// PLANNER
// =============================================================================

/// Plans rosters with one fairness mode.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    mode: FairnessMode,
    optimizer: Optimizer,
}

impl Planner {
    #[must_use]
    pub fn new(mode: FairnessMode) -> Self {
        Self {
            mode,
            optimizer: Optimizer::new(),
        }
    }

    /// Stop every search of this planner once `interrupt` is raised.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.optimizer = self.optimizer.with_interrupt(interrupt);
        self
    }

    /// Validate `roster` and group each population.
    ///
    /// # Errors
    /// - `InvalidRoster` when validation reports any issue
    /// - `SearchInterrupted` when the interrupt was raised mid-plan
    pub fn plan(&self, roster: &Roster, populations: &[PopulationSpec]) -> Result<Plan, CohortError> {
        roster.validate(populations).into_result()?;

        let group_counts: Vec<usize> = populations
            .iter()
            .map(|spec| spec.sizes.group_count())
            .collect();
        let palettes = palette::assign(&group_counts);

        let outcomes = populations
            .iter()
            .zip(palettes)
            .map(|(spec, colors)| match self.plan_population(roster, spec, colors) {
                Ok(plan) => Ok(PopulationOutcome::Grouped(plan)),
                Err(CohortError::NoFeasiblePartition) => Ok(PopulationOutcome::Infeasible {
                    name: spec.name.clone(),
                    sizes: spec.sizes.clone(),
                }),
                Err(e) => Err(e),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Plan {
            mode: self.mode,
            populations: outcomes,
        })
    }

    fn plan_population(
        &self,
        roster: &Roster,
        spec: &PopulationSpec,
        colors: Vec<Color>,
    ) -> Result<PopulationPlan, CohortError> {
        let directed = build_directed(&roster.population(spec.range));
        let undirected = build_undirected(&directed);

        let baseline = self.optimizer.optimize(&undirected, &spec.sizes)?;

        let reweighted = FairnessController::new(self.mode)
            .with_optimizer(self.optimizer.clone())
            .rebalance(&directed, &spec.sizes, &baseline.partition)?;

        let partition = reweighted.resolve(&baseline.partition).clone();
        let score = evaluator::score(&partition, &undirected);

        Ok(PopulationPlan {
            name: spec.name.clone(),
            sizes: spec.sizes.clone(),
            partition,
            score,
            colors,
            fairness: FairnessOutcome::from(&reweighted),
            stats: baseline.stats,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{PopulationRange, parse_target_sizes};
    use crate::PreferenceRecord;

    fn spec(name: &str, start: u64, end: u64, sizes: &str) -> PopulationSpec {
        PopulationSpec::new(
            name,
            PopulationRange::new(start, end),
            parse_target_sizes(sizes).expect("sizes"),
        )
    }

    fn roster() -> Roster {
        Roster::new(vec![
            PreferenceRecord::new(1, 2, 3, 4),
            PreferenceRecord::new(2, 1, 3, 4),
            PreferenceRecord::new(3, 4, 1, 2),
            PreferenceRecord::new(4, 3, 1, 2),
            PreferenceRecord::new(21, 22, 23, 24),
            PreferenceRecord::new(22, 21, 23, 24),
            PreferenceRecord::new(23, 24, 21, 22),
            PreferenceRecord::new(24, 23, 21, 22),
        ])
    }

    #[test]
    fn plans_every_population() {
        let plan = Planner::new(FairnessMode::Primary)
            .plan(&roster(), &[spec("a", 1, 4, "2, 2"), spec("b", 21, 24, "2, 2")])
            .expect("plan");

        assert!(plan.is_complete());
        let first = plan.populations[0].grouped().expect("grouped");
        assert_eq!(first.fairness, FairnessOutcome::NotRequested);
        assert_eq!(first.score, Score { intra: 12, inter: 12 });

        let one = plan.lookup(PersonId(1)).expect("placed");
        let two = plan.lookup(PersonId(2)).expect("placed");
        assert_eq!(one.group, two.group);
        assert_eq!(one.population, "a");
    }

    #[test]
    fn populations_never_share_colours() {
        let plan = Planner::new(FairnessMode::Primary)
            .plan(&roster(), &[spec("a", 1, 4, "2, 2"), spec("b", 21, 24, "2, 2")])
            .expect("plan");

        let a = plan.lookup(PersonId(1)).expect("a").color;
        let b = plan.lookup(PersonId(21)).expect("b").color;
        assert_ne!(a, b);
        assert_eq!(plan.placements().len(), 8);
        assert!(plan.placements().windows(2).all(|w| w[0].person < w[1].person));
    }

    #[test]
    fn invalid_roster_is_not_planned() {
        let err = Planner::new(FairnessMode::Primary)
            .plan(&roster(), &[spec("a", 1, 4, "3, 2"), spec("b", 21, 24, "2, 2")])
            .expect_err("invalid");
        assert!(matches!(err, CohortError::InvalidRoster(_)));
    }

    #[test]
    fn infeasible_population_does_not_abort_the_other() {
        // In "a" nobody reaches across the two pairs, so one group of four
        // cannot be built.
        let records = vec![
            PreferenceRecord::new(1, 2, 2, 2),
            PreferenceRecord::new(2, 1, 1, 1),
            PreferenceRecord::new(3, 4, 4, 4),
            PreferenceRecord::new(4, 3, 3, 3),
            PreferenceRecord::new(21, 22, 23, 24),
            PreferenceRecord::new(22, 21, 23, 24),
            PreferenceRecord::new(23, 24, 21, 22),
            PreferenceRecord::new(24, 23, 21, 22),
        ];
        let plan = Planner::new(FairnessMode::Primary)
            .plan(
                &Roster::new(records),
                &[spec("a", 1, 4, "4"), spec("b", 21, 24, "2, 2")],
            )
            .expect("plan");

        assert!(!plan.is_complete());
        assert!(matches!(
            &plan.populations[0],
            PopulationOutcome::Infeasible { name, .. } if name == "a"
        ));
        assert!(plan.populations[1].grouped().is_some());
        assert!(plan.lookup(PersonId(1)).is_none());
    }

    #[test]
    fn minority_mode_on_equal_groups_keeps_baseline() {
        let plan = Planner::new(FairnessMode::MinorityBoost)
            .plan(&roster(), &[spec("a", 1, 4, "2, 2"), spec("b", 21, 24, "2, 2")])
            .expect("plan");

        for outcome in &plan.populations {
            let grouped = outcome.grouped().expect("grouped");
            assert_eq!(grouped.fairness, FairnessOutcome::NothingToBoost);
        }
    }

    #[test]
    fn raised_interrupt_aborts_plan() {
        let interrupt = Interrupt::new();
        interrupt.raise();
        let err = Planner::new(FairnessMode::Primary)
            .with_interrupt(interrupt)
            .plan(&roster(), &[spec("a", 1, 4, "2, 2"), spec("b", 21, 24, "2, 2")])
            .expect_err("interrupted");
        assert_eq!(err, CohortError::SearchInterrupted);
    }

    #[test]
    fn plan_serializes_outcome_tags() {
        let plan = Planner::new(FairnessMode::IsolationBoost)
            .plan(&roster(), &[spec("a", 1, 4, "2, 2"), spec("b", 21, 24, "2, 2")])
            .expect("plan");
        let json = serde_json::to_value(&plan).expect("serialize");

        assert_eq!(json["mode"], "isolation_boost");
        assert_eq!(json["populations"][0]["status"], "grouped");
        assert_eq!(json["populations"][0]["fairness"]["outcome"], "nothing_to_boost");
    }
}
