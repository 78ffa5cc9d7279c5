//! # Planning Service
//!
//! The single entry point the CLI and the HTTP API use to group a roster:
//! validate, plan, log what the search did.

use crate::error::AppError;
use cohort_core::{FairnessMode, Interrupt, Plan, Planner, PopulationOutcome, PopulationSpec, Roster};

/// Validate `roster` against `populations` and plan it.
///
/// Runs on the calling thread; hosts that need a deadline pass an
/// `Interrupt` and raise it from elsewhere.
pub fn plan_roster(
    roster: &Roster,
    populations: &[PopulationSpec],
    mode: FairnessMode,
    interrupt: Option<Interrupt>,
) -> Result<Plan, AppError> {
    let report = roster.validate(populations);
    if !report.is_ok() {
        tracing::warn!(issues = report.issues().len(), "roster rejected: {}", report.summary());
        return Err(AppError::Validation(report));
    }

    let mut planner = Planner::new(mode);
    if let Some(interrupt) = interrupt {
        planner = planner.with_interrupt(interrupt);
    }

    let plan = planner.plan(roster, populations)?;

    for outcome in &plan.populations {
        match outcome {
            PopulationOutcome::Grouped(population) => tracing::info!(
                population = %population.name,
                groups = population.partition.group_count(),
                intra = population.score.intra,
                inter = population.score.inter,
                placements = population.stats.placements,
                complete_assignments = population.stats.complete_assignments,
                fairness = ?population.fairness,
                "population grouped"
            ),
            PopulationOutcome::Infeasible { name, sizes } => tracing::warn!(
                population = %name,
                sizes = %sizes,
                "no partition keeps every group connected"
            ),
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PopulationConfig;
    use cohort_core::PreferenceRecord;

    fn specs(sizes: &str) -> Vec<PopulationSpec> {
        vec![
            PopulationConfig {
                name: "a".to_string(),
                start: 1,
                end: 4,
                sizes: sizes.to_string(),
            }
            .to_spec()
            .expect("spec"),
        ]
    }

    fn roster() -> Roster {
        Roster::new(vec![
            PreferenceRecord::new(1, 2, 3, 4),
            PreferenceRecord::new(2, 1, 3, 4),
            PreferenceRecord::new(3, 4, 1, 2),
            PreferenceRecord::new(4, 3, 1, 2),
        ])
    }

    #[test]
    fn valid_roster_is_planned() {
        let plan = plan_roster(&roster(), &specs("2, 2"), FairnessMode::Primary, None)
            .expect("plan");
        assert!(plan.is_complete());
    }

    #[test]
    fn invalid_roster_carries_the_report() {
        let err = plan_roster(&roster(), &specs("3, 3"), FairnessMode::Primary, None)
            .expect_err("invalid");
        match err {
            AppError::Validation(report) => assert_eq!(report.issues().len(), 1),
            other => unreachable!("expected a validation error, got {other}"),
        }
    }
}
