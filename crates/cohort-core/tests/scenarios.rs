//! # Scenario Tests
//!
//! End-to-end behaviour on small hand-written rosters, checked against an
//! exhaustive reference where the roster is small enough.

use cohort_core::{
    CohortError, EdgeWeight, FairnessController, FairnessMode, Partition, PersonId,
    PopulationRange, PopulationSpec, PreferenceRecord, Reweighted, Roster, TargetSizes,
    UnchangedReason, UndirectedGraph, ValidationIssue, WeightedEdges, build_directed,
    build_undirected, optimize, parse_target_sizes, score,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn sizes(s: &[usize]) -> TargetSizes {
    TargetSizes::new(s.to_vec()).expect("sizes")
}

/// Best intra weight over every assignment of the graph's nodes to groups of
/// the given sizes, with no pruning at all.
fn exhaustive_best_intra(graph: &UndirectedGraph, capacities: &[usize]) -> i64 {
    fn assign(
        graph: &UndirectedGraph,
        nodes: &[PersonId],
        capacities: &[usize],
        groups: &mut Vec<BTreeSet<PersonId>>,
        best: &mut i64,
    ) {
        let Some((&node, rest)) = nodes.split_first() else {
            let partition = Partition::from_groups(groups.clone());
            *best = (*best).max(score(&partition, graph).intra);
            return;
        };
        for index in 0..groups.len() {
            if groups[index].len() < capacities[index] {
                groups[index].insert(node);
                assign(graph, rest, capacities, groups, best);
                groups[index].remove(&node);
            }
        }
    }

    let nodes: Vec<PersonId> = graph.node_ids().collect();
    let mut groups = vec![BTreeSet::new(); capacities.len()];
    let mut best = i64::MIN;
    assign(graph, &nodes, capacities, &mut groups, &mut best);
    best
}

#[test]
fn disjoint_cliques_are_recovered_exactly() {
    let records = [
        PreferenceRecord::new(1, 2, 3, 2),
        PreferenceRecord::new(2, 3, 1, 3),
        PreferenceRecord::new(3, 1, 2, 1),
        PreferenceRecord::new(4, 5, 6, 5),
        PreferenceRecord::new(5, 6, 4, 6),
        PreferenceRecord::new(6, 4, 5, 4),
        PreferenceRecord::new(7, 8, 9, 8),
        PreferenceRecord::new(8, 9, 7, 9),
        PreferenceRecord::new(9, 7, 8, 7),
    ];
    let graph = build_undirected(&build_directed(&records));

    let solution = optimize(&graph, &sizes(&[3, 3, 3])).expect("solution");

    let groups: BTreeSet<BTreeSet<PersonId>> =
        solution.partition.groups().iter().cloned().collect();
    let expected: BTreeSet<BTreeSet<PersonId>> = [[1, 2, 3], [4, 5, 6], [7, 8, 9]]
        .iter()
        .map(|ids| ids.iter().map(|&id| PersonId(id)).collect())
        .collect();
    assert_eq!(groups, expected);
    assert_eq!(solution.score.inter, 0);
}

#[test]
fn cyclic_roster_matches_exhaustive_reference() {
    // Person i ranks i+1, i+2, i+3 (mod 6).
    let records: Vec<_> = (1..=6u64)
        .map(|i| PreferenceRecord::new(i, i % 6 + 1, (i + 1) % 6 + 1, (i + 2) % 6 + 1))
        .collect();
    let graph = build_undirected(&build_directed(&records));

    let solution = optimize(&graph, &sizes(&[3, 3])).expect("solution");

    assert_eq!(solution.score.intra, exhaustive_best_intra(&graph, &[3, 3]));
    assert_eq!(solution.score.intra, 16);
    assert_eq!(solution.score.total(), graph.total_weight());

    // Two runs agree to the group label.
    let again = optimize(&graph, &sizes(&[3, 3])).expect("solution");
    assert_eq!(again.partition, solution.partition);
}

#[test]
fn self_preference_builds_a_self_loop_but_fails_validation() {
    let records = [PreferenceRecord::new(1, 2, 3, 1)];
    let directed = build_directed(&records);
    assert_eq!(directed.edge(PersonId(1), PersonId(2)), Some(EdgeWeight::new(3)));
    assert_eq!(directed.edge(PersonId(1), PersonId(3)), Some(EdgeWeight::new(2)));
    assert_eq!(directed.edge(PersonId(1), PersonId(1)), Some(EdgeWeight::new(1)));

    let report = Roster::new(records.to_vec()).validate(&[PopulationSpec::new(
        "a",
        PopulationRange::new(1, 3),
        sizes(&[1]),
    )]);
    assert!(report.issues().contains(&ValidationIssue::SelfPreference {
        person: PersonId(1)
    }));
}

#[test]
fn minority_boost_on_equal_pairs_returns_the_baseline() {
    let records = [
        PreferenceRecord::new(1, 2, 3, 4),
        PreferenceRecord::new(2, 1, 4, 3),
        PreferenceRecord::new(3, 4, 1, 2),
        PreferenceRecord::new(4, 3, 2, 1),
    ];
    let directed = build_directed(&records);
    let target = sizes(&[2, 2]);
    let baseline = optimize(&build_undirected(&directed), &target)
        .expect("baseline")
        .partition;

    let result = FairnessController::new(FairnessMode::MinorityBoost)
        .rebalance(&directed, &target, &baseline)
        .expect("rebalance");

    assert_eq!(result, Reweighted::Unchanged(UnchangedReason::NothingToBoost));
    assert_eq!(result.resolve(&baseline).assignment(), baseline.assignment());
}

#[test]
fn size_sum_mismatch_is_refused_by_validation_and_engine() {
    let records: Vec<_> = (1..=4u64)
        .map(|i| PreferenceRecord::new(i, i % 4 + 1, (i + 1) % 4 + 1, (i + 2) % 4 + 1))
        .collect();
    let wrong = parse_target_sizes("2, 1").expect("sizes");

    let report = Roster::new(records.clone()).validate(&[PopulationSpec::new(
        "a",
        PopulationRange::new(1, 4),
        wrong.clone(),
    )]);
    assert!(!report.is_ok());

    let graph = build_undirected(&build_directed(&records));
    assert_eq!(
        optimize(&graph, &wrong).expect_err("mismatch"),
        CohortError::TargetSizeMismatch {
            expected: 3,
            actual: 4
        }
    );
}

proptest! {
    /// Affinity pruning only removes candidates, so the search can never beat
    /// the unpruned optimum.
    #[test]
    fn search_never_exceeds_exhaustive_optimum(
        offsets in vec((1u64..6, 1u64..6, 1u64..6), 6),
    ) {
        let records: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, &(a, b, c))| {
                let i = i as u64;
                PreferenceRecord::new(i + 1, (i + a) % 6 + 1, (i + b) % 6 + 1, (i + c) % 6 + 1)
            })
            .collect();
        let graph = build_undirected(&build_directed(&records));

        if let Ok(solution) = optimize(&graph, &sizes(&[3, 3])) {
            prop_assert!(solution.score.intra <= exhaustive_best_intra(&graph, &[3, 3]));
        }
    }
}
