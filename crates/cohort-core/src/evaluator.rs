//! # Objective Evaluator
//!
//! Scores a partition against a weighted graph.

use crate::graph::WeightedEdges;
use crate::{Partition, Score};

/// Compute intra- and inter-group weight for `partition` over `graph`.
///
/// Edges with an endpoint outside the partition's domain are ignored. An edge
/// whose endpoints share a group adds to `intra`, otherwise to `inter`.
#[must_use]
pub fn score<G: WeightedEdges>(partition: &Partition, graph: &G) -> Score {
    let assignment = partition.assignment();
    let mut result = Score::default();

    for (a, b, weight) in graph.weighted_edges() {
        let (Some(group_a), Some(group_b)) = (assignment.get(&a), assignment.get(&b)) else {
            continue;
        };
        if group_a == group_b {
            result.intra = result.intra.saturating_add(weight.value());
        } else {
            result.inter = result.inter.saturating_add(weight.value());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_directed, build_undirected};
    use crate::{PersonId, PreferenceRecord};
    use std::collections::BTreeSet;

    fn group(ids: &[u64]) -> BTreeSet<PersonId> {
        ids.iter().map(|&id| PersonId(id)).collect()
    }

    #[test]
    fn splits_weight_between_intra_and_inter() {
        let records = [
            PreferenceRecord::new(1, 2, 3, 4),
            PreferenceRecord::new(2, 1, 4, 3),
            PreferenceRecord::new(3, 4, 1, 2),
            PreferenceRecord::new(4, 3, 2, 1),
        ];
        let graph = build_undirected(&build_directed(&records));
        let partition = Partition::from_groups(vec![group(&[1, 2]), group(&[3, 4])]);

        let result = score(&partition, &graph);

        assert_eq!(result.intra, 12);
        assert_eq!(result.inter, 12);
        assert_eq!(result.total(), graph.total_weight());
    }

    #[test]
    fn edges_outside_domain_are_ignored() {
        let records = [PreferenceRecord::new(1, 2, 3, 9)];
        let graph = build_directed(&records);
        let partition = Partition::from_groups(vec![group(&[1, 2]), group(&[3])]);

        let result = score(&partition, &graph);

        assert_eq!(result.intra, 3);
        assert_eq!(result.inter, 2);
    }

    #[test]
    fn empty_partition_scores_zero() {
        let graph = build_directed(&[PreferenceRecord::new(1, 2, 3, 4)]);
        assert_eq!(score(&Partition::default(), &graph), Score::default());
    }
}
