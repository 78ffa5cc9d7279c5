//! # Core Type Definitions
//!
//! This module contains all core types for the Cohort partition engine:
//! - Person and weight identifiers (`PersonId`, `EdgeWeight`)
//! - Input records (`PreferenceRecord`, `Rank`)
//! - Search inputs and outputs (`TargetSizes`, `Partition`, `Score`)
//! - Error types (`CohortError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they key a `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for weights to prevent overflow

use crate::primitives::{MAX_POPULATION_SIZE, RANK_WEIGHTS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS & WEIGHTS
// =============================================================================

/// Identifier of a person on the roster (seat number, student number...).
///
/// Unique within a population. Which population a person belongs to is
/// decided by the caller's id ranges, never stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weight of an edge in the relationship graph.
///
/// Uses i64 with saturating arithmetic to prevent overflow.
/// Higher weight indicates a stronger stated preference.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EdgeWeight(pub i64);

impl EdgeWeight {
    /// Create a new edge weight with the given value.
    #[must_use]
    pub const fn new(weight: i64) -> Self {
        Self(weight)
    }

    /// Add another weight using saturating arithmetic.
    #[must_use]
    pub const fn accumulate(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Multiply by a boost factor using saturating arithmetic.
    #[must_use]
    pub const fn scaled(self, multiplier: i64) -> Self {
        Self(self.0.saturating_mul(multiplier))
    }

    /// Whether this weight counts as an affinity between two people.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Get the raw weight value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

// =============================================================================
// PREFERENCE RECORDS
// =============================================================================

/// Position of a choice within a preference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    First,
    Second,
    Third,
}

impl Rank {
    /// All ranks, strongest first.
    pub const ALL: [Rank; 3] = [Rank::First, Rank::Second, Rank::Third];

    /// Edge weight contributed by a choice at this rank.
    #[must_use]
    pub const fn weight(self) -> EdgeWeight {
        match self {
            Rank::First => EdgeWeight::new(RANK_WEIGHTS[0]),
            Rank::Second => EdgeWeight::new(RANK_WEIGHTS[1]),
            Rank::Third => EdgeWeight::new(RANK_WEIGHTS[2]),
        }
    }
}

/// One roster row: a person and the three people they would like to be
/// grouped with, strongest preference first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub person: PersonId,
    pub choices: [PersonId; 3],
}

impl PreferenceRecord {
    /// Create a record from raw ids.
    #[must_use]
    pub const fn new(person: u64, first: u64, second: u64, third: u64) -> Self {
        Self {
            person: PersonId(person),
            choices: [PersonId(first), PersonId(second), PersonId(third)],
        }
    }

    /// Iterate `(choice, rank)` pairs in rank order.
    pub fn ranked_choices(&self) -> impl Iterator<Item = (PersonId, Rank)> + '_ {
        self.choices.iter().copied().zip(Rank::ALL)
    }

    /// Whether the person named themselves among their choices.
    #[must_use]
    pub fn names_self(&self) -> bool {
        self.choices.contains(&self.person)
    }
}

// =============================================================================
// TARGET SIZES
// =============================================================================

/// Ordered group capacities, one entry per group.
///
/// Every entry is positive and at most `MAX_POPULATION_SIZE`, and the sum
/// fits in `usize`. Whether the sum matches the population is checked where
/// the population is known (validation and the search entry point).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct TargetSizes(Vec<usize>);

impl TargetSizes {
    /// Build target sizes, rejecting an empty list, a zero-sized group, a
    /// group larger than any population, or a sum that overflows.
    pub fn new(sizes: Vec<usize>) -> Result<Self, CohortError> {
        if sizes.is_empty() {
            return Err(CohortError::InvalidTargetSizes(
                "at least one group is required".to_string(),
            ));
        }
        if let Some(position) = sizes.iter().position(|&s| s == 0) {
            return Err(CohortError::InvalidTargetSizes(format!(
                "group {} has size 0",
                position + 1
            )));
        }
        if let Some((position, size)) = sizes
            .iter()
            .enumerate()
            .find(|(_, size)| **size > MAX_POPULATION_SIZE)
        {
            return Err(CohortError::InvalidTargetSizes(format!(
                "group {} has size {size}, limit is {MAX_POPULATION_SIZE}",
                position + 1
            )));
        }
        if sizes
            .iter()
            .try_fold(0usize, |sum, &size| sum.checked_add(size))
            .is_none()
        {
            return Err(CohortError::InvalidTargetSizes(
                "group sizes overflow when added".to_string(),
            ));
        }
        Ok(Self(sizes))
    }

    /// Capacities in group order.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.0.len()
    }

    /// Sum of all capacities.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().fold(0, |sum, &size| sum.saturating_add(size))
    }
}

impl TryFrom<Vec<usize>> for TargetSizes {
    type Error = CohortError;

    fn try_from(sizes: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(sizes)
    }
}

impl From<TargetSizes> for Vec<usize> {
    fn from(sizes: TargetSizes) -> Self {
        sizes.0
    }
}

impl fmt::Display for TargetSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}

// =============================================================================
// PARTITION
// =============================================================================

/// A complete grouping: group index -> members.
///
/// Group indices are positional (`0..group_count`). Members are kept in a
/// `BTreeSet` so two partitions compare equal exactly when every group holds
/// the same people, independent of placement order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Partition {
    groups: Vec<BTreeSet<PersonId>>,
}

impl Partition {
    /// Create a partition from per-group member sets.
    #[must_use]
    pub fn from_groups(groups: Vec<BTreeSet<PersonId>>) -> Self {
        Self { groups }
    }

    /// Members of each group, in group order.
    #[must_use]
    pub fn groups(&self) -> &[BTreeSet<PersonId>] {
        &self.groups
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Cardinality of each group, in group order.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(BTreeSet::len).collect()
    }

    /// Total number of people placed.
    #[must_use]
    pub fn person_count(&self) -> usize {
        self.groups.iter().map(BTreeSet::len).sum()
    }

    /// Index of the group holding `person`, if any.
    #[must_use]
    pub fn group_of(&self, person: PersonId) -> Option<usize> {
        self.groups.iter().position(|g| g.contains(&person))
    }

    /// Person -> group index lookup table.
    #[must_use]
    pub fn assignment(&self) -> BTreeMap<PersonId, usize> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(index, members)| members.iter().map(move |p| (*p, index)))
            .collect()
    }
}

// =============================================================================
// SCORE
// =============================================================================

/// Objective totals for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Score {
    /// Sum of weights of edges whose endpoints share a group.
    pub intra: i64,
    /// Sum of weights of edges whose endpoints sit in different groups.
    pub inter: i64,
}

impl Score {
    /// Sum of both totals: all in-domain weight.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.intra.saturating_add(self.inter)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Cohort engine.
///
/// - No silent failures
/// - Use `Result<T, CohortError>` for fallible operations
/// - The engine never panics; every error is recoverable by the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CohortError {
    /// Target sizes are malformed (empty list, zero size, unparsable token).
    #[error("Invalid target sizes: {0}")]
    InvalidTargetSizes(String),

    /// Target sizes do not add up to the number of people being grouped.
    #[error("Target sizes sum to {expected} but the population has {actual} people")]
    TargetSizeMismatch { expected: usize, actual: usize },

    /// Affinity pruning eliminated every complete assignment.
    #[error("No partition satisfies the target sizes without placing a stranger in an occupied group")]
    NoFeasiblePartition,

    /// The host raised the interrupt flag before the search finished.
    #[error("Search interrupted")]
    SearchInterrupted,

    /// The roster failed validation; the payload summarizes the issues.
    #[error("Invalid roster: {0}")]
    InvalidRoster(String),
}

// =============================================================================
// TESTS
// =============================================================================
