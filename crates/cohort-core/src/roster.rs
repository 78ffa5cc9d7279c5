//! # Roster & Validation
//!
//! A roster is the full list of preference records, possibly covering several
//! populations. Each population is an inclusive id range with its own target
//! sizes. Nothing is grouped until `Roster::validate` reports no issues.
//!
//! ## Checks
//!
//! - population ranges must not overlap
//! - every person must fall inside some range
//! - a person appears at most once and never chooses themselves
//! - every choice names a person on the roster, in the chooser's population
//! - target sizes add up to the population's head count
//! - input limits from `primitives`

use crate::primitives::{MAX_GROUPS, MAX_POPULATION_SIZE, MAX_ROSTER_RECORDS};
use crate::{CohortError, PersonId, PreferenceRecord, TargetSizes};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// POPULATIONS
// =============================================================================

/// Inclusive range of person ids forming one population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationRange {
    pub start: PersonId,
    pub end: PersonId,
}

impl PopulationRange {
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self {
            start: PersonId(start),
            end: PersonId(end),
        }
    }

    /// Whether `person` lies inside the range.
    #[must_use]
    pub fn contains(&self, person: PersonId) -> bool {
        self.start <= person && person <= self.end
    }

    /// Whether two ranges share at least one id.
    #[must_use]
    pub fn overlaps(&self, other: &PopulationRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for PopulationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// One population to group: a name, its id range and its group sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSpec {
    pub name: String,
    pub range: PopulationRange,
    pub sizes: TargetSizes,
}

impl PopulationSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, range: PopulationRange, sizes: TargetSizes) -> Self {
        Self {
            name: name.into(),
            range,
            sizes,
        }
    }
}

/// Parse a comma-separated size list such as `"4, 4, 3"`.
///
/// # Errors
/// `InvalidTargetSizes` for empty input, a token that is not a non-negative
/// integer, or a zero.
pub fn parse_target_sizes(input: &str) -> Result<TargetSizes, CohortError> {
    if input.trim().is_empty() {
        return Err(CohortError::InvalidTargetSizes(
            "group sizes are empty".to_string(),
        ));
    }
    let sizes = input
        .split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<usize>().map_err(|_| {
                CohortError::InvalidTargetSizes(format!("'{token}' is not a group size"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    TargetSizes::new(sizes)
}

// =============================================================================
// VALIDATION REPORT
// =============================================================================

/// A single problem found in a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    RangesOverlap {
        first: String,
        second: String,
    },
    OutsideRanges {
        persons: Vec<PersonId>,
    },
    DuplicatePerson {
        person: PersonId,
    },
    SelfPreference {
        person: PersonId,
    },
    UnknownPreference {
        person: PersonId,
        choice: PersonId,
    },
    CrossPopulationLink {
        person: PersonId,
        choice: PersonId,
    },
    EmptyPopulation {
        population: String,
    },
    SizeMismatch {
        population: String,
        expected: usize,
        actual: usize,
    },
    PopulationTooLarge {
        population: String,
        size: usize,
        limit: usize,
    },
    TooManyGroups {
        population: String,
        groups: usize,
        limit: usize,
    },
    TooManyRecords {
        count: usize,
        limit: usize,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RangesOverlap { first, second } => {
                write!(f, "ranges of '{first}' and '{second}' overlap")
            }
            Self::OutsideRanges { persons } => {
                let ids: Vec<String> = persons.iter().map(ToString::to_string).collect();
                write!(f, "ids outside every range: {}", ids.join(", "))
            }
            Self::DuplicatePerson { person } => write!(f, "{person} appears more than once"),
            Self::SelfPreference { person } => write!(f, "{person} lists themselves as a choice"),
            Self::UnknownPreference { person, choice } => {
                write!(f, "{person} chooses {choice}, who is not on the roster")
            }
            Self::CrossPopulationLink { person, choice } => {
                write!(f, "{person} chooses {choice} from another population")
            }
            Self::EmptyPopulation { population } => {
                write!(f, "population '{population}' has no members")
            }
            Self::SizeMismatch {
                population,
                expected,
                actual,
            } => write!(
                f,
                "group sizes of '{population}' sum to {expected} but it has {actual} people"
            ),
            Self::PopulationTooLarge {
                population,
                size,
                limit,
            } => write!(f, "population '{population}' has {size} people (limit {limit})"),
            Self::TooManyGroups {
                population,
                groups,
                limit,
            } => write!(f, "population '{population}' asks for {groups} groups (limit {limit})"),
            Self::TooManyRecords { count, limit } => {
                write!(f, "roster has {count} records (limit {limit})")
            }
        }
    }
}

/// Every issue found by `Roster::validate`, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when the roster can be planned.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// All issues as one line, `; `-separated.
    #[must_use]
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        parts.join("; ")
    }

    /// Turn a failing report into `CohortError::InvalidRoster`.
    ///
    /// # Errors
    /// `InvalidRoster` carrying the summary when any issue was found.
    pub fn into_result(self) -> Result<(), CohortError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(CohortError::InvalidRoster(self.summary()))
        }
    }

    fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }
}

// =============================================================================
// ROSTER
// =============================================================================

/// Preference records for every population, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    records: Vec<PreferenceRecord>,
}

impl Roster {
    #[must_use]
    pub fn new(records: Vec<PreferenceRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[PreferenceRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose person falls inside `range`.
    #[must_use]
    pub fn population(&self, range: PopulationRange) -> Vec<PreferenceRecord> {
        self.records
            .iter()
            .filter(|record| range.contains(record.person))
            .copied()
            .collect()
    }

    /// Run every check against `populations`.
    #[must_use]
    pub fn validate(&self, populations: &[PopulationSpec]) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.records.len() > MAX_ROSTER_RECORDS {
            report.push(ValidationIssue::TooManyRecords {
                count: self.records.len(),
                limit: MAX_ROSTER_RECORDS,
            });
        }

        for (i, first) in populations.iter().enumerate() {
            for second in populations.iter().skip(i.saturating_add(1)) {
                if first.range.overlaps(&second.range) {
                    report.push(ValidationIssue::RangesOverlap {
                        first: first.name.clone(),
                        second: second.name.clone(),
                    });
                }
            }
        }

        let population_of = |person: PersonId| {
            populations
                .iter()
                .position(|spec| spec.range.contains(person))
        };

        let outside: BTreeSet<PersonId> = self
            .records
            .iter()
            .map(|record| record.person)
            .filter(|person| population_of(*person).is_none())
            .collect();
        if !outside.is_empty() {
            report.push(ValidationIssue::OutsideRanges {
                persons: outside.into_iter().collect(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut reported = BTreeSet::new();
        for record in &self.records {
            if !seen.insert(record.person) && reported.insert(record.person) {
                report.push(ValidationIssue::DuplicatePerson {
                    person: record.person,
                });
            }
        }

        for record in &self.records {
            if record.names_self() {
                report.push(ValidationIssue::SelfPreference {
                    person: record.person,
                });
            }

            let Some(home) = population_of(record.person) else {
                continue;
            };
            let mut checked = BTreeSet::new();
            for &choice in &record.choices {
                if choice == record.person || !checked.insert(choice) {
                    continue;
                }
                if !seen.contains(&choice) {
                    report.push(ValidationIssue::UnknownPreference {
                        person: record.person,
                        choice,
                    });
                } else if population_of(choice) != Some(home) {
                    report.push(ValidationIssue::CrossPopulationLink {
                        person: record.person,
                        choice,
                    });
                }
            }
        }

        let mut head_counts: BTreeMap<usize, usize> = BTreeMap::new();
        for record in &self.records {
            if let Some(index) = population_of(record.person) {
                *head_counts.entry(index).or_default() += 1;
            }
        }

        for (index, spec) in populations.iter().enumerate() {
            let actual = head_counts.get(&index).copied().unwrap_or(0);
            if actual == 0 {
                report.push(ValidationIssue::EmptyPopulation {
                    population: spec.name.clone(),
                });
                continue;
            }
            if spec.sizes.total() != actual {
                report.push(ValidationIssue::SizeMismatch {
                    population: spec.name.clone(),
                    expected: spec.sizes.total(),
                    actual,
                });
            }
            if actual > MAX_POPULATION_SIZE {
                report.push(ValidationIssue::PopulationTooLarge {
                    population: spec.name.clone(),
                    size: actual,
                    limit: MAX_POPULATION_SIZE,
                });
            }
            if spec.sizes.group_count() > MAX_GROUPS {
                report.push(ValidationIssue::TooManyGroups {
                    population: spec.name.clone(),
                    groups: spec.sizes.group_count(),
                    limit: MAX_GROUPS,
                });
            }
        }

        report
    }
}

impl FromIterator<PreferenceRecord> for Roster {
    fn from_iter<I: IntoIterator<Item = PreferenceRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
