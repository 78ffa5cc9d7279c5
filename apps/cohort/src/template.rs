//! # Demo Roster Template
//!
//! Generates a believable roster to try the planner with: every population is
//! split into friendship circles whose members mostly choose each other, plus
//! one isolated member who chooses freely but whom nobody else picks.
//!
//! Generation is seeded, so the same options always give the same roster.

use crate::config::{Config, PopulationConfig};
use crate::error::AppError;
use cohort_core::{PreferenceRecord, Roster};
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

/// Relative odds of choosing inside vs. outside one's own circle, per rank.
const CIRCLE_BIAS: [(u32, u32); 3] = [(100, 0), (95, 5), (90, 10)];

/// Shape of one generated population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoPopulation {
    pub name: String,
    /// First id; members are numbered consecutively from here.
    pub start: u64,
    /// Size of each friendship circle, in id order.
    pub circles: Vec<usize>,
}

impl DemoPopulation {
    fn len(&self) -> usize {
        self.circles.iter().sum()
    }
}

/// Options for `generate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOptions {
    pub seed: u64,
    pub populations: Vec<DemoPopulation>,
}

impl Default for TemplateOptions {
    /// Two classes of fourteen: seats 1-14 and 21-34, circles of 4, 4 and 6.
    fn default() -> Self {
        Self {
            seed: 46,
            populations: vec![
                DemoPopulation {
                    name: "male".to_string(),
                    start: 1,
                    circles: vec![4, 4, 6],
                },
                DemoPopulation {
                    name: "female".to_string(),
                    start: 21,
                    circles: vec![4, 4, 6],
                },
            ],
        }
    }
}

/// A generated roster with a config that groups it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoRoster {
    pub roster: Roster,
    pub config: Config,
}

/// Generate a demo roster.
///
/// Target sizes in the returned config mirror the circles.
pub fn generate(options: &TemplateOptions) -> Result<DemoRoster, AppError> {
    let mut rng = SmallRng::seed_from_u64(options.seed);
    let mut records = Vec::new();
    let mut populations = Vec::new();

    for population in &options.populations {
        if population.len() < 3 {
            return Err(AppError::Template(format!(
                "population '{}' needs at least 3 members",
                population.name
            )));
        }
        if population.circles.contains(&0) {
            return Err(AppError::Template(format!(
                "population '{}' has an empty circle",
                population.name
            )));
        }

        let end = (population.len() as u64 - 1)
            .checked_add(population.start)
            .ok_or_else(|| {
                AppError::Template(format!(
                    "population '{}' runs past the largest id",
                    population.name
                ))
            })?;

        records.extend(generate_population(population, &mut rng)?);

        let sizes: Vec<String> = population.circles.iter().map(ToString::to_string).collect();
        populations.push(PopulationConfig {
            name: population.name.clone(),
            start: population.start,
            end,
            sizes: sizes.join(", "),
        });
    }

    Ok(DemoRoster {
        roster: Roster::new(records),
        config: Config {
            populations,
            ..Config::default()
        },
    })
}

fn generate_population(
    population: &DemoPopulation,
    rng: &mut SmallRng,
) -> Result<Vec<PreferenceRecord>, AppError> {
    let members: Vec<u64> = (0..population.len() as u64)
        .map(|offset| population.start.saturating_add(offset))
        .collect();

    let mut circles: Vec<&[u64]> = Vec::with_capacity(population.circles.len());
    let mut rest = members.as_slice();
    for &size in &population.circles {
        let (circle, tail) = rest.split_at(size);
        circles.push(circle);
        rest = tail;
    }

    let isolated = *members
        .choose(rng)
        .ok_or_else(|| AppError::Template("population is empty".to_string()))?;

    let mut records = Vec::with_capacity(members.len());
    for circle in &circles {
        for &person in *circle {
            let choices = if person == isolated {
                let others: Vec<u64> = members.iter().copied().filter(|&m| m != person).collect();
                [
                    pick_uniform(&others, rng)?,
                    pick_uniform(&others, rng)?,
                    pick_uniform(&others, rng)?,
                ]
            } else {
                let inside: Vec<u64> = circle
                    .iter()
                    .copied()
                    .filter(|&m| m != person && m != isolated)
                    .collect();
                let outside: Vec<u64> = members
                    .iter()
                    .copied()
                    .filter(|&m| m != person && m != isolated && !inside.contains(&m))
                    .collect();
                [
                    pick_biased(&inside, &outside, CIRCLE_BIAS[0], rng)?,
                    pick_biased(&inside, &outside, CIRCLE_BIAS[1], rng)?,
                    pick_biased(&inside, &outside, CIRCLE_BIAS[2], rng)?,
                ]
            };
            records.push(PreferenceRecord::new(
                person, choices[0], choices[1], choices[2],
            ));
        }
    }

    Ok(records)
}

fn pick_uniform(candidates: &[u64], rng: &mut SmallRng) -> Result<u64, AppError> {
    candidates
        .choose(rng)
        .copied()
        .ok_or_else(|| AppError::Template("nobody left to choose".to_string()))
}

/// Weighted pick; falls back to a uniform pick when the weights rule out
/// every candidate (e.g. a circle with no eligible members).
fn pick_biased(
    inside: &[u64],
    outside: &[u64],
    (inside_weight, outside_weight): (u32, u32),
    rng: &mut SmallRng,
) -> Result<u64, AppError> {
    let candidates: Vec<u64> = inside.iter().chain(outside).copied().collect();
    let weights = inside
        .iter()
        .map(|_| inside_weight)
        .chain(outside.iter().map(|_| outside_weight));

    match WeightedIndex::new(weights) {
        Ok(index) => candidates
            .get(index.sample(rng))
            .copied()
            .ok_or_else(|| AppError::Template("weighted pick out of range".to_string())),
        Err(_) => pick_uniform(&candidates, rng),
    }
}
