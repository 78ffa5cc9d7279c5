//! # Engine Primitives
//!
//! Hardcoded runtime constants for the Cohort engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Rank weights**: how much a first, second and third choice is worth.
//! 2. **Boost schedule**: how the fairness controller escalates its multiplier.
//! 3. **Input limits**: how large a roster the exponential search accepts.

/// Edge weight per rank position: first choice 3, second 2, third 1.
pub const RANK_WEIGHTS: [i64; 3] = [3, 2, 1];

/// Multiplier applied in the first re-weighting round.
pub const BOOST_START_MULTIPLIER: i64 = 5;

/// Amount the multiplier grows by after each unproductive round.
pub const BOOST_STEP: i64 = 5;

/// Maximum number of re-weighting rounds before giving up.
pub const MAX_BOOST_ROUNDS: usize = 10;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of people in a single population.
///
/// The search is exponential in population size; this is a classroom-scale
/// engine and rejects anything larger before it starts.
pub const MAX_POPULATION_SIZE: usize = 64;

/// Maximum number of records accepted in one roster.
pub const MAX_ROSTER_RECORDS: usize = 512;

/// Maximum number of groups in one population.
pub const MAX_GROUPS: usize = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_weights_strictly_decrease() {
        assert!(RANK_WEIGHTS.windows(2).all(|w| w[0] > w[1]));
        assert!(RANK_WEIGHTS.iter().all(|&w| w > 0));
    }

    #[test]
    fn boost_schedule_never_shrinks() {
        assert!(BOOST_START_MULTIPLIER > 1);
        assert!(BOOST_STEP > 0);
    }
}
