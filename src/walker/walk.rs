//! Bounded 1-D random walk
//!
//! The walk starts at position 0 and moves ±1 per step. It stops as soon
//! as `|position| > domain_size` or after `max_steps` steps, whichever
//! comes first. The result counts the moves that stayed inside the
//! domain: the move that leaves it is not counted. Leaving the domain and
//! exhausting the budget both produce just a step count.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameters of a single walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkParams {
    /// Half-width of the legal domain
    pub domain_size: u64,

    /// Step budget
    pub max_steps: u64,
}

impl WalkParams {
    /// Create walk parameters
    pub fn new(domain_size: u64, max_steps: u64) -> Self {
        Self {
            domain_size,
            max_steps,
        }
    }

    /// Check whether a position lies outside `[-domain_size, domain_size]`
    #[inline]
    pub fn is_out_of_bounds(&self, position: i64) -> bool {
        position.unsigned_abs() > self.domain_size
    }
}

/// Run one walk and return the number of in-bounds steps taken
///
/// Always terminates: the loop is bounded by `max_steps`.
pub fn random_walk<R: Rng>(params: &WalkParams, rng: &mut R) -> u64 {
    let mut position: i64 = 0;

    for steps in 0..params.max_steps {
        position += if rng.gen_bool(0.5) { 1 } else { -1 };

        if params.is_out_of_bounds(position) {
            return steps;
        }
    }

    params.max_steps
}

/// Base seed derived from the wall clock
pub fn clock_seed() -> u64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .map(|n| n as u64)
        .unwrap_or_else(|| now.timestamp() as u64)
}

/// Derive a walker's seed from the run's base seed and its id
///
/// SplitMix64 finalizer over `base + id * golden`, so walkers launched in
/// the same instant with adjacent ids still get unrelated sequences.
pub fn walker_seed(base: u64, walker_id: usize) -> u64 {
    let mut z = base.wrapping_add((walker_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Per-walker random generator
pub fn walker_rng(base: u64, walker_id: usize) -> StdRng {
    StdRng::seed_from_u64(walker_seed(base, walker_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_zero_budget_reports_zero() {
        let params = WalkParams::new(1, 0);
        for seed in 0..32 {
            let mut rng = walker_rng(seed, 1);
            assert_eq!(random_walk(&params, &mut rng), 0);
        }
    }

    #[test]
    fn test_result_within_budget() {
        for domain in [1u64, 2, 5, 50] {
            for max_steps in [0u64, 1, 3, 100, 1000] {
                let params = WalkParams::new(domain, max_steps);
                for id in 1..=20 {
                    let mut rng = walker_rng(12345, id);
                    let steps = random_walk(&params, &mut rng);
                    assert!(steps <= max_steps, "steps {} > max {}", steps, max_steps);
                }
            }
        }
    }

    #[test]
    fn test_unreachable_domain_exhausts_budget() {
        let params = WalkParams::new(1_000_000, 5);
        for id in 1..=5 {
            let mut rng = walker_rng(99, id);
            assert_eq!(random_walk(&params, &mut rng), 5);
        }
    }

    #[test]
    fn test_earliest_exit_is_domain_size() {
        // Leaving takes domain_size + 1 moves; the last one is not counted
        let params = WalkParams::new(3, 10_000);
        for id in 1..=50 {
            let mut rng = walker_rng(7, id);
            let steps = random_walk(&params, &mut rng);
            assert!(steps >= 3);
        }
    }

    #[test]
    fn test_exiting_move_not_counted() {
        // Replay the same generator, counting moves until the position leaves
        let params = WalkParams::new(1, 100);
        let mut min_steps = u64::MAX;

        for id in 1..=200 {
            let steps = random_walk(&params, &mut walker_rng(2024, id));

            let mut rng = walker_rng(2024, id);
            let mut position: i64 = 0;
            let mut moves = 0u64;
            while moves < params.max_steps && !params.is_out_of_bounds(position) {
                position += if rng.gen_bool(0.5) { 1 } else { -1 };
                moves += 1;
            }

            if params.is_out_of_bounds(position) {
                assert_eq!(steps, moves - 1);
            } else {
                assert_eq!(steps, params.max_steps);
            }
            min_steps = min_steps.min(steps);
        }

        // Two straight moves in the same direction leave [-1, 1] after one counted step
        assert_eq!(min_steps, 1);
    }

    #[test]
    fn test_small_domain_exits_quickly() {
        let params = WalkParams::new(1, 100);
        let total: u64 = (1..=200)
            .map(|id| random_walk(&params, &mut walker_rng(2024, id)))
            .sum();
        // Expected exit time from [-1, 1] is 4 moves
        assert!(total / 200 < 20);
    }

    #[test]
    fn test_out_of_bounds() {
        let params = WalkParams::new(2, 10);
        assert!(!params.is_out_of_bounds(0));
        assert!(!params.is_out_of_bounds(2));
        assert!(!params.is_out_of_bounds(-2));
        assert!(params.is_out_of_bounds(3));
        assert!(params.is_out_of_bounds(-3));
    }

    #[test]
    fn test_same_seed_reproducible() {
        let params = WalkParams::new(10, 10_000);
        let a = random_walk(&params, &mut walker_rng(42, 3));
        let b = random_walk(&params, &mut walker_rng(42, 3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_walker_seeds_distinct() {
        let seeds: HashSet<u64> = (1..=1000).map(|id| walker_seed(42, id)).collect();
        assert_eq!(seeds.len(), 1000);
        assert_ne!(walker_seed(1, 1), walker_seed(2, 1));
    }
}
