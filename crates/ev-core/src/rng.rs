//! Deterministic RNG for pivot sampling.
//!
//! # Determinism strategy
//!
//! Approximate betweenness picks a random subset of source nodes.  The subset
//! is drawn from a `SmallRng` seeded from `EngineConfig::seed`, so the same
//! network, sample size and seed always produce the same ranking.  The drawn
//! indices are returned sorted so accumulation order does not depend on the
//! sampling algorithm's internal order.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seeded RNG used for pivot selection.
///
/// Used only from the thread that owns it.  If several analyses run
/// concurrently, derive one per request with [`PivotRng::child`].
pub struct PivotRng(SmallRng);

impl PivotRng {
    pub fn new(seed: u64) -> Self {
        PivotRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `PivotRng` with a different seed offset.
    pub fn child(&mut self, offset: u64) -> PivotRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        PivotRng(SmallRng::seed_from_u64(child_seed))
    }

    /// Choose `k` distinct indices from `0..n`, sorted ascending.
    ///
    /// `k` is clamped to `n`; `k == n` returns every index without consuming
    /// any randomness.
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        if k >= n {
            return (0..n).collect();
        }
        let mut picked = rand::seq::index::sample(&mut self.0, n, k).into_vec();
        picked.sort_unstable();
        picked
    }
}
