//! Edge-weight abstraction shared by every graph algorithm.
//!
//! The cost model produces `f64` minutes, but the graph views and the
//! shortest-path / centrality routines are written against [`Weight`] so that
//! integer-cost networks (hand-built test graphs, millisecond travel times)
//! run through exactly the same code.
//!
//! # Ordering
//!
//! Algorithms never use `PartialOrd` directly on weights; they go through
//! [`Weight::total_cmp`] so that heap ordering is total even for floats.

use std::cmp::Ordering;
use std::fmt::Debug;

/// Scalar cost carried by graph edges.
pub trait Weight: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// Additive identity (cost of the empty path).
    const ZERO: Self;

    /// Sentinel for "unreached".  Never produced by a successful relaxation.
    const UNREACHABLE: Self;

    /// Path-cost addition.  Integer weights saturate at `UNREACHABLE`.
    fn plus(self, rhs: Self) -> Self;

    /// Total order used by priority queues and comparisons.
    fn total_cmp(&self, other: &Self) -> Ordering;

    /// Lossy conversion used for reporting and centrality arithmetic.
    fn to_f64(self) -> f64;

    /// Conversion used to express heuristics in the weight's unit.
    /// Integer weights round down so an admissible heuristic stays admissible.
    fn from_f64(v: f64) -> Self;

    /// `true` for finite, non-negative weights accepted by the builder.
    fn is_usable(self) -> bool;

    /// Strictly cheaper than `other`.
    #[inline]
    fn cheaper_than(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Less
    }
}

macro_rules! float_weight {
    ($t:ty) => {
        impl Weight for $t {
            const ZERO: Self = 0.0;
            const UNREACHABLE: Self = <$t>::INFINITY;

            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn total_cmp(&self, other: &Self) -> Ordering {
                <$t>::total_cmp(self, other)
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn is_usable(self) -> bool {
                self.is_finite() && self >= 0.0
            }
        }
    };
}

macro_rules! int_weight {
    ($t:ty) => {
        impl Weight for $t {
            const ZERO: Self = 0;
            const UNREACHABLE: Self = <$t>::MAX;

            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self.saturating_add(rhs)
            }

            #[inline]
            fn total_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                if v.is_nan() || v <= 0.0 { 0 } else { v.floor() as $t }
            }

            #[inline]
            fn is_usable(self) -> bool {
                self != <$t>::MAX
            }
        }
    };
}

float_weight!(f64);
float_weight!(f32);
int_weight!(u32);
int_weight!(u64);
