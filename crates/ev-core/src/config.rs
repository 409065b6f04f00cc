//! Engine configuration.
//!
//! Typically loaded from a JSON file by the host application (with the
//! `serde` feature) and handed to `Session::load` and the task queue.

use crate::{CoreError, CoreResult};

/// Fallback speed for edges with a missing or non-positive speed limit.
pub const DEFAULT_SPEED_KMH: f64 = 30.0;

/// Multiplier applied to vulnerability in the risk penalty `1 + factor * v`.
pub const DEFAULT_RISK_FACTOR: f64 = 2.0;

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Speed (km/h) assumed when an edge carries no usable speed limit.
    pub default_speed_kmh: f64,

    /// Vulnerability weight in the risk multiplier.  Default: 2.0.
    pub risk_factor: f64,

    /// Number of critical nodes returned when the caller does not say.
    pub top_k: usize,

    /// Pivot count for approximate betweenness.  `None` = exact.
    pub sample_size: Option<usize>,

    /// Master RNG seed.  The same seed always produces identical rankings.
    pub seed: u64,

    /// How often the consumer drains the result queue, in milliseconds.
    pub poll_interval_ms: u64,

    /// Bound on undelivered task outcomes.  `None` = unbounded.
    pub queue_capacity: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_speed_kmh: DEFAULT_SPEED_KMH,
            risk_factor:       DEFAULT_RISK_FACTOR,
            top_k:             50,
            sample_size:       Some(100),
            seed:              42,
            poll_interval_ms:  100,
            queue_capacity:    None,
        }
    }
}

impl EngineConfig {
    /// Reject values that would make costs non-positive or the queue unusable.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.default_speed_kmh.is_finite() && self.default_speed_kmh > 0.0) {
            return Err(CoreError::Config(format!(
                "default_speed_kmh must be a positive number, got {}",
                self.default_speed_kmh
            )));
        }
        if !(self.risk_factor.is_finite() && self.risk_factor >= 0.0) {
            return Err(CoreError::Config(format!(
                "risk_factor must be a non-negative number, got {}",
                self.risk_factor
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(CoreError::Config("poll_interval_ms must be at least 1".into()));
        }
        if self.queue_capacity == Some(0) {
            return Err(CoreError::Config("queue_capacity must be at least 1".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}
