//! Risk-weighted edge cost model.
//!
//! ```text
//! speed  = max_speed_kmh  if positive and finite, else default_speed_kmh
//! time   = (length_m / 1000 / speed) * 60                       [minutes]
//! risk   = 1 + risk_factor * vulnerability    (vulnerability defaults to 0)
//! cost   = time * risk
//! ```
//!
//! The one-way flag never changes the cost; it only decides how many arcs
//! the builder creates.

use ev_core::{DEFAULT_RISK_FACTOR, DEFAULT_SPEED_KMH, EngineConfig};

use crate::records::RawEdge;
use crate::SpatialResult;

/// Pure mapping from raw edge attributes to a scalar weight.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CostModel {
    pub default_speed_kmh: f64,
    pub risk_factor:       f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            default_speed_kmh: DEFAULT_SPEED_KMH,
            risk_factor:       DEFAULT_RISK_FACTOR,
        }
    }
}

impl CostModel {
    /// Build from a validated configuration.
    pub fn from_config(config: &EngineConfig) -> SpatialResult<Self> {
        config.validate()?;
        Ok(Self {
            default_speed_kmh: config.default_speed_kmh,
            risk_factor:       config.risk_factor,
        })
    }

    /// Speed actually used for an edge.
    #[inline]
    pub fn effective_speed(&self, max_speed_kmh: Option<f64>) -> f64 {
        match max_speed_kmh {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => self.default_speed_kmh,
        }
    }

    /// Travel time in minutes before the risk penalty.
    #[inline]
    pub fn base_minutes(&self, length_m: f64, max_speed_kmh: Option<f64>) -> f64 {
        (length_m / 1000.0 / self.effective_speed(max_speed_kmh)) * 60.0
    }

    /// `1 + risk_factor * vulnerability`; missing or NaN vulnerability is 0.
    #[inline]
    pub fn risk_multiplier(&self, vulnerability: Option<f64>) -> f64 {
        let v = vulnerability.filter(|v| v.is_finite()).unwrap_or(0.0);
        1.0 + v * self.risk_factor
    }

    /// Edge cost.  `_one_way` is accepted so every raw attribute flows
    /// through one entry point; it has no effect on the result.
    #[inline]
    pub fn weight(
        &self,
        length_m:      f64,
        max_speed_kmh: Option<f64>,
        vulnerability: Option<f64>,
        _one_way:      bool,
    ) -> f64 {
        self.base_minutes(length_m, max_speed_kmh) * self.risk_multiplier(vulnerability)
    }

    #[inline]
    pub fn edge_weight(&self, edge: &RawEdge) -> f64 {
        self.weight(edge.length_m, edge.max_speed_kmh, edge.vulnerability, edge.is_one_way())
    }
}

/// [`CostModel::weight`] with the default constants.
#[inline]
pub fn weight(length_m: f64, max_speed_kmh: Option<f64>, vulnerability: Option<f64>, one_way: bool) -> f64 {
    CostModel::default().weight(length_m, max_speed_kmh, vulnerability, one_way)
}
