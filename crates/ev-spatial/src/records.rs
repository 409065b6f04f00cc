//! Input records handed to the network builder.
//!
//! These mirror the rows of the node, edge and safe-point tables.  Optional
//! fields stay `Option` here; defaults are applied by the cost model, never
//! at parse time, so a record always says exactly what the source said.

use ev_core::GeoPoint;

/// A road node as it appears in the source data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct RawNode {
    /// Stable external identifier (e.g. OSM node id).
    pub id:  i64,
    pub lat: f64,
    pub lon: f64,
}

impl RawNode {
    pub fn new(id: i64, lat: f64, lon: f64) -> Self {
        Self { id, lat, lon }
    }

    #[inline]
    pub fn pos(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// A street segment as it appears in the source data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct RawEdge {
    pub origin:        i64,
    pub destination:   i64,
    /// Physical length in metres.
    pub length_m:      f64,
    /// Posted speed limit in km/h.
    pub max_speed_kmh: Option<f64>,
    /// Seismic vulnerability on the source's risk scale.
    pub vulnerability: Option<f64>,
    /// `Some(true)` adds only the `origin → destination` arc.
    pub one_way:       Option<bool>,
}

impl RawEdge {
    /// Two-way edge with no speed or vulnerability data.
    pub fn new(origin: i64, destination: i64, length_m: f64) -> Self {
        Self {
            origin,
            destination,
            length_m,
            max_speed_kmh: None,
            vulnerability: None,
            one_way: None,
        }
    }

    pub fn with_speed(mut self, kmh: f64) -> Self {
        self.max_speed_kmh = Some(kmh);
        self
    }

    pub fn with_vulnerability(mut self, v: f64) -> Self {
        self.vulnerability = Some(v);
        self
    }

    pub fn one_way(mut self) -> Self {
        self.one_way = Some(true);
        self
    }

    #[inline]
    pub fn is_one_way(&self) -> bool {
        self.one_way.unwrap_or(false)
    }
}

/// A designated evacuation destination.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SafePoint {
    pub lat:  f64,
    pub lon:  f64,
    /// Display name shown by the presentation layer.
    pub name: String,
}

impl SafePoint {
    pub fn new(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self { lat, lon, name: name.into() }
    }

    #[inline]
    pub fn pos(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}
