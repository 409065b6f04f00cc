//! Geographic coordinate type.
//!
//! Distances between points are measured as plain Euclidean distance in
//! degree space: `(lat, lon)` is treated as a flat 2-D coordinate.  At city
//! scale this is what both nearest-node snapping and the A* heuristic use,
//! and it must stay that way for routes to match the reference behaviour.

/// A WGS-84 geographic coordinate in double precision.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` if both components are finite and inside the WGS-84 range.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Squared planar distance in degrees².
    #[inline]
    pub fn planar_distance_2(self, other: GeoPoint) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        dlat * dlat + dlon * dlon
    }

    /// Planar (non-geodesic) distance in degrees.
    #[inline]
    pub fn planar_distance(self, other: GeoPoint) -> f64 {
        self.planar_distance_2(other).sqrt()
    }

    /// `[lat, lon]` pair, the layout used by the spatial index.
    #[inline]
    pub fn to_array(self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
