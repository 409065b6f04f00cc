//! Synthetic street grid over central Lima.
//!
//! Node layout (`ROWS × COLS`, row = south→north, col = west→east):
//!
//! ```text
//!  col:  0 ............................................ COLS-1
//!        Costa Verde (older, more vulnerable)    ...    Surco
//! ```
//!
//! - every fourth row and column is an avenue at 60 km/h; the rest carry no
//!   speed limit and fall back to the configured default;
//! - odd rows are one-way, alternating east- and westbound;
//! - vulnerability falls off from the coast (west) inland.

use ev_spatial::{RawEdge, RawNode, SafePoint};

pub const ROWS: usize = 30;
pub const COLS: usize = 30;

/// Southern latitude and step between rows (~440 m/step).
const LAT_MIN:  f64 = -12.135;
const LAT_STEP: f64 = 0.004;

/// Western longitude and step between columns (~435 m/step near Lima).
const LON_MIN:  f64 = -77.085;
const LON_STEP: f64 = 0.004;

const AVENUE_KMH: f64 = 60.0;

/// Named parks and plazas, placed at `(row, col)` cells with a small offset
/// so they snap to a nearby node rather than sit on one.
const SAFE_POINTS: &[(&str, usize, usize)] = &[
    ("Parque Kennedy",       6,  9),
    ("Parque El Olivar",    12, 12),
    ("Campo de Marte",      21, 15),
    ("Parque de la Reserva", 24, 20),
    ("Parque Reducto",       2,  5),
    ("Pentagonito",          9, 26),
];

fn external_id(row: usize, col: usize) -> i64 {
    1_000 + (row * COLS + col) as i64
}

fn position(row: usize, col: usize) -> (f64, f64) {
    (LAT_MIN + row as f64 * LAT_STEP, LON_MIN + col as f64 * LON_STEP)
}

/// Node, edge and safe-point records for the grid.
pub fn build_records() -> (Vec<RawNode>, Vec<RawEdge>, Vec<SafePoint>) {
    let mut nodes = Vec::with_capacity(ROWS * COLS);
    for row in 0..ROWS {
        for col in 0..COLS {
            let (lat, lon) = position(row, col);
            nodes.push(RawNode::new(external_id(row, col), lat, lon));
        }
    }

    let mut edges = Vec::with_capacity(2 * ROWS * COLS);

    // Horizontal streets.
    for row in 0..ROWS {
        // Correct east-west distance for latitude (cos projection).
        let lat_rad = position(row, 0).0.to_radians();
        let dist_m  = LON_STEP * lat_rad.cos() * 111_320.0;
        for col in 0..COLS - 1 {
            let (a, b) = match row % 4 {
                3 => (external_id(row, col + 1), external_id(row, col)),
                _ => (external_id(row, col), external_id(row, col + 1)),
            };
            let mut e = RawEdge::new(a, b, dist_m).with_vulnerability(vulnerability(col));
            if row % 4 == 0 {
                e = e.with_speed(AVENUE_KMH);
            }
            if row % 2 == 1 {
                e = e.one_way();
            }
            edges.push(e);
        }
    }

    // Vertical streets, all two-way.
    let dist_m = LAT_STEP * 111_320.0;
    for row in 0..ROWS - 1 {
        for col in 0..COLS {
            let mut e = RawEdge::new(external_id(row, col), external_id(row + 1, col), dist_m)
                .with_vulnerability(vulnerability(col));
            if col % 4 == 0 {
                e = e.with_speed(AVENUE_KMH);
            }
            edges.push(e);
        }
    }

    let safe_points = SAFE_POINTS
        .iter()
        .map(|&(name, row, col)| {
            let (lat, lon) = position(row, col);
            SafePoint::new(lat + 0.0007, lon - 0.0005, name)
        })
        .collect();

    (nodes, edges, safe_points)
}

/// 0.6 on the coast down to 0.0 at the eastern edge.
fn vulnerability(col: usize) -> f64 {
    0.6 * (COLS - 1 - col) as f64 / (COLS - 1) as f64
}
