//! CSV loaders for nodes, edges and safe points.
//!
//! # CSV format
//!
//! Headers are required; column order does not matter.
//!
//! ```csv
//! id,lat,lon
//! 101,-12.0464,-77.0428
//! ```
//!
//! ```csv
//! origin,destination,length_m,max_speed_kmh,vulnerability,one_way
//! 101,102,85.3,40,0.2,false
//! ```
//!
//! ```csv
//! lat,lon,name
//! -12.0560,-77.0844,Parque Central
//! ```
//!
//! The edge and safe-point tables also accept the column names used by the
//! municipal exports:
//!
//! | Canonical       | Alias            |
//! |-----------------|------------------|
//! | `origin`        | `origen`         |
//! | `destination`   | `destino`        |
//! | `length_m`      | `longitud`       |
//! | `max_speed_kmh` | `velocidad_max`  |
//! | `vulnerability` | `vulnerabilidad` |
//! | `one_way`       | `sentido_unico`  |
//! | `name`          | `nombre`         |
//!
//! Numeric cells that fail to parse are read as missing rather than aborting
//! the load.  A missing node coordinate drops the node at build time, a
//! missing speed falls back to the configured default.  Edge rows without
//! both endpoints or a length are skipped with a warning.  `one_way`
//! accepts `true/false/1/0/yes/no` in any case; anything else means two-way.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Deserializer};

use crate::records::{RawEdge, RawNode, SafePoint};
use crate::{SpatialError, SpatialResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRow {
    id:  i64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    lon: Option<f64>,
}

#[derive(Deserialize)]
struct EdgeRow {
    #[serde(alias = "origen", default, deserialize_with = "csv::invalid_option")]
    origin:        Option<i64>,
    #[serde(alias = "destino", default, deserialize_with = "csv::invalid_option")]
    destination:   Option<i64>,
    #[serde(alias = "longitud", default, deserialize_with = "csv::invalid_option")]
    length_m:      Option<f64>,
    #[serde(alias = "velocidad_max", default, deserialize_with = "csv::invalid_option")]
    max_speed_kmh: Option<f64>,
    #[serde(alias = "vulnerabilidad", default, deserialize_with = "csv::invalid_option")]
    vulnerability: Option<f64>,
    #[serde(alias = "sentido_unico", default, deserialize_with = "lenient_bool")]
    one_way:       Option<bool>,
}

#[derive(Deserialize)]
struct SafePointRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    lat:  Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    lon:  Option<f64>,
    #[serde(alias = "nombre", default)]
    name: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load road nodes from a CSV file.
pub fn load_nodes_csv(path: &Path) -> SpatialResult<Vec<RawNode>> {
    let file = File::open(path).map_err(SpatialError::Io)?;
    load_nodes_reader(file)
}

/// Like [`load_nodes_csv`] but accepts any `Read` source.
pub fn load_nodes_reader<R: Read>(reader: R) -> SpatialResult<Vec<RawNode>> {
    let mut rdr = csv_reader(reader);
    let mut nodes = Vec::new();
    for result in rdr.deserialize::<NodeRow>() {
        let row = result?;
        nodes.push(RawNode::new(
            row.id,
            row.lat.unwrap_or(f64::NAN),
            row.lon.unwrap_or(f64::NAN),
        ));
    }
    Ok(nodes)
}

/// Load street segments from a CSV file.
pub fn load_edges_csv(path: &Path) -> SpatialResult<Vec<RawEdge>> {
    let file = File::open(path).map_err(SpatialError::Io)?;
    load_edges_reader(file)
}

/// Like [`load_edges_csv`] but accepts any `Read` source.
pub fn load_edges_reader<R: Read>(reader: R) -> SpatialResult<Vec<RawEdge>> {
    let mut rdr = csv_reader(reader);
    let mut edges = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.deserialize::<EdgeRow>() {
        let row = result?;
        let (Some(origin), Some(destination), Some(length_m)) =
            (row.origin, row.destination, row.length_m)
        else {
            skipped += 1;
            continue;
        };
        edges.push(RawEdge {
            origin,
            destination,
            length_m,
            max_speed_kmh: row.max_speed_kmh,
            vulnerability: row.vulnerability,
            one_way:       row.one_way,
        });
    }
    if skipped > 0 {
        warn!("skipped {skipped} edge rows with a missing endpoint or length");
    }
    Ok(edges)
}

/// Load evacuation destinations from a CSV file.
pub fn load_safe_points_csv(path: &Path) -> SpatialResult<Vec<SafePoint>> {
    let file = File::open(path).map_err(SpatialError::Io)?;
    load_safe_points_reader(file)
}

/// Like [`load_safe_points_csv`] but accepts any `Read` source.
///
/// Rows with unparseable coordinates are kept as non-finite points; the
/// session discards them when resolving safe points to nodes.
pub fn load_safe_points_reader<R: Read>(reader: R) -> SpatialResult<Vec<SafePoint>> {
    let mut rdr = csv_reader(reader);
    let mut points = Vec::new();
    for result in rdr.deserialize::<SafePointRow>() {
        let row = result?;
        points.push(SafePoint::new(
            row.lat.unwrap_or(f64::NAN),
            row.lon.unwrap_or(f64::NAN),
            row.name,
        ));
    }
    Ok(points)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn lenient_bool<'de, D>(de: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.as_deref().and_then(parse_bool))
}
