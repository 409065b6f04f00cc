//! `ev-core` — foundational types for the `evroute` evacuation engine.
//!
//! This crate is a dependency of every other `ev-*` crate.  It has no `ev-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `ArcId`                                     |
//! | [`geo`]         | `GeoPoint`, planar lat/lon distance                   |
//! | [`weight`]      | `Weight` trait (f64, f32, u32, u64)                   |
//! | [`rng`]         | `PivotRng` (seeded pivot sampling)                    |
//! | [`config`]      | `EngineConfig`                                        |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod weight;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DEFAULT_RISK_FACTOR, DEFAULT_SPEED_KMH, EngineConfig};
pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{ArcId, NodeId};
pub use rng::PivotRng;
pub use weight::Weight;
