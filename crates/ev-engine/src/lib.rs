//! `ev-engine` — evacuation routing and critical-node analysis over a loaded
//! road network.
//!
//! # Flow
//!
//! ```text
//! node / edge / safe-point records
//!        │  Session::load        (cost model → builder → largest component
//!        ▼                        → R-tree → safe points resolved to nodes)
//!   Arc<Session>  ──► find_route(origin, algorithm)   → RouteResult
//!                 └─► find_critical_nodes(top_k, k)   → CriticalNodeRanking
//! ```
//!
//! Hosts that must stay responsive run these through [`TaskQueue`], which
//! executes each request on a background thread and hands back outcomes
//! through a polled channel.
//!
//! # Cargo features
//!
//! | Feature     | Effect                                                |
//! |-------------|-------------------------------------------------------|
//! | `parallel`  | Runs betweenness pivots on Rayon's thread pool.       |
//! | `serialize` | Derives `Serialize` on results and load reports.      |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ev_core::{EngineConfig, GeoPoint};
//! use ev_engine::Session;
//! use ev_spatial::{Algorithm, loader};
//!
//! let nodes = loader::load_nodes_csv("nodes.csv".as_ref())?;
//! let edges = loader::load_edges_csv("edges.csv".as_ref())?;
//! let safe  = loader::load_safe_points_csv("safe_points.csv".as_ref())?;
//! let session = Session::load(&nodes, &edges, &safe, &EngineConfig::default())?;
//! let route = session.find_route(GeoPoint::new(-12.05, -77.04), Algorithm::AStar)?;
//! ```

pub mod error;
pub mod session;
pub mod worker;

#[cfg(test)]
mod tests;

pub use error::{EngineError, EngineResult};
pub use session::{LoadReport, RouteResult, Session};
pub use worker::{Supersede, TaskKind, TaskOutcome, TaskQueue, Ticket};
