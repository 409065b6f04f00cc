//! `ev-spatial` — risk-weighted road network, spatial indexing, routing and
//! centrality.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`records`]    | `RawNode`, `RawEdge`, `SafePoint` input rows               |
//! | [`cost`]       | `CostModel`: time × risk edge weights                      |
//! | [`network`]    | `RoadNetwork` (directed + undirected CSR), `NetworkBuilder`|
//! | [`index`]      | `SpatialIndex`: nearest node over an R-tree                |
//! | [`router`]     | `PathFinder`, `Dijkstra`, `AStar`, `BellmanFord`, `Algorithm` |
//! | [`centrality`] | Brandes betweenness, `rank_critical_nodes`                 |
//! | [`loader`]     | CSV loaders for nodes, edges and safe points               |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                         |
//!
//! # Feature flags
//!
//! | Flag        | Effect                                                   |
//! |-------------|----------------------------------------------------------|
//! | `parallel`  | Runs betweenness pivots on Rayon's thread pool.          |
//! | `serialize` | Derives `Serialize` on records, stats and results.       |

pub mod centrality;
pub mod cost;
pub mod error;
pub mod index;
pub mod loader;
pub mod network;
pub mod records;
pub mod router;


pub use centrality::{CriticalNode, CriticalNodeRanking, betweenness, rank_critical_nodes, select_pivots};
pub use cost::CostModel;
pub use error::{SpatialError, SpatialResult};
pub use index::SpatialIndex;
pub use network::{BuildStats, NetworkBuilder, NodeRecord, RoadNetwork};
pub use records::{RawEdge, RawNode, SafePoint};
pub use router::{
    AStar, Algorithm, BellmanFord, Dijkstra, FnHeuristic, Heuristic, Path, PathFinder,
    PlanarDistance, ShortestPathTree, route_to_best,
};
