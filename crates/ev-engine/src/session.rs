//! The loaded-network session and its two query operations.
//!
//! A [`Session`] owns everything a query needs: the road network restricted
//! to its largest component, the nearest-node index over that network, and
//! the usable safe points already resolved to nodes.  It is immutable after
//! [`Session::load`], so one `Arc<Session>` can serve any number of
//! concurrent route and centrality requests without locking.

use std::fmt;
use std::time::{Duration, Instant};

use log::{info, warn};

use ev_core::{EngineConfig, GeoPoint, NodeId, PivotRng};
use ev_spatial::{
    Algorithm, BuildStats, CostModel, CriticalNodeRanking, NetworkBuilder, RawEdge, RawNode,
    RoadNetwork, SafePoint, SpatialError, SpatialIndex, rank_critical_nodes, route_to_best,
};

use crate::{EngineError, EngineResult};

// ── Results ───────────────────────────────────────────────────────────────────

/// Summary of a completed load.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct LoadReport {
    pub node_count:            usize,
    /// Distinct undirected edges.
    pub edge_count:            usize,
    /// Directed arcs in the routing view.
    pub arc_count:             usize,
    pub usable_safe_points:    usize,
    /// Safe points dropped for non-finite coordinates.
    pub discarded_safe_points: usize,
    pub stats:                 BuildStats,
    pub elapsed:               Duration,
}

/// Cheapest evacuation route from one origin.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct RouteResult {
    /// Nodes from the origin's nearest node to the destination's, inclusive.
    pub nodes:       Vec<NodeId>,
    /// Total risk-weighted cost in minutes.
    pub cost:        f64,
    pub destination: SafePoint,
    pub algorithm:   Algorithm,
    pub elapsed:     Duration,
}

impl RouteResult {
    pub fn origin_node(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn destination_node(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

pub struct Session {
    config:      EngineConfig,
    network:     RoadNetwork<f64>,
    index:       SpatialIndex,
    safe_points: Vec<SafePoint>,
    /// Nearest node of each entry in `safe_points`.
    targets:     Vec<NodeId>,
    report:      LoadReport,
}

impl Session {
    /// Build the network, the spatial index, and the candidate table.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Config`] if `config` fails validation.
    /// - [`EngineError::Data`] if no valid node or edge survives filtering.
    pub fn load(
        nodes:       &[RawNode],
        edges:       &[RawEdge],
        safe_points: &[SafePoint],
        config:      &EngineConfig,
    ) -> EngineResult<Self> {
        let started = Instant::now();
        config.validate()?;
        let model = CostModel::from_config(config).map_err(load_error)?;

        let network = NetworkBuilder::from_records(nodes, edges, &model)
            .build()
            .map_err(load_error)?;
        let index = SpatialIndex::build(&network.nodes);

        let mut usable  = Vec::with_capacity(safe_points.len());
        let mut targets = Vec::with_capacity(safe_points.len());
        for sp in safe_points {
            if let Some(node) = index.nearest(sp.pos()) {
                usable.push(sp.clone());
                targets.push(node);
            }
        }
        let discarded = safe_points.len() - usable.len();
        if discarded > 0 {
            warn!("discarded {discarded} safe points with invalid coordinates");
        }
        if usable.is_empty() {
            warn!("no usable safe points; every route request will fail");
        }

        let report = LoadReport {
            node_count:            network.node_count(),
            edge_count:            network.edge_count,
            arc_count:             network.arc_count(),
            usable_safe_points:    usable.len(),
            discarded_safe_points: discarded,
            stats:                 network.stats,
            elapsed:               started.elapsed(),
        };
        info!(
            "session loaded in {:.2?}: {} nodes, {} arcs, {} safe points",
            report.elapsed, report.node_count, report.arc_count, report.usable_safe_points
        );

        Ok(Self {
            config: config.clone(),
            network,
            index,
            safe_points: usable,
            targets,
            report,
        })
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn network(&self) -> &RoadNetwork<f64> {
        &self.network
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Usable safe points, in load order.
    pub fn safe_points(&self) -> &[SafePoint] {
        &self.safe_points
    }

    /// Nearest retained node to `pos`.
    pub fn nearest_node(&self, pos: GeoPoint) -> EngineResult<NodeId> {
        self.index.nearest(pos).ok_or(EngineError::InvalidCoordinate(pos))
    }

    /// Route from `origin` to the cheapest reachable safe point.
    ///
    /// Equal-cost safe points resolve to the one loaded first.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidCoordinate`] for a non-finite origin.
    /// - [`EngineError::NoRouteFound`] when no safe point is reachable.
    pub fn find_route(&self, origin: GeoPoint, algorithm: Algorithm) -> EngineResult<RouteResult> {
        let started = Instant::now();
        let from = self.nearest_node(origin)?;
        let finder = algorithm.finder::<f64>();

        let (i, path) = route_to_best(finder.as_ref(), &self.network, from, &self.targets)
            .map_err(|e| match e {
                SpatialError::Unreachable { from } => EngineError::NoRouteFound { origin: from },
                // Negative cycles and foreign node ids; the cost model and
                // index never produce either.
                other => EngineError::Computation(other),
            })?;

        let result = RouteResult {
            nodes:       path.nodes,
            cost:        path.cost,
            destination: self.safe_points[i].clone(),
            algorithm,
            elapsed:     started.elapsed(),
        };
        info!(
            "{algorithm} route from {from} to {:?}: cost {:.3}, {} nodes in {:.2?}",
            result.destination.name,
            result.cost,
            result.nodes.len(),
            result.elapsed
        );
        Ok(result)
    }

    /// Rank nodes by betweenness.
    ///
    /// Pivots are drawn from a fresh RNG seeded with `config.seed`, so the
    /// same arguments always return the same ranking.
    pub fn find_critical_nodes(
        &self,
        top_k:       usize,
        sample_size: Option<usize>,
    ) -> EngineResult<CriticalNodeRanking> {
        let mut rng = PivotRng::new(self.config.seed);
        rank_critical_nodes(&self.network, top_k, sample_size, &mut rng)
            .map_err(EngineError::Computation)
    }

    /// Coordinates of every node on `route`, for drawing.
    pub fn path_coords(&self, route: &RouteResult) -> Vec<GeoPoint> {
        route.nodes.iter().map(|&n| self.network.node_pos(n)).collect()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

fn load_error(e: SpatialError) -> EngineError {
    match e {
        SpatialError::Core(c) => EngineError::Config(c),
        other => EngineError::Data(other),
    }
}
