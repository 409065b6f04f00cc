//! Nearest-node spatial index.
//!
//! An R-tree (via `rstar`) bulk-loaded from the retained node table maps a
//! `(lat, lon)` query to the closest `NodeId`.  Because it is built after
//! component filtering, a query can never answer with a node outside the
//! usable graph.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use ev_core::{GeoPoint, NodeId};

use crate::network::NodeRecord;

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a `[lat, lon]` point with its `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon degrees.  No geodesic
    /// correction; snapping must match the planar approximation.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── SpatialIndex ──────────────────────────────────────────────────────────────

/// Immutable nearest-neighbour index over node coordinates.
pub struct SpatialIndex {
    tree: RTree<NodeEntry>,
}

impl SpatialIndex {
    /// Bulk-load the index from a node table (`NodeId` = position in slice).
    ///
    /// O(N log N); faster than N inserts.
    pub fn build(nodes: &[NodeRecord]) -> Self {
        let entries: Vec<NodeEntry> = nodes
            .iter()
            .enumerate()
            .map(|(i, rec)| NodeEntry {
                point: rec.pos.to_array(),
                id:    NodeId::from_index(i),
            })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// `NodeId` of the node nearest to `pos`.
    ///
    /// Returns `None` if the index is empty or `pos` has a non-finite
    /// component.
    pub fn nearest(&self, pos: GeoPoint) -> Option<NodeId> {
        if !(pos.lat.is_finite() && pos.lon.is_finite()) {
            return None;
        }
        self.tree.nearest_neighbor(&pos.to_array()).map(|e| e.id)
    }

    /// Up to `k` nearest nodes to `pos`, sorted by ascending distance.
    pub fn k_nearest(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        if !(pos.lat.is_finite() && pos.lon.is_finite()) {
            return Vec::new();
        }
        self.tree
            .nearest_neighbor_iter(&pos.to_array())
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}
