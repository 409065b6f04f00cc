//! Road network representation and builder.
//!
//! # Two views, one set of weights
//!
//! A [`RoadNetwork`] carries two adjacency structures over the same nodes:
//!
//! - the **directed view** (`arc_*` arrays) used for routing: a one-way
//!   edge contributes one arc, a two-way edge contributes two;
//! - the **undirected view** (`adj_*` arrays) used for connectivity and
//!   centrality: every edge is traversable both ways.
//!
//! Both are stored in **Compressed Sparse Row (CSR)** format.  Outgoing arcs
//! of `NodeId n` occupy
//!
//! ```text
//! arc_to[ arc_start[n] .. arc_start[n+1] ]
//! ```
//!
//! and likewise for `adj_start` / `adj_to`.  Within one node's slice, arcs
//! keep the order in which their edges were first added, so every traversal
//! (and therefore every tie-break) is reproducible from the input order.
//!
//! # Largest component
//!
//! [`NetworkBuilder::build`] keeps only the largest connected component of
//! the undirected view.  Components are discovered by breadth-first search
//! started from nodes in input order; on equal size the component found
//! first wins.

use std::collections::VecDeque;
use std::ops::Range;

use log::{info, warn};
use rustc_hash::FxHashMap;

use ev_core::{ArcId, GeoPoint, NodeId, Weight};

use crate::cost::CostModel;
use crate::records::{RawEdge, RawNode};
use crate::{SpatialError, SpatialResult};

// ── Node table ────────────────────────────────────────────────────────────────

/// A retained node: external id plus position.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct NodeRecord {
    pub external_id: i64,
    pub pos:         GeoPoint,
}

/// Counters collected while building, for load reports and logging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct BuildStats {
    /// Node records offered to the builder.
    pub nodes_in:        usize,
    /// Node records rejected for bad coordinates or duplicate ids.
    pub nodes_dropped:   usize,
    /// Edge records offered to the builder.
    pub edges_in:        usize,
    /// Edge records rejected for unknown endpoints or unusable weight.
    pub edges_skipped:   usize,
    /// Connected components found before filtering.
    pub components:      usize,
    /// Nodes kept in the largest component.
    pub retained_nodes:  usize,
    /// Valid nodes discarded because they sit outside that component.
    pub discarded_nodes: usize,
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Weighted road graph restricted to its largest connected component.
///
/// All arrays are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`NetworkBuilder`].
pub struct RoadNetwork<W: Weight = f64> {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Retained nodes, in input order.  Indexed by `NodeId`.
    pub nodes: Vec<NodeRecord>,

    // ── Directed view (routing) ───────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub arc_start: Vec<u32>,
    /// Source node of each arc (needed for path reconstruction).
    pub arc_from: Vec<NodeId>,
    /// Destination node of each arc.
    pub arc_to: Vec<NodeId>,
    /// Cost of each arc.
    pub arc_weight: Vec<W>,

    // ── Undirected view (connectivity, centrality) ────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub adj_start: Vec<u32>,
    /// Neighbour on the other end of each half-edge.
    pub adj_to: Vec<NodeId>,
    /// Cost of each half-edge (shared with the directed view).
    pub adj_weight: Vec<W>,

    /// Number of distinct undirected edges.
    pub edge_count: usize,

    /// Counters from the build that produced this network.
    pub stats: BuildStats,

    by_external: FxHashMap<i64, NodeId>,
}

impl<W: Weight> RoadNetwork<W> {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed arcs in the routing view.
    pub fn arc_count(&self) -> usize {
        self.arc_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Node lookups ──────────────────────────────────────────────────────

    #[inline]
    pub fn node_pos(&self, node: NodeId) -> GeoPoint {
        self.nodes[node.index()].pos
    }

    #[inline]
    pub fn external_id(&self, node: NodeId) -> i64 {
        self.nodes[node.index()].external_id
    }

    /// `NodeId` of a retained node by its external id.
    pub fn node_by_external(&self, external_id: i64) -> Option<NodeId> {
        self.by_external.get(&external_id).copied()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    // ── Directed traversal ────────────────────────────────────────────────

    /// Iterator over the `ArcId`s of all outgoing arcs from `node`.
    ///
    /// A contiguous index range; no heap allocation.
    #[inline]
    pub fn out_arcs(&self, node: NodeId) -> impl Iterator<Item = ArcId> + '_ {
        self.arc_range(node).map(ArcId::from_index)
    }

    /// Out-degree of `node` in the directed view.
    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.arc_range(node).len()
    }

    #[inline]
    fn arc_range(&self, node: NodeId) -> Range<usize> {
        self.arc_start[node.index()] as usize..self.arc_start[node.index() + 1] as usize
    }

    // ── Undirected traversal ──────────────────────────────────────────────

    /// `(neighbour, weight)` pairs of `node` in the undirected view.
    #[inline]
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, W)> + '_ {
        let start = self.adj_start[node.index()] as usize;
        let end   = self.adj_start[node.index() + 1] as usize;
        (start..end).map(move |i| (self.adj_to[i], self.adj_weight[i]))
    }

    /// Degree of `node` in the undirected view.
    #[inline]
    pub fn degree(&self, node: NodeId) -> usize {
        (self.adj_start[node.index() + 1] - self.adj_start[node.index()]) as usize
    }

    /// Connected components of the undirected view.  Always 1 for a built
    /// network; exposed so callers and tests can check the invariant.
    pub fn component_count(&self) -> usize {
        let n = self.node_count();
        let mut seen = vec![false; n];
        let mut count = 0;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            count += 1;
            bfs(NodeId::from_index(start), &mut seen, |v| {
                self.neighbors(v).map(|(w, _)| w).collect::<Vec<_>>()
            });
        }
        count
    }
}

/// Mark everything reachable from `start`, returning nodes in visit order.
fn bfs<F, I>(start: NodeId, seen: &mut [bool], mut next: F) -> Vec<NodeId>
where
    F: FnMut(NodeId) -> I,
    I: IntoIterator<Item = NodeId>,
{
    let mut order = Vec::new();
    let mut queue = VecDeque::from([start]);
    seen[start.index()] = true;
    while let Some(v) = queue.pop_front() {
        order.push(v);
        for w in next(v) {
            if !seen[w.index()] {
                seen[w.index()] = true;
                queue.push_back(w);
            }
        }
    }
    order
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// Nodes are keyed by their external id.  Edges may reference nodes added
/// later; endpoints are resolved at build time.
///
/// # Example
///
/// ```
/// use ev_spatial::{NetworkBuilder, RawEdge, RawNode};
///
/// let mut b = NetworkBuilder::new();
/// b.add_node(&RawNode::new(10, -12.10, -77.03));
/// b.add_node(&RawNode::new(11, -12.11, -77.03));
/// b.add_raw_edge(&RawEdge::new(10, 11, 500.0), &Default::default());
/// let net = b.build().unwrap();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.arc_count(), 2); // two-way
/// ```
pub struct NetworkBuilder<W: Weight = f64> {
    nodes:     Vec<NodeRecord>,
    index:     FxHashMap<i64, u32>,
    edges:     Vec<PendingEdge<W>>,
    stats:     BuildStats,
}

struct PendingEdge<W> {
    origin:      i64,
    destination: i64,
    weight:      W,
    one_way:     bool,
}

impl<W: Weight> NetworkBuilder<W> {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            index: FxHashMap::default(),
            edges: Vec::with_capacity(edges),
            stats: BuildStats::default(),
        }
    }

    /// Add a node.  Returns `false` (and counts the drop) if the coordinate
    /// is invalid or the external id was already added.
    pub fn add_node(&mut self, node: &RawNode) -> bool {
        self.stats.nodes_in += 1;
        if !node.pos().is_valid() || self.index.contains_key(&node.id) {
            self.stats.nodes_dropped += 1;
            return false;
        }
        self.index.insert(node.id, self.nodes.len() as u32);
        self.nodes.push(NodeRecord { external_id: node.id, pos: node.pos() });
        true
    }

    /// Add an edge with a precomputed weight.
    ///
    /// Two-way edges (`one_way == false`) produce arcs in both directions.
    pub fn add_edge(&mut self, origin: i64, destination: i64, weight: W, one_way: bool) {
        self.stats.edges_in += 1;
        self.edges.push(PendingEdge { origin, destination, weight, one_way });
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`] restricted to the
    /// largest connected component.
    ///
    /// # Errors
    ///
    /// [`SpatialError::EmptyNetwork`] if no valid node or no valid edge
    /// survives filtering.
    pub fn build(self) -> SpatialResult<RoadNetwork<W>> {
        let NetworkBuilder { nodes, index, edges, mut stats } = self;

        if nodes.is_empty() {
            return Err(SpatialError::EmptyNetwork("no valid nodes"));
        }
        if nodes.len() >= u32::MAX as usize {
            return Err(SpatialError::TooLarge(nodes.len()));
        }

        // ── Resolve endpoints and de-duplicate (last weight wins) ─────────
        let mut undirected: Vec<(u32, u32, W)> = Vec::with_capacity(edges.len());
        let mut arcs:       Vec<(u32, u32, W)> = Vec::with_capacity(edges.len() * 2);
        let mut und_slot: FxHashMap<(u32, u32), usize> = FxHashMap::default();
        let mut arc_slot: FxHashMap<(u32, u32), usize> = FxHashMap::default();

        for e in &edges {
            let (Some(&a), Some(&b)) = (index.get(&e.origin), index.get(&e.destination)) else {
                stats.edges_skipped += 1;
                continue;
            };
            if !e.weight.is_usable() {
                stats.edges_skipped += 1;
                continue;
            }
            upsert(&mut undirected, &mut und_slot, (a.min(b), a.max(b)), (a, b, e.weight));
            upsert(&mut arcs, &mut arc_slot, (a, b), (a, b, e.weight));
            if !e.one_way {
                upsert(&mut arcs, &mut arc_slot, (b, a), (b, a, e.weight));
            }
        }

        if stats.edges_skipped > 0 {
            warn!("skipped {} of {} edge records", stats.edges_skipped, stats.edges_in);
        }
        if stats.nodes_dropped > 0 {
            warn!("dropped {} of {} node records", stats.nodes_dropped, stats.nodes_in);
        }
        if undirected.is_empty() {
            return Err(SpatialError::EmptyNetwork("no valid edges"));
        }

        // ── Largest connected component ───────────────────────────────────
        let n = nodes.len();
        let (start, _, to, _) = csr(n, undirected.iter().flat_map(|&(a, b, w)| half_edges(a, b, w)));
        let mut seen = vec![false; n];
        let mut best: Vec<NodeId> = Vec::new();
        for s in 0..n {
            if seen[s] {
                continue;
            }
            stats.components += 1;
            let comp = bfs(NodeId::from_index(s), &mut seen, |v| {
                to[start[v.index()] as usize..start[v.index() + 1] as usize].to_vec()
            });
            if comp.len() > best.len() {
                best = comp;
            }
        }

        // Renumber retained nodes densely, preserving input order.
        let mut retained = vec![false; n];
        for &v in &best {
            retained[v.index()] = true;
        }
        let mut remap = vec![NodeId::INVALID; n];
        let mut kept = Vec::with_capacity(best.len());
        for (i, rec) in nodes.into_iter().enumerate() {
            if retained[i] {
                remap[i] = NodeId::from_index(kept.len());
                kept.push(rec);
            }
        }
        stats.retained_nodes  = kept.len();
        stats.discarded_nodes = n - kept.len();

        let keep = |a: u32, b: u32| remap[a as usize].is_valid() && remap[b as usize].is_valid();
        let m = kept.len();

        let und_kept: Vec<(u32, u32, W)> = undirected
            .into_iter()
            .filter(|&(a, b, _)| keep(a, b))
            .map(|(a, b, w)| (remap[a as usize].0, remap[b as usize].0, w))
            .collect();
        let edge_count = und_kept.len();
        let (adj_start, _, adj_to, adj_weight) =
            csr(m, und_kept.iter().flat_map(|&(a, b, w)| half_edges(a, b, w)));

        let (arc_start, arc_from, arc_to, arc_weight) = csr(
            m,
            arcs.into_iter()
                .filter(|&(a, b, _)| keep(a, b))
                .map(|(a, b, w)| (remap[a as usize].0, remap[b as usize].0, w)),
        );

        let by_external = kept
            .iter()
            .enumerate()
            .map(|(i, r)| (r.external_id, NodeId::from_index(i)))
            .collect();

        info!(
            "network built: {} nodes, {} edges, {} arcs ({} components, {} nodes discarded)",
            m, edge_count, arc_to.len(), stats.components, stats.discarded_nodes
        );

        Ok(RoadNetwork {
            nodes: kept,
            arc_start,
            arc_from,
            arc_to,
            arc_weight,
            adj_start,
            adj_to,
            adj_weight,
            edge_count,
            stats,
            by_external,
        })
    }
}

impl NetworkBuilder<f64> {
    /// Builder pre-loaded with node and edge records, weighted by `model`.
    pub fn from_records(nodes: &[RawNode], edges: &[RawEdge], model: &CostModel) -> Self {
        let mut b = Self::with_capacity(nodes.len(), edges.len());
        for n in nodes {
            b.add_node(n);
        }
        for e in edges {
            b.add_raw_edge(e, model);
        }
        b
    }

    /// Add an edge record, computing its weight with `model`.
    pub fn add_raw_edge(&mut self, edge: &RawEdge, model: &CostModel) {
        let weight = model.edge_weight(edge);
        self.add_edge(edge.origin, edge.destination, weight, edge.is_one_way());
    }
}

impl<W: Weight> Default for NetworkBuilder<W> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Construction helpers ──────────────────────────────────────────────────────

/// Insert `value` under `key`, or overwrite the weight of the existing entry
/// while keeping its position.
fn upsert<W>(
    list:  &mut Vec<(u32, u32, W)>,
    slots: &mut FxHashMap<(u32, u32), usize>,
    key:   (u32, u32),
    value: (u32, u32, W),
) {
    match slots.get(&key) {
        Some(&i) => list[i].2 = value.2,
        None => {
            slots.insert(key, list.len());
            list.push(value);
        }
    }
}

/// Both directions of an undirected edge; a self-loop yields one entry.
fn half_edges<W: Copy>(a: u32, b: u32, w: W) -> impl Iterator<Item = (u32, u32, W)> {
    let back = (a != b).then_some((b, a, w));
    std::iter::once((a, b, w)).chain(back)
}

type Csr<W> = (Vec<u32>, Vec<NodeId>, Vec<NodeId>, Vec<W>);

/// Stable counting-sort of `(from, to, weight)` entries into CSR arrays.
fn csr<W: Weight>(n: usize, entries: impl Iterator<Item = (u32, u32, W)>) -> Csr<W> {
    let entries: Vec<(u32, u32, W)> = entries.collect();

    let mut start = vec![0u32; n + 1];
    for &(a, _, _) in &entries {
        start[a as usize + 1] += 1;
    }
    for i in 1..=n {
        start[i] += start[i - 1];
    }
    debug_assert_eq!(start[n] as usize, entries.len());

    let mut cursor: Vec<u32> = start[..n].to_vec();
    let mut from   = vec![NodeId::INVALID; entries.len()];
    let mut to     = vec![NodeId::INVALID; entries.len()];
    let mut weight = vec![W::ZERO; entries.len()];
    for &(a, b, w) in &entries {
        let slot = cursor[a as usize] as usize;
        cursor[a as usize] += 1;
        from[slot]   = NodeId(a);
        to[slot]     = NodeId(b);
        weight[slot] = w;
    }

    (start, from, to, weight)
}
