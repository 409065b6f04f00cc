//! Routing trait, the three shortest-path strategies, and best-candidate
//! selection.
//!
//! # Pluggability
//!
//! Callers route through the [`PathFinder`] trait, so a strategy can be
//! chosen at runtime ([`Algorithm::finder`]) or fixed at compile time.
//!
//! | Strategy         | Candidate evaluation                                  |
//! |------------------|-------------------------------------------------------|
//! | [`Dijkstra`]     | one shortest-path tree from the origin, looked up     |
//! | [`AStar`]        | one goal-directed search per candidate                |
//! | [`BellmanFord`]  | one queue-based Bellman-Ford run per candidate        |
//!
//! All strategies run on the **directed** view of the network and record
//! predecessor arcs, so the winning path is never recomputed.
//!
//! # Determinism
//!
//! Priority queues break key ties by insertion sequence and arcs are scanned
//! in CSR order, so identical inputs always yield identical paths.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::str::FromStr;

use ev_core::{ArcId, NodeId, Weight};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── Path ──────────────────────────────────────────────────────────────────────

/// The result of a shortest-path query: visited nodes, traversed arcs, and
/// total cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Path<W> {
    /// Nodes from source to destination inclusive.
    pub nodes: Vec<NodeId>,
    /// Arcs to traverse in order; `nodes.len() - 1` entries.
    pub arcs: Vec<ArcId>,
    /// Sum of arc weights.
    pub cost: W,
}

impl<W: Weight> Path<W> {
    fn trivial(node: NodeId) -> Self {
        Self { nodes: vec![node], arcs: vec![], cost: W::ZERO }
    }

    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.arcs.is_empty()
    }

    pub fn source(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn target(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable shortest-path strategy.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`; routing runs on background workers
/// that share one network.
pub trait PathFinder<W: Weight>: Send + Sync {
    /// Cheapest path from `from` to `to` over the directed view.
    ///
    /// `from == to` yields a trivial zero-cost path.  Returns
    /// [`SpatialError::NoRoute`] if `to` is unreachable.
    fn find_path(&self, network: &RoadNetwork<W>, from: NodeId, to: NodeId) -> SpatialResult<Path<W>>;

    /// Cheapest path from `from` to each of `targets` (`None` = unreachable).
    ///
    /// The default evaluates every target independently.
    fn find_paths(
        &self,
        network: &RoadNetwork<W>,
        from:    NodeId,
        targets: &[NodeId],
    ) -> SpatialResult<Vec<Option<Path<W>>>> {
        targets
            .iter()
            .map(|&to| match self.find_path(network, from, to) {
                Ok(p) => Ok(Some(p)),
                Err(SpatialError::NoRoute { .. }) => Ok(None),
                Err(e) => Err(e),
            })
            .collect()
    }
}

/// Pick the cheapest reachable target.
///
/// Returns `(index into targets, path)`.  Strict comparison: among equal-cost
/// targets the earliest in `targets` wins.
pub fn route_to_best<W: Weight>(
    finder:  &dyn PathFinder<W>,
    network: &RoadNetwork<W>,
    from:    NodeId,
    targets: &[NodeId],
) -> SpatialResult<(usize, Path<W>)> {
    let mut best: Option<(usize, Path<W>)> = None;
    for (i, path) in finder.find_paths(network, from, targets)?.into_iter().enumerate() {
        let Some(path) = path else { continue };
        log::debug!("candidate {i} ({}): cost {:?}", targets[i], path.cost);
        let better = match &best {
            None => true,
            Some((_, b)) => path.cost.cheaper_than(&b.cost),
        };
        if better {
            best = Some((i, path));
        }
    }
    best.ok_or(SpatialError::Unreachable { from })
}

// ── Algorithm selector ────────────────────────────────────────────────────────

/// Runtime-selectable routing strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
    BellmanFord,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Dijkstra, Algorithm::AStar, Algorithm::BellmanFord];

    /// Machine-readable name, accepted back by `FromStr`.
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Dijkstra    => "dijkstra",
            Algorithm::AStar       => "astar",
            Algorithm::BellmanFord => "bellman-ford",
        }
    }

    /// Human-readable label for status lines and legends.
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Dijkstra    => "Dijkstra",
            Algorithm::AStar       => "A*",
            Algorithm::BellmanFord => "Bellman-Ford",
        }
    }

    /// Boxed strategy.  A* uses the planar-distance heuristic.
    pub fn finder<W: Weight>(self) -> Box<dyn PathFinder<W>> {
        match self {
            Algorithm::Dijkstra    => Box::new(Dijkstra),
            Algorithm::AStar       => Box::new(AStar::planar()),
            Algorithm::BellmanFord => Box::new(BellmanFord),
        }
    }
}

impl FromStr for Algorithm {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dijkstra" => Ok(Algorithm::Dijkstra),
            "astar" | "a*" | "a-star" => Ok(Algorithm::AStar),
            "bellman-ford" | "bellman_ford" | "bellmanford" => Ok(Algorithm::BellmanFord),
            other => Err(SpatialError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Shared internals ──────────────────────────────────────────────────────────

/// Min-heap entry.  `BinaryHeap` is a max-heap, so ordering is reversed;
/// equal keys pop in insertion order.
pub(crate) struct QueueEntry<W> {
    pub key:  W,
    pub seq:  u64,
    pub node: NodeId,
}

impl<W: Weight> PartialEq for QueueEntry<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<W: Weight> Eq for QueueEntry<W> {}

impl<W: Weight> PartialOrd for QueueEntry<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W: Weight> Ord for QueueEntry<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn check_nodes<W: Weight>(network: &RoadNetwork<W>, nodes: &[NodeId]) -> SpatialResult<()> {
    match nodes.iter().find(|n| !network.contains(**n)) {
        Some(&n) => Err(SpatialError::NodeNotFound(n)),
        None => Ok(()),
    }
}

/// Walk predecessor arcs back from `to`.
fn reconstruct<W: Weight>(
    network:  &RoadNetwork<W>,
    prev_arc: &[ArcId],
    to:       NodeId,
    cost:     W,
) -> Path<W> {
    let mut arcs = Vec::new();
    let mut cur = to;
    loop {
        let a = prev_arc[cur.index()];
        if a == ArcId::INVALID {
            break;
        }
        arcs.push(a);
        cur = network.arc_from[a.index()];
    }
    arcs.reverse();

    let mut nodes = Vec::with_capacity(arcs.len() + 1);
    nodes.push(cur);
    nodes.extend(arcs.iter().map(|a| network.arc_to[a.index()]));
    Path { nodes, arcs, cost }
}

// ── Dijkstra ──────────────────────────────────────────────────────────────────

/// Standard Dijkstra over the directed view.
pub struct Dijkstra;

/// Single-source distances and predecessor arcs.
pub struct ShortestPathTree<W> {
    pub source:   NodeId,
    /// `W::UNREACHABLE` for nodes not reached.
    pub dist:     Vec<W>,
    pub prev_arc: Vec<ArcId>,
}

impl<W: Weight> ShortestPathTree<W> {
    pub fn cost_to(&self, node: NodeId) -> Option<W> {
        let d = self.dist[node.index()];
        (d != W::UNREACHABLE).then_some(d)
    }

    pub fn path_to(&self, network: &RoadNetwork<W>, to: NodeId) -> Option<Path<W>> {
        let cost = self.cost_to(to)?;
        Some(reconstruct(network, &self.prev_arc, to, cost))
    }
}

impl Dijkstra {
    /// Distances from `from` to every node (no early exit).
    pub fn tree<W: Weight>(&self, network: &RoadNetwork<W>, from: NodeId) -> ShortestPathTree<W> {
        let (dist, prev_arc) = dijkstra(network, from, None);
        ShortestPathTree { source: from, dist, prev_arc }
    }
}

impl<W: Weight> PathFinder<W> for Dijkstra {
    fn find_path(&self, network: &RoadNetwork<W>, from: NodeId, to: NodeId) -> SpatialResult<Path<W>> {
        check_nodes(network, &[from, to])?;
        if from == to {
            return Ok(Path::trivial(from));
        }
        let (dist, prev_arc) = dijkstra(network, from, Some(to));
        if dist[to.index()] == W::UNREACHABLE {
            return Err(SpatialError::NoRoute { from, to });
        }
        Ok(reconstruct(network, &prev_arc, to, dist[to.index()]))
    }

    /// One tree from `from`, then a lookup per target.
    fn find_paths(
        &self,
        network: &RoadNetwork<W>,
        from:    NodeId,
        targets: &[NodeId],
    ) -> SpatialResult<Vec<Option<Path<W>>>> {
        check_nodes(network, &[from])?;
        check_nodes(network, targets)?;
        let tree = self.tree(network, from);
        Ok(targets.iter().map(|&t| tree.path_to(network, t)).collect())
    }
}

fn dijkstra<W: Weight>(
    network: &RoadNetwork<W>,
    from:    NodeId,
    target:  Option<NodeId>,
) -> (Vec<W>, Vec<ArcId>) {
    let n = network.node_count();
    let mut dist     = vec![W::UNREACHABLE; n];
    let mut prev_arc = vec![ArcId::INVALID; n];
    let mut done     = vec![false; n];
    let mut seq = 0u64;

    dist[from.index()] = W::ZERO;
    let mut heap = BinaryHeap::new();
    heap.push(QueueEntry { key: W::ZERO, seq, node: from });

    while let Some(QueueEntry { key: cost, node, .. }) = heap.pop() {
        // Skip stale heap entries.
        if done[node.index()] {
            continue;
        }
        done[node.index()] = true;
        if Some(node) == target {
            break;
        }

        for arc in network.out_arcs(node) {
            let next = network.arc_to[arc.index()];
            if done[next.index()] {
                continue;
            }
            let new_cost = cost.plus(network.arc_weight[arc.index()]);
            if new_cost.cheaper_than(&dist[next.index()]) {
                dist[next.index()] = new_cost;
                prev_arc[next.index()] = arc;
                seq += 1;
                heap.push(QueueEntry { key: new_cost, seq, node: next });
            }
        }
    }

    (dist, prev_arc)
}

// ── A* ────────────────────────────────────────────────────────────────────────

/// Estimate of the remaining cost between two nodes.
pub trait Heuristic<W: Weight>: Send + Sync {
    fn estimate(&self, network: &RoadNetwork<W>, from: NodeId, to: NodeId) -> W;
}

/// Straight-line distance between node coordinates, in degrees, treating
/// `(lat, lon)` as a flat plane.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlanarDistance;

impl<W: Weight> Heuristic<W> for PlanarDistance {
    #[inline]
    fn estimate(&self, network: &RoadNetwork<W>, from: NodeId, to: NodeId) -> W {
        W::from_f64(network.node_pos(from).planar_distance(network.node_pos(to)))
    }
}

/// Heuristic backed by a closure.
pub struct FnHeuristic<F>(pub F);

impl<W: Weight, F> Heuristic<W> for FnHeuristic<F>
where
    F: Fn(NodeId, NodeId) -> W + Send + Sync,
{
    #[inline]
    fn estimate(&self, _network: &RoadNetwork<W>, from: NodeId, to: NodeId) -> W {
        (self.0)(from, to)
    }
}

/// Goal-directed search.  Optimal when the heuristic never overestimates.
pub struct AStar<H> {
    pub heuristic: H,
}

impl AStar<PlanarDistance> {
    pub fn planar() -> Self {
        Self { heuristic: PlanarDistance }
    }
}

impl<H> AStar<H> {
    pub fn new(heuristic: H) -> Self {
        Self { heuristic }
    }
}

impl<W: Weight, H: Heuristic<W>> PathFinder<W> for AStar<H> {
    fn find_path(&self, network: &RoadNetwork<W>, from: NodeId, to: NodeId) -> SpatialResult<Path<W>> {
        check_nodes(network, &[from, to])?;
        if from == to {
            return Ok(Path::trivial(from));
        }

        let n = network.node_count();
        let mut g        = vec![W::UNREACHABLE; n];
        let mut prev_arc = vec![ArcId::INVALID; n];
        let mut closed   = vec![false; n];
        // Heuristic values are computed once per node.
        let mut h: Vec<Option<W>> = vec![None; n];
        let mut seq = 0u64;

        g[from.index()] = W::ZERO;
        let mut open = BinaryHeap::new();
        open.push(QueueEntry { key: self.heuristic.estimate(network, from, to), seq, node: from });

        while let Some(QueueEntry { node, .. }) = open.pop() {
            if node == to {
                return Ok(reconstruct(network, &prev_arc, to, g[to.index()]));
            }
            if closed[node.index()] {
                continue;
            }
            closed[node.index()] = true;

            for arc in network.out_arcs(node) {
                let next = network.arc_to[arc.index()];
                if closed[next.index()] {
                    continue;
                }
                let tentative = g[node.index()].plus(network.arc_weight[arc.index()]);
                if tentative.cheaper_than(&g[next.index()]) {
                    g[next.index()] = tentative;
                    prev_arc[next.index()] = arc;
                    let est = *h[next.index()]
                        .get_or_insert_with(|| self.heuristic.estimate(network, next, to));
                    seq += 1;
                    open.push(QueueEntry { key: tentative.plus(est), seq, node: next });
                }
            }
        }

        Err(SpatialError::NoRoute { from, to })
    }
}

// ── Bellman-Ford ──────────────────────────────────────────────────────────────

/// Queue-based Bellman-Ford.  Handles negative arcs and reports negative
/// cycles; on this network's non-negative costs it agrees with Dijkstra.
pub struct BellmanFord;

impl BellmanFord {
    /// Distances and predecessor arcs from `from` to every node.
    pub fn tree<W: Weight>(
        &self,
        network: &RoadNetwork<W>,
        from:    NodeId,
    ) -> SpatialResult<ShortestPathTree<W>> {
        check_nodes(network, &[from])?;
        let n = network.node_count();
        let mut dist     = vec![W::UNREACHABLE; n];
        let mut prev_arc = vec![ArcId::INVALID; n];
        let mut hops     = vec![0usize; n];
        let mut queued   = vec![false; n];

        dist[from.index()] = W::ZERO;
        let mut queue = VecDeque::from([from]);
        queued[from.index()] = true;

        while let Some(u) = queue.pop_front() {
            queued[u.index()] = false;
            let du = dist[u.index()];
            for arc in network.out_arcs(u) {
                let v = network.arc_to[arc.index()];
                let nd = du.plus(network.arc_weight[arc.index()]);
                if nd.cheaper_than(&dist[v.index()]) {
                    dist[v.index()] = nd;
                    prev_arc[v.index()] = arc;
                    hops[v.index()] = hops[u.index()] + 1;
                    // A shortest path never needs n arcs.
                    if hops[v.index()] >= n {
                        return Err(SpatialError::NegativeCycle(from));
                    }
                    if !queued[v.index()] {
                        queued[v.index()] = true;
                        queue.push_back(v);
                    }
                }
            }
        }

        Ok(ShortestPathTree { source: from, dist, prev_arc })
    }
}

impl<W: Weight> PathFinder<W> for BellmanFord {
    fn find_path(&self, network: &RoadNetwork<W>, from: NodeId, to: NodeId) -> SpatialResult<Path<W>> {
        check_nodes(network, &[from, to])?;
        if from == to {
            return Ok(Path::trivial(from));
        }
        self.tree(network, from)?
            .path_to(network, to)
            .ok_or(SpatialError::NoRoute { from, to })
    }
}
