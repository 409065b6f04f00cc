//! Betweenness centrality and critical-node ranking.
//!
//! # Algorithm
//!
//! Weighted Brandes accumulation over the **undirected** view: for each
//! pivot source `s`, a Dijkstra pass counts shortest paths (`sigma`) and
//! records predecessors; dependencies are then accumulated in reverse
//! settle order.  Paths of exactly equal cost are all counted.
//!
//! # Sampling
//!
//! Exact betweenness uses every node as a source.  With a sample size `k <
//! n`, `k` pivots are drawn by [`PivotRng`] and the sum is extrapolated:
//!
//! ```text
//! score(v) = raw(v) * n / (k * (n - 1) * (n - 2))
//! ```
//!
//! which for `k == n` is the usual normalised undirected betweenness.
//! Networks with two nodes or fewer score zero everywhere.
//!
//! # Parallelism
//!
//! The sequential path folds each pivot's dependencies into the running sum
//! as soon as they are computed.  With the `parallel` feature pivots run on
//! Rayon's pool in batches of `PIVOT_BATCH`; each batch is summed in pivot
//! order, so scores are bit-identical to the sequential path and at most
//! `PIVOT_BATCH * n` floats are held at once.

use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use log::info;

use ev_core::{GeoPoint, NodeId, PivotRng, Weight};

use crate::network::RoadNetwork;
use crate::router::QueueEntry;
use crate::{SpatialError, SpatialResult};

// ── Ranking types ─────────────────────────────────────────────────────────────

/// One ranked node, with what the presentation layer needs to mark it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct CriticalNode {
    pub node:        NodeId,
    pub external_id: i64,
    pub pos:         GeoPoint,
    pub score:       f64,
}

/// Nodes by descending betweenness, truncated to the requested length.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct CriticalNodeRanking {
    pub nodes:   Vec<CriticalNode>,
    /// Source nodes actually used (equals node count when exact).
    pub pivots:  usize,
    /// Wall-clock time spent computing.
    pub elapsed: Duration,
}

impl CriticalNodeRanking {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Pivot sources for a given sample size.
///
/// `None` or a size `>= n` selects every node.  `Some(0)` is treated as 1.
pub fn select_pivots<W: Weight>(
    network:     &RoadNetwork<W>,
    sample_size: Option<usize>,
    rng:         &mut PivotRng,
) -> Vec<NodeId> {
    let n = network.node_count();
    let k = sample_size.map_or(n, |k| k.max(1));
    rng.sample_indices(n, k).into_iter().map(NodeId::from_index).collect()
}

/// Normalised betweenness of every node, using `pivots` as sources.
///
/// Indexed by `NodeId`.
pub fn betweenness<W: Weight>(network: &RoadNetwork<W>, pivots: &[NodeId]) -> Vec<f64> {
    let n = network.node_count();
    let mut raw = raw_betweenness(network, pivots);

    let k = pivots.len();
    if n <= 2 || k == 0 {
        return vec![0.0; n];
    }
    let scale = n as f64 / (k as f64 * (n - 1) as f64 * (n - 2) as f64);
    raw.iter_mut().for_each(|v| *v *= scale);
    raw
}

/// Rank nodes by betweenness and keep the best `top_k`.
///
/// Ties keep node-table order.
///
/// # Errors
///
/// [`SpatialError::EmptyNetwork`] if the network has no nodes.
pub fn rank_critical_nodes<W: Weight>(
    network:     &RoadNetwork<W>,
    top_k:       usize,
    sample_size: Option<usize>,
    rng:         &mut PivotRng,
) -> SpatialResult<CriticalNodeRanking> {
    if network.is_empty() {
        return Err(SpatialError::EmptyNetwork("cannot rank nodes of an empty network"));
    }
    let started = Instant::now();

    let pivots = select_pivots(network, sample_size, rng);
    let scores = betweenness(network, &pivots);

    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable: equal scores stay in node order.
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order.truncate(top_k);

    let nodes = order
        .into_iter()
        .map(|i| {
            let node = NodeId::from_index(i);
            CriticalNode {
                node,
                external_id: network.external_id(node),
                pos:         network.node_pos(node),
                score:       scores[i],
            }
        })
        .collect();

    let elapsed = started.elapsed();
    info!(
        "betweenness over {} nodes with {} pivots in {:.2?}",
        network.node_count(),
        pivots.len(),
        elapsed
    );

    Ok(CriticalNodeRanking { nodes, pivots: pivots.len(), elapsed })
}

// ── Brandes internals ─────────────────────────────────────────────────────────

/// Pivots computed together per Rayon batch.
#[cfg(feature = "parallel")]
pub(crate) const PIVOT_BATCH: usize = 64;

/// Unnormalised dependency sum over `pivots`, accumulated in pivot order.
#[cfg(not(feature = "parallel"))]
pub(crate) fn raw_betweenness<W: Weight>(network: &RoadNetwork<W>, pivots: &[NodeId]) -> Vec<f64> {
    let mut raw = vec![0.0f64; network.node_count()];
    for &s in pivots {
        add_into(&mut raw, &dependencies(network, s));
    }
    raw
}

#[cfg(feature = "parallel")]
pub(crate) fn raw_betweenness<W: Weight>(network: &RoadNetwork<W>, pivots: &[NodeId]) -> Vec<f64> {
    use rayon::prelude::*;
    let mut raw = vec![0.0f64; network.node_count()];
    for batch in pivots.chunks(PIVOT_BATCH) {
        let deltas: Vec<Vec<f64>> = batch.par_iter().map(|&s| dependencies(network, s)).collect();
        for delta in &deltas {
            add_into(&mut raw, delta);
        }
    }
    raw
}

#[inline]
fn add_into(raw: &mut [f64], delta: &[f64]) {
    for (acc, d) in raw.iter_mut().zip(delta) {
        *acc += d;
    }
}

/// Dependency of `source` on every node (`delta[source] == 0`).
pub(crate) fn dependencies<W: Weight>(network: &RoadNetwork<W>, source: NodeId) -> Vec<f64> {
    let n = network.node_count();
    let mut dist  = vec![W::UNREACHABLE; n];
    let mut sigma = vec![0.0f64; n];
    let mut preds: Vec<Vec<NodeId>> = vec![Vec::new(); n];
    let mut done  = vec![false; n];
    let mut settled: Vec<NodeId> = Vec::with_capacity(n);
    let mut seq = 0u64;

    dist[source.index()]  = W::ZERO;
    sigma[source.index()] = 1.0;
    let mut heap = BinaryHeap::new();
    heap.push(QueueEntry { key: W::ZERO, seq, node: source });

    while let Some(QueueEntry { key: d, node: v, .. }) = heap.pop() {
        if done[v.index()] {
            continue;
        }
        done[v.index()] = true;
        settled.push(v);

        for (w, weight) in network.neighbors(v) {
            if done[w.index()] {
                continue;
            }
            let nd = d.plus(weight);
            let cur = dist[w.index()];
            if nd.cheaper_than(&cur) {
                dist[w.index()]  = nd;
                sigma[w.index()] = sigma[v.index()];
                preds[w.index()].clear();
                preds[w.index()].push(v);
                seq += 1;
                heap.push(QueueEntry { key: nd, seq, node: w });
            } else if nd == cur {
                sigma[w.index()] += sigma[v.index()];
                preds[w.index()].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    while let Some(w) = settled.pop() {
        let coeff = (1.0 + delta[w.index()]) / sigma[w.index()];
        for &v in &preds[w.index()] {
            delta[v.index()] += sigma[v.index()] * coeff;
        }
    }
    delta[source.index()] = 0.0;
    delta
}
