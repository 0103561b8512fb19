//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The engine and dispatcher call routing via the [`Router`] trait, so
//! applications can swap in custom implementations (A*, contraction
//! hierarchies, toll-aware costs) without touching the engine.
//!
//! # Cost units
//!
//! All costs are free-flow **seconds** (`u64`), summed from
//! `edge_base_secs`.  Time-of-day traffic and weather are applied per hop
//! by the delay model at drive time, never at planning time.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hs_core::{EdgeId, NodeId};

use crate::network::NetworkGraph;
use crate::{NetworkError, NetworkResult};

/// Marker for an unreachable node in [`Router::costs_to`] output.
pub const UNREACHABLE: u64 = u64::MAX;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query: an ordered list of `EdgeId`s and the total
/// free-flow travel time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Route {
    /// Edges to traverse in order, from source to destination.
    pub edges: Vec<EdgeId>,
    /// Cumulative free-flow travel time in seconds.
    pub base_secs: u64,
}

impl Route {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// Append `next`, which must start where `self` ends.
    pub fn then(mut self, next: Route) -> Route {
        self.edges.extend(next.edges);
        self.base_secs += next.base_secs;
        self
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so independent replications can
/// share one router across Rayon worker threads.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to`.
    ///
    /// `from == to` yields an empty route; a disconnected pair yields
    /// [`NetworkError::NoRoute`].
    fn route(&self, network: &NetworkGraph, from: NodeId, to: NodeId) -> NetworkResult<Route>;

    /// Free-flow cost from **every** node to `target`, indexed by `NodeId`.
    /// Nodes that cannot reach `target` hold [`UNREACHABLE`].
    fn costs_to(&self, network: &NetworkGraph, target: NodeId) -> Vec<u64>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the CSR facility graph, using
/// `edge_base_secs` as cost.  `costs_to` runs the same search over the
/// reverse CSR.
#[derive(Debug, Clone, Copy, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, network: &NetworkGraph, from: NodeId, to: NodeId) -> NetworkResult<Route> {
        for n in [from, to] {
            if !network.contains_node(n) {
                return Err(NetworkError::NodeNotFound(n));
            }
        }
        dijkstra(network, from, to)
    }

    fn costs_to(&self, network: &NetworkGraph, target: NodeId) -> Vec<u64> {
        let n = network.node_count();
        let mut dist = vec![UNREACHABLE; n];
        if !network.contains_node(target) {
            return dist;
        }
        dist[target.index()] = 0;

        let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((0, target)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if cost > dist[node.index()] {
                continue;
            }
            for edge in network.in_edges(node) {
                let pred = network.edge_from[edge.index()];
                let new_cost = cost.saturating_add(network.edge_base_secs[edge.index()] as u64);
                if new_cost < dist[pred.index()] {
                    dist[pred.index()] = new_cost;
                    heap.push(Reverse((new_cost, pred)));
                }
            }
        }
        dist
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

fn dijkstra(network: &NetworkGraph, from: NodeId, to: NodeId) -> NetworkResult<Route> {
    if from == to {
        return Ok(Route::default());
    }

    let n = network.node_count();
    // dist[v] = best known cost (s) to reach v.
    let mut dist      = vec![UNREACHABLE; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0;

    // Min-heap: (cost, node).  Secondary key NodeId ensures deterministic
    // tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_edge, to, cost));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost.saturating_add(network.edge_base_secs[edge.index()] as u64);

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    Err(NetworkError::NoRoute { from, to })
}

fn reconstruct(network: &NetworkGraph, prev_edge: &[EdgeId], to: NodeId, total: u64) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    loop {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();
    Route { edges, base_secs: total }
}
