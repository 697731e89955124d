//! Routing trait and default Dijkstra implementation.
//!
//! Routes are edge-to-edge: the result starts with the departure edge and
//! ends with the arrival edge, which is what a vehicle insertion needs.
//!
//! # Cost units
//!
//! Costs are free-flow travel times in **milliseconds** (u32).  `Route`
//! exposes the total as `travel_secs: f64`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::network::{EdgeIdx, RoadNetwork};
use crate::{LinkError, LinkResult};

use mt_core::EdgeId;

// ── Route ─────────────────────────────────────────────────────────────────────

/// An ordered list of edges from departure to arrival, plus the free-flow
/// travel time of everything after the departure edge.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub edges:       Vec<EdgeId>,
    pub travel_secs: f64,
}

impl Route {
    pub fn new(edges: Vec<EdgeId>) -> Self {
        Self { edges, travel_secs: 0.0 }
    }

    pub fn departure(&self) -> Option<&EdgeId> {
        self.edges.first()
    }

    pub fn arrival(&self) -> Option<&EdgeId> {
        self.edges.last()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine used by [`MicroSim`](crate::MicroSim).
pub trait Router {
    /// Compute a route from the start of `from` to the end of `to`.
    fn route(&self, network: &RoadNetwork, from: EdgeIdx, to: EdgeIdx) -> LinkResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Dijkstra over edges, cost = free-flow travel time of each entered edge.
/// Immediate reversals at a junction are not allowed.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, network: &RoadNetwork, from: EdgeIdx, to: EdgeIdx) -> LinkResult<Route> {
        dijkstra(network, from, to)
    }
}

fn dijkstra(network: &RoadNetwork, from: EdgeIdx, to: EdgeIdx) -> LinkResult<Route> {
    if from == to {
        return Ok(Route::new(vec![network.edge_id(from).clone()]));
    }

    let n = network.edge_count();
    let mut dist      = vec![u32::MAX; n];
    let mut prev_edge = vec![EdgeIdx::INVALID; n];

    dist[from.index()] = 0;

    // Secondary key EdgeIdx ensures deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u32, EdgeIdx)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, edge))) = heap.pop() {
        if edge == to {
            return Ok(reconstruct(network, &prev_edge, to, cost));
        }

        // Skip stale heap entries.
        if cost > dist[edge.index()] {
            continue;
        }

        for next in network.successors(edge) {
            let new_cost = cost.saturating_add(network.edge_travel_ms[next.index()]);
            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev_edge[next.index()] = edge;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }

    Err(LinkError::NoRoute {
        from: network.edge_id(from).clone(),
        to:   network.edge_id(to).clone(),
    })
}

fn reconstruct(network: &RoadNetwork, prev_edge: &[EdgeIdx], to: EdgeIdx, total_ms: u32) -> Route {
    let mut edges = vec![network.edge_id(to).clone()];
    let mut cur = to;
    loop {
        let e = prev_edge[cur.index()];
        if e == EdgeIdx::INVALID {
            break;
        }
        edges.push(network.edge_id(e).clone());
        cur = e;
    }
    edges.reverse();
    Route {
        edges,
        travel_secs: total_ms as f64 / 1000.0,
    }
}
