//! Random departure/arrival selection for injected vehicles.

use mt_core::{EdgeId, SimRng};
use mt_link::{LinkError, LinkQuery, LinkResult, Route};
use tracing::debug;

/// Picks a random routable origin/destination pair from the network's
/// non-internal edges.
///
/// Each attempt draws a departure edge and a *different* arrival edge and
/// asks the simulator for a route; pairs without a route are retried up to
/// `max_attempts` times.
pub struct RouteSource {
    edges:        Vec<EdgeId>,
    max_attempts: u32,
    rng:          SimRng,
}

impl RouteSource {
    /// Use `edges` as the candidate set.  Internal edges are dropped.
    pub fn new(edges: Vec<EdgeId>, max_attempts: u32, rng: SimRng) -> Self {
        let edges = edges.into_iter().filter(|e| !e.is_internal()).collect();
        Self { edges, max_attempts, rng }
    }

    /// Candidate set taken from the simulator's edge list.
    pub fn from_link<L: LinkQuery + ?Sized>(link: &L, max_attempts: u32, rng: SimRng) -> LinkResult<Self> {
        Ok(Self::new(link.edge_ids()?, max_attempts, rng))
    }

    pub fn candidate_count(&self) -> usize {
        self.edges.len()
    }

    /// A route between two distinct random edges, or `None` when every
    /// attempt failed.  Only fatal link errors are returned as `Err`.
    pub fn pick<L: LinkQuery + ?Sized>(&mut self, link: &L) -> LinkResult<Option<Route>> {
        let n = self.edges.len();
        if n < 2 {
            return Ok(None);
        }
        for attempt in 0..self.max_attempts {
            let from = self.rng.gen_range(0..n);
            // Draw from the other n - 1 edges.
            let mut to = self.rng.gen_range(0..n - 1);
            if to >= from {
                to += 1;
            }
            let (from, to) = (&self.edges[from], &self.edges[to]);
            match link.find_route(from, to) {
                Ok(route) if !route.is_empty() => return Ok(Some(route)),
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(LinkError::NoRoute { .. }) => {}
                Err(e) => debug!(attempt, %from, %to, error = %e, "route lookup failed"),
            }
        }
        Ok(None)
    }
}
