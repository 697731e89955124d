//! Step-duration bound for any link.

use std::time::{Duration, Instant};

use mt_core::{EdgeId, VehicleClass, VehicleId};
use tracing::warn;

use crate::link::{LinkQuery, SignalAhead, SimulationLink, VehicleState};
use crate::router::Route;
use crate::{LinkError, LinkResult};

/// Wraps a link and turns an `advance()` that takes longer than `bound` into
/// [`LinkError::SimulationUnavailable`].
///
/// The check happens after the inner call returns, so a simulator that never
/// answers still blocks the caller.  Transports with their own read timeout
/// should configure it to the same bound.
pub struct TimedLink<L> {
    inner: L,
    bound: Duration,
}

impl<L: SimulationLink> TimedLink<L> {
    pub fn new(inner: L, bound: Duration) -> Self {
        Self { inner, bound }
    }

    pub fn from_millis(inner: L, bound_ms: u64) -> Self {
        Self::new(inner, Duration::from_millis(bound_ms))
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: SimulationLink> LinkQuery for TimedLink<L> {
    fn vehicle_ids(&self) -> LinkResult<Vec<VehicleId>> {
        self.inner.vehicle_ids()
    }
    fn vehicle_state(&self, id: &VehicleId) -> LinkResult<VehicleState> {
        self.inner.vehicle_state(id)
    }
    fn co2_emission(&self, id: &VehicleId) -> LinkResult<f64> {
        self.inner.co2_emission(id)
    }
    fn edge_ids(&self) -> LinkResult<Vec<EdgeId>> {
        self.inner.edge_ids()
    }
    fn find_route(&self, from: &EdgeId, to: &EdgeId) -> LinkResult<Route> {
        self.inner.find_route(from, to)
    }
    fn signal_ahead(&self, id: &VehicleId) -> LinkResult<Option<SignalAhead>> {
        self.inner.signal_ahead(id)
    }
}

impl<L: SimulationLink> SimulationLink for TimedLink<L> {
    fn advance(&mut self) -> LinkResult<()> {
        let started = Instant::now();
        self.inner.advance()?;
        let took = started.elapsed();
        if took > self.bound {
            warn!(took_ms = took.as_millis() as u64, bound_ms = self.bound.as_millis() as u64, "simulation step timed out");
            return Err(LinkError::SimulationUnavailable(format!(
                "step took {} ms, bound is {} ms",
                took.as_millis(),
                self.bound.as_millis()
            )));
        }
        Ok(())
    }
    fn insert_vehicle(&mut self, id: &VehicleId, class: VehicleClass, route: &Route) -> LinkResult<()> {
        self.inner.insert_vehicle(id, class, route)
    }
    fn remove_vehicle(&mut self, id: &VehicleId) -> LinkResult<()> {
        self.inner.remove_vehicle(id)
    }
    fn set_speed(&mut self, id: &VehicleId, speed_mps: f64) -> LinkResult<()> {
        self.inner.set_speed(id, speed_mps)
    }
}
