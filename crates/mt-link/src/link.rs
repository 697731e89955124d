//! The simulator link contract.
//!
//! The link is split in two:
//!
//! * [`LinkQuery`]: read-only queries.  Measurement roles receive
//!   `&L where L: LinkQuery` and so cannot change the simulation.
//! * [`SimulationLink`]: stepping and mutation.  Only the coordinator and
//!   the control roles (population, green wave) hold it mutably.
//!
//! All calls are blocking request/response exchanges with one simulator
//! session; nothing here is thread-safe or needs to be.

use mt_core::{EdgeId, SignalId, VehicleClass, VehicleId};

use crate::router::Route;
use crate::signal::SignalPhase;
use crate::LinkResult;

// ── Query results ─────────────────────────────────────────────────────────────

/// Per-vehicle state read once per step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleState {
    pub class:         VehicleClass,
    /// Current speed in m/s.
    pub speed_mps:     f64,
    /// Edge the vehicle is currently on.
    pub edge:          EdgeId,
    pub edge_length_m: f64,
    /// Cumulative distance driven since insertion, in metres.
    pub distance_m:    f64,
}

/// The next traffic signal on a vehicle's path.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalAhead {
    pub signal:         SignalId,
    /// Which character of each phase state applies to the vehicle's lane.
    pub link_index:     usize,
    pub phases:         Vec<SignalPhase>,
    pub current_phase:  usize,
    /// Seconds until the current phase ends.
    pub secs_to_switch: f64,
    /// Distance to the stop line, in metres.
    pub distance_m:     f64,
}

// ── Traits ────────────────────────────────────────────────────────────────────

/// Read-only view of a running simulation.
pub trait LinkQuery {
    /// Ids of every live vehicle.  Order is unspecified.
    fn vehicle_ids(&self) -> LinkResult<Vec<VehicleId>>;

    /// Fails with `UnknownEntity` when `id` is not live.
    fn vehicle_state(&self, id: &VehicleId) -> LinkResult<VehicleState>;

    /// Instantaneous CO2 emission rate in mg/s.
    fn co2_emission(&self, id: &VehicleId) -> LinkResult<f64>;

    /// Every edge in the network, internal edges included.
    fn edge_ids(&self) -> LinkResult<Vec<EdgeId>>;

    /// Fastest route from the start of `from` to the end of `to`.
    fn find_route(&self, from: &EdgeId, to: &EdgeId) -> LinkResult<Route>;

    /// The next signal on the vehicle's current edge, if any.
    fn signal_ahead(&self, _id: &VehicleId) -> LinkResult<Option<SignalAhead>> {
        Ok(None)
    }
}

/// Full control of a simulation session.
pub trait SimulationLink: LinkQuery {
    /// Progress the simulation by exactly one step.
    fn advance(&mut self) -> LinkResult<()>;

    /// Insert a vehicle that departs now on `route`'s first edge.
    fn insert_vehicle(&mut self, id: &VehicleId, class: VehicleClass, route: &Route) -> LinkResult<()>;

    /// Remove a vehicle.  Removing a vehicle that is already gone succeeds.
    fn remove_vehicle(&mut self, id: &VehicleId) -> LinkResult<()>;

    /// Hold the vehicle at `speed_mps` (until arrival or the next call).
    /// A negative value hands speed control back to the simulator.
    fn set_speed(&mut self, id: &VehicleId, speed_mps: f64) -> LinkResult<()>;
}

// Forwarding impls so a caller can lend a link to a coordinator and inspect
// it after the run.

impl<L: LinkQuery + ?Sized> LinkQuery for &mut L {
    fn vehicle_ids(&self) -> LinkResult<Vec<VehicleId>> {
        (**self).vehicle_ids()
    }
    fn vehicle_state(&self, id: &VehicleId) -> LinkResult<VehicleState> {
        (**self).vehicle_state(id)
    }
    fn co2_emission(&self, id: &VehicleId) -> LinkResult<f64> {
        (**self).co2_emission(id)
    }
    fn edge_ids(&self) -> LinkResult<Vec<EdgeId>> {
        (**self).edge_ids()
    }
    fn find_route(&self, from: &EdgeId, to: &EdgeId) -> LinkResult<Route> {
        (**self).find_route(from, to)
    }
    fn signal_ahead(&self, id: &VehicleId) -> LinkResult<Option<SignalAhead>> {
        (**self).signal_ahead(id)
    }
}

impl<L: SimulationLink + ?Sized> SimulationLink for &mut L {
    fn advance(&mut self) -> LinkResult<()> {
        (**self).advance()
    }
    fn insert_vehicle(&mut self, id: &VehicleId, class: VehicleClass, route: &Route) -> LinkResult<()> {
        (**self).insert_vehicle(id, class, route)
    }
    fn remove_vehicle(&mut self, id: &VehicleId) -> LinkResult<()> {
        (**self).remove_vehicle(id)
    }
    fn set_speed(&mut self, id: &VehicleId, speed_mps: f64) -> LinkResult<()> {
        (**self).set_speed(id, speed_mps)
    }
}
