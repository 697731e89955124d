//! In-process microscopic simulator.
//!
//! `MicroSim` implements [`SimulationLink`] over a [`RoadNetwork`] so the
//! monitoring loop can run without an external simulator.  It is a small
//! model, not a calibrated one:
//!
//! * one lane per edge, vehicles ordered by position,
//! * speed is the minimum of the free-flow target (edge limit or a held
//!   speed), the acceleration bound, and the speed that keeps a safe gap to
//!   the obstacle ahead (leader, red light, or a full next edge),
//! * fixed-time signals at junctions; yellow is treated as red by a vehicle
//!   that can still stop comfortably,
//! * vehicles leave when they reach the end of their last route edge.
//!
//! CO2 for conventional vehicles is a polynomial in speed and positive
//! acceleration; AVs emit nothing.

use std::collections::{BTreeMap, HashMap};

use mt_core::{EdgeId, VehicleClass, VehicleId};
use tracing::debug;

use crate::link::{LinkQuery, SignalAhead, SimulationLink, VehicleState};
use crate::network::{EdgeIdx, RoadNetwork};
use crate::router::{DijkstraRouter, Route, Router};
use crate::signal::LightState;
use crate::{LinkError, LinkResult};

// ── Emission model ────────────────────────────────────────────────────────────

const IDLE_CO2_MG_S:        f64 = 1_300.0;
const SPEED_CO2_MG_PER_M:   f64 = 100.0;
const ACCEL_CO2_COEFF:      f64 = 150.0;

/// Vehicles halt this far before a stop line so that float noise can never
/// carry them onto the junction.
const STOP_LINE_MARGIN_M: f64 = 0.1;

fn co2_rate_mg_s(class: VehicleClass, speed_mps: f64, accel_mps2: f64) -> f64 {
    if !class.emits_co2() {
        return 0.0;
    }
    IDLE_CO2_MG_S + SPEED_CO2_MG_PER_M * speed_mps + ACCEL_CO2_COEFF * accel_mps2.max(0.0) * speed_mps
}

// ── Parameters ────────────────────────────────────────────────────────────────

/// Vehicle dynamics and session parameters.
#[derive(Clone, Debug)]
pub struct MicroParams {
    pub step_length_secs: f64,
    pub max_accel_mps2:   f64,
    pub max_decel_mps2:   f64,
    pub vehicle_length_m: f64,
    /// Bumper-to-bumper distance kept to the vehicle ahead when stopped.
    pub min_gap_m:        f64,
    /// `advance()` fails once simulated time reaches this value.
    pub end_time_secs:    Option<f64>,
    /// `advance()` fails once this many steps have succeeded.  Simulates a
    /// dropped connection.
    pub fail_after_steps: Option<u64>,
}

impl Default for MicroParams {
    fn default() -> Self {
        Self {
            step_length_secs: 1.0,
            max_accel_mps2:   2.6,
            max_decel_mps2:   4.5,
            vehicle_length_m: 5.0,
            min_gap_m:        2.5,
            end_time_secs:    None,
            fail_after_steps: None,
        }
    }
}

// ── Vehicle state ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct SimVehicle {
    class:      VehicleClass,
    route:      Vec<EdgeIdx>,
    route_pos:  usize,
    /// Front bumper position along the current edge, in metres.
    pos_m:      f64,
    speed_mps:  f64,
    accel_mps2: f64,
    distance_m: f64,
    held_speed: Option<f64>,
}

impl SimVehicle {
    #[inline]
    fn edge(&self) -> EdgeIdx {
        self.route[self.route_pos]
    }

    #[inline]
    fn next_edge(&self) -> Option<EdgeIdx> {
        self.route.get(self.route_pos + 1).copied()
    }

    #[inline]
    fn on_last_edge(&self) -> bool {
        self.route_pos + 1 >= self.route.len()
    }
}

// ── MicroSim ──────────────────────────────────────────────────────────────────

/// A deterministic single-process simulator.
///
/// Vehicles are stored in a `BTreeMap` keyed by id, so iteration order (and
/// therefore every run with the same inputs) is reproducible.
pub struct MicroSim<R: Router = DijkstraRouter> {
    network:  RoadNetwork,
    router:   R,
    params:   MicroParams,
    vehicles: BTreeMap<VehicleId, SimVehicle>,
    step:     u64,
    arrived:  u64,
}

impl MicroSim<DijkstraRouter> {
    pub fn new(network: RoadNetwork, params: MicroParams) -> Self {
        Self::with_router(network, params, DijkstraRouter)
    }
}

impl<R: Router> MicroSim<R> {
    pub fn with_router(network: RoadNetwork, params: MicroParams, router: R) -> Self {
        Self {
            network,
            router,
            params,
            vehicles: BTreeMap::new(),
            step: 0,
            arrived: 0,
        }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    pub fn params(&self) -> &MicroParams {
        &self.params
    }

    /// Steps completed so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn time_secs(&self) -> f64 {
        self.step as f64 * self.params.step_length_secs
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Vehicles that reached the end of their route.
    pub fn arrived_count(&self) -> u64 {
        self.arrived
    }

    fn lookup(&self, id: &VehicleId) -> LinkResult<&SimVehicle> {
        self.vehicles
            .get(id)
            .ok_or_else(|| LinkError::UnknownEntity(id.clone()))
    }

    /// `true` when the signal at the end of the vehicle's edge forbids
    /// entering the junction.
    fn must_stop_at_line(&self, v: &SimVehicle, now: f64, dist_m: f64) -> bool {
        if v.on_last_edge() {
            return false;
        }
        let Some(control) = self.network.edge_control[v.edge().index()] else {
            return false;
        };
        let program = &self.network.signals[control.signal];
        match program.light_at(now, control.link_index) {
            LightState::Green  => false,
            LightState::Red    => true,
            LightState::Yellow => {
                let braking = v.speed_mps * v.speed_mps / (2.0 * self.params.max_decel_mps2);
                braking <= dist_m
            }
        }
    }

    /// Speed that brings the vehicle to a halt within `gap_m`.
    fn safe_speed(&self, gap_m: f64) -> f64 {
        if gap_m <= 0.0 {
            return 0.0;
        }
        let dt = self.params.step_length_secs;
        (gap_m / dt).min((2.0 * self.params.max_decel_mps2 * gap_m).sqrt())
    }

    fn check_route(&self, id: &VehicleId, route: &Route) -> LinkResult<Vec<EdgeIdx>> {
        let fail = |reason: String| LinkError::InjectionFailed { id: id.clone(), reason };

        if route.is_empty() {
            return Err(fail("empty route".into()));
        }
        let mut edges = Vec::with_capacity(route.edges.len());
        for e in &route.edges {
            let idx = self
                .network
                .edge_idx(e.as_str())
                .ok_or_else(|| fail(format!("unknown edge {e}")))?;
            if let Some(&prev) = edges.last() {
                if !self.network.connects(prev, idx) {
                    return Err(fail(format!(
                        "route is not connected between {} and {e}",
                        self.network.edge_id(prev)
                    )));
                }
            }
            edges.push(idx);
        }
        Ok(edges)
    }
}

impl<R: Router> LinkQuery for MicroSim<R> {
    fn vehicle_ids(&self) -> LinkResult<Vec<VehicleId>> {
        Ok(self.vehicles.keys().cloned().collect())
    }

    fn vehicle_state(&self, id: &VehicleId) -> LinkResult<VehicleState> {
        let v = self.lookup(id)?;
        let edge = v.edge();
        Ok(VehicleState {
            class:         v.class,
            speed_mps:     v.speed_mps,
            edge:          self.network.edge_id(edge).clone(),
            edge_length_m: self.network.edge_length_m[edge.index()],
            distance_m:    v.distance_m,
        })
    }

    fn co2_emission(&self, id: &VehicleId) -> LinkResult<f64> {
        let v = self.lookup(id)?;
        Ok(co2_rate_mg_s(v.class, v.speed_mps, v.accel_mps2))
    }

    fn edge_ids(&self) -> LinkResult<Vec<EdgeId>> {
        Ok(self.network.edge_ids.clone())
    }

    fn find_route(&self, from: &EdgeId, to: &EdgeId) -> LinkResult<Route> {
        let f = self
            .network
            .edge_idx(from.as_str())
            .ok_or_else(|| LinkError::UnknownEdge(from.clone()))?;
        let t = self
            .network
            .edge_idx(to.as_str())
            .ok_or_else(|| LinkError::UnknownEdge(to.clone()))?;
        self.router.route(&self.network, f, t)
    }

    fn signal_ahead(&self, id: &VehicleId) -> LinkResult<Option<SignalAhead>> {
        let v = self.lookup(id)?;
        if v.on_last_edge() {
            return Ok(None);
        }
        let edge = v.edge();
        let Some(control) = self.network.edge_control[edge.index()] else {
            return Ok(None);
        };
        let program = &self.network.signals[control.signal];
        let Some((current_phase, secs_to_switch)) = program.phase_at(self.time_secs()) else {
            return Ok(None);
        };
        Ok(Some(SignalAhead {
            signal:     program.id.clone(),
            link_index: control.link_index,
            phases:     program.phases.clone(),
            current_phase,
            secs_to_switch,
            distance_m: (self.network.edge_length_m[edge.index()] - v.pos_m).max(0.0),
        }))
    }
}

impl<R: Router> SimulationLink for MicroSim<R> {
    fn advance(&mut self) -> LinkResult<()> {
        if let Some(n) = self.params.fail_after_steps {
            if self.step >= n {
                return Err(LinkError::SimulationUnavailable("connection to simulator lost".into()));
            }
        }
        if let Some(end) = self.params.end_time_secs {
            if self.time_secs() >= end - 1e-9 {
                return Err(LinkError::SimulationUnavailable(format!(
                    "simulation ended at {end} s"
                )));
            }
        }

        self.step += 1;
        let now = self.time_secs();
        let dt = self.params.step_length_secs;
        let vlen = self.params.vehicle_length_m;
        let min_gap = self.params.min_gap_m;

        // Lanes: vehicles per edge, front-most first.
        let mut lanes: BTreeMap<EdgeIdx, Vec<(f64, VehicleId)>> = BTreeMap::new();
        for (id, v) in &self.vehicles {
            lanes.entry(v.edge()).or_default().push((v.pos_m, id.clone()));
        }
        for lane in lanes.values_mut() {
            lane.sort_by(|a, b| b.0.total_cmp(&a.0));
        }
        // Rear bumper of the last vehicle on each edge, before this step.
        let tails: HashMap<EdgeIdx, f64> = lanes
            .iter()
            .filter_map(|(e, lane)| lane.last().map(|(pos, _)| (*e, pos - vlen)))
            .collect();

        let mut arrivals = Vec::new();
        for (edge, lane) in &lanes {
            let edge_len = self.network.edge_length_m[edge.index()];
            let limit = self.network.edge_speed_mps[edge.index()];
            let mut leader_rear: Option<f64> = None;

            for (_, id) in lane {
                let Some(v) = self.vehicles.get(id) else { continue };

                let mut gap = f64::INFINITY;
                if let Some(rear) = leader_rear {
                    gap = gap.min(rear - min_gap - v.pos_m);
                }
                let to_line = edge_len - v.pos_m;
                if self.must_stop_at_line(v, now, to_line) {
                    gap = gap.min(to_line - STOP_LINE_MARGIN_M);
                } else if let Some(next) = v.next_edge() {
                    if let Some(tail) = tails.get(&next) {
                        gap = gap.min(to_line + tail - min_gap);
                    }
                }

                let target = v.held_speed.map_or(limit, |h| h.min(limit));
                let free = target.min(v.speed_mps + self.params.max_accel_mps2 * dt);
                let new_speed = if gap.is_finite() {
                    free.min(self.safe_speed(gap))
                } else {
                    free
                }
                .max(0.0);

                let Some(v) = self.vehicles.get_mut(id) else { continue };
                v.accel_mps2 = (new_speed - v.speed_mps) / dt;
                v.speed_mps = new_speed;
                v.pos_m += new_speed * dt;
                v.distance_m += new_speed * dt;
                leader_rear = Some(v.pos_m - vlen);

                let mut len = edge_len;
                while v.pos_m >= len {
                    if v.on_last_edge() {
                        arrivals.push(id.clone());
                        break;
                    }
                    v.pos_m -= len;
                    v.route_pos += 1;
                    len = self.network.edge_length_m[v.edge().index()];
                }
            }
        }

        for id in arrivals {
            self.vehicles.remove(&id);
            self.arrived += 1;
            debug!(vehicle = %id, step = self.step, "vehicle arrived");
        }
        Ok(())
    }

    fn insert_vehicle(&mut self, id: &VehicleId, class: VehicleClass, route: &Route) -> LinkResult<()> {
        if self.vehicles.contains_key(id) {
            return Err(LinkError::InjectionFailed { id: id.clone(), reason: "duplicate vehicle id".into() });
        }
        let edges = self.check_route(id, route)?;
        let first = edges[0];
        let vlen = self.params.vehicle_length_m;
        let edge_len = self.network.edge_length_m[first.index()];
        if edge_len < vlen {
            return Err(LinkError::InjectionFailed {
                id:     id.clone(),
                reason: format!("departure edge {} is shorter than a vehicle", self.network.edge_id(first)),
            });
        }

        // Closest rear bumper on the departure edge.
        let nearest_rear = self
            .vehicles
            .values()
            .filter(|v| v.edge() == first)
            .map(|v| v.pos_m - vlen)
            .min_by(|a, b| a.total_cmp(b));
        let gap = nearest_rear.map_or(f64::INFINITY, |rear| rear - self.params.min_gap_m - vlen);
        if gap < 0.0 {
            return Err(LinkError::InjectionFailed {
                id:     id.clone(),
                reason: format!("no room on departure edge {}", self.network.edge_id(first)),
            });
        }

        let limit = self.network.edge_speed_mps[first.index()];
        let speed = if gap.is_finite() { limit.min(self.safe_speed(gap)) } else { limit };
        self.vehicles.insert(id.clone(), SimVehicle {
            class,
            route: edges,
            route_pos: 0,
            pos_m: vlen,
            speed_mps: speed,
            accel_mps2: 0.0,
            distance_m: 0.0,
            held_speed: None,
        });
        debug!(vehicle = %id, %class, edge = %self.network.edge_id(first), "vehicle inserted");
        Ok(())
    }

    fn remove_vehicle(&mut self, id: &VehicleId) -> LinkResult<()> {
        self.vehicles.remove(id);
        Ok(())
    }

    fn set_speed(&mut self, id: &VehicleId, speed_mps: f64) -> LinkResult<()> {
        let v = self
            .vehicles
            .get_mut(id)
            .ok_or_else(|| LinkError::UnknownEntity(id.clone()))?;
        v.held_speed = (speed_mps >= 0.0).then_some(speed_mps);
        Ok(())
    }
}
