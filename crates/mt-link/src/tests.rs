//! Unit tests for mt-link.
//!
//! All tests use a hand-built corridor so they run without an external
//! simulator.

use mt_core::{EdgeId, VehicleClass, VehicleId};

use crate::{
    LinkError, LinkQuery, MicroParams, MicroSim, RoadNetwork, RoadNetworkBuilder, Route,
    SignalPhase, SignalProgram, SimulationLink,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Four junctions in a row, 100 m two-way segments at 10 m/s:
///
/// ```text
///   j0 ──1──▶ j1 ──2──▶ j2 ──3──▶ j3
///      ◀─-1──    ◀─-2──    ◀─-3──
/// ```
///
/// With `signal`, j1 runs the given phases (link 0 = edge "1",
/// link 1 = edge "-2").
fn corridor(signal: Option<Vec<SignalPhase>>) -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    let j: Vec<_> = (0..4).map(|i| b.add_junction(format!("j{i}"))).collect();
    for i in 0..3 {
        b.add_road(format!("{}", i + 1), format!("-{}", i + 1), j[i], j[i + 1], 100.0, 10.0);
    }
    if let Some(phases) = signal {
        b.add_signal(j[1], SignalProgram::new("tl1", phases));
    }
    b.build()
}

fn sim(signal: Option<Vec<SignalPhase>>) -> MicroSim {
    MicroSim::new(corridor(signal), MicroParams::default())
}

fn route(edges: &[&str]) -> Route {
    Route::new(edges.iter().map(|e| EdgeId::from(*e)).collect())
}

fn vid(s: &str) -> VehicleId {
    VehicleId::from(s)
}

// ── Network & routing ─────────────────────────────────────────────────────────

#[cfg(test)]
mod network {
    use super::*;

    #[test]
    fn edges_resolve_by_string() {
        let net = corridor(None);
        assert_eq!(net.junction_count(), 4);
        assert_eq!(net.edge_count(), 6);
        let e = net.edge_idx("2").unwrap();
        assert_eq!(net.edge_id(e).as_str(), "2");
        assert!(net.edge_idx("9").is_none());
    }

    #[test]
    fn successors_exclude_reversal() {
        let net = corridor(None);
        let one = net.edge_idx("1").unwrap();
        let next: Vec<_> = net.successors(one).map(|e| net.edge_id(e).to_string()).collect();
        assert_eq!(next, vec!["2".to_string()]);
    }

    #[test]
    fn signal_link_indices_follow_source_order() {
        let net = corridor(Some(vec![SignalPhase::new(30.0, "Gr")]));
        let c1 = net.edge_control[net.edge_idx("1").unwrap().index()].unwrap();
        let c2 = net.edge_control[net.edge_idx("-2").unwrap().index()].unwrap();
        assert_eq!(c1.link_index, 0);
        assert_eq!(c2.link_index, 1);
        assert!(net.edge_control[net.edge_idx("2").unwrap().index()].is_none());
    }
}

#[cfg(test)]
mod router {
    use super::*;

    #[test]
    fn straight_through_route() {
        let s = sim(None);
        let r = s.find_route(&EdgeId::from("1"), &EdgeId::from("3")).unwrap();
        assert_eq!(r, Route { edges: route(&["1", "2", "3"]).edges, travel_secs: 20.0 });
    }

    #[test]
    fn same_edge_is_single_edge_route() {
        let s = sim(None);
        let r = s.find_route(&EdgeId::from("2"), &EdgeId::from("2")).unwrap();
        assert_eq!(r.edges.len(), 1);
    }

    #[test]
    fn no_u_turns() {
        let s = sim(None);
        let err = s.find_route(&EdgeId::from("1"), &EdgeId::from("-1")).unwrap_err();
        assert!(matches!(err, LinkError::NoRoute { .. }));
    }

    #[test]
    fn unknown_edge() {
        let s = sim(None);
        let err = s.find_route(&EdgeId::from("1"), &EdgeId::from("x")).unwrap_err();
        assert!(matches!(err, LinkError::UnknownEdge(e) if e.as_str() == "x"));
    }
}

// ── Signals ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod signal {
    use crate::{LightState, SignalPhase, SignalProgram};

    fn program() -> SignalProgram {
        SignalProgram::new("tl", vec![
            SignalPhase::new(30.0, "Gr"),
            SignalPhase::new(3.0, "yr"),
            SignalPhase::new(27.0, "rG"),
        ])
    }

    #[test]
    fn phase_lookup_wraps_cycle() {
        let p = program();
        assert_eq!(p.cycle_secs(), 60.0);
        assert_eq!(p.phase_at(0.0), Some((0, 30.0)));
        assert_eq!(p.phase_at(31.0), Some((1, 2.0)));
        assert_eq!(p.phase_at(65.0), Some((0, 25.0)));
    }

    #[test]
    fn lights_per_link() {
        let p = program();
        assert_eq!(p.light_at(10.0, 0), LightState::Green);
        assert_eq!(p.light_at(10.0, 1), LightState::Red);
        assert_eq!(p.light_at(31.0, 0), LightState::Yellow);
        assert_eq!(p.light_at(40.0, 1), LightState::Green);
        // Beyond the state string: uncontrolled.
        assert_eq!(p.light_at(40.0, 5), LightState::Green);
    }

    #[test]
    fn offset_shifts_program() {
        let p = program().with_offset(30.0);
        assert_eq!(p.phase_at(30.0), Some((0, 30.0)));
        assert_eq!(p.phase_at(0.0).map(|(i, _)| i), Some(1));
    }

    #[test]
    fn empty_program_has_no_phase() {
        assert!(SignalProgram::new("x", vec![]).phase_at(5.0).is_none());
    }
}

// ── MicroSim ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod micro {
    use super::*;

    #[test]
    fn inserted_vehicle_is_live_immediately() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("a"), VehicleClass::Conventional, &route(&["1", "2"])).unwrap();
        assert_eq!(s.vehicle_ids().unwrap(), vec![vid("a")]);
        let st = s.vehicle_state(&vid("a")).unwrap();
        assert_eq!(st.edge.as_str(), "1");
        assert_eq!(st.speed_mps, 10.0);
        assert_eq!(st.distance_m, 0.0);
    }

    #[test]
    fn vehicle_arrives_at_end_of_route() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1"])).unwrap();
        for _ in 0..10 {
            s.advance().unwrap();
        }
        assert!(s.vehicle_ids().unwrap().is_empty());
        assert_eq!(s.arrived_count(), 1);
        assert!(matches!(s.vehicle_state(&vid("a")), Err(LinkError::UnknownEntity(_))));
    }

    #[test]
    fn vehicle_moves_onto_next_edge() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1", "2", "3"])).unwrap();
        for _ in 0..12 {
            s.advance().unwrap();
        }
        let st = s.vehicle_state(&vid("a")).unwrap();
        assert_eq!(st.edge.as_str(), "2");
        assert!((st.distance_m - 120.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["2"])).unwrap();
        let err = s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["3"])).unwrap_err();
        assert!(matches!(err, LinkError::InjectionFailed { .. }));
    }

    #[test]
    fn full_departure_edge_rejected_until_it_clears() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1"])).unwrap();
        let err = s.insert_vehicle(&vid("b"), VehicleClass::Av, &route(&["1"])).unwrap_err();
        assert!(matches!(err, LinkError::InjectionFailed { .. }));
        s.advance().unwrap();
        s.insert_vehicle(&vid("b"), VehicleClass::Av, &route(&["1"])).unwrap();
    }

    #[test]
    fn disconnected_route_rejected() {
        let mut s = sim(None);
        let err = s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1", "3"])).unwrap_err();
        assert!(matches!(err, LinkError::InjectionFailed { .. }));
        assert_eq!(s.vehicle_count(), 0);
    }

    #[test]
    fn red_light_stops_vehicle_before_junction() {
        let mut s = sim(Some(vec![SignalPhase::new(100.0, "rr")]));
        s.insert_vehicle(&vid("a"), VehicleClass::Conventional, &route(&["1", "2"])).unwrap();
        for _ in 0..30 {
            s.advance().unwrap();
        }
        let st = s.vehicle_state(&vid("a")).unwrap();
        assert_eq!(st.edge.as_str(), "1");
        assert!(st.speed_mps <= 0.1, "speed {}", st.speed_mps);
        assert!(st.distance_m < 100.0);
    }

    #[test]
    fn follower_queues_behind_stopped_leader() {
        let mut s = sim(Some(vec![SignalPhase::new(100.0, "rr")]));
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1", "2"])).unwrap();
        s.advance().unwrap();
        s.insert_vehicle(&vid("b"), VehicleClass::Av, &route(&["1", "2"])).unwrap();
        for _ in 0..40 {
            s.advance().unwrap();
        }
        let a = s.vehicle_state(&vid("a")).unwrap();
        let b = s.vehicle_state(&vid("b")).unwrap();
        assert!(b.speed_mps <= 0.1);
        assert!(a.distance_m - b.distance_m >= 5.0 + 2.5 - 1e-9);
    }

    #[test]
    fn emission_by_class() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("c"), VehicleClass::Conventional, &route(&["1"])).unwrap();
        s.insert_vehicle(&vid("v"), VehicleClass::Av, &route(&["3"])).unwrap();
        // Cruising at 10 m/s with zero acceleration.
        assert!((s.co2_emission(&vid("c")).unwrap() - 2_300.0).abs() < 1e-9);
        assert_eq!(s.co2_emission(&vid("v")).unwrap(), 0.0);
    }

    #[test]
    fn held_speed_caps_and_releases() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1", "2", "3"])).unwrap();
        s.set_speed(&vid("a"), 3.0).unwrap();
        s.advance().unwrap();
        assert_eq!(s.vehicle_state(&vid("a")).unwrap().speed_mps, 3.0);
        s.set_speed(&vid("a"), -1.0).unwrap();
        s.advance().unwrap();
        assert!((s.vehicle_state(&vid("a")).unwrap().speed_mps - 5.6).abs() < 1e-9);
        assert!(matches!(s.set_speed(&vid("zz"), 1.0), Err(LinkError::UnknownEntity(_))));
    }

    #[test]
    fn signal_ahead_reports_program() {
        let mut s = sim(Some(vec![SignalPhase::new(30.0, "GG"), SignalPhase::new(30.0, "rr")]));
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1", "2"])).unwrap();
        s.insert_vehicle(&vid("b"), VehicleClass::Av, &route(&["3"])).unwrap();
        s.advance().unwrap();

        let ahead = s.signal_ahead(&vid("a")).unwrap().unwrap();
        assert_eq!(ahead.signal.as_str(), "tl1");
        assert_eq!(ahead.link_index, 0);
        assert_eq!(ahead.current_phase, 0);
        assert!((ahead.secs_to_switch - 29.0).abs() < 1e-9);
        assert!((ahead.distance_m - 85.0).abs() < 1e-9);

        assert!(s.signal_ahead(&vid("b")).unwrap().is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1"])).unwrap();
        s.remove_vehicle(&vid("a")).unwrap();
        s.remove_vehicle(&vid("a")).unwrap();
        assert_eq!(s.vehicle_count(), 0);
    }

    #[test]
    fn fails_after_configured_steps() {
        let params = MicroParams { fail_after_steps: Some(3), ..MicroParams::default() };
        let mut s = MicroSim::new(corridor(None), params);
        for _ in 0..3 {
            s.advance().unwrap();
        }
        let err = s.advance().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(s.step(), 3);
    }

    #[test]
    fn end_time_terminates_session() {
        let params = MicroParams { end_time_secs: Some(2.0), ..MicroParams::default() };
        let mut s = MicroSim::new(corridor(None), params);
        s.advance().unwrap();
        s.advance().unwrap();
        assert!(matches!(s.advance(), Err(LinkError::SimulationUnavailable(_))));
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod snapshot {
    use mt_core::Step;

    use super::*;
    use crate::StepSnapshot;

    #[test]
    fn vanished_vehicles_are_skipped() {
        let mut s = sim(None);
        s.insert_vehicle(&vid("a"), VehicleClass::Av, &route(&["1"])).unwrap();
        s.insert_vehicle(&vid("b"), VehicleClass::Conventional, &route(&["2"])).unwrap();

        let mut snap = StepSnapshot::capture(&s, Step(0), 0.0).unwrap();
        snap.push_injected(vid("ghost"));
        assert_eq!(snap.live_count(), 3);

        let missing = snap.read_states(&s).unwrap();
        assert_eq!(missing, 1);
        assert_eq!(snap.readings.len(), 2);
        let counts = snap.class_counts();
        assert_eq!((counts.av, counts.conventional), (1, 1));
        assert_eq!(snap.readings_of(VehicleClass::Conventional).count(), 1);
    }
}

// ── TimedLink ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod timed {
    use std::time::Duration;

    use super::*;
    use crate::{LinkResult, SignalAhead, TimedLink, VehicleState};

    /// A link whose every step takes `delay`.
    struct SlowLink {
        delay: Duration,
    }

    impl LinkQuery for SlowLink {
        fn vehicle_ids(&self) -> LinkResult<Vec<VehicleId>> {
            Ok(vec![])
        }
        fn vehicle_state(&self, id: &VehicleId) -> LinkResult<VehicleState> {
            Err(LinkError::UnknownEntity(id.clone()))
        }
        fn co2_emission(&self, id: &VehicleId) -> LinkResult<f64> {
            Err(LinkError::UnknownEntity(id.clone()))
        }
        fn edge_ids(&self) -> LinkResult<Vec<EdgeId>> {
            Ok(vec![])
        }
        fn find_route(&self, from: &EdgeId, to: &EdgeId) -> LinkResult<Route> {
            Err(LinkError::NoRoute { from: from.clone(), to: to.clone() })
        }
        fn signal_ahead(&self, _id: &VehicleId) -> LinkResult<Option<SignalAhead>> {
            Ok(None)
        }
    }

    impl SimulationLink for SlowLink {
        fn advance(&mut self) -> LinkResult<()> {
            std::thread::sleep(self.delay);
            Ok(())
        }
        fn insert_vehicle(&mut self, _: &VehicleId, _: VehicleClass, _: &Route) -> LinkResult<()> {
            Ok(())
        }
        fn remove_vehicle(&mut self, _: &VehicleId) -> LinkResult<()> {
            Ok(())
        }
        fn set_speed(&mut self, _: &VehicleId, _: f64) -> LinkResult<()> {
            Ok(())
        }
    }

    #[test]
    fn slow_step_becomes_unavailable() {
        let mut link = TimedLink::new(SlowLink { delay: Duration::from_millis(20) }, Duration::from_millis(1));
        let err = link.advance().unwrap_err();
        assert!(matches!(err, LinkError::SimulationUnavailable(_)));
    }

    #[test]
    fn fast_step_passes_through() {
        let mut link = TimedLink::from_millis(sim(None), 5_000);
        link.advance().unwrap();
        assert_eq!(link.inner().step(), 1);
    }
}
