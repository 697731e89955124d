//! Unit tests for mt-monitor.

use mt_core::{EdgeId, GreenWaveConfig, MonitorConfig, MtError, Step, VehicleClass};
use mt_greenwave::SpeedAdvisory;
use mt_link::{MicroParams, MicroSim, RoadNetwork, RoadNetworkBuilder, SignalPhase, SignalProgram};
use mt_measure::{EmissionSample, StopEvent};
use mt_population::PopulationSample;

use crate::{
    batch_seed, BatchSummary, MonitorBuilder, MonitorError, MonitorObserver, MonitorRole,
    NoopObserver, RunOutcome, RunResult, Spread,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Four 150 m two-way segments j0..j4 at 12 m/s, signals at j1 and j2.
fn arterial() -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    let j: Vec<_> = (0..5).map(|i| b.add_junction(format!("j{i}"))).collect();
    for i in 0..4 {
        b.add_road(format!("{}", i + 1), format!("-{}", i + 1), j[i], j[i + 1], 150.0, 12.0);
    }
    let phases = vec![
        SignalPhase::new(25.0, "Gr"),
        SignalPhase::new(3.0, "yr"),
        SignalPhase::new(25.0, "rG"),
        SignalPhase::new(3.0, "ry"),
    ];
    b.add_signal(j[1], SignalProgram::new("tl1", phases.clone()));
    b.add_signal(j[2], SignalProgram::new("tl2", phases).with_offset(12.0));
    b.build()
}

fn all_edges() -> Vec<EdgeId> {
    ["1", "2", "3", "4", "-1", "-2", "-3", "-4"].iter().map(|e| EdgeId::from(*e)).collect()
}

fn config(n: u32, pct: f64, horizon: f64) -> MonitorConfig {
    MonitorConfig {
        target_vehicles:    n,
        av_penetration_pct: pct,
        horizon_secs:       horizon,
        monitored_edges:    all_edges(),
        ..MonitorConfig::default()
    }
}

fn sim(params: MicroParams) -> MicroSim {
    MicroSim::new(arterial(), params)
}

fn run(config: MonitorConfig, params: MicroParams) -> RunResult {
    MonitorBuilder::new(config, sim(params))
        .build()
        .unwrap()
        .run(&mut NoopObserver)
}

/// Counts every callback.
#[derive(Default)]
struct Recorder {
    step_starts: u64,
    step_ends:   u64,
    population:  Vec<PopulationSample>,
    emission:    Vec<EmissionSample>,
    stops:       Vec<StopEvent>,
    advisories:  Vec<SpeedAdvisory>,
    run_ends:    u32,
}

impl MonitorObserver for Recorder {
    fn on_step_start(&mut self, _step: Step) {
        self.step_starts += 1;
    }
    fn on_step_end(&mut self, _step: Step, _live: usize) {
        self.step_ends += 1;
    }
    fn on_population_sample(&mut self, sample: &PopulationSample) {
        self.population.push(sample.clone());
    }
    fn on_emission_sample(&mut self, sample: &EmissionSample) {
        self.emission.push(sample.clone());
    }
    fn on_stop_event(&mut self, event: &StopEvent) {
        self.stops.push(event.clone());
    }
    fn on_speed_advisory(&mut self, advisory: &SpeedAdvisory) {
        self.advisories.push(advisory.clone());
    }
    fn on_run_end(&mut self, _result: &RunResult) {
        self.run_ends += 1;
    }
}

// ── Scenario runs ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod scenario {
    use super::*;

    #[test]
    fn ten_vehicles_half_av_for_100_steps() {
        let result = run(config(10, 50.0, 100.0), MicroParams::default());

        assert_eq!(result.outcome, RunOutcome::Complete);
        assert_eq!(result.steps_completed, 100);
        assert_eq!(result.population.samples.len(), 100);

        // Nothing was in the network at start, so injection alone never
        // pushes the count above the target.
        assert!(result.population.samples.iter().all(|s| s.live <= 10));
        assert_eq!(result.population.max_simultaneous, 10);

        let total = result.population.total_injected();
        assert!(total >= 10);
        let av = result.population.injected.av as f64;
        assert!((av / total as f64 - 0.5).abs() <= 1.0 / total as f64);

        assert_eq!(result.emission.total_mg.av, 0.0);
        assert!(result.emission.total_mg.conventional > 0.0);
        assert_eq!(result.emission.steps_observed, 100);

        assert_eq!(result.stops.total as usize, result.stops.events.len());
        assert_eq!(result.stops.counts.len(), 8);
        assert!(result.green_wave.is_none());
    }

    #[test]
    fn no_injection_inside_cutoff_window() {
        let result = run(config(10, 50.0, 100.0), MicroParams::default());
        // Cutoff 60 s of a 100 s horizon: generation stops at t = 40.
        assert!(result.population.injections.iter().all(|r| r.time_secs < 40.0));
    }

    #[test]
    fn same_seed_same_run() {
        let a = run(config(10, 30.0, 80.0), MicroParams::default());
        let b = run(config(10, 30.0, 80.0), MicroParams::default());
        assert_eq!(a.population.injections, b.population.injections);
        assert_eq!(a.stops.total, b.stops.total);
        assert_eq!(a.emission.total_mg, b.emission.total_mg);
    }

    #[test]
    fn all_conventional_mix() {
        let result = run(config(6, 0.0, 60.0), MicroParams::default());
        assert_eq!(result.population.injected.av, 0);
        assert_eq!(result.emission.vehicle_secs.av, 0.0);
    }

    #[test]
    fn short_horizon_needs_a_shorter_cutoff() {
        let cfg = config(6, 50.0, 40.0);
        assert!(cfg.generation_window_secs() <= 0.0);
        let idle = run(cfg.clone(), MicroParams::default());
        assert!(idle.is_complete());
        assert_eq!(idle.population.total_injected(), 0);

        let mut cfg = cfg;
        cfg.stop_generation_before_end_secs = 10.0;
        let busy = run(cfg, MicroParams::default());
        assert!(busy.population.total_injected() > 0);
        assert!(busy.conventional_co2_g() > 0.0);
    }

    #[test]
    fn lost_simulator_at_step_50_is_incomplete() {
        let params = MicroParams { fail_after_steps: Some(50), ..MicroParams::default() };
        let result = run(config(10, 50.0, 100.0), params);

        match &result.outcome {
            RunOutcome::Incomplete { at_step, reason } => {
                assert_eq!(*at_step, Step(50));
                assert!(!reason.is_empty());
            }
            other => panic!("expected Incomplete, got {other:?}"),
        }
        assert_eq!(result.steps_completed, 50);
        assert_eq!(result.population.samples.len(), 50);
        assert_eq!(result.population.samples.last().map(|s| s.step), Some(Step(49)));
        assert_eq!(result.emission.steps_observed, 50);
        assert!(result.stops.events.iter().all(|e| e.start_step < Step(50)));
    }

    #[test]
    fn simulator_end_time_is_incomplete() {
        let params = MicroParams { end_time_secs: Some(30.0), ..MicroParams::default() };
        let result = run(config(5, 50.0, 100.0), params);
        assert!(!result.is_complete());
        assert_eq!(result.steps_completed, 30);
    }

    #[test]
    fn green_wave_advises_only_avs_on_targets() {
        let mut cfg = config(12, 50.0, 120.0);
        cfg.seed = 7;
        let green = GreenWaveConfig {
            enabled:      true,
            target_edges: vec![EdgeId::from("1"), EdgeId::from("2"), EdgeId::from("-3"), EdgeId::from("-2")],
            ..GreenWaveConfig::default()
        };
        let mut rec = Recorder::default();
        let result = MonitorBuilder::new(cfg, sim(MicroParams::default()))
            .green_wave(green)
            .build()
            .unwrap()
            .run(&mut rec);

        let report = result.green_wave.as_ref().unwrap();
        assert_eq!(report.count(), rec.advisories.len());
        let av_ids: Vec<_> = result
            .population
            .injections
            .iter()
            .filter(|r| r.class == VehicleClass::Av)
            .map(|r| r.id.clone())
            .collect();
        for a in &report.advisories {
            assert!(av_ids.contains(&a.vehicle));
            assert!(["1", "2", "-3", "-2"].contains(&a.edge.as_str()));
            assert!(a.advised_kmh > 0.0 && a.advised_kmh <= 100.0);
        }
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use super::*;

    #[test]
    fn hooks_fire_per_step_and_once_at_end() {
        let mut cfg = config(8, 50.0, 50.0);
        cfg.emission_sample_interval_steps = 10;
        let mut rec = Recorder::default();
        let result = MonitorBuilder::new(cfg, sim(MicroParams::default()))
            .build()
            .unwrap()
            .run(&mut rec);

        assert_eq!(rec.step_starts, 50);
        assert_eq!(rec.step_ends, 50);
        assert_eq!(rec.population.len(), 50);
        assert_eq!(rec.emission.len(), 5);
        assert_eq!(rec.stops, result.stops.events);
        assert_eq!(rec.run_ends, 1);
    }

    #[test]
    fn failed_step_has_no_step_end() {
        let params = MicroParams { fail_after_steps: Some(3), ..MicroParams::default() };
        let mut rec = Recorder::default();
        MonitorBuilder::new(config(4, 50.0, 20.0), sim(params))
            .build()
            .unwrap()
            .run(&mut rec);
        assert_eq!(rec.step_starts, 4);
        assert_eq!(rec.step_ends, 3);
        assert_eq!(rec.run_ends, 1);
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = config(10, 150.0, 100.0);
        let err = MonitorBuilder::new(cfg, sim(MicroParams::default())).build().err();
        assert!(matches!(err, Some(MonitorError::Config(MtError::ConfigInvalid(_)))));
    }

    #[test]
    fn unknown_monitored_edges_are_rejected() {
        let mut cfg = config(10, 50.0, 100.0);
        cfg.monitored_edges = vec![EdgeId::from("nowhere")];
        let err = MonitorBuilder::new(cfg, sim(MicroParams::default())).build().err();
        assert!(matches!(err, Some(MonitorError::Config(MtError::ConfigInvalid(_)))));
    }

    #[test]
    fn partially_unknown_edges_are_dropped() {
        let mut cfg = config(4, 50.0, 10.0);
        cfg.monitored_edges = vec![EdgeId::from("2"), EdgeId::from("nowhere")];
        let result = run(cfg, MicroParams::default());
        assert_eq!(result.stops.monitored.len(), 1);
        assert!(result.stops.counts.contains_key("2"));
    }

    #[test]
    fn green_wave_without_known_targets_is_rejected() {
        let green = GreenWaveConfig {
            enabled:      true,
            target_edges: vec![EdgeId::from("nowhere")],
            ..GreenWaveConfig::default()
        };
        let err = MonitorBuilder::new(config(4, 50.0, 10.0), sim(MicroParams::default()))
            .green_wave(green)
            .build()
            .err();
        assert!(matches!(err, Some(MonitorError::Config(_))));
    }

    #[test]
    fn disabled_green_wave_is_ignored() {
        let green = GreenWaveConfig { enabled: false, ..GreenWaveConfig::default() };
        let result = MonitorBuilder::new(config(4, 50.0, 10.0), sim(MicroParams::default()))
            .green_wave(green)
            .build()
            .unwrap()
            .run(&mut NoopObserver);
        assert!(result.green_wave.is_none());
    }

    #[test]
    fn borrowed_link_can_be_inspected_after_run() {
        let mut micro = sim(MicroParams::default());
        let result = MonitorBuilder::new(config(6, 50.0, 40.0), &mut micro)
            .build()
            .unwrap()
            .run(&mut NoopObserver);
        assert_eq!(micro.step(), 40);
        assert_eq!(result.population.injections.len() as u64, result.population.total_injected());
    }
}

// ── Roles & batch ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod roles {
    use super::*;

    #[test]
    fn population_runs_first_green_wave_last() {
        assert_eq!(MonitorRole::ORDER[0], MonitorRole::Population);
        assert_eq!(MonitorRole::ORDER[3], MonitorRole::GreenWave);
        let controls: Vec<_> = MonitorRole::ORDER.iter().filter(|r| r.is_control()).collect();
        assert_eq!(controls.len(), 2);
    }
}

#[cfg(test)]
mod batch {
    use super::*;

    #[test]
    fn spread_statistics() {
        let s = Spread::of(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.stdev - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(Spread::of(&[]).is_none());
        assert_eq!(Spread::of(&[7.0]).unwrap().stdev, 0.0);
    }

    #[test]
    fn incomplete_runs_are_excluded_from_spreads() {
        let mut summary = BatchSummary::new();
        for i in 0..3 {
            let mut cfg = config(6, 50.0, 40.0);
            cfg.stop_generation_before_end_secs = 10.0;
            cfg.seed = batch_seed(100, i);
            let params = if i == 1 {
                MicroParams { fail_after_steps: Some(10), ..MicroParams::default() }
            } else {
                MicroParams::default()
            };
            summary.push(&run(cfg, params));
        }
        assert_eq!(summary.runs.len(), 3);
        assert_eq!(summary.incomplete, 1);
        assert_eq!(summary.completed(), 2);
        assert_eq!(summary.runs[1].seed, 101);
        assert!(!summary.runs[1].complete);
        let co2 = summary.co2_g.unwrap();
        assert!(co2.min <= co2.max);
        assert!(co2.min > 0.0);
    }
}
