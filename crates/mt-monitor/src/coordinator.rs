//! The `MonitorCoordinator` struct and its step loop.

use std::time::Instant;

use mt_core::{MonitorConfig, SimClock, Step};
use mt_greenwave::GreenWaveAdvisor;
use mt_link::{LinkResult, SimulationLink, StepSnapshot, TimedLink};
use mt_measure::{EmissionAggregator, StopEventAggregator};
use mt_population::PopulationController;
use tracing::{info, warn};

use crate::{AnomalyCounts, MonitorObserver, MonitorRole, RunOutcome, RunResult};

/// Owns the link and every role for exactly one run.
///
/// Each step:
///
/// 1. **Advance** the simulator by one step.  A lost simulator (or an
///    `advance()` slower than `step_timeout_ms`) ends the run as
///    [`RunOutcome::Incomplete`].
/// 2. **Snapshot** the live vehicle ids once.
/// 3. **Roles** in [`MonitorRole::ORDER`]:
///    - `Population`: count and mix correction, then one state read per
///      vehicle into the shared snapshot.
///    - `Emission`: integrate conventional-vehicle CO2.
///    - `Stops`: update dwells on monitored edges.
///    - `GreenWave`: advise AVs entering target edges (when enabled).
/// 4. **Observer** hooks, and a status line every `status_interval_secs`.
///
/// Create via [`MonitorBuilder`][crate::MonitorBuilder].
pub struct MonitorCoordinator<L: SimulationLink> {
    pub(crate) config:       MonitorConfig,
    pub(crate) clock:        SimClock,
    pub(crate) link:         TimedLink<L>,
    pub(crate) population:   PopulationController,
    pub(crate) emission:     EmissionAggregator,
    pub(crate) stops:        StopEventAggregator,
    pub(crate) green_wave:   Option<GreenWaveAdvisor>,
    /// Ids in the snapshot whose state could not be read.
    pub(crate) state_misses: u64,
}

impl<L: SimulationLink> MonitorCoordinator<L> {
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run to the horizon, or until the simulator is lost.
    ///
    /// Consumes the coordinator: every role is finalized exactly once and
    /// only the returned [`RunResult`] survives.
    pub fn run<O: MonitorObserver>(mut self, observer: &mut O) -> RunResult {
        let started = Instant::now();
        let horizon = self.config.horizon_steps();
        let status_every = self.config.status_interval_steps();
        let target = self.population.settings().target;

        info!(
            horizon_steps = horizon,
            target_vehicles = target.count(),
            av_fraction = target.av_fraction(),
            seed = self.config.seed,
            "run started"
        );

        let outcome = loop {
            let step = self.clock.current_step;
            if step.0 >= horizon {
                break RunOutcome::Complete;
            }

            observer.on_step_start(step);
            match self.process_step(step, observer) {
                Ok(live) => observer.on_step_end(step, live),
                Err(e) => {
                    warn!(step = step.0, error = %e, "simulator lost; ending run early");
                    break RunOutcome::Incomplete { reason: e.to_string(), at_step: step };
                }
            }

            if step.is_multiple_of(status_every) {
                self.log_status(step);
            }
            self.clock.advance();
        };

        let steps_completed = match &outcome {
            RunOutcome::Complete => self.clock.current_step.0,
            RunOutcome::Incomplete { at_step, .. } => at_step.0,
        };
        let result = self.finish(outcome, steps_completed, started.elapsed().as_secs_f64());

        info!(
            complete = result.is_complete(),
            steps = result.steps_completed,
            stops = result.total_stops(),
            co2_g = result.conventional_co2_g(),
            injected = result.population.total_injected(),
            "run finished"
        );
        observer.on_run_end(&result);
        result
    }

    // ── Step processing ───────────────────────────────────────────────────

    /// One full step.  Returns the number of vehicles read.  Only fatal link
    /// errors are returned.
    fn process_step<O: MonitorObserver>(&mut self, step: Step, observer: &mut O) -> LinkResult<usize> {
        self.link.advance()?;

        let time = self.clock.time_at(step);
        let mut snapshot = StepSnapshot::capture(&self.link, step, time)?;

        for role in MonitorRole::ORDER {
            match role {
                MonitorRole::Population => {
                    self.population.control(&mut self.link, &mut snapshot)?;
                    self.state_misses += snapshot.read_states(&self.link)?;
                    let sample = self.population.observe(&snapshot);
                    observer.on_population_sample(&sample);
                }
                MonitorRole::Emission => {
                    if let Some(sample) = self.emission.observe(&self.link, &snapshot)? {
                        observer.on_emission_sample(&sample);
                    }
                }
                MonitorRole::Stops => {
                    for event in self.stops.observe(&snapshot) {
                        observer.on_stop_event(&event);
                    }
                }
                MonitorRole::GreenWave => {
                    if let Some(advisor) = self.green_wave.as_mut() {
                        for advisory in advisor.apply(&mut self.link, &snapshot)? {
                            observer.on_speed_advisory(&advisory);
                        }
                    }
                }
            }
        }
        Ok(snapshot.readings.len())
    }

    fn log_status(&self, step: Step) {
        let counters = self.population.counters();
        info!(
            step = step.0,
            time_secs = self.clock.time_at(step),
            injected = counters.total_injected,
            injected_av = counters.av_injected,
            co2_g = self.emission.cumulative_mg().conventional / 1000.0,
            stops = self.stops.total(),
            "status"
        );
    }

    fn finish(self, outcome: RunOutcome, steps_completed: u64, wall_secs: f64) -> RunResult {
        let anomalies = AnomalyCounts {
            state_reads: self.state_misses,
            emission:    self.emission.anomalies(),
            green_wave:  self.green_wave.as_ref().map_or(0, GreenWaveAdvisor::anomalies),
        };
        RunResult {
            outcome,
            steps_completed,
            config:     self.config,
            population: self.population.finalize(),
            emission:   self.emission.finalize(),
            stops:      self.stops.finalize(),
            green_wave: self.green_wave.map(GreenWaveAdvisor::finalize),
            anomalies,
            wall_secs,
        }
    }
}
