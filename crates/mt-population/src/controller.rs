//! The `PopulationController` control role.

#[cfg(not(feature = "fx-hash"))]
use std::collections::HashSet;

#[cfg(feature = "fx-hash")]
use rustc_hash::FxHashSet as HashSet;

use mt_core::{MonitorConfig, MtResult, PopulationTarget, VehicleClass, VehicleId};
use mt_link::{LinkResult, SimulationLink, StepSnapshot};
use tracing::{debug, warn};

use crate::mix::{MixCounters, MixPolicy};
use crate::report::{InjectionRecord, PopulationReport, PopulationSample};
use crate::routes::RouteSource;

/// First numeric suffix of generated vehicle ids (`dyn_2000`, `dyn_2001`, …).
pub const FIRST_VEHICLE_NUMBER: u64 = 2000;

// ── Settings ──────────────────────────────────────────────────────────────────

/// The subset of [`MonitorConfig`] the controller needs.
#[derive(Clone, Debug)]
pub struct PopulationSettings {
    pub target:                 PopulationTarget,
    pub max_inject_per_step:    u32,
    pub control_interval_steps: u64,
    pub horizon_secs:           f64,
    /// No generation while the remaining horizon is at or below this.
    pub cutoff_secs:            f64,
}

impl PopulationSettings {
    pub fn from_config(config: &MonitorConfig) -> MtResult<Self> {
        Ok(Self {
            target:                 config.population_target()?,
            max_inject_per_step:    config.max_inject_per_step,
            control_interval_steps: config.control_interval_steps,
            horizon_secs:           config.horizon_secs,
            cutoff_secs:            config.stop_generation_before_end_secs,
        })
    }
}

/// What one control step did.
#[derive(Clone, Debug, Default)]
pub struct StepInjection {
    /// Vehicles the controller tried to add.
    pub requested: u32,
    pub injected:  Vec<(VehicleId, VehicleClass)>,
    pub failed:    u32,
}

// ── PopulationController ──────────────────────────────────────────────────────

/// Keeps the live count at `N` and the injected AV share at `f`.
///
/// The controller only ever adds vehicles.  A surplus (e.g. from vehicles
/// that were already in the simulation at start) is tolerated and drains as
/// vehicles reach their destinations.
pub struct PopulationController {
    settings: PopulationSettings,
    mix:      MixPolicy,
    counters: MixCounters,
    routes:   RouteSource,
    next_number: u64,

    // ── Report accumulators ───────────────────────────────────────────────
    samples:           Vec<PopulationSample>,
    injections:        Vec<InjectionRecord>,
    failed_injections: u64,
    route_failures:    u64,
    seen:              HashSet<VehicleId>,
    abs_error_sum:     f64,
    av_fraction_sum:   f64,
    av_fraction_n:     u64,
    max_live:          u32,
}

impl PopulationController {
    pub fn new(settings: PopulationSettings, routes: RouteSource) -> Self {
        let mix = MixPolicy::new(settings.target.av_fraction());
        Self {
            settings,
            mix,
            counters: MixCounters::default(),
            routes,
            next_number: FIRST_VEHICLE_NUMBER,
            samples: Vec::new(),
            injections: Vec::new(),
            failed_injections: 0,
            route_failures: 0,
            seen: HashSet::default(),
            abs_error_sum: 0.0,
            av_fraction_sum: 0.0,
            av_fraction_n: 0,
            max_live: 0,
        }
    }

    pub fn settings(&self) -> &PopulationSettings {
        &self.settings
    }

    pub fn counters(&self) -> MixCounters {
        self.counters
    }

    /// `true` while the remaining horizon exceeds the generation cutoff.
    pub fn generation_open(&self, time_secs: f64) -> bool {
        self.settings.horizon_secs - time_secs > self.settings.cutoff_secs
    }

    /// Run count and mix correction for this step.
    ///
    /// Injected ids are appended to `snapshot.ids` so the measurement roles
    /// see them this step.  Rejected insertions are counted and retried on a
    /// later step; only fatal link errors are returned.
    pub fn control<L: SimulationLink + ?Sized>(
        &mut self,
        link:     &mut L,
        snapshot: &mut StepSnapshot,
    ) -> LinkResult<StepInjection> {
        let mut out = StepInjection::default();

        if !snapshot.step.is_multiple_of(self.settings.control_interval_steps)
            || !self.generation_open(snapshot.time_secs)
        {
            return Ok(out);
        }

        let live = snapshot.live_count() as u64;
        let target = self.settings.target.count() as u64;
        if live >= target {
            return Ok(out);
        }
        let wanted = (target - live).min(self.settings.max_inject_per_step as u64) as u32;
        out.requested = wanted;

        for _ in 0..wanted {
            let Some(route) = self.routes.pick(&*link)? else {
                self.route_failures += 1;
                out.failed += 1;
                continue;
            };

            let class = self.mix.next_class(&self.counters);
            let id = VehicleId::new(format!("dyn_{}", self.next_number));
            self.next_number += 1;

            match link.insert_vehicle(&id, class, &route) {
                Ok(()) => {
                    self.counters.record(class);
                    debug!(vehicle = %id, %class, step = snapshot.step.0, "injected vehicle");
                    if let (Some(departure), Some(arrival)) = (route.departure(), route.arrival()) {
                        self.injections.push(InjectionRecord {
                            step:      snapshot.step,
                            time_secs: snapshot.time_secs,
                            id:        id.clone(),
                            class,
                            departure: departure.clone(),
                            arrival:   arrival.clone(),
                        });
                    }
                    snapshot.push_injected(id.clone());
                    out.injected.push((id, class));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    self.failed_injections += 1;
                    out.failed += 1;
                    debug!(vehicle = %id, error = %e, "injection rejected");
                }
            }
        }

        if out.failed > 0 {
            warn!(
                step = snapshot.step.0,
                requested = out.requested,
                injected = out.injected.len(),
                "injection shortfall"
            );
        }
        Ok(out)
    }

    /// Record the population after this step's states were read.
    pub fn observe(&mut self, snapshot: &StepSnapshot) -> PopulationSample {
        let counts = snapshot.class_counts();
        let sample = PopulationSample {
            step:      snapshot.step,
            time_secs: snapshot.time_secs,
            live:      counts.total(),
            live_av:   counts.av,
            target:    self.settings.target.count(),
        };

        for r in &snapshot.readings {
            if !self.seen.contains(&r.id) {
                self.seen.insert(r.id.clone());
            }
        }
        self.abs_error_sum += (sample.live as f64 - sample.target as f64).abs();
        if let Some(f) = sample.live_av_fraction() {
            self.av_fraction_sum += f;
            self.av_fraction_n += 1;
        }
        self.max_live = self.max_live.max(sample.live);
        self.samples.push(sample.clone());
        sample
    }

    /// Consume the controller and produce its report.
    pub fn finalize(self) -> PopulationReport {
        let n = self.samples.len();
        PopulationReport {
            target:                self.settings.target,
            mean_abs_count_error:  if n > 0 { self.abs_error_sum / n as f64 } else { 0.0 },
            mean_live_av_fraction: if self.av_fraction_n > 0 {
                self.av_fraction_sum / self.av_fraction_n as f64
            } else {
                0.0
            },
            samples:               self.samples,
            injections:            self.injections,
            injected:              self.counters.per_class(),
            failed_injections:     self.failed_injections,
            route_failures:        self.route_failures,
            max_simultaneous:      self.max_live,
            distinct_vehicles:     self.seen.len() as u64,
        }
    }
}
