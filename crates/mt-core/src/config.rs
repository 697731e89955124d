//! Run configuration.
//!
//! All values are supplied once, before a run starts, and are immutable for
//! the run's duration.  Application crates typically deserialize
//! [`MonitorConfig`] from a TOML file (with the `serde` feature) and override
//! a few fields from the command line before calling
//! [`MonitorConfig::validate`].

use crate::{EdgeId, MtError, MtResult, SimClock};

// ── PopulationTarget ──────────────────────────────────────────────────────────

/// Target live vehicle count `N` and target AV fraction `f`.
///
/// Invariants: `count > 0`, `0.0 <= av_fraction <= 1.0`.  Only constructible
/// through [`PopulationTarget::new`], which enforces both.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PopulationTarget {
    count:       u32,
    av_fraction: f64,
}

impl PopulationTarget {
    pub fn new(count: u32, av_fraction: f64) -> MtResult<Self> {
        if count == 0 {
            return Err(MtError::ConfigInvalid(
                "target vehicle count must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&av_fraction) {
            return Err(MtError::ConfigInvalid(format!(
                "AV fraction {av_fraction} is outside [0, 1]"
            )));
        }
        Ok(Self { count, av_fraction })
    }

    /// Build from a percentage in `[0, 100]`, the unit used on the command
    /// line and in config files.
    pub fn from_percent(count: u32, av_penetration_pct: f64) -> MtResult<Self> {
        if !(0.0..=100.0).contains(&av_penetration_pct) {
            return Err(MtError::ConfigInvalid(format!(
                "AV penetration {av_penetration_pct}% is outside 0–100"
            )));
        }
        Self::new(count, av_penetration_pct / 100.0)
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn av_fraction(&self) -> f64 {
        self.av_fraction
    }
}

// ── MonitorConfig ─────────────────────────────────────────────────────────────

/// Top-level monitoring-run configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// Target live vehicle count `N`.
    pub target_vehicles: u32,

    /// Target AV share as a percentage, 0–100.
    pub av_penetration_pct: f64,

    /// Simulated run length in seconds.
    pub horizon_secs: f64,

    /// Seconds per simulator step.
    pub step_length_secs: f64,

    /// Upper bound on vehicles injected in a single step.
    pub max_inject_per_step: u32,

    /// No vehicles are generated once the remaining horizon is at or below
    /// this many seconds.
    pub stop_generation_before_end_secs: f64,

    /// Run population control every N steps.
    pub control_interval_steps: u64,

    /// Random departure/arrival pairs tried per injection before giving up.
    pub max_route_attempts: u32,

    /// Speed (m/s) at or below which a vehicle counts as stopped.
    pub stop_speed_threshold_mps: f64,

    /// Minimum dwell (s) for a stop to be counted.  Inclusive.
    pub min_stop_duration_secs: f64,

    /// Edges on which stops are counted.
    pub monitored_edges: Vec<EdgeId>,

    /// Emit an emission time-series sample every N steps.
    pub emission_sample_interval_steps: u64,

    /// Log a status line every N simulated seconds.
    pub status_interval_secs: f64,

    /// An `advance()` slower than this is treated as a lost simulator.
    pub step_timeout_ms: u64,

    /// Seed for route selection.  The same seed against a deterministic
    /// simulator always produces identical runs.
    pub seed: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target_vehicles:                 100,
            av_penetration_pct:              50.0,
            horizon_secs:                    1_000.0,
            step_length_secs:                1.0,
            max_inject_per_step:             5,
            stop_generation_before_end_secs: 60.0,
            control_interval_steps:          1,
            max_route_attempts:              10,
            stop_speed_threshold_mps:        0.1,
            min_stop_duration_secs:          1.0,
            monitored_edges:                 Vec::new(),
            emission_sample_interval_steps:  1,
            status_interval_secs:            10.0,
            step_timeout_ms:                 5_000,
            seed:                            42,
        }
    }
}

impl MonitorConfig {
    /// Check every field and return the first violation as
    /// [`MtError::ConfigInvalid`].
    ///
    /// The monitored-edge set is only checked for emptiness here; resolving
    /// it against the simulator's network happens when the coordinator is
    /// built.
    pub fn validate(&self) -> MtResult<()> {
        self.population_target()?;

        let positive = [
            (self.horizon_secs,     "horizon_secs"),
            (self.step_length_secs, "step_length_secs"),
            (self.min_stop_duration_secs, "min_stop_duration_secs"),
        ];
        for (value, name) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MtError::ConfigInvalid(format!("{name} must be positive, got {value}")));
            }
        }

        if !(self.stop_speed_threshold_mps >= 0.0) {
            return Err(MtError::ConfigInvalid(
                "stop_speed_threshold_mps must be non-negative".into(),
            ));
        }
        if !(self.stop_generation_before_end_secs >= 0.0) {
            return Err(MtError::ConfigInvalid(
                "stop_generation_before_end_secs must be non-negative".into(),
            ));
        }

        let nonzero = [
            (self.max_inject_per_step as u64, "max_inject_per_step"),
            (self.control_interval_steps,     "control_interval_steps"),
            (self.max_route_attempts as u64,  "max_route_attempts"),
            (self.emission_sample_interval_steps, "emission_sample_interval_steps"),
            (self.step_timeout_ms,            "step_timeout_ms"),
        ];
        for (value, name) in nonzero {
            if value == 0 {
                return Err(MtError::ConfigInvalid(format!("{name} must be at least 1")));
            }
        }

        if self.monitored_edges.is_empty() {
            return Err(MtError::ConfigInvalid("no monitored edges configured".into()));
        }
        Ok(())
    }

    /// Seconds at the start of the run during which vehicles may be
    /// injected.  Zero or less means the run never injects.
    pub fn generation_window_secs(&self) -> f64 {
        self.horizon_secs - self.stop_generation_before_end_secs
    }

    /// The validated population target.
    pub fn population_target(&self) -> MtResult<PopulationTarget> {
        PopulationTarget::from_percent(self.target_vehicles, self.av_penetration_pct)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.step_length_secs)
    }

    /// Number of steps in the run (exclusive upper bound).
    pub fn horizon_steps(&self) -> u64 {
        self.make_clock().steps_for_secs(self.horizon_secs)
    }

    /// Steps between status log lines (at least 1).
    pub fn status_interval_steps(&self) -> u64 {
        self.make_clock().steps_for_secs(self.status_interval_secs).max(1)
    }
}

// ── GreenWaveConfig ───────────────────────────────────────────────────────────

/// Settings for the optional green-wave speed advisory applied to AVs.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GreenWaveConfig {
    pub enabled: bool,

    /// Edges on which entering AVs receive an advisory.
    pub target_edges: Vec<EdgeId>,

    /// Signal cycle length `C` used when the next green cannot be reached
    /// within the legal speed.
    pub cycle_secs: f64,

    /// Legal speed `vj` in km/h; also the fallback advisory.
    pub legal_speed_kmh: f64,
}

impl Default for GreenWaveConfig {
    fn default() -> Self {
        Self {
            enabled:         false,
            target_edges:    Vec::new(),
            cycle_secs:      90.0,
            legal_speed_kmh: 60.0,
        }
    }
}

impl GreenWaveConfig {
    pub fn validate(&self) -> MtResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.target_edges.is_empty() {
            return Err(MtError::ConfigInvalid(
                "green wave enabled without target edges".into(),
            ));
        }
        if !(self.cycle_secs > 0.0) || !(self.legal_speed_kmh > 0.0) {
            return Err(MtError::ConfigInvalid(
                "green wave cycle and legal speed must be positive".into(),
            ));
        }
        Ok(())
    }
}
