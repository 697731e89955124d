//! The value a run returns.

use mt_core::{MonitorConfig, Step};
use mt_greenwave::GreenWaveReport;
use mt_measure::{EmissionReport, StopReport};
use mt_population::PopulationReport;

/// How a run ended.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum RunOutcome {
    /// Every step up to the horizon ran.
    Complete,
    /// The simulator was lost at `at_step`; reports cover the steps before it.
    Incomplete { reason: String, at_step: Step },
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete)
    }
}

/// Vehicles that vanished between the id query and a later query, per role.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnomalyCounts {
    /// State reads for ids in the snapshot.
    pub state_reads: u64,
    pub emission:    u64,
    pub green_wave:  u64,
}

impl AnomalyCounts {
    pub fn total(&self) -> u64 {
        self.state_reads + self.emission + self.green_wave
    }
}

/// Everything a run produced.  Built once, after every role was finalized.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunResult {
    pub outcome:         RunOutcome,
    pub steps_completed: u64,
    pub config:          MonitorConfig,
    pub population:      PopulationReport,
    pub emission:        EmissionReport,
    pub stops:           StopReport,
    pub green_wave:      Option<GreenWaveReport>,
    pub anomalies:       AnomalyCounts,
    pub wall_secs:       f64,
}

impl RunResult {
    pub fn is_complete(&self) -> bool {
        self.outcome.is_complete()
    }

    /// Conventional-vehicle CO2 in grams.
    pub fn conventional_co2_g(&self) -> f64 {
        self.emission.total_grams().conventional
    }

    pub fn total_stops(&self) -> u64 {
        self.stops.total
    }
}
