//! Population time series and end-of-run report.

use mt_core::{EdgeId, PerClass, PopulationTarget, Step, VehicleClass, VehicleId};

/// Live population after control ran for one step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PopulationSample {
    pub step:      Step,
    pub time_secs: f64,
    pub live:      u32,
    pub live_av:   u32,
    pub target:    u32,
}

impl PopulationSample {
    /// Share of live vehicles that are AVs, `None` on an empty network.
    pub fn live_av_fraction(&self) -> Option<f64> {
        (self.live > 0).then(|| self.live_av as f64 / self.live as f64)
    }
}

/// One successful insertion.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InjectionRecord {
    pub step:      Step,
    pub time_secs: f64,
    pub id:        VehicleId,
    pub class:     VehicleClass,
    pub departure: EdgeId,
    pub arrival:   EdgeId,
}

/// Everything the population controller learned during one run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PopulationReport {
    pub target:                PopulationTarget,
    pub samples:               Vec<PopulationSample>,
    pub injections:            Vec<InjectionRecord>,
    pub injected:              PerClass<u64>,
    /// Insertions the simulator rejected.
    pub failed_injections:     u64,
    /// Injections skipped because no routable pair was found.
    pub route_failures:        u64,
    pub mean_abs_count_error:  f64,
    /// Mean over samples with at least one live vehicle.
    pub mean_live_av_fraction: f64,
    pub max_simultaneous:      u32,
    pub distinct_vehicles:     u64,
}

impl PopulationReport {
    pub fn total_injected(&self) -> u64 {
        self.injected.total()
    }

    /// `av / total` over all successful injections.
    pub fn injected_av_fraction(&self) -> Option<f64> {
        let total = self.total_injected();
        (total > 0).then(|| self.injected.av as f64 / total as f64)
    }
}
