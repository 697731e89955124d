//! Deterministic AV/conventional mix correction.
//!
//! The class of each injected vehicle is chosen greedily from the running
//! injection counters, never by coin flip:
//!
//! ```text
//! inject Av  iff  (av_injected + 1) / (total_injected + 1) <= f
//! ```
//!
//! This keeps `av_injected / total_injected` within `1 / total_injected` of
//! `f` at every point of the run.

use mt_core::{PerClass, VehicleClass};

/// Tolerance for the fraction comparison so that e.g. `f = 0.3` admits the
/// third AV out of ten despite binary rounding.
const FRACTION_EPS: f64 = 1e-9;

/// Successful injections so far.  Only updated after the simulator accepted
/// the vehicle.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MixCounters {
    pub av_injected:    u64,
    pub total_injected: u64,
}

impl MixCounters {
    pub fn record(&mut self, class: VehicleClass) {
        self.total_injected += 1;
        if class == VehicleClass::Av {
            self.av_injected += 1;
        }
    }

    pub fn per_class(&self) -> PerClass<u64> {
        PerClass::new(self.av_injected, self.total_injected - self.av_injected)
    }

    /// `av_injected / total_injected`, or `None` before the first injection.
    pub fn av_share(&self) -> Option<f64> {
        (self.total_injected > 0).then(|| self.av_injected as f64 / self.total_injected as f64)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct MixPolicy {
    av_fraction: f64,
}

impl MixPolicy {
    pub fn new(av_fraction: f64) -> Self {
        Self { av_fraction }
    }

    pub fn av_fraction(&self) -> f64 {
        self.av_fraction
    }

    /// Class for the next injection given the current counters.
    pub fn next_class(&self, counters: &MixCounters) -> VehicleClass {
        let av_after    = (counters.av_injected + 1) as f64;
        let total_after = (counters.total_injected + 1) as f64;
        if av_after <= self.av_fraction * total_after + FRACTION_EPS {
            VehicleClass::Av
        } else {
            VehicleClass::Conventional
        }
    }
}
