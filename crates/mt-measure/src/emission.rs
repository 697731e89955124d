//! Per-class CO2 accumulation.
//!
//! Every step, each live conventional vehicle's instantaneous rate (mg/s) is
//! read from the link and integrated over the step length.  AVs are
//! zero-emission by [`VehicleClass::emits_co2`] and are never queried.

use mt_core::{MonitorConfig, PerClass, Step, VehicleClass};
use mt_link::{LinkError, LinkQuery, LinkResult, StepSnapshot};
use tracing::debug;

use crate::VehicleMap;

#[derive(Clone, Debug)]
pub struct EmissionSettings {
    pub step_length_secs:      f64,
    pub sample_interval_steps: u64,
}

impl EmissionSettings {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            step_length_secs:      config.step_length_secs,
            sample_interval_steps: config.emission_sample_interval_steps,
        }
    }
}

/// One point of the emission time series.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EmissionSample {
    pub step:          Step,
    pub time_secs:     f64,
    /// Summed instantaneous rate of all live vehicles of each class, mg/s.
    pub rate_mg_s:     PerClass<f64>,
    /// Mass emitted since the start of the run, mg.
    pub cumulative_mg: PerClass<f64>,
    pub live:          PerClass<u32>,
}

impl EmissionSample {
    /// Emission of this step in grams (rate × step length).
    pub fn step_grams(&self, step_length_secs: f64) -> PerClass<f64> {
        self.rate_mg_s.map(|_, r| r * step_length_secs / 1000.0)
    }

    pub fn cumulative_grams(&self) -> PerClass<f64> {
        self.cumulative_mg.map(|_, m| m / 1000.0)
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EmissionReport {
    pub total_mg:           PerClass<f64>,
    /// Sum of `live × step_length` over the run.
    pub vehicle_secs:       PerClass<f64>,
    /// Mean per-vehicle rate, mg/s (`total / vehicle_secs`).
    pub avg_rate_mg_s:      PerClass<f64>,
    /// Distance driven, from each vehicle's last cumulative-distance reading.
    pub distance_m:         PerClass<f64>,
    pub steps_observed:     u64,
    pub samples:            Vec<EmissionSample>,
    /// Rate queries skipped because the vehicle had vanished.
    pub anomalies:          u64,
}

impl EmissionReport {
    pub fn total_grams(&self) -> PerClass<f64> {
        self.total_mg.map(|_, m| m / 1000.0)
    }

    /// Conventional-vehicle CO2 intensity, g/km.  `None` before any
    /// conventional vehicle moved.
    pub fn conventional_g_per_km(&self) -> Option<f64> {
        let km = self.distance_m.conventional / 1000.0;
        (km > 0.0).then(|| self.total_mg.conventional / 1000.0 / km)
    }
}

pub struct EmissionAggregator {
    settings:       EmissionSettings,
    cumulative_mg:  PerClass<f64>,
    vehicle_secs:   PerClass<f64>,
    last_distance:  VehicleMap<(VehicleClass, f64)>,
    samples:        Vec<EmissionSample>,
    steps_observed: u64,
    anomalies:      u64,
}

impl EmissionAggregator {
    pub fn new(settings: EmissionSettings) -> Self {
        Self {
            settings,
            cumulative_mg:  PerClass::default(),
            vehicle_secs:   PerClass::default(),
            last_distance:  VehicleMap::default(),
            samples:        Vec::new(),
            steps_observed: 0,
            anomalies:      0,
        }
    }

    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    pub fn cumulative_mg(&self) -> PerClass<f64> {
        self.cumulative_mg
    }

    /// Integrate one step.  Returns a sample on sampling steps.
    ///
    /// A vehicle that vanished between the snapshot and the rate query is
    /// skipped for this step and counted as an anomaly.  Fatal link errors
    /// propagate.
    pub fn observe<L: LinkQuery + ?Sized>(
        &mut self,
        link:     &L,
        snapshot: &StepSnapshot,
    ) -> LinkResult<Option<EmissionSample>> {
        let dt = self.settings.step_length_secs;
        let mut rate = PerClass::<f64>::default();
        let mut live = PerClass::<u32>::default();

        for r in &snapshot.readings {
            let class = r.state.class;
            live[class] += 1;
            self.last_distance.insert(r.id.clone(), (class, r.state.distance_m));

            if !class.emits_co2() {
                continue;
            }
            match link.co2_emission(&r.id) {
                Ok(mg_s) => rate[class] += mg_s,
                Err(e) if e.is_fatal() => return Err(e),
                Err(LinkError::UnknownEntity(_)) => self.anomalies += 1,
                Err(e) => {
                    self.anomalies += 1;
                    debug!(vehicle = %r.id, error = %e, "emission query failed");
                }
            }
        }

        for class in VehicleClass::ALL {
            self.cumulative_mg[class] += rate[class] * dt;
            self.vehicle_secs[class] += live[class] as f64 * dt;
        }
        self.steps_observed += 1;

        if !snapshot.step.is_multiple_of(self.settings.sample_interval_steps) {
            return Ok(None);
        }
        let sample = EmissionSample {
            step:          snapshot.step,
            time_secs:     snapshot.time_secs,
            rate_mg_s:     rate,
            cumulative_mg: self.cumulative_mg,
            live,
        };
        self.samples.push(sample.clone());
        Ok(Some(sample))
    }

    pub fn finalize(self) -> EmissionReport {
        let mut distance_m = PerClass::<f64>::default();
        for (class, d) in self.last_distance.values() {
            distance_m[*class] += d;
        }
        let avg_rate_mg_s = PerClass::new(
            ratio(self.cumulative_mg.av, self.vehicle_secs.av),
            ratio(self.cumulative_mg.conventional, self.vehicle_secs.conventional),
        );
        EmissionReport {
            total_mg: self.cumulative_mg,
            vehicle_secs: self.vehicle_secs,
            avg_rate_mg_s,
            distance_m,
            steps_observed: self.steps_observed,
            samples: self.samples,
            anomalies: self.anomalies,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
