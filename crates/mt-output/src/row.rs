//! Plain data row types written by output backends.

use mt_greenwave::SpeedAdvisory;
use mt_measure::{EmissionSample, StopEvent, StopReport};
use mt_population::PopulationSample;

/// Live vehicle count against the target at one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationRow {
    pub step:      u64,
    pub time_secs: f64,
    pub live:      u32,
    pub live_av:   u32,
    pub target:    u32,
}

impl From<&PopulationSample> for PopulationRow {
    fn from(s: &PopulationSample) -> Self {
        Self {
            step:      s.step.0,
            time_secs: s.time_secs,
            live:      s.live,
            live_av:   s.live_av,
            target:    s.target,
        }
    }
}

/// CO2 emitted during one sampled step, plus the running totals.  Grams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Co2Row {
    pub step:                  u64,
    pub time_secs:             f64,
    pub conventional_g:        f64,
    pub av_g:                  f64,
    pub total_conventional_g:  f64,
    pub total_av_g:            f64,
    pub conventional_vehicles: u32,
    pub av_vehicles:           u32,
}

impl Co2Row {
    /// `step_length_secs` turns the sampled rate into the grams of one step.
    pub fn from_sample(sample: &EmissionSample, step_length_secs: f64) -> Self {
        let step_g = sample.step_grams(step_length_secs);
        let total_g = sample.cumulative_grams();
        Self {
            step:                  sample.step.0,
            time_secs:             sample.time_secs,
            conventional_g:        step_g.conventional,
            av_g:                  step_g.av,
            total_conventional_g:  total_g.conventional,
            total_av_g:            total_g.av,
            conventional_vehicles: sample.live.conventional,
            av_vehicles:           sample.live.av,
        }
    }
}

/// One counted stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopEventRow {
    pub time_secs:     f64,
    pub vehicle_id:    String,
    pub edge_id:       String,
    /// Dwell length at the moment the stop was counted.
    pub duration_secs: f64,
    /// Network-wide total after this stop.
    pub total_count:   u64,
}

impl From<&StopEvent> for StopEventRow {
    fn from(e: &StopEvent) -> Self {
        Self {
            time_secs:     e.time_secs,
            vehicle_id:    e.vehicle.to_string(),
            edge_id:       e.edge.to_string(),
            duration_secs: e.duration_at_count_secs,
            total_count:   e.total_count,
        }
    }
}

/// Final stop count for one monitored edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCountRow {
    pub edge_id: String,
    pub count:   u64,
}

impl StopCountRow {
    /// Every monitored edge, busiest first.  Edges without stops are kept.
    pub fn from_report(report: &StopReport) -> Vec<Self> {
        report
            .ranked()
            .into_iter()
            .map(|(edge, count)| Self { edge_id: edge.to_string(), count })
            .collect()
    }
}

/// One green-wave speed advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryRow {
    pub time_secs:      f64,
    pub vehicle_id:     String,
    pub edge_id:        String,
    pub signal_id:      String,
    pub time_to_green:  f64,
    pub time_to_red:    f64,
    pub lane_length_m:  f64,
    pub green_duration: f64,
    pub advised_kmh:    f64,
    pub previous_kmh:   f64,
}

impl From<&SpeedAdvisory> for AdvisoryRow {
    fn from(a: &SpeedAdvisory) -> Self {
        Self {
            time_secs:      a.time_secs,
            vehicle_id:     a.vehicle.to_string(),
            edge_id:        a.edge.to_string(),
            signal_id:      a.signal.to_string(),
            time_to_green:  a.time_to_green,
            time_to_red:    a.time_to_red,
            lane_length_m:  a.lane_length_m,
            green_duration: a.green_duration,
            advised_kmh:    a.advised_kmh,
            previous_kmh:   a.previous_kmh,
        }
    }
}
