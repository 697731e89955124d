//! Advisory log and end-of-run statistics.

use std::collections::BTreeMap;

use mt_core::{EdgeId, SignalId, Step, VehicleId};

/// One advisory applied to one AV on one edge.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpeedAdvisory {
    pub step:             Step,
    pub time_secs:        f64,
    pub vehicle:          VehicleId,
    pub edge:             EdgeId,
    pub signal:           SignalId,
    pub time_to_green:    f64,
    pub time_to_red:      f64,
    pub lane_length_m:    f64,
    pub green_duration:   f64,
    pub advised_kmh:      f64,
    pub previous_kmh:     f64,
}

impl SpeedAdvisory {
    pub fn speed_change_kmh(&self) -> f64 {
        self.advised_kmh - self.previous_kmh
    }
}

/// Averages and ranges over all advisories.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AdvisoryStats {
    pub count:                usize,
    pub mean_time_to_green:   f64,
    pub mean_time_to_red:     f64,
    pub mean_lane_length_m:   f64,
    pub mean_green_duration:  f64,
    pub mean_advised_kmh:     f64,
    pub mean_abs_change_kmh:  f64,
    pub min_time_to_green:    f64,
    pub max_time_to_green:    f64,
    pub min_time_to_red:      f64,
    pub max_time_to_red:      f64,
    pub min_lane_length_m:    f64,
    pub max_lane_length_m:    f64,
}

impl AdvisoryStats {
    /// `None` for an empty log.
    pub fn from_advisories(log: &[SpeedAdvisory]) -> Option<Self> {
        if log.is_empty() {
            return None;
        }
        let n = log.len() as f64;
        let mean = |f: fn(&SpeedAdvisory) -> f64| log.iter().map(f).sum::<f64>() / n;
        let min = |f: fn(&SpeedAdvisory) -> f64| log.iter().map(f).fold(f64::INFINITY, f64::min);
        let max = |f: fn(&SpeedAdvisory) -> f64| log.iter().map(f).fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count:               log.len(),
            mean_time_to_green:  mean(|a| a.time_to_green),
            mean_time_to_red:    mean(|a| a.time_to_red),
            mean_lane_length_m:  mean(|a| a.lane_length_m),
            mean_green_duration: mean(|a| a.green_duration),
            mean_advised_kmh:    mean(|a| a.advised_kmh),
            mean_abs_change_kmh: mean(|a| a.speed_change_kmh().abs()),
            min_time_to_green:   min(|a| a.time_to_green),
            max_time_to_green:   max(|a| a.time_to_green),
            min_time_to_red:     min(|a| a.time_to_red),
            max_time_to_red:     max(|a| a.time_to_red),
            min_lane_length_m:   min(|a| a.lane_length_m),
            max_lane_length_m:   max(|a| a.lane_length_m),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EdgeAdvisoryStats {
    pub count:               usize,
    pub mean_time_to_green:  f64,
    pub mean_advised_kmh:    f64,
    pub mean_abs_change_kmh: f64,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GreenWaveReport {
    pub advisories: Vec<SpeedAdvisory>,
    pub stats:      Option<AdvisoryStats>,
    pub per_edge:   BTreeMap<EdgeId, EdgeAdvisoryStats>,
    /// Vehicle/edge pairs skipped because no signal lay ahead.
    pub no_signal:  u64,
    /// Queries or speed commands for vehicles that had vanished.
    pub anomalies:  u64,
}

impl GreenWaveReport {
    pub fn from_log(advisories: Vec<SpeedAdvisory>, no_signal: u64, anomalies: u64) -> Self {
        let stats = AdvisoryStats::from_advisories(&advisories);

        let mut grouped: BTreeMap<EdgeId, Vec<&SpeedAdvisory>> = BTreeMap::new();
        for a in &advisories {
            grouped.entry(a.edge.clone()).or_default().push(a);
        }
        let per_edge = grouped
            .into_iter()
            .map(|(edge, list)| {
                let n = list.len() as f64;
                let stats = EdgeAdvisoryStats {
                    count:               list.len(),
                    mean_time_to_green:  list.iter().map(|a| a.time_to_green).sum::<f64>() / n,
                    mean_advised_kmh:    list.iter().map(|a| a.advised_kmh).sum::<f64>() / n,
                    mean_abs_change_kmh: list.iter().map(|a| a.speed_change_kmh().abs()).sum::<f64>() / n,
                };
                (edge, stats)
            })
            .collect();

        Self { advisories, stats, per_edge, no_signal, anomalies }
    }

    pub fn count(&self) -> usize {
        self.advisories.len()
    }
}
