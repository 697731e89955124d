//! Stop-event counting on a monitored set of edges.
//!
//! A *dwell* starts when a vehicle is at or below the speed threshold on a
//! monitored edge and lasts while it stays slow on that same edge.  A dwell
//! counts once, on the first step its duration reaches the minimum.

use std::collections::{BTreeMap, BTreeSet};

use mt_core::{EdgeId, MonitorConfig, Step, VehicleId};
use mt_link::StepSnapshot;
use tracing::debug;

use crate::VehicleMap;

/// Duration comparisons tolerate float noise from `step * step_length`.
const DURATION_EPS: f64 = 1e-9;

#[derive(Clone, Debug)]
pub struct StopSettings {
    pub speed_threshold_mps: f64,
    pub min_duration_secs:   f64,
    pub monitored:           BTreeSet<EdgeId>,
}

impl StopSettings {
    /// Thresholds from `config`; `monitored` is the resolved edge set.
    pub fn from_config(config: &MonitorConfig, monitored: BTreeSet<EdgeId>) -> Self {
        Self {
            speed_threshold_mps: config.stop_speed_threshold_mps,
            min_duration_secs:   config.min_stop_duration_secs,
            monitored,
        }
    }
}

/// One counted stop.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StopEvent {
    pub vehicle:                VehicleId,
    pub edge:                   EdgeId,
    pub start_step:             Step,
    pub start_time_secs:        f64,
    /// Time at which the dwell reached the minimum duration.
    pub time_secs:              f64,
    /// Dwell length when the stop was counted, not the final dwell length.
    pub duration_at_count_secs: f64,
    /// Grand total including this event.
    pub total_count:            u64,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StopReport {
    /// One entry per monitored edge, zero counts included.
    pub counts:           BTreeMap<EdgeId, u64>,
    pub total:            u64,
    pub events:           Vec<StopEvent>,
    pub monitored:        BTreeSet<EdgeId>,
    pub edges_with_stops: usize,
}

impl StopReport {
    pub fn count_for(&self, edge: &str) -> u64 {
        self.counts.get(edge).copied().unwrap_or(0)
    }

    /// Edges sorted by descending count, ties by edge id.
    pub fn ranked(&self) -> Vec<(&EdgeId, u64)> {
        let mut v: Vec<_> = self.counts.iter().map(|(e, n)| (e, *n)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        v
    }
}

#[derive(Clone, Debug)]
struct Dwell {
    edge:       EdgeId,
    start_step: Step,
    start_time: f64,
    last_time:  f64,
    counted:    bool,
}

impl Dwell {
    fn duration(&self) -> f64 {
        self.last_time - self.start_time
    }
}

pub struct StopEventAggregator {
    settings:  StopSettings,
    open:      VehicleMap<Dwell>,
    counts:    BTreeMap<EdgeId, u64>,
    total:     u64,
    events:    Vec<StopEvent>,
    discarded: u64,
}

impl StopEventAggregator {
    pub fn new(settings: StopSettings) -> Self {
        let counts = settings.monitored.iter().map(|e| (e.clone(), 0)).collect();
        Self {
            settings,
            open: VehicleMap::default(),
            counts,
            total: 0,
            events: Vec::new(),
            discarded: 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn open_dwells(&self) -> usize {
        self.open.len()
    }

    /// Dwells that ended before reaching the minimum duration.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Update dwells from this step's readings; returns the stops counted
    /// on this step.
    pub fn observe(&mut self, snapshot: &StepSnapshot) -> Vec<StopEvent> {
        let mut counted = Vec::new();
        let t = snapshot.time_secs;

        let mut present: VehicleMap<()> = VehicleMap::default();
        for r in &snapshot.readings {
            present.insert(r.id.clone(), ());
            let slow = r.state.speed_mps <= self.settings.speed_threshold_mps;
            let monitored = self.settings.monitored.contains(&r.state.edge);

            // An existing dwell continues only on the same edge while slow.
            let continues = matches!(
                self.open.get(&r.id),
                Some(d) if slow && d.edge == r.state.edge
            );
            if !continues {
                if let Some(d) = self.open.remove(&r.id) {
                    self.close(&r.id, d);
                }
                if slow && monitored {
                    self.open.insert(r.id.clone(), Dwell {
                        edge:       r.state.edge.clone(),
                        start_step: snapshot.step,
                        start_time: t,
                        last_time:  t,
                        counted:    false,
                    });
                }
            }

            let Some(d) = self.open.get_mut(&r.id) else { continue };
            d.last_time = t;
            if !d.counted && d.duration() >= self.settings.min_duration_secs - DURATION_EPS {
                d.counted = true;
                let d = d.clone();
                counted.push(self.count(&r.id, &d));
            }
        }

        // Vehicles gone from the snapshot end their dwell.
        let mut gone: Vec<VehicleId> = self
            .open
            .keys()
            .filter(|id| !present.contains_key(*id))
            .cloned()
            .collect();
        gone.sort();
        for id in gone {
            if let Some(d) = self.open.remove(&id) {
                self.close(&id, d);
            }
        }
        counted
    }

    fn count(&mut self, vehicle: &VehicleId, d: &Dwell) -> StopEvent {
        self.total += 1;
        *self.counts.entry(d.edge.clone()).or_insert(0) += 1;
        let event = StopEvent {
            vehicle:                vehicle.clone(),
            edge:                   d.edge.clone(),
            start_step:             d.start_step,
            start_time_secs:        d.start_time,
            time_secs:              d.last_time,
            duration_at_count_secs: d.duration(),
            total_count:            self.total,
        };
        debug!(vehicle = %vehicle, edge = %d.edge, duration = event.duration_at_count_secs, total = self.total, "stop counted");
        self.events.push(event.clone());
        event
    }

    fn close(&mut self, vehicle: &VehicleId, d: Dwell) {
        if !d.counted {
            self.discarded += 1;
            debug!(vehicle = %vehicle, edge = %d.edge, duration = d.duration(), "short dwell discarded");
        }
    }

    pub fn finalize(self) -> StopReport {
        let edges_with_stops = self.counts.values().filter(|n| **n > 0).count();
        StopReport {
            counts: self.counts,
            total: self.total,
            events: self.events,
            monitored: self.settings.monitored,
            edges_with_stops,
        }
    }
}
