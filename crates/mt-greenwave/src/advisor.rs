//! The `GreenWaveAdvisor` control role.

use std::collections::BTreeSet;

#[cfg(not(feature = "fx-hash"))]
use std::collections::HashSet;

#[cfg(feature = "fx-hash")]
use rustc_hash::FxHashSet as HashSet;

use mt_core::{EdgeId, GreenWaveConfig, VehicleClass, VehicleId};
use mt_link::{LinkError, LinkResult, SimulationLink, StepSnapshot};
use tracing::debug;

use crate::report::{GreenWaveReport, SpeedAdvisory};
use crate::speed::{kmh_to_mps, mps_to_kmh, SpeedRule};
use crate::timing::SignalTiming;

#[derive(Clone, Debug)]
pub struct GreenWaveSettings {
    pub targets:     BTreeSet<EdgeId>,
    pub rule:        SpeedRule,
    /// AV share `P` used in the `R ≤ G·P` test.
    pub penetration: f64,
}

impl GreenWaveSettings {
    pub fn from_config(config: &GreenWaveConfig, penetration: f64) -> Self {
        Self {
            targets: config.target_edges.iter().cloned().collect(),
            rule:    SpeedRule {
                cycle_secs:      config.cycle_secs,
                legal_speed_kmh: config.legal_speed_kmh,
            },
            penetration,
        }
    }
}

/// Gives each AV one advisory per target edge it enters.
///
/// A vehicle/edge pair is remembered while the vehicle is live, so re-entering
/// the same edge later in the trip does not trigger a second advisory.
pub struct GreenWaveAdvisor {
    settings:   GreenWaveSettings,
    advised:    HashSet<(VehicleId, EdgeId)>,
    advisories: Vec<SpeedAdvisory>,
    no_signal:  u64,
    anomalies:  u64,
}

impl GreenWaveAdvisor {
    pub fn new(settings: GreenWaveSettings) -> Self {
        Self {
            settings,
            advised:    HashSet::default(),
            advisories: Vec::new(),
            no_signal:  0,
            anomalies:  0,
        }
    }

    pub fn settings(&self) -> &GreenWaveSettings {
        &self.settings
    }

    pub fn anomalies(&self) -> u64 {
        self.anomalies
    }

    pub fn advisory_count(&self) -> usize {
        self.advisories.len()
    }

    /// Advise every AV that is on a target edge for the first time.
    ///
    /// Returns the advisories applied this step.  Only fatal link errors
    /// are returned.
    pub fn apply<L: SimulationLink + ?Sized>(
        &mut self,
        link:     &mut L,
        snapshot: &StepSnapshot,
    ) -> LinkResult<Vec<SpeedAdvisory>> {
        let mut applied = Vec::new();

        for r in snapshot.readings_of(VehicleClass::Av) {
            let edge = &r.state.edge;
            if !self.settings.targets.contains(edge) {
                continue;
            }
            let key = (r.id.clone(), edge.clone());
            if self.advised.contains(&key) {
                continue;
            }

            let ahead = match link.signal_ahead(&r.id) {
                Ok(Some(ahead)) => ahead,
                Ok(None) => {
                    self.no_signal += 1;
                    self.advised.insert(key);
                    continue;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    self.note_anomaly(&r.id, &e);
                    continue;
                }
            };

            let timing = SignalTiming::from_ahead(&ahead);
            let advised_kmh = self.settings.rule.advise_kmh(
                r.state.edge_length_m,
                self.settings.penetration,
                &timing,
            );

            match link.set_speed(&r.id, kmh_to_mps(advised_kmh)) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    self.note_anomaly(&r.id, &e);
                    continue;
                }
            }

            let advisory = SpeedAdvisory {
                step:           snapshot.step,
                time_secs:      snapshot.time_secs,
                vehicle:        r.id.clone(),
                edge:           edge.clone(),
                signal:         ahead.signal,
                time_to_green:  timing.time_to_green,
                time_to_red:    timing.time_to_red,
                lane_length_m:  r.state.edge_length_m,
                green_duration: timing.green_duration,
                advised_kmh,
                previous_kmh:   mps_to_kmh(r.state.speed_mps),
            };
            debug!(
                vehicle = %advisory.vehicle,
                edge = %advisory.edge,
                s = timing.time_to_green,
                r = timing.time_to_red,
                v = advised_kmh,
                "speed advisory"
            );
            self.advised.insert(key);
            self.advisories.push(advisory.clone());
            applied.push(advisory);
        }

        // Forget pairs whose vehicle has left the simulation.
        let live: HashSet<&VehicleId> = snapshot.ids.iter().collect();
        self.advised.retain(|(id, _)| live.contains(id));

        Ok(applied)
    }

    fn note_anomaly(&mut self, id: &VehicleId, e: &LinkError) {
        self.anomalies += 1;
        debug!(vehicle = %id, error = %e, "green-wave query skipped");
    }

    pub fn finalize(self) -> GreenWaveReport {
        GreenWaveReport::from_log(self.advisories, self.no_signal, self.anomalies)
    }
}
