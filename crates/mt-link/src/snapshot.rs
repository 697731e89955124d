//! Per-step view of the live vehicle set, shared by every role.
//!
//! The coordinator captures the id list once per step; the population
//! controller appends the ids it injected; then every vehicle's state is read
//! exactly once.  Measurement roles work from the readings instead of
//! querying the link again.

use mt_core::{PerClass, Step, VehicleClass, VehicleId};

use crate::link::{LinkQuery, VehicleState};
use crate::{LinkError, LinkResult};

/// One vehicle's state for the current step.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleReading {
    pub id:    VehicleId,
    pub state: VehicleState,
}

#[derive(Clone, Debug, Default)]
pub struct StepSnapshot {
    pub step:      Step,
    pub time_secs: f64,
    /// Live ids as reported after `advance()`, plus ids injected this step.
    pub ids:       Vec<VehicleId>,
    /// Filled by [`read_states`](Self::read_states).
    pub readings:  Vec<VehicleReading>,
}

impl StepSnapshot {
    /// Query the live id list.  Only fatal link errors can fail this.
    pub fn capture<L: LinkQuery + ?Sized>(link: &L, step: Step, time_secs: f64) -> LinkResult<Self> {
        Ok(Self {
            step,
            time_secs,
            ids: link.vehicle_ids()?,
            readings: Vec::new(),
        })
    }

    /// Number of vehicles in the id list.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.ids.len()
    }

    /// Append an id the caller just inserted.
    pub fn push_injected(&mut self, id: VehicleId) {
        self.ids.push(id);
    }

    /// Read every vehicle's state once.
    ///
    /// Vehicles that vanished between the id query and the state query are
    /// skipped; the number skipped is returned.  Fatal errors propagate.
    pub fn read_states<L: LinkQuery + ?Sized>(&mut self, link: &L) -> LinkResult<u64> {
        let mut missing = 0;
        self.readings.clear();
        self.readings.reserve(self.ids.len());
        for id in &self.ids {
            match link.vehicle_state(id) {
                Ok(state) => self.readings.push(VehicleReading { id: id.clone(), state }),
                Err(LinkError::UnknownEntity(_)) => missing += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => missing += 1,
            }
        }
        Ok(missing)
    }

    /// Live vehicles per class, from the readings.
    pub fn class_counts(&self) -> PerClass<u32> {
        let mut counts = PerClass::<u32>::default();
        for r in &self.readings {
            counts[r.state.class] += 1;
        }
        counts
    }

    pub fn readings_of(&self, class: VehicleClass) -> impl Iterator<Item = &VehicleReading> {
        self.readings.iter().filter(move |r| r.state.class == class)
    }
}
