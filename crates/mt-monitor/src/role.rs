//! The roles the coordinator runs every step.

use std::fmt;

/// One per-step role.  [`MonitorRole::ORDER`] is the order the coordinator
/// runs them in.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MonitorRole {
    Population,
    Emission,
    Stops,
    GreenWave,
}

impl MonitorRole {
    /// Population first so injected vehicles are measured on their first
    /// step; the green wave last so it sees the same snapshot the
    /// aggregators saw.
    pub const ORDER: [MonitorRole; 4] = [
        MonitorRole::Population,
        MonitorRole::Emission,
        MonitorRole::Stops,
        MonitorRole::GreenWave,
    ];

    /// Roles that may change the simulation.
    pub const fn is_control(self) -> bool {
        matches!(self, MonitorRole::Population | MonitorRole::GreenWave)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MonitorRole::Population => "population",
            MonitorRole::Emission   => "emission",
            MonitorRole::Stops      => "stops",
            MonitorRole::GreenWave  => "green_wave",
        }
    }
}

impl fmt::Display for MonitorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
