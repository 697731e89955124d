//! The advisory speed rule.

use crate::timing::SignalTiming;

/// Inputs at or below this (seconds, metres) are treated as missing data.
const MIN_VALID_INPUT: f64 = 0.1;

/// Advisories above this are discarded in favour of the legal speed.
const MAX_ADVISORY_KMH: f64 = 100.0;

const MPS_TO_KMH: f64 = 3.6;

/// Cycle length `C` and legal speed `vj` for the advisory formula.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpeedRule {
    pub cycle_secs:      f64,
    pub legal_speed_kmh: f64,
}

impl Default for SpeedRule {
    fn default() -> Self {
        Self { cycle_secs: 90.0, legal_speed_kmh: 60.0 }
    }
}

impl SpeedRule {
    /// Advisory speed in km/h for a lane of `length_m` metres at AV share
    /// `penetration`.
    ///
    /// With `T = G·P`:
    ///
    /// | condition                       | speed            |
    /// |---------------------------------|------------------|
    /// | any of S, R, L ≤ 0.1 or G ≤ 0   | `vj`             |
    /// | `R ≤ T`                         | `vj`             |
    /// | `L/S` ≤ `vj`                    | `L/S`            |
    /// | `L/R` ≤ `vj`                    | `vj`             |
    /// | otherwise                       | `L/(S + C)`      |
    ///
    /// Results outside `(0, 100]` km/h fall back to `vj`.
    pub fn advise_kmh(&self, length_m: f64, penetration: f64, timing: &SignalTiming) -> f64 {
        let vj = self.legal_speed_kmh;
        let SignalTiming { time_to_green: s, time_to_red: r, green_duration: g } = *timing;
        let l = length_m;

        if s <= MIN_VALID_INPUT || r <= MIN_VALID_INPUT || l <= MIN_VALID_INPUT || g <= 0.0 {
            return vj;
        }

        let threshold = g * penetration;
        let v = if r <= threshold {
            vj
        } else if l / s * MPS_TO_KMH <= vj {
            l / s * MPS_TO_KMH
        } else if l / r * MPS_TO_KMH <= vj {
            vj
        } else if s + self.cycle_secs > MIN_VALID_INPUT {
            l / (s + self.cycle_secs) * MPS_TO_KMH
        } else {
            vj
        };

        if v <= 0.0 || v > MAX_ADVISORY_KMH { vj } else { v }
    }
}

#[inline]
pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh / MPS_TO_KMH
}

#[inline]
pub fn mps_to_kmh(mps: f64) -> f64 {
    mps * MPS_TO_KMH
}
