//! Fixed-time signal programs.
//!
//! A program is a cyclic list of phases.  Each phase carries a duration and a
//! state string with one character per controlled link: `G`/`g` green,
//! `y` yellow, `r` red.  Characters are compared case-insensitively.

use mt_core::SignalId;

/// Light shown to one controlled link.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightState {
    Green,
    Yellow,
    Red,
}

impl LightState {
    /// Decode one state character.  Unrecognised characters (e.g. `o` for
    /// "off") are reported as green, i.e. no restriction.
    pub fn from_char(c: char) -> Self {
        match c.to_ascii_uppercase() {
            'Y' => LightState::Yellow,
            'R' => LightState::Red,
            _   => LightState::Green,
        }
    }
}

/// One phase of a fixed-time program.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalPhase {
    pub duration_secs: f64,
    pub state:         String,
}

impl SignalPhase {
    pub fn new(duration_secs: f64, state: impl Into<String>) -> Self {
        Self { duration_secs, state: state.into() }
    }

    /// Upper-cased state character for `link_index`, if the state string is
    /// long enough.
    pub fn char_at(&self, link_index: usize) -> Option<char> {
        self.state.chars().nth(link_index).map(|c| c.to_ascii_uppercase())
    }

    /// Light shown to `link_index`.  Links beyond the state string are
    /// uncontrolled and always green.
    pub fn light(&self, link_index: usize) -> LightState {
        self.char_at(link_index).map_or(LightState::Green, LightState::from_char)
    }
}

/// A fixed-time program owned by one signalised junction.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalProgram {
    pub id:          SignalId,
    pub phases:      Vec<SignalPhase>,
    /// Seconds subtracted from simulated time before looking up the phase;
    /// used to stagger neighbouring junctions.
    pub offset_secs: f64,
}

impl SignalProgram {
    pub fn new(id: impl Into<SignalId>, phases: Vec<SignalPhase>) -> Self {
        Self { id: id.into(), phases, offset_secs: 0.0 }
    }

    pub fn with_offset(mut self, offset_secs: f64) -> Self {
        self.offset_secs = offset_secs;
        self
    }

    pub fn cycle_secs(&self) -> f64 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }

    /// `(phase index, seconds until that phase ends)` at simulated time
    /// `time_secs`.  Returns `None` for an empty or zero-length program.
    pub fn phase_at(&self, time_secs: f64) -> Option<(usize, f64)> {
        let cycle = self.cycle_secs();
        if self.phases.is_empty() || cycle <= 0.0 {
            return None;
        }
        let mut t = (time_secs - self.offset_secs).rem_euclid(cycle);
        for (i, phase) in self.phases.iter().enumerate() {
            if t < phase.duration_secs {
                return Some((i, phase.duration_secs - t));
            }
            t -= phase.duration_secs;
        }
        // Float residue at the very end of the cycle.
        let last = self.phases.len() - 1;
        Some((last, 0.0))
    }

    /// Light shown to `link_index` at `time_secs`.
    pub fn light_at(&self, time_secs: f64, link_index: usize) -> LightState {
        self.phase_at(time_secs)
            .map_or(LightState::Green, |(i, _)| self.phases[i].light(link_index))
    }
}
