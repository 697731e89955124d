//! Simulation time model.
//!
//! # Design
//!
//! Progress is counted in integer `Step`s.  The mapping to simulated seconds
//! is held in `SimClock`:
//!
//!   time_secs = step * step_length_secs
//!
//! Using an integer step as the canonical unit keeps "did we reach the
//! horizon?" and "is this a sampling step?" exact; only durations reported to
//! users are converted to seconds.

use std::fmt;

// ── Step ─────────────────────────────────────────────────────────────────────

/// An absolute simulation step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    /// Return the step `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Step {
        Step(self.0 + n)
    }

    /// Steps elapsed from `earlier` to `self` (saturating at zero).
    #[inline]
    pub fn since(self, earlier: Step) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// `true` when `self` falls on a multiple of `interval`.  An interval of
    /// zero never matches.
    #[inline]
    pub fn is_multiple_of(self, interval: u64) -> bool {
        interval > 0 && self.0 % interval == 0
    }
}

impl std::ops::Add<u64> for Step {
    type Output = Step;
    #[inline]
    fn add(self, rhs: u64) -> Step {
        Step(self.0 + rhs)
    }
}

/// Saturating, like [`Step::since`].
impl std::ops::Sub for Step {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Step) -> u64 {
        self.since(rhs)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between step counts and simulated seconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many simulated seconds one step represents.  Default: 1.0.
    pub step_length_secs: f64,
    /// The current step, advanced by `SimClock::advance()` each iteration.
    pub current_step: Step,
}

impl SimClock {
    pub fn new(step_length_secs: f64) -> Self {
        Self {
            step_length_secs,
            current_step: Step::ZERO,
        }
    }

    /// Advance the clock by one step.
    #[inline]
    pub fn advance(&mut self) {
        self.current_step = Step(self.current_step.0 + 1);
    }

    /// Simulated seconds at the start of `step`.
    #[inline]
    pub fn time_at(&self, step: Step) -> f64 {
        step.0 as f64 * self.step_length_secs
    }

    /// Simulated seconds elapsed up to the current step.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.time_at(self.current_step)
    }

    /// How many steps span `secs` seconds? (rounds up so a horizon is never
    /// cut short)
    #[inline]
    pub fn steps_for_secs(&self, secs: f64) -> u64 {
        if secs <= 0.0 || self.step_length_secs <= 0.0 {
            return 0;
        }
        // Tolerate float noise such as 100.0 / 0.1 = 1000.0000000000001.
        let raw = secs / self.step_length_secs;
        let rounded = raw.round();
        if (raw - rounded).abs() < 1e-9 {
            rounded as u64
        } else {
            raw.ceil() as u64
        }
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} s)", self.current_step, self.elapsed_secs())
    }
}
