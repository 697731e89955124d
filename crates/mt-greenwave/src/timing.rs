//! Signal timing as seen from one approaching lane.
//!
//! All times are measured from "now", i.e. from the point in the current
//! phase described by [`SignalAhead::secs_to_switch`].  Only an upper-case
//! `G` after normalisation counts as green here (`g` normalises to `G`); `y`
//! is yellow, `r` is red.  Other state characters are neither.

use mt_link::{SignalAhead, SignalPhase};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SignalTiming {
    /// `S`: seconds until the lane's next green phase starts.
    pub time_to_green:  f64,
    /// `R`: seconds until the lane next turns red (trailing yellow included).
    pub time_to_red:    f64,
    /// `G`: duration of the first green phase in the program.
    pub green_duration: f64,
}

impl SignalTiming {
    pub fn from_ahead(ahead: &SignalAhead) -> Self {
        Self {
            time_to_green:  time_to_green(ahead),
            time_to_red:    time_to_red(ahead),
            green_duration: green_duration(&ahead.phases, ahead.link_index),
        }
    }
}

fn state_at(phase: &SignalPhase, link: usize) -> Option<char> {
    phase.char_at(link)
}

fn is(phase: &SignalPhase, link: usize, c: char) -> bool {
    state_at(phase, link) == Some(c)
}

/// `None` when the program is empty, the current phase is out of range, or
/// the lane index is beyond the current state string.
fn current(ahead: &SignalAhead) -> Option<char> {
    ahead.phases.get(ahead.current_phase).and_then(|p| state_at(p, ahead.link_index))
}

/// Seconds until the next green phase starts.
///
/// While green, this is the start of the *next* separate green phase; if the
/// program has none, the end of the current phase.  Otherwise the phases are
/// walked forward for one full cycle.  Returns 0 for unusable input.
pub fn time_to_green(ahead: &SignalAhead) -> f64 {
    let Some(now) = current(ahead) else { return 0.0 };
    let phases = &ahead.phases;
    let n = phases.len();
    let link = ahead.link_index;
    let mut acc = ahead.secs_to_switch;

    for k in 1..=n {
        let idx = (ahead.current_phase + k) % n;
        if now == 'G' && idx == ahead.current_phase {
            return ahead.secs_to_switch;
        }
        if is(&phases[idx], link, 'G') {
            return acc;
        }
        acc += phases[idx].duration_secs;
    }
    acc
}

/// Seconds until the lane turns red.
///
/// * green: rest of this phase, plus the next phase if it is yellow,
/// * yellow: rest of this phase,
/// * red: until the end of the next green phase (plus its trailing yellow),
/// * anything else: 0.
pub fn time_to_red(ahead: &SignalAhead) -> f64 {
    let Some(now) = current(ahead) else { return 0.0 };
    let phases = &ahead.phases;
    let n = phases.len();
    let link = ahead.link_index;
    let next = |i: usize| &phases[(i + 1) % n];

    match now {
        'G' => {
            let mut acc = ahead.secs_to_switch;
            if is(next(ahead.current_phase), link, 'Y') {
                acc += next(ahead.current_phase).duration_secs;
            }
            acc
        }
        'Y' => ahead.secs_to_switch,
        'R' => {
            let mut acc = ahead.secs_to_switch;
            for k in 1..n {
                let idx = (ahead.current_phase + k) % n;
                acc += phases[idx].duration_secs;
                if is(&phases[idx], link, 'G') {
                    if is(next(idx), link, 'Y') {
                        acc += next(idx).duration_secs;
                    }
                    return acc;
                }
            }
            acc
        }
        _ => 0.0,
    }
}

/// Duration of the first phase that is green for `link`, or 0.
pub fn green_duration(phases: &[SignalPhase], link: usize) -> f64 {
    phases
        .iter()
        .find(|p| is(p, link, 'G'))
        .map_or(0.0, |p| p.duration_secs)
}
