//! Demo road network: a 12-segment two-way arterial.
//!
//! Junctions `j0..j12` are joined by 200 m segments at 50 km/h.  Edge `"k"`
//! runs from `j(k-1)` to `jk`, edge `"-k"` runs back.  Every second interior
//! junction carries a 90 s fixed-time signal, offset so a vehicle at the
//! speed limit meets successive greens.

use mt_core::EdgeId;
use mt_link::{RoadNetwork, RoadNetworkBuilder, SignalPhase, SignalProgram};

pub const SEGMENTS:      usize = 12;
pub const SEGMENT_M:     f64   = 200.0;
pub const SPEED_MPS:     f64   = 50.0 / 3.6;
/// Main-street green, side-street green; a 3 s yellow after each.
const GREEN_SECS:        f64   = 42.0;
const YELLOW_SECS:       f64   = 3.0;

/// Build the arterial.
pub fn build_network() -> RoadNetwork {
    let mut b = RoadNetworkBuilder::new();
    let junctions: Vec<_> = (0..=SEGMENTS).map(|i| b.add_junction(format!("j{i}"))).collect();

    for k in 1..=SEGMENTS {
        b.add_road(
            k.to_string(),
            format!("-{k}"),
            junctions[k - 1],
            junctions[k],
            SEGMENT_M,
            SPEED_MPS,
        );
    }

    // Link 0 is the eastbound approach, link 1 the westbound one.
    let phases = vec![
        SignalPhase::new(GREEN_SECS, "Gr"),
        SignalPhase::new(YELLOW_SECS, "yr"),
        SignalPhase::new(GREEN_SECS, "rG"),
        SignalPhase::new(YELLOW_SECS, "ry"),
    ];
    let travel_secs = SEGMENT_M / SPEED_MPS;
    for (n, j) in (2..SEGMENTS).step_by(2).enumerate() {
        let offset = n as f64 * 2.0 * travel_secs;
        b.add_signal(
            junctions[j],
            SignalProgram::new(format!("tl{j}"), phases.clone()).with_offset(offset),
        );
    }
    b.build()
}

/// Every edge id, eastbound first.
pub fn edge_ids() -> Vec<EdgeId> {
    (1..=SEGMENTS)
        .map(|k| EdgeId::from(k.to_string()))
        .chain((1..=SEGMENTS).map(|k| EdgeId::from(format!("-{k}"))))
        .collect()
}
