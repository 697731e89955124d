//! `mt-greenwave`: speed advisories that let AVs arrive at the next signal
//! on green.
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`timing`]   | `SignalTiming`: time to green (S), to red (R), green (G)  |
//! | [`speed`]    | `SpeedRule`, the advisory speed formula                   |
//! | [`advisor`]  | `GreenWaveAdvisor` control role                           |
//! | [`report`]   | `SpeedAdvisory`, `GreenWaveReport`, summary statistics    |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                               |
//! |-----------|------------------------------------------------------|
//! | `fx-hash` | FxHash for the advised vehicle/edge set.             |
//! | `serde`   | `Serialize` on advisories and the report.            |

pub mod advisor;
pub mod report;
pub mod speed;
pub mod timing;


pub use advisor::{GreenWaveAdvisor, GreenWaveSettings};
pub use report::{AdvisoryStats, EdgeAdvisoryStats, GreenWaveReport, SpeedAdvisory};
pub use speed::SpeedRule;
pub use timing::SignalTiming;
