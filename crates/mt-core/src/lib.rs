//! `mt-core`: foundational types for the mixed-traffic monitoring workspace.
//!
//! This crate is a dependency of every other `mt-*` crate.  It intentionally
//! has no `mt-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `VehicleId`, `EdgeId`, `SignalId`                     |
//! | [`time`]        | `Step`, `SimClock`                                    |
//! | [`vehicle`]     | `VehicleClass` (AV / conventional) and its policies   |
//! | [`config`]      | `MonitorConfig`, `PopulationTarget`, `GreenWaveConfig`|
//! | [`rng`]         | `SimRng` (seeded, run-level)                          |
//! | [`error`]       | `MtError`, `MtResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required for TOML config loading and JSON summaries.       |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{GreenWaveConfig, MonitorConfig, PopulationTarget};
pub use error::{MtError, MtResult};
pub use ids::{EdgeId, SignalId, VehicleId};
pub use rng::SimRng;
pub use time::{SimClock, Step};
pub use vehicle::{PerClass, VehicleClass};
