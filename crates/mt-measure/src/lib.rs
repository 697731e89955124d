//! `mt-measure`: read-only measurement roles.
//!
//! Both aggregators consume the per-step [`StepSnapshot`](mt_link::StepSnapshot)
//! built by the coordinator and never mutate the simulation.  Each is
//! finalized exactly once by value, producing an immutable report.
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`emission`] | `EmissionAggregator`, `EmissionSample`, `EmissionReport`      |
//! | [`stops`]    | `StopEventAggregator`, `StopEvent`, `StopReport`              |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                               |
//! |-----------|------------------------------------------------------|
//! | `fx-hash` | FxHash for per-vehicle maps.                         |
//! | `serde`   | `Serialize` on samples, events, and reports.         |

pub mod emission;
pub mod stops;


pub use emission::{EmissionAggregator, EmissionReport, EmissionSample, EmissionSettings};
pub use stops::{StopEvent, StopEventAggregator, StopReport, StopSettings};

#[cfg(not(feature = "fx-hash"))]
pub(crate) type VehicleMap<V> = std::collections::HashMap<mt_core::VehicleId, V>;

#[cfg(feature = "fx-hash")]
pub(crate) type VehicleMap<V> = rustc_hash::FxHashMap<mt_core::VehicleId, V>;
