//! `mt-population`: keeps the live vehicle count and the AV mix at target.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`controller`] | `PopulationController`, `PopulationSettings`, `StepInjection` |
//! | [`mix`]        | `MixPolicy`, `MixCounters` (greedy deterministic mix)     |
//! | [`routes`]     | `RouteSource` (random routable origin/destination pairs)  |
//! | [`report`]     | `PopulationReport`, `PopulationSample`, `InjectionRecord` |
//!
//! # Control rules
//!
//! 1. Count: with `live < N`, inject `min(N - live, max_inject_per_step)`.
//!    Never remove vehicles.
//! 2. Mix: each injected vehicle's class comes from [`MixPolicy`].
//! 3. Cutoff: no injection once the remaining horizon is at or below the
//!    configured window.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                               |
//! |-----------|------------------------------------------------------|
//! | `fx-hash` | FxHash for the distinct-vehicle set.                 |
//! | `serde`   | `Serialize` on the report types.                     |

pub mod controller;
pub mod mix;
pub mod report;
pub mod routes;


pub use controller::{PopulationController, PopulationSettings, StepInjection, FIRST_VEHICLE_NUMBER};
pub use mix::{MixCounters, MixPolicy};
pub use report::{InjectionRecord, PopulationReport, PopulationSample};
pub use routes::RouteSource;
