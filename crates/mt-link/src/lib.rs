//! `mt-link`: the boundary between the monitoring loop and a running
//! traffic simulation.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`link`]     | `LinkQuery`, `SimulationLink`, `VehicleState`, `SignalAhead` |
//! | [`snapshot`] | `StepSnapshot`, `VehicleReading`                            |
//! | [`timed`]    | `TimedLink<L>` step-duration bound                          |
//! | [`network`]  | `RoadNetwork` (CSR), `RoadNetworkBuilder`                   |
//! | [`router`]   | `Router` trait, `Route`, `DijkstraRouter`                   |
//! | [`signal`]   | `SignalProgram`, `SignalPhase`, `LightState`                |
//! | [`micro`]    | `MicroSim`, an in-process simulator implementing the link   |
//! | [`error`]    | `LinkError`, `LinkResult<T>`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod link;
pub mod micro;
pub mod network;
pub mod router;
pub mod signal;
pub mod snapshot;
pub mod timed;

#[cfg(test)]
mod tests;

pub use error::{LinkError, LinkResult};
pub use link::{LinkQuery, SignalAhead, SimulationLink, VehicleState};
pub use micro::{MicroParams, MicroSim};
pub use network::{EdgeControl, EdgeIdx, JunctionIdx, RoadNetwork, RoadNetworkBuilder};
pub use router::{DijkstraRouter, Route, Router};
pub use signal::{LightState, SignalPhase, SignalProgram};
pub use snapshot::{StepSnapshot, VehicleReading};
pub use timed::TimedLink;
