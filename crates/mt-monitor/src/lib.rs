//! `mt-monitor`: step loop coordinator for the mixed-traffic monitor.
//!
//! # Step loop
//!
//! ```text
//! for step in 0..horizon_steps:
//!   ① Advance    : one simulator step; a lost simulator ends the run
//!                  as Incomplete { reason, at_step }.
//!   ② Snapshot   : live ids queried once.
//!   ③ Population : inject up to the target count, AV mix by counters;
//!                  then every vehicle's state is read once.
//!   ④ Emission   : CO2 of conventional vehicles, integrated per class.
//!   ⑤ Stops      : dwells on monitored edges, counted once each.
//!   ⑥ GreenWave  : optional speed advisory for AVs on target edges.
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use mt_monitor::{MonitorBuilder, NoopObserver};
//!
//! let result = MonitorBuilder::new(config, link).build()?.run(&mut NoopObserver);
//! println!("{} stops, {:.1} g CO2", result.total_stops(), result.conventional_co2_g());
//! ```

pub mod batch;
pub mod builder;
pub mod coordinator;
pub mod error;
pub mod observer;
pub mod result;
pub mod role;

#[cfg(test)]
mod tests;

pub use batch::{batch_seed, BatchSummary, RunStats, Spread};
pub use builder::MonitorBuilder;
pub use coordinator::MonitorCoordinator;
pub use error::{MonitorError, MonitorResult};
pub use observer::{MonitorObserver, NoopObserver};
pub use result::{AnomalyCounts, RunOutcome, RunResult};
pub use role::MonitorRole;
