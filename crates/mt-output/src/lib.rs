//! `mt-output` writes what a monitoring run observed.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                                    |
//! |-----------|---------|------------------------------------------------------------------|
//! | *(none)*  | CSV     | `population_log.csv`, `co2_emission_log.csv`, `stop_count_detailed.csv`, `stop_counts.csv`, `speed_advisories.csv` |
//! | `sqlite`  | SQLite  | `output.db`                                                      |
//! | `parquet` | Parquet | the same five tables as `.parquet` files                         |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`RunOutputObserver`], which implements `mt_monitor::MonitorObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mt_output::{CsvWriter, RunOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = RunOutputObserver::new(writer, config.step_length_secs);
//! let result = coordinator.run(&mut obs);
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::RunOutputObserver;
pub use row::{AdvisoryRow, Co2Row, PopulationRow, StopCountRow, StopEventRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
