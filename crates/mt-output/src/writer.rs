//! The `OutputWriter` trait implemented by all backend writers.

use crate::{AdvisoryRow, Co2Row, OutputResult, PopulationRow, StopCountRow, StopEventRow};

/// Trait implemented by the CSV, SQLite and Parquet writers.
///
/// The observer never sees these results directly; it stores the first
/// error for [`RunOutputObserver::take_error`][crate::RunOutputObserver::take_error].
pub trait OutputWriter {
    /// One row per step.
    fn write_population(&mut self, row: &PopulationRow) -> OutputResult<()>;

    /// One row per emission sampling step.
    fn write_co2(&mut self, row: &Co2Row) -> OutputResult<()>;

    fn write_stop_event(&mut self, row: &StopEventRow) -> OutputResult<()>;

    fn write_advisory(&mut self, row: &AdvisoryRow) -> OutputResult<()>;

    /// The end-of-run per-edge totals, written once.
    fn write_stop_counts(&mut self, rows: &[StopCountRow]) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
