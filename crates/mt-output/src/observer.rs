//! `RunOutputObserver<W>` bridges `MonitorObserver` to an `OutputWriter`.

use mt_greenwave::SpeedAdvisory;
use mt_measure::{EmissionSample, StopEvent};
use mt_monitor::{MonitorObserver, RunResult};
use mt_population::PopulationSample;
use tracing::warn;

use crate::row::{AdvisoryRow, Co2Row, PopulationRow, StopCountRow, StopEventRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`MonitorObserver`] that streams samples and events to any
/// [`OutputWriter`] backend and writes the per-edge stop counts at run end.
///
/// Errors from the writer are stored internally because observer methods
/// have no return value.  After `run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct RunOutputObserver<W: OutputWriter> {
    writer:           W,
    step_length_secs: f64,
    rows_written:     u64,
    last_error:       Option<OutputError>,
}

impl<W: OutputWriter> RunOutputObserver<W> {
    /// Create an observer backed by `writer`.  `step_length_secs` converts
    /// sampled CO2 rates into per-step grams.
    pub fn new(writer: W, step_length_secs: f64) -> Self {
        Self {
            writer,
            step_length_secs,
            rows_written: 0,
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after the run returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Rows accepted by the writer so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store(&mut self, result: OutputResult<()>, rows: u64) {
        match result {
            Ok(()) => self.rows_written += rows,
            Err(e) => {
                // Keep only the first error.
                if self.last_error.is_none() {
                    warn!(error = %e, "output write failed; later errors suppressed");
                    self.last_error = Some(e);
                }
            }
        }
    }
}

impl<W: OutputWriter> MonitorObserver for RunOutputObserver<W> {
    fn on_population_sample(&mut self, sample: &PopulationSample) {
        let result = self.writer.write_population(&PopulationRow::from(sample));
        self.store(result, 1);
    }

    fn on_emission_sample(&mut self, sample: &EmissionSample) {
        let row = Co2Row::from_sample(sample, self.step_length_secs);
        let result = self.writer.write_co2(&row);
        self.store(result, 1);
    }

    fn on_stop_event(&mut self, event: &StopEvent) {
        let result = self.writer.write_stop_event(&StopEventRow::from(event));
        self.store(result, 1);
    }

    fn on_speed_advisory(&mut self, advisory: &SpeedAdvisory) {
        let result = self.writer.write_advisory(&AdvisoryRow::from(advisory));
        self.store(result, 1);
    }

    fn on_run_end(&mut self, result: &RunResult) {
        let counts = StopCountRow::from_report(&result.stops);
        let written = self.writer.write_stop_counts(&counts);
        self.store(written, counts.len() as u64);

        let finished = self.writer.finish();
        self.store(finished, 0);
    }
}
