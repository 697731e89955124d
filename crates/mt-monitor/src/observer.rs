//! Run observer trait for progress reporting and output.

use mt_core::Step;
use mt_greenwave::SpeedAdvisory;
use mt_measure::{EmissionSample, StopEvent};
use mt_population::PopulationSample;

use crate::RunResult;

/// Callbacks invoked by [`MonitorCoordinator::run`][crate::MonitorCoordinator::run].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: stop printer
///
/// ```rust,ignore
/// struct StopPrinter;
///
/// impl MonitorObserver for StopPrinter {
///     fn on_stop_event(&mut self, event: &StopEvent) {
///         println!("{} stopped on {}", event.vehicle, event.edge);
///     }
/// }
/// ```
pub trait MonitorObserver {
    /// Called at the start of each step, before the simulator advances.
    fn on_step_start(&mut self, _step: Step) {}

    /// Called after every role ran.  `live` is the number of vehicles whose
    /// state was read this step.
    fn on_step_end(&mut self, _step: Step, _live: usize) {}

    fn on_population_sample(&mut self, _sample: &PopulationSample) {}

    /// Called on emission sampling steps only.
    fn on_emission_sample(&mut self, _sample: &EmissionSample) {}

    fn on_stop_event(&mut self, _event: &StopEvent) {}

    fn on_speed_advisory(&mut self, _advisory: &SpeedAdvisory) {}

    /// Called once with the finished result, complete or not.
    fn on_run_end(&mut self, _result: &RunResult) {}
}

/// A [`MonitorObserver`] that does nothing.
pub struct NoopObserver;

impl MonitorObserver for NoopObserver {}
