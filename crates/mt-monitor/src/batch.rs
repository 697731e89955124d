//! Summary statistics over repeated runs with the same parameters.

use crate::RunResult;

/// Mean, sample standard deviation, and range of one metric.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Spread {
    pub mean:   f64,
    /// Sample standard deviation; 0 for a single value.
    pub stdev:  f64,
    pub min:    f64,
    pub max:    f64,
    pub median: f64,
}

impl Spread {
    /// `None` for an empty slice.
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let stdev = if values.len() > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            mean,
            stdev,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median,
        })
    }

    /// Coefficient of variation in percent, `None` when the mean is zero.
    pub fn cv_pct(&self) -> Option<f64> {
        (self.mean != 0.0).then(|| self.stdev / self.mean * 100.0)
    }
}

/// Headline numbers of one run in a batch.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RunStats {
    pub run:                usize,
    pub seed:               u64,
    pub complete:           bool,
    pub total_stops:        u64,
    pub conventional_co2_g: f64,
    pub wall_secs:          f64,
}

impl RunStats {
    pub fn from_result(run: usize, result: &RunResult) -> Self {
        Self {
            run,
            seed:               result.config.seed,
            complete:           result.is_complete(),
            total_stops:        result.total_stops(),
            conventional_co2_g: result.conventional_co2_g(),
            wall_secs:          result.wall_secs,
        }
    }
}

/// Statistics across a batch of runs.
///
/// Incomplete runs are listed in `runs` but excluded from the spreads.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BatchSummary {
    pub runs:       Vec<RunStats>,
    pub stops:      Option<Spread>,
    pub co2_g:      Option<Spread>,
    pub wall_secs:  Option<Spread>,
    pub incomplete: usize,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished run and refresh the spreads.
    pub fn push(&mut self, result: &RunResult) {
        let stats = RunStats::from_result(self.runs.len() + 1, result);
        if !stats.complete {
            self.incomplete += 1;
        }
        self.runs.push(stats);
        self.refresh();
    }

    pub fn completed(&self) -> usize {
        self.runs.len() - self.incomplete
    }

    fn refresh(&mut self) {
        let done: Vec<&RunStats> = self.runs.iter().filter(|r| r.complete).collect();
        let col = |f: fn(&RunStats) -> f64| done.iter().map(|r| f(r)).collect::<Vec<_>>();
        self.stops = Spread::of(&col(|r| r.total_stops as f64));
        self.co2_g = Spread::of(&col(|r| r.conventional_co2_g));
        self.wall_secs = Spread::of(&col(|r| r.wall_secs));
    }
}

/// Seed for run `index` (0-based) of a batch started from `base`.
pub fn batch_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}
