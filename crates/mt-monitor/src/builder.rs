//! Fluent builder for constructing a [`MonitorCoordinator`].

use std::collections::{BTreeSet, HashSet};

use mt_core::{EdgeId, GreenWaveConfig, MonitorConfig, MtError, SimRng};
use mt_greenwave::{GreenWaveAdvisor, GreenWaveSettings};
use mt_link::{SimulationLink, TimedLink};
use mt_measure::{EmissionAggregator, EmissionSettings, StopEventAggregator, StopSettings};
use mt_population::{PopulationController, PopulationSettings, RouteSource};
use tracing::{info, warn};

use crate::{MonitorCoordinator, MonitorResult};

/// Fluent builder for [`MonitorCoordinator<L>`].
///
/// # Required inputs
///
/// - [`MonitorConfig`]: target, horizon, thresholds, monitored edges, seed
/// - `L: SimulationLink`: a connected simulator session
///
/// # Optional inputs
///
/// | Method            | Default            |
/// |-------------------|--------------------|
/// | `.green_wave(c)`  | disabled           |
///
/// # Example
///
/// ```rust,ignore
/// let sim = MicroSim::new(network, MicroParams::default());
/// let result = MonitorBuilder::new(config, sim)
///     .green_wave(green)
///     .build()?
///     .run(&mut NoopObserver);
/// ```
pub struct MonitorBuilder<L: SimulationLink> {
    config:     MonitorConfig,
    link:       L,
    green_wave: GreenWaveConfig,
}

impl<L: SimulationLink> MonitorBuilder<L> {
    pub fn new(config: MonitorConfig, link: L) -> Self {
        Self { config, link, green_wave: GreenWaveConfig::default() }
    }

    /// Enable the green-wave advisory with `config` (ignored unless
    /// `config.enabled`).
    pub fn green_wave(mut self, config: GreenWaveConfig) -> Self {
        self.green_wave = config;
        self
    }

    /// Validate the configuration, resolve edge sets against the simulator,
    /// and return a ready-to-run coordinator.
    ///
    /// Fails with `ConfigInvalid` when validation fails or when none of the
    /// configured monitored edges exist in the network.
    pub fn build(self) -> MonitorResult<MonitorCoordinator<L>> {
        self.config.validate()?;
        self.green_wave.validate()?;

        if self.config.generation_window_secs() <= 0.0 {
            warn!(
                horizon_secs = self.config.horizon_secs,
                cutoff_secs = self.config.stop_generation_before_end_secs,
                "generation cutoff covers the whole horizon; no vehicles will be injected"
            );
        }

        let edges = self.link.edge_ids()?;
        let known: HashSet<&EdgeId> = edges.iter().collect();

        // ── Resolve monitored edges ───────────────────────────────────────
        let monitored = resolve(&self.config.monitored_edges, &known, "monitored");
        if monitored.is_empty() {
            return Err(MtError::ConfigInvalid(
                "none of the monitored edges exist in the network".into(),
            )
            .into());
        }

        let target = self.config.population_target()?;

        // ── Optional green wave ───────────────────────────────────────────
        let green_wave = if self.green_wave.enabled {
            let mut settings = GreenWaveSettings::from_config(&self.green_wave, target.av_fraction());
            settings.targets = resolve(&self.green_wave.target_edges, &known, "green-wave target");
            if settings.targets.is_empty() {
                return Err(MtError::ConfigInvalid(
                    "none of the green-wave target edges exist in the network".into(),
                )
                .into());
            }
            Some(GreenWaveAdvisor::new(settings))
        } else {
            None
        };

        // ── Roles ─────────────────────────────────────────────────────────
        let routes = RouteSource::new(
            edges,
            self.config.max_route_attempts,
            SimRng::new(self.config.seed),
        );
        info!(
            monitored = monitored.len(),
            route_edges = routes.candidate_count(),
            green_wave = green_wave.is_some(),
            "monitor ready"
        );

        let population = PopulationController::new(PopulationSettings::from_config(&self.config)?, routes);
        let emission = EmissionAggregator::new(EmissionSettings::from_config(&self.config));
        let stops = StopEventAggregator::new(StopSettings::from_config(&self.config, monitored));

        Ok(MonitorCoordinator {
            clock:        self.config.make_clock(),
            link:         TimedLink::from_millis(self.link, self.config.step_timeout_ms),
            config:       self.config,
            population,
            emission,
            stops,
            green_wave,
            state_misses: 0,
        })
    }
}

/// Keep the configured edges that exist in the network, warning about the
/// rest.
fn resolve(configured: &[EdgeId], known: &HashSet<&EdgeId>, what: &str) -> BTreeSet<EdgeId> {
    let mut out = BTreeSet::new();
    for edge in configured {
        if known.contains(edge) {
            out.insert(edge.clone());
        } else {
            warn!(edge = %edge, "{what} edge not found in network; ignored");
        }
    }
    out
}
