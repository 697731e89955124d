//! Demo settings: a TOML file with `[monitor]`, `[green_wave]`, `[output]`
//! and `[logging]` sections, then CLI overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use mt_core::{EdgeId, GreenWaveConfig, MonitorConfig};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Output backend.  SQLite and Parquet need the matching Cargo feature.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Sqlite,
    Parquet,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir:       PathBuf,
    pub format:    OutputFormat,
    /// Repeated runs with seeds `seed, seed + 1, ...`.
    pub runs:      usize,
    /// Busiest edges printed in the summary.
    pub top_edges: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir:       PathBuf::from("output/mixed-traffic"),
            format:    OutputFormat::Csv,
            runs:      1,
            top_edges: 5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level:  String,
    /// `text` or `json`.
    pub format: String,
    pub color:  bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".into(), format: "text".into(), color: true }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub monitor:    MonitorConfig,
    pub green_wave: GreenWaveConfig,
    pub output:     OutputSettings,
    pub logging:    LoggingSettings,
}

impl DemoSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Settings from `cli.config` (or defaults) with the flags applied.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply(cli);
        Ok(settings)
    }

    pub fn apply(&mut self, cli: &Cli) {
        if let Some(n) = cli.vehicles {
            self.monitor.target_vehicles = n;
        }
        if let Some(pct) = cli.penetration {
            self.monitor.av_penetration_pct = pct;
        }
        if let Some(h) = cli.horizon {
            self.monitor.horizon_secs = h;
        }
        if let Some(seed) = cli.seed {
            self.monitor.seed = seed;
        }
        if let Some(runs) = cli.runs {
            self.output.runs = runs;
        }
        if cli.green_wave {
            self.green_wave.enabled = true;
        }
        if let Some(dir) = &cli.output {
            self.output.dir = dir.clone();
        }
        if let Some(format) = cli.format {
            self.output.format = format;
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
        if cli.json_logs {
            self.logging.format = "json".into();
        }
    }

    /// Empty edge lists mean "every edge of the network".
    pub fn fill_edges(&mut self, network_edges: &[EdgeId]) {
        if self.monitor.monitored_edges.is_empty() {
            self.monitor.monitored_edges = network_edges.to_vec();
        }
        if self.green_wave.target_edges.is_empty() {
            self.green_wave.target_edges = network_edges.to_vec();
        }
    }
}

/// Initialise `tracing`.  `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingSettings) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    } else {
        subscriber
            .with(fmt::layer().with_ansi(config.color))
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    }
    Ok(())
}
