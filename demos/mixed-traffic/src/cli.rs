//! Command-line flags.  Every flag overrides the matching TOML setting.

use std::path::PathBuf;

use clap::Parser;

use crate::settings::OutputFormat;

/// Keep N vehicles with an AV share f on a signalized arterial and report
/// CO2 and stop counts.
#[derive(Parser, Debug, Default)]
#[command(name = "mixed-traffic", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target number of simultaneous vehicles (N)
    #[arg(short = 'n', long)]
    pub vehicles: Option<u32>,

    /// AV penetration in percent (0-100)
    #[arg(short, long)]
    pub penetration: Option<f64>,

    /// Run length in simulated seconds
    #[arg(long)]
    pub horizon: Option<f64>,

    /// Base RNG seed; run i of a batch uses seed + i
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of repeated runs
    #[arg(short, long)]
    pub runs: Option<usize>,

    /// Enable green-wave speed advisories for AVs
    #[arg(long)]
    pub green_wave: bool,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output backend
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}
