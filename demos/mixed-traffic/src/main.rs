//! mixed-traffic: hold N vehicles with an AV share f on a signalized
//! arterial and report conventional-vehicle CO2 and stops per edge.
//!
//! ```text
//! mixed-traffic -n 100 -p 50 --horizon 1000
//! mixed-traffic -c mixed-traffic.toml --runs 5 --green-wave
//! ```

mod cli;
mod network;
mod settings;


use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use mt_core::{GreenWaveConfig, MonitorConfig};
use mt_link::{MicroParams, MicroSim};
use mt_monitor::{BatchSummary, MonitorBuilder, RunResult, batch_seed};
use mt_output::{CsvWriter, OutputWriter, RunOutputObserver};

use cli::Cli;
use network::build_network;
use settings::{DemoSettings, OutputFormat, init_logging};

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = DemoSettings::resolve(&cli)?;
    init_logging(&settings.logging)?;
    settings.fill_edges(&network::edge_ids());

    let m = &settings.monitor;
    println!("=== mixed-traffic monitor ===");
    println!(
        "Vehicles: {}  |  AV: {:.1}%  |  Horizon: {} s  |  Seed: {}  |  Runs: {}",
        m.target_vehicles, m.av_penetration_pct, m.horizon_secs, m.seed, settings.output.runs
    );
    println!(
        "Network: {} segments x {} m, {} monitored edges, green wave {}",
        network::SEGMENTS,
        network::SEGMENT_M,
        m.monitored_edges.len(),
        if settings.green_wave.enabled { "on" } else { "off" },
    );
    println!();

    if settings.output.runs <= 1 {
        let dir = settings.output.dir.clone();
        let result = run_once(&settings, settings.monitor.seed, &dir)?;
        write_json(&dir.join("summary.json"), &result)?;
        print_run(&result, settings.output.top_edges);
        println!("Output written to {}", dir.display());
    } else {
        let summary = run_batch(&settings)?;
        print_batch(&summary);
    }
    Ok(())
}

// ── Runs ──────────────────────────────────────────────────────────────────────

/// One run with `seed`, output into `dir`.
fn run_once(settings: &DemoSettings, seed: u64, dir: &Path) -> Result<RunResult> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut config = settings.monitor.clone();
    config.seed = seed;
    let green = settings.green_wave.clone();

    match settings.output.format {
        OutputFormat::Csv => execute(config, green, CsvWriter::new(dir)?),
        #[cfg(feature = "sqlite")]
        OutputFormat::Sqlite => execute(config, green, mt_output::SqliteWriter::new(dir)?),
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => execute(config, green, mt_output::ParquetWriter::new(dir)?),
        #[allow(unreachable_patterns)]
        other => bail!("output format {other:?} needs the matching Cargo feature"),
    }
}

fn execute<W: OutputWriter>(config: MonitorConfig, green: GreenWaveConfig, writer: W) -> Result<RunResult> {
    let params = MicroParams { step_length_secs: config.step_length_secs, ..MicroParams::default() };
    let sim = MicroSim::new(build_network(), params);

    let step_length = config.step_length_secs;
    let coordinator = MonitorBuilder::new(config, sim).green_wave(green).build()?;
    let mut observer = RunOutputObserver::new(writer, step_length);
    let result = coordinator.run(&mut observer);

    if let Some(e) = observer.take_error() {
        return Err(e).context("failed to write run output");
    }
    Ok(result)
}

/// Repeated runs with seeds `seed, seed + 1, ...`, each in `run_<i>/`.
fn run_batch(settings: &DemoSettings) -> Result<BatchSummary> {
    let mut summary = BatchSummary::new();
    for i in 0..settings.output.runs {
        let seed = batch_seed(settings.monitor.seed, i);
        let dir = run_dir(&settings.output.dir, i);
        let result = run_once(settings, seed, &dir)?;
        if !result.is_complete() {
            warn!(run = i + 1, seed, "run incomplete; excluded from statistics");
        }
        write_json(&dir.join("summary.json"), &result)?;
        summary.push(&result);
        info!(
            run = i + 1,
            seed,
            stops = result.total_stops(),
            co2_g = result.conventional_co2_g(),
            "batch run finished"
        );
    }
    write_json(&settings.output.dir.join("batch_summary.json"), &summary)?;
    Ok(summary)
}

fn run_dir(base: &Path, index: usize) -> PathBuf {
    base.join(format!("run_{:03}", index + 1))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

// ── Printing ──────────────────────────────────────────────────────────────────

fn print_run(result: &RunResult, top_edges: usize) {
    let pop = &result.population;
    match &result.outcome {
        mt_monitor::RunOutcome::Complete => {
            println!("Run complete: {} steps in {:.3} s", result.steps_completed, result.wall_secs)
        }
        mt_monitor::RunOutcome::Incomplete { reason, at_step } => {
            println!("Run INCOMPLETE at step {}: {reason}", at_step.0)
        }
    }
    println!();
    println!("Population");
    println!("  injected            : {} ({} AV, {} conventional)",
        pop.total_injected(), pop.injected.av, pop.injected.conventional);
    if let Some(share) = pop.injected_av_fraction() {
        println!("  injected AV share   : {:.1}%", share * 100.0);
    }
    println!("  mean |live - N|     : {:.2}", pop.mean_abs_count_error);
    println!("  max simultaneous    : {}", pop.max_simultaneous);
    println!("  failed injections   : {}", pop.failed_injections);

    let em = &result.emission;
    println!();
    println!("CO2 (conventional vehicles)");
    println!("  total               : {:.1} g", result.conventional_co2_g());
    println!("  mean rate           : {:.1} mg/s", em.avg_rate_mg_s.conventional);
    if let Some(g_km) = em.conventional_g_per_km() {
        println!("  per distance        : {g_km:.1} g/km");
    }

    let stops = &result.stops;
    println!();
    println!("Stops");
    println!("  total               : {}", stops.total);
    println!("  edges with stops    : {} of {}", stops.edges_with_stops, stops.monitored.len());
    println!("  {:<10} {:>8}", "Edge", "Stops");
    println!("  {}", "-".repeat(19));
    for (edge, count) in stops.ranked().into_iter().take(top_edges) {
        println!("  {:<10} {:>8}", edge.as_str(), count);
    }

    if let Some(gw) = &result.green_wave {
        println!();
        println!("Green wave");
        println!("  advisories          : {}", gw.count());
        if let Some(s) = &gw.stats {
            println!("  mean advised speed  : {:.1} km/h", s.mean_advised_kmh);
            println!("  mean time to green  : {:.1} s", s.mean_time_to_green);
            println!("  mean |speed change| : {:.1} km/h", s.mean_abs_change_kmh);
        }
        println!("  no signal ahead     : {}", gw.no_signal);
    }

    if result.anomalies.total() > 0 {
        println!();
        println!("Vanished between queries: {}", result.anomalies.total());
    }
    println!();
}

fn print_batch(summary: &BatchSummary) {
    println!("{:<5} {:>8} {:>10} {:>12} {:>9}", "Run", "Seed", "Stops", "CO2 (g)", "Status");
    println!("{}", "-".repeat(48));
    for r in &summary.runs {
        println!(
            "{:<5} {:>8} {:>10} {:>12.1} {:>9}",
            r.run,
            r.seed,
            r.total_stops,
            r.conventional_co2_g,
            if r.complete { "ok" } else { "partial" },
        );
    }
    println!();
    println!("{} of {} runs complete", summary.completed(), summary.runs.len());
    for (name, spread) in [("stops", &summary.stops), ("CO2 g", &summary.co2_g)] {
        if let Some(s) = spread {
            let cv = s.cv_pct().map_or_else(|| "-".to_string(), |v| format!("{v:.1}%"));
            println!(
                "  {name:<6} mean {:.1}  sd {:.1}  median {:.1}  range [{:.1}, {:.1}]  cv {cv}",
                s.mean, s.stdev, s.median, s.min, s.max
            );
        }
    }
}
