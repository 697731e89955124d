//! CSV output backend.
//!
//! Creates five files in the configured output directory:
//! - `population_log.csv`
//! - `co2_emission_log.csv`
//! - `stop_count_detailed.csv`
//! - `stop_counts.csv`
//! - `speed_advisories.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AdvisoryRow, Co2Row, OutputResult, PopulationRow, StopCountRow, StopEventRow};

pub const POPULATION_HEADER: [&str; 5] = ["step", "time", "live", "live_av", "target"];
pub const CO2_HEADER: [&str; 8] = [
    "step",
    "time",
    "gasoline_co2_g",
    "av_co2_g",
    "total_gasoline_co2_g",
    "total_av_co2_g",
    "gasoline_vehicles",
    "av_vehicles",
];
pub const STOP_EVENT_HEADER: [&str; 5] = ["time", "vehicle_id", "edge_id", "duration", "total_count"];
pub const STOP_COUNT_HEADER: [&str; 2] = ["edge_id", "count"];
pub const ADVISORY_HEADER: [&str; 10] = [
    "time",
    "vehicle_id",
    "edge_id",
    "signal_id",
    "time_to_green",
    "time_to_red",
    "lane_length",
    "green_duration",
    "advised_kmh",
    "previous_kmh",
];

/// Writes run output to five CSV files.
pub struct CsvWriter {
    population:  Writer<File>,
    co2:         Writer<File>,
    stop_events: Writer<File>,
    stop_counts: Writer<File>,
    advisories:  Writer<File>,
    finished:    bool,
}

impl CsvWriter {
    /// Create the five CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            population:  open(dir, "population_log.csv", &POPULATION_HEADER)?,
            co2:         open(dir, "co2_emission_log.csv", &CO2_HEADER)?,
            stop_events: open(dir, "stop_count_detailed.csv", &STOP_EVENT_HEADER)?,
            stop_counts: open(dir, "stop_counts.csv", &STOP_COUNT_HEADER)?,
            advisories:  open(dir, "speed_advisories.csv", &ADVISORY_HEADER)?,
            finished:    false,
        })
    }
}

fn open(dir: &Path, name: &str, header: &[&str]) -> OutputResult<Writer<File>> {
    let mut w = Writer::from_path(dir.join(name))?;
    w.write_record(header)?;
    Ok(w)
}

impl OutputWriter for CsvWriter {
    fn write_population(&mut self, row: &PopulationRow) -> OutputResult<()> {
        self.population.write_record(&[
            row.step.to_string(),
            row.time_secs.to_string(),
            row.live.to_string(),
            row.live_av.to_string(),
            row.target.to_string(),
        ])?;
        Ok(())
    }

    fn write_co2(&mut self, row: &Co2Row) -> OutputResult<()> {
        self.co2.write_record(&[
            row.step.to_string(),
            row.time_secs.to_string(),
            row.conventional_g.to_string(),
            row.av_g.to_string(),
            row.total_conventional_g.to_string(),
            row.total_av_g.to_string(),
            row.conventional_vehicles.to_string(),
            row.av_vehicles.to_string(),
        ])?;
        Ok(())
    }

    fn write_stop_event(&mut self, row: &StopEventRow) -> OutputResult<()> {
        self.stop_events.write_record(&[
            row.time_secs.to_string(),
            row.vehicle_id.clone(),
            row.edge_id.clone(),
            row.duration_secs.to_string(),
            row.total_count.to_string(),
        ])?;
        Ok(())
    }

    fn write_advisory(&mut self, row: &AdvisoryRow) -> OutputResult<()> {
        self.advisories.write_record(&[
            row.time_secs.to_string(),
            row.vehicle_id.clone(),
            row.edge_id.clone(),
            row.signal_id.clone(),
            row.time_to_green.to_string(),
            row.time_to_red.to_string(),
            row.lane_length_m.to_string(),
            row.green_duration.to_string(),
            row.advised_kmh.to_string(),
            row.previous_kmh.to_string(),
        ])?;
        Ok(())
    }

    fn write_stop_counts(&mut self, rows: &[StopCountRow]) -> OutputResult<()> {
        for row in rows {
            self.stop_counts.write_record(&[row.edge_id.clone(), row.count.to_string()])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.population.flush()?;
        self.co2.flush()?;
        self.stop_events.flush()?;
        self.stop_counts.flush()?;
        self.advisories.flush()?;
        Ok(())
    }
}
