//! Tests for mt-output.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use mt_core::{EdgeId, PerClass, SignalId, Step, VehicleId};
use mt_greenwave::SpeedAdvisory;
use mt_measure::{EmissionSample, StopEvent, StopReport};
use mt_population::PopulationSample;
use tempfile::TempDir;

use crate::row::{AdvisoryRow, Co2Row, PopulationRow, StopCountRow, StopEventRow};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn population_sample(step: u64, live: u32, live_av: u32) -> PopulationSample {
    PopulationSample { step: Step(step), time_secs: step as f64, live, live_av, target: 10 }
}

fn emission_sample(step: u64) -> EmissionSample {
    EmissionSample {
        step:          Step(step),
        time_secs:     step as f64,
        rate_mg_s:     PerClass::new(0.0, 2000.0),
        cumulative_mg: PerClass::new(0.0, 2000.0 * (step + 1) as f64),
        live:          PerClass::new(3, 2),
    }
}

fn stop_event(vehicle: &str, edge: &str, total: u64) -> StopEvent {
    StopEvent {
        vehicle:                VehicleId::from(vehicle),
        edge:                   EdgeId::from(edge),
        start_step:             Step(4),
        start_time_secs:        4.0,
        time_secs:              5.0,
        duration_at_count_secs: 1.0,
        total_count:            total,
    }
}

fn advisory() -> SpeedAdvisory {
    SpeedAdvisory {
        step:           Step(7),
        time_secs:      7.0,
        vehicle:        VehicleId::from("veh3"),
        edge:           EdgeId::from("2"),
        signal:         SignalId::from("tl2"),
        time_to_green:  10.0,
        time_to_red:    40.0,
        lane_length_m:  150.0,
        green_duration: 25.0,
        advised_kmh:    54.0,
        previous_kmh:   43.2,
    }
}

fn stop_report(counts: &[(&str, u64)]) -> StopReport {
    let counts: BTreeMap<EdgeId, u64> = counts.iter().map(|(e, n)| (EdgeId::from(*e), *n)).collect();
    StopReport {
        total:            counts.values().sum(),
        edges_with_stops: counts.values().filter(|n| **n > 0).count(),
        monitored:        counts.keys().cloned().collect::<BTreeSet<_>>(),
        events:           Vec::new(),
        counts,
    }
}

fn read_csv(dir: &Path, name: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(dir.join(name)).unwrap();
    let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_owned).collect())
        .collect();
    (headers, rows)
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rows {
    use super::*;

    #[test]
    fn co2_row_converts_rate_to_step_grams() {
        let row = Co2Row::from_sample(&emission_sample(2), 0.5);
        assert_eq!(row.conventional_g, 1.0, "2000 mg/s over 0.5 s is 1 g");
        assert_eq!(row.av_g, 0.0);
        assert_eq!(row.total_conventional_g, 6.0);
        assert_eq!(row.conventional_vehicles, 2);
        assert_eq!(row.av_vehicles, 3);
    }

    #[test]
    fn stop_counts_are_ranked_and_keep_zero_edges() {
        let rows = StopCountRow::from_report(&stop_report(&[("1", 2), ("2", 0), ("3", 5), ("4", 2)]));
        let flat: Vec<_> = rows.iter().map(|r| (r.edge_id.as_str(), r.count)).collect();
        assert_eq!(flat, [("3", 5), ("1", 2), ("4", 2), ("2", 0)]);
    }

    #[test]
    fn advisory_row_carries_ids_as_strings() {
        let row = AdvisoryRow::from(&advisory());
        assert_eq!(row.vehicle_id, "veh3");
        assert_eq!(row.edge_id, "2");
        assert_eq!(row.signal_id, "tl2");
        assert_eq!(row.advised_kmh, 54.0);
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;
    use crate::csv::CsvWriter;
    use crate::writer::OutputWriter;

    const FILES: [&str; 5] = [
        "population_log.csv",
        "co2_emission_log.csv",
        "stop_count_detailed.csv",
        "stop_counts.csv",
        "speed_advisories.csv",
    ];

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        for name in FILES {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let (h, rows) = read_csv(dir.path(), "co2_emission_log.csv");
        assert!(rows.is_empty());
        assert_eq!(
            h,
            [
                "step",
                "time",
                "gasoline_co2_g",
                "av_co2_g",
                "total_gasoline_co2_g",
                "total_av_co2_g",
                "gasoline_vehicles",
                "av_vehicles",
            ]
        );
        let (h, _) = read_csv(dir.path(), "stop_count_detailed.csv");
        assert_eq!(h, ["time", "vehicle_id", "edge_id", "duration", "total_count"]);
        let (h, _) = read_csv(dir.path(), "stop_counts.csv");
        assert_eq!(h, ["edge_id", "count"]);
        let (h, _) = read_csv(dir.path(), "population_log.csv");
        assert_eq!(h, ["step", "time", "live", "live_av", "target"]);
    }

    #[test]
    fn csv_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_population(&PopulationRow::from(&population_sample(3, 8, 4))).unwrap();
        w.write_co2(&Co2Row::from_sample(&emission_sample(3), 1.0)).unwrap();
        w.write_stop_event(&StopEventRow::from(&stop_event("veh1", "2", 1))).unwrap();
        w.write_advisory(&AdvisoryRow::from(&advisory())).unwrap();
        w.write_stop_counts(&StopCountRow::from_report(&stop_report(&[("2", 1), ("3", 0)]))).unwrap();
        w.finish().unwrap();

        let (_, rows) = read_csv(dir.path(), "population_log.csv");
        assert_eq!(rows, [["3", "3", "8", "4", "10"]]);

        let (_, rows) = read_csv(dir.path(), "co2_emission_log.csv");
        assert_eq!(rows, [["3", "3", "2", "0", "8", "0", "2", "3"]]);

        let (_, rows) = read_csv(dir.path(), "stop_count_detailed.csv");
        assert_eq!(rows, [["5", "veh1", "2", "1", "1"]]);

        let (_, rows) = read_csv(dir.path(), "stop_counts.csv");
        assert_eq!(rows, [["2", "1"], ["3", "0"]]);

        let (_, rows) = read_csv(dir.path(), "speed_advisories.csv");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][3], "tl2");
        assert_eq!(rows[0][8], "54");
    }

    #[test]
    fn csv_finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use super::*;
    use mt_link::{MicroParams, MicroSim, RoadNetworkBuilder, SignalPhase, SignalProgram};
    use mt_monitor::{MonitorBuilder, MonitorObserver};
    use mt_core::MonitorConfig;

    use crate::csv::CsvWriter;
    use crate::observer::RunOutputObserver;
    use crate::writer::OutputWriter;
    use crate::{OutputError, OutputResult};

    /// Rejects every population row.
    #[derive(Default)]
    struct FailingWriter {
        accepted: u32,
    }

    impl OutputWriter for FailingWriter {
        fn write_population(&mut self, _row: &PopulationRow) -> OutputResult<()> {
            Err(OutputError::Io(std::io::Error::other("disk full")))
        }
        fn write_co2(&mut self, _row: &Co2Row) -> OutputResult<()> {
            self.accepted += 1;
            Ok(())
        }
        fn write_stop_event(&mut self, _row: &StopEventRow) -> OutputResult<()> {
            self.accepted += 1;
            Ok(())
        }
        fn write_advisory(&mut self, _row: &AdvisoryRow) -> OutputResult<()> {
            self.accepted += 1;
            Ok(())
        }
        fn write_stop_counts(&mut self, _rows: &[StopCountRow]) -> OutputResult<()> {
            Ok(())
        }
        fn finish(&mut self) -> OutputResult<()> {
            Ok(())
        }
    }

    #[test]
    fn first_error_is_kept_and_writes_continue() {
        let mut obs = RunOutputObserver::new(FailingWriter::default(), 1.0);
        obs.on_population_sample(&population_sample(0, 1, 0));
        obs.on_population_sample(&population_sample(1, 2, 1));
        obs.on_emission_sample(&emission_sample(1));
        obs.on_stop_event(&stop_event("veh0", "1", 1));

        assert_eq!(obs.rows_written(), 2);
        let err = obs.take_error().expect("population write failed");
        assert!(matches!(err, OutputError::Io(_)));
        assert!(obs.take_error().is_none(), "error is taken once");
        assert_eq!(obs.into_writer().accepted, 2);
    }

    #[test]
    fn full_run_writes_every_table() {
        let mut b = RoadNetworkBuilder::new();
        let j: Vec<_> = (0..4).map(|i| b.add_junction(format!("j{i}"))).collect();
        for i in 0..3 {
            b.add_road(format!("{}", i + 1), format!("-{}", i + 1), j[i], j[i + 1], 120.0, 12.0);
        }
        b.add_signal(
            j[1],
            SignalProgram::new(
                "tl1",
                vec![
                    SignalPhase::new(20.0, "Gr"),
                    SignalPhase::new(3.0, "yr"),
                    SignalPhase::new(20.0, "rG"),
                    SignalPhase::new(3.0, "ry"),
                ],
            ),
        );
        let sim = MicroSim::new(b.build(), MicroParams::default());

        let config = MonitorConfig {
            target_vehicles: 6,
            av_penetration_pct: 50.0,
            horizon_secs: 60.0,
            stop_generation_before_end_secs: 10.0,
            monitored_edges: ["1", "2", "3", "-1", "-2", "-3"].iter().map(|e| EdgeId::from(*e)).collect(),
            ..MonitorConfig::default()
        };

        let dir = tmp();
        let mut obs = RunOutputObserver::new(CsvWriter::new(dir.path()).unwrap(), config.step_length_secs);
        let result = MonitorBuilder::new(config, sim).build().unwrap().run(&mut obs);
        assert!(obs.take_error().is_none(), "no write errors expected");
        assert!(result.is_complete());
        assert!(result.population.total_injected() > 0);

        let (_, rows) = read_csv(dir.path(), "population_log.csv");
        assert_eq!(rows.len(), 60);
        let (_, rows) = read_csv(dir.path(), "co2_emission_log.csv");
        assert_eq!(rows.len(), result.emission.samples.len());
        let (_, rows) = read_csv(dir.path(), "stop_count_detailed.csv");
        assert_eq!(rows.len() as u64, result.total_stops());
        let (_, rows) = read_csv(dir.path(), "stop_counts.csv");
        assert_eq!(rows.len(), 6, "one row per monitored edge");
    }
}

// ── SQLite ────────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use super::*;
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    #[test]
    fn sqlite_db_created() {
        let dir = tmp();
        let _w = SqliteWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("output.db").exists());
    }

    #[test]
    fn sqlite_population_and_counts() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        for step in 0..3 {
            w.write_population(&PopulationRow::from(&population_sample(step, 5, 2))).unwrap();
        }
        w.write_stop_counts(&StopCountRow::from_report(&stop_report(&[("1", 4), ("2", 0)]))).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM population_log", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 3);
        let stops: i64 = conn
            .query_row("SELECT count FROM stop_counts WHERE edge_id = '1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stops, 4);
    }

    #[test]
    fn sqlite_co2_grams() {
        let dir = tmp();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        w.write_co2(&Co2Row::from_sample(&emission_sample(0), 1.0)).unwrap();
        w.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let (g, total): (f64, f64) = conn
            .query_row(
                "SELECT gasoline_co2_g, total_gasoline_co2_g FROM co2_emission_log WHERE step = 0",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(g, 2.0);
        assert_eq!(total, 2.0);
    }
}

// ── Parquet ───────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "parquet"))]
mod parquet_tests {
    use super::*;
    use arrow::datatypes::DataType;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use crate::parquet::ParquetWriter;
    use crate::writer::OutputWriter;

    #[test]
    fn parquet_files_created() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        assert!(dir.path().join("population_log.parquet").exists());
        assert!(dir.path().join("co2_emission_log.parquet").exists());
        assert!(dir.path().join("stop_counts.parquet").exists());
    }

    #[test]
    fn parquet_buffered_rows_flushed_on_finish() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        for step in 0..10 {
            w.write_co2(&Co2Row::from_sample(&emission_sample(step), 1.0)).unwrap();
        }
        w.finish().unwrap();

        let file = std::fs::File::open(dir.path().join("co2_emission_log.parquet")).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        let schema = builder.schema().clone();
        let total_rows: usize = builder.build().unwrap().map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total_rows, 10);
        assert_eq!(*schema.field_with_name("gasoline_co2_g").unwrap().data_type(), DataType::Float64);
    }

    #[test]
    fn parquet_string_columns() {
        let dir = tmp();
        let mut w = ParquetWriter::new(dir.path()).unwrap();
        w.write_stop_event(&StopEventRow::from(&stop_event("veh9", "3", 1))).unwrap();
        w.finish().unwrap();

        let file = std::fs::File::open(dir.path().join("stop_count_detailed.parquet")).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        let schema = builder.schema().clone();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, ["time", "vehicle_id", "edge_id", "duration", "total_count"]);
        assert_eq!(*schema.field_with_name("vehicle_id").unwrap().data_type(), DataType::Utf8);
    }
}
