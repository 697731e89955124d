//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! five tables: `population_log`, `co2_emission_log`, `stop_events`,
//! `stop_counts` and `speed_advisories`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{AdvisoryRow, Co2Row, OutputResult, PopulationRow, StopCountRow, StopEventRow};

/// Writes run output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS population_log (
                 step      INTEGER PRIMARY KEY,
                 time      REAL    NOT NULL,
                 live      INTEGER NOT NULL,
                 live_av   INTEGER NOT NULL,
                 target    INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS co2_emission_log (
                 step                 INTEGER PRIMARY KEY,
                 time                 REAL    NOT NULL,
                 gasoline_co2_g       REAL    NOT NULL,
                 av_co2_g             REAL    NOT NULL,
                 total_gasoline_co2_g REAL    NOT NULL,
                 total_av_co2_g       REAL    NOT NULL,
                 gasoline_vehicles    INTEGER NOT NULL,
                 av_vehicles          INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS stop_events (
                 time        REAL    NOT NULL,
                 vehicle_id  TEXT    NOT NULL,
                 edge_id     TEXT    NOT NULL,
                 duration    REAL    NOT NULL,
                 total_count INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS stop_counts (
                 edge_id TEXT    PRIMARY KEY,
                 count   INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS speed_advisories (
                 time           REAL NOT NULL,
                 vehicle_id     TEXT NOT NULL,
                 edge_id        TEXT NOT NULL,
                 signal_id      TEXT NOT NULL,
                 time_to_green  REAL NOT NULL,
                 time_to_red    REAL NOT NULL,
                 lane_length    REAL NOT NULL,
                 green_duration REAL NOT NULL,
                 advised_kmh    REAL NOT NULL,
                 previous_kmh   REAL NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_population(&mut self, row: &PopulationRow) -> OutputResult<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO population_log (step, time, live, live_av, target) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(rusqlite::params![row.step, row.time_secs, row.live, row.live_av, row.target])?;
        Ok(())
    }

    fn write_co2(&mut self, row: &Co2Row) -> OutputResult<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO co2_emission_log \
                 (step, time, gasoline_co2_g, av_co2_g, total_gasoline_co2_g, total_av_co2_g, \
                  gasoline_vehicles, av_vehicles) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?
            .execute(rusqlite::params![
                row.step,
                row.time_secs,
                row.conventional_g,
                row.av_g,
                row.total_conventional_g,
                row.total_av_g,
                row.conventional_vehicles,
                row.av_vehicles,
            ])?;
        Ok(())
    }

    fn write_stop_event(&mut self, row: &StopEventRow) -> OutputResult<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO stop_events (time, vehicle_id, edge_id, duration, total_count) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(rusqlite::params![
                row.time_secs,
                row.vehicle_id,
                row.edge_id,
                row.duration_secs,
                row.total_count,
            ])?;
        Ok(())
    }

    fn write_advisory(&mut self, row: &AdvisoryRow) -> OutputResult<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO speed_advisories \
                 (time, vehicle_id, edge_id, signal_id, time_to_green, time_to_red, \
                  lane_length, green_duration, advised_kmh, previous_kmh) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?
            .execute(rusqlite::params![
                row.time_secs,
                row.vehicle_id,
                row.edge_id,
                row.signal_id,
                row.time_to_green,
                row.time_to_red,
                row.lane_length_m,
                row.green_duration,
                row.advised_kmh,
                row.previous_kmh,
            ])?;
        Ok(())
    }

    fn write_stop_counts(&mut self, rows: &[StopCountRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO stop_counts (edge_id, count) VALUES (?1, ?2)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.edge_id, row.count])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
