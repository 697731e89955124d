//! Parquet output backend (feature `parquet`).
//!
//! Creates five files in the configured output directory, one per table:
//! `population_log`, `co2_emission_log`, `stop_count_detailed`,
//! `stop_counts` and `speed_advisories`, each with a `.parquet` suffix.
//!
//! Rows are buffered and written as one record batch per
//! [`BATCH_ROWS`] rows, so a step-by-step run does not produce one row
//! group per step.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, StringBuilder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{AdvisoryRow, Co2Row, OutputResult, PopulationRow, StopCountRow, StopEventRow};

/// Buffered rows per record batch.
pub const BATCH_ROWS: usize = 4096;

// ── Schemas and batches ───────────────────────────────────────────────────────

/// A row type with a fixed Arrow schema.
trait ArrowRow: Clone {
    fn schema() -> Arc<Schema>;
    fn batch(schema: &Arc<Schema>, rows: &[Self]) -> Result<RecordBatch, ArrowError>;
}

impl ArrowRow for PopulationRow {
    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("step",    DataType::UInt64,  false),
            Field::new("time",    DataType::Float64, false),
            Field::new("live",    DataType::UInt32,  false),
            Field::new("live_av", DataType::UInt32,  false),
            Field::new("target",  DataType::UInt32,  false),
        ]))
    }

    fn batch(schema: &Arc<Schema>, rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let mut steps   = UInt64Builder::new();
        let mut times   = Float64Builder::new();
        let mut live    = UInt32Builder::new();
        let mut live_av = UInt32Builder::new();
        let mut target  = UInt32Builder::new();
        for row in rows {
            steps.append_value(row.step);
            times.append_value(row.time_secs);
            live.append_value(row.live);
            live_av.append_value(row.live_av);
            target.append_value(row.target);
        }
        let columns: Vec<ArrayRef> = vec![
            Arc::new(steps.finish()),
            Arc::new(times.finish()),
            Arc::new(live.finish()),
            Arc::new(live_av.finish()),
            Arc::new(target.finish()),
        ];
        RecordBatch::try_new(Arc::clone(schema), columns)
    }
}

impl ArrowRow for Co2Row {
    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("step",                 DataType::UInt64,  false),
            Field::new("time",                 DataType::Float64, false),
            Field::new("gasoline_co2_g",       DataType::Float64, false),
            Field::new("av_co2_g",             DataType::Float64, false),
            Field::new("total_gasoline_co2_g", DataType::Float64, false),
            Field::new("total_av_co2_g",       DataType::Float64, false),
            Field::new("gasoline_vehicles",    DataType::UInt32,  false),
            Field::new("av_vehicles",          DataType::UInt32,  false),
        ]))
    }

    fn batch(schema: &Arc<Schema>, rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let mut steps     = UInt64Builder::new();
        let mut times     = Float64Builder::new();
        let mut conv_g    = Float64Builder::new();
        let mut av_g      = Float64Builder::new();
        let mut conv_tot  = Float64Builder::new();
        let mut av_tot    = Float64Builder::new();
        let mut conv_live = UInt32Builder::new();
        let mut av_live   = UInt32Builder::new();
        for row in rows {
            steps.append_value(row.step);
            times.append_value(row.time_secs);
            conv_g.append_value(row.conventional_g);
            av_g.append_value(row.av_g);
            conv_tot.append_value(row.total_conventional_g);
            av_tot.append_value(row.total_av_g);
            conv_live.append_value(row.conventional_vehicles);
            av_live.append_value(row.av_vehicles);
        }
        let columns: Vec<ArrayRef> = vec![
            Arc::new(steps.finish()),
            Arc::new(times.finish()),
            Arc::new(conv_g.finish()),
            Arc::new(av_g.finish()),
            Arc::new(conv_tot.finish()),
            Arc::new(av_tot.finish()),
            Arc::new(conv_live.finish()),
            Arc::new(av_live.finish()),
        ];
        RecordBatch::try_new(Arc::clone(schema), columns)
    }
}

impl ArrowRow for StopEventRow {
    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("time",        DataType::Float64, false),
            Field::new("vehicle_id",  DataType::Utf8,    false),
            Field::new("edge_id",     DataType::Utf8,    false),
            Field::new("duration",    DataType::Float64, false),
            Field::new("total_count", DataType::UInt64,  false),
        ]))
    }

    fn batch(schema: &Arc<Schema>, rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let mut times     = Float64Builder::new();
        let mut vehicles  = StringBuilder::new();
        let mut edges     = StringBuilder::new();
        let mut durations = Float64Builder::new();
        let mut totals    = UInt64Builder::new();
        for row in rows {
            times.append_value(row.time_secs);
            vehicles.append_value(&row.vehicle_id);
            edges.append_value(&row.edge_id);
            durations.append_value(row.duration_secs);
            totals.append_value(row.total_count);
        }
        let columns: Vec<ArrayRef> = vec![
            Arc::new(times.finish()),
            Arc::new(vehicles.finish()),
            Arc::new(edges.finish()),
            Arc::new(durations.finish()),
            Arc::new(totals.finish()),
        ];
        RecordBatch::try_new(Arc::clone(schema), columns)
    }
}

impl ArrowRow for StopCountRow {
    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("edge_id", DataType::Utf8,   false),
            Field::new("count",   DataType::UInt64, false),
        ]))
    }

    fn batch(schema: &Arc<Schema>, rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let mut edges  = StringBuilder::new();
        let mut counts = UInt64Builder::new();
        for row in rows {
            edges.append_value(&row.edge_id);
            counts.append_value(row.count);
        }
        let columns: Vec<ArrayRef> = vec![Arc::new(edges.finish()), Arc::new(counts.finish())];
        RecordBatch::try_new(Arc::clone(schema), columns)
    }
}

impl ArrowRow for AdvisoryRow {
    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("time",           DataType::Float64, false),
            Field::new("vehicle_id",     DataType::Utf8,    false),
            Field::new("edge_id",        DataType::Utf8,    false),
            Field::new("signal_id",      DataType::Utf8,    false),
            Field::new("time_to_green",  DataType::Float64, false),
            Field::new("time_to_red",    DataType::Float64, false),
            Field::new("lane_length",    DataType::Float64, false),
            Field::new("green_duration", DataType::Float64, false),
            Field::new("advised_kmh",    DataType::Float64, false),
            Field::new("previous_kmh",   DataType::Float64, false),
        ]))
    }

    fn batch(schema: &Arc<Schema>, rows: &[Self]) -> Result<RecordBatch, ArrowError> {
        let mut times    = Float64Builder::new();
        let mut vehicles = StringBuilder::new();
        let mut edges    = StringBuilder::new();
        let mut signals  = StringBuilder::new();
        let mut to_green = Float64Builder::new();
        let mut to_red   = Float64Builder::new();
        let mut lengths  = Float64Builder::new();
        let mut greens   = Float64Builder::new();
        let mut advised  = Float64Builder::new();
        let mut previous = Float64Builder::new();
        for row in rows {
            times.append_value(row.time_secs);
            vehicles.append_value(&row.vehicle_id);
            edges.append_value(&row.edge_id);
            signals.append_value(&row.signal_id);
            to_green.append_value(row.time_to_green);
            to_red.append_value(row.time_to_red);
            lengths.append_value(row.lane_length_m);
            greens.append_value(row.green_duration);
            advised.append_value(row.advised_kmh);
            previous.append_value(row.previous_kmh);
        }
        let columns: Vec<ArrayRef> = vec![
            Arc::new(times.finish()),
            Arc::new(vehicles.finish()),
            Arc::new(edges.finish()),
            Arc::new(signals.finish()),
            Arc::new(to_green.finish()),
            Arc::new(to_red.finish()),
            Arc::new(lengths.finish()),
            Arc::new(greens.finish()),
            Arc::new(advised.finish()),
            Arc::new(previous.finish()),
        ];
        RecordBatch::try_new(Arc::clone(schema), columns)
    }
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// One Parquet file plus its pending rows.
struct Table<R: ArrowRow> {
    writer:  Option<ArrowWriter<File>>,
    schema:  Arc<Schema>,
    pending: Vec<R>,
}

impl<R: ArrowRow> Table<R> {
    fn create(dir: &Path, name: &str) -> OutputResult<Self> {
        let schema = R::schema();
        let file = File::create(dir.join(name))?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))?;
        Ok(Self { writer: Some(writer), schema, pending: Vec::new() })
    }

    fn push(&mut self, row: R) -> OutputResult<()> {
        self.pending.push(row);
        if self.pending.len() >= BATCH_ROWS {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.writer.as_mut() else {
            self.pending.clear();
            return Ok(());
        };
        let batch = R::batch(&self.schema, &self.pending)?;
        self.pending.clear();
        writer.write(&batch)?;
        Ok(())
    }

    fn close(&mut self) -> OutputResult<()> {
        self.flush()?;
        if let Some(w) = self.writer.take() {
            w.close()?;
        }
        Ok(())
    }
}

// ── Writer ────────────────────────────────────────────────────────────────────

/// Writes run output to five Parquet files.
///
/// `finish()` **must** be called to flush buffered rows and write the
/// Parquet footers; files written without calling `finish()` cannot be
/// opened by Parquet readers.
pub struct ParquetWriter {
    population:  Table<PopulationRow>,
    co2:         Table<Co2Row>,
    stop_events: Table<StopEventRow>,
    stop_counts: Table<StopCountRow>,
    advisories:  Table<AdvisoryRow>,
}

impl ParquetWriter {
    /// Create the five Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            population:  Table::create(dir, "population_log.parquet")?,
            co2:         Table::create(dir, "co2_emission_log.parquet")?,
            stop_events: Table::create(dir, "stop_count_detailed.parquet")?,
            stop_counts: Table::create(dir, "stop_counts.parquet")?,
            advisories:  Table::create(dir, "speed_advisories.parquet")?,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_population(&mut self, row: &PopulationRow) -> OutputResult<()> {
        self.population.push(*row)
    }

    fn write_co2(&mut self, row: &Co2Row) -> OutputResult<()> {
        self.co2.push(*row)
    }

    fn write_stop_event(&mut self, row: &StopEventRow) -> OutputResult<()> {
        self.stop_events.push(row.clone())
    }

    fn write_advisory(&mut self, row: &AdvisoryRow) -> OutputResult<()> {
        self.advisories.push(row.clone())
    }

    fn write_stop_counts(&mut self, rows: &[StopCountRow]) -> OutputResult<()> {
        for row in rows {
            self.stop_counts.push(row.clone())?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.population.close()?;
        self.co2.close()?;
        self.stop_events.close()?;
        self.stop_counts.close()?;
        self.advisories.close()?;
        Ok(())
    }
}
