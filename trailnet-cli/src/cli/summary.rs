//! Summary rows and their Parquet and tab-separated renderings.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow_array::{ArrayRef, BooleanArray, Float64Array, RecordBatch, StringArray, UInt64Array};
use arrow_schema::{ArrowError, DataType, Field, Schema, SchemaRef};
use parquet::{arrow::ArrowWriter, errors::ParquetError};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, instrument};

/// File name used when no explicit summary path is given.
pub const DEFAULT_SUMMARY_FILE: &str = "summary.parquet";

const HEADER: [&str; 9] = [
    "experiment",
    "proximity_level",
    "start_x",
    "start_y",
    "seed",
    "cost",
    "mean_travel_time",
    "vulnerability",
    "connected",
];

/// One analysed (experiment, proximity level) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    /// File name of the experiment bundle.
    pub experiment: String,
    /// Proximity level of the analysed skeleton.
    pub proximity_level: usize,
    /// Simulation start position.
    pub start_x: f64,
    /// Simulation start position.
    pub start_y: f64,
    /// Simulation seed.
    pub seed: u64,
    /// Total edge length of the skeleton.
    pub cost: f64,
    /// Mean shortest-path length between ordered station pairs.
    pub mean_travel_time: f64,
    /// Mean increase in travel time over single-edge removals.
    pub vulnerability: f64,
    /// Whether the skeleton connects every station.
    pub connected: bool,
}

/// Failure to persist the summary table.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// The record batch could not be assembled.
    #[error("failed to assemble summary batch: {0}")]
    Arrow(#[from] ArrowError),
    /// The Parquet encoder failed.
    #[error("failed to encode summary `{}`: {source}", path.display())]
    Parquet {
        /// Destination of the summary.
        path: PathBuf,
        /// Encoder failure.
        #[source]
        source: ParquetError,
    },
    /// The staging file could not be created or renamed into place.
    #[error("failed to write summary `{}`: {source}", path.display())]
    Io {
        /// Destination of the summary.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}

/// Returns the Arrow schema of the summary table.
#[must_use]
pub fn summary_schema() -> SchemaRef {
    let [experiment, level, start_x, start_y, seed, cost, mtt, vulnerability, connected] = HEADER;
    Arc::new(Schema::new(vec![
        Field::new(experiment, DataType::Utf8, false),
        Field::new(level, DataType::UInt64, false),
        Field::new(start_x, DataType::Float64, false),
        Field::new(start_y, DataType::Float64, false),
        Field::new(seed, DataType::UInt64, false),
        Field::new(cost, DataType::Float64, false),
        Field::new(mtt, DataType::Float64, false),
        Field::new(vulnerability, DataType::Float64, false),
        Field::new(connected, DataType::Boolean, false),
    ]))
}

/// Converts `rows` into a record batch matching [`summary_schema`].
///
/// # Errors
/// Returns [`ArrowError`] if the columns disagree with the schema.
pub fn to_record_batch(rows: &[SummaryRow]) -> Result<RecordBatch, ArrowError> {
    let floats = |field: fn(&SummaryRow) -> f64| -> ArrayRef {
        Arc::new(rows.iter().map(field).collect::<Float64Array>())
    };
    let columns: Vec<ArrayRef> = vec![
        Arc::new(
            rows.iter()
                .map(|row| Some(row.experiment.as_str()))
                .collect::<StringArray>(),
        ),
        Arc::new(
            rows.iter()
                .map(|row| row.proximity_level as u64)
                .collect::<UInt64Array>(),
        ),
        floats(|row| row.start_x),
        floats(|row| row.start_y),
        Arc::new(rows.iter().map(|row| row.seed).collect::<UInt64Array>()),
        floats(|row| row.cost),
        floats(|row| row.mean_travel_time),
        floats(|row| row.vulnerability),
        Arc::new(
            rows.iter()
                .map(|row| Some(row.connected))
                .collect::<BooleanArray>(),
        ),
    ];
    RecordBatch::try_new(summary_schema(), columns)
}

/// Writes `rows` to `path` as Parquet through a staged sibling file, so
/// readers never observe a partial table.
///
/// # Errors
/// Returns [`SummaryError`] when encoding or publishing fails.
#[instrument(
    name = "cli.write_summary",
    err,
    skip(path, rows),
    fields(path = %path.display(), rows = rows.len()),
)]
pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<(), SummaryError> {
    let io_error = |source: io::Error| SummaryError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parquet_error = |source: ParquetError| SummaryError::Parquet {
        path: path.to_path_buf(),
        source,
    };

    let batch = to_record_batch(rows)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = NamedTempFile::new_in(parent).map_err(io_error)?;
    let mut writer =
        ArrowWriter::try_new(staged.reopen().map_err(io_error)?, batch.schema(), None)
            .map_err(parquet_error)?;
    writer.write(&batch).map_err(parquet_error)?;
    writer.close().map_err(parquet_error)?;
    staged.as_file().sync_all().map_err(io_error)?;
    staged.persist(path).map_err(|err| io_error(err.error))?;
    info!("summary written");
    Ok(())
}

/// Renders `rows` as a tab-separated table with a header line.
///
/// # Errors
/// Returns [`io::Error`] if writing to `writer` fails.
pub fn render_rows(rows: &[SummaryRow], mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "{}", HEADER.join("\t"))?;
    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{}",
            row.experiment,
            row.proximity_level,
            row.start_x,
            row.start_y,
            row.seed,
            row.cost,
            row.mean_travel_time,
            row.vulnerability,
            row.connected,
        )?;
    }
    Ok(())
}
