//! Forward conversion: JSON Lines in, one Parquet table out.
//!
//! Two strategies bridge unbounded input to the columnar writer:
//!
//! - [`Strategy::Buffered`] decodes every row into memory, infers the schema
//!   from all of them and writes in batches.
//! - [`Strategy::Sampled`] infers the schema from the first `sample_size` rows
//!   while spilling *every* row to a [`SpillStore`], then replays the spill
//!   file through the normalizer and writer. Peak memory is one sample window
//!   plus one write batch. Rows after the window are written against the
//!   sample's schema: unseen fields are dropped and conflicting values are
//!   coerced to text or rejected by the writer.
//!
//! In both strategies decoding completes before the writer is opened, so a
//! malformed document never leaves a partial table behind. Empty input is a
//! successful conversion that writes nothing.

use crate::config::{ConvertConfig, Strategy};
use crate::error::Result;
use crate::io::jsonl::RowDecoder;
use crate::io::parquet::ColumnarWriter;
use crate::io::spill::SpillStore;
use crate::normalize::normalize;
use crate::schema::{TableSchema, build_schema};
use crate::stats::StatisticsCollector;
use crate::value::Row;
use indexmap::IndexSet;
use serde::Serialize;
use std::io::{Read, Write};
use std::sync::Arc;

/// Outcome of one [`convert`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConvertReport {
    /// Rows decoded from the input.
    pub rows_read: usize,
    /// Rows written to the table.
    pub rows_written: usize,
    /// Record batches handed to the writer.
    pub batches_written: usize,
    /// The schema the table was written with; `None` when nothing was written.
    pub schema: Option<TableSchema>,
}

impl ConvertReport {
    /// `true` if the input held no rows and the sink was left untouched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schema.is_none()
    }
}

/// Convert JSON Lines from `input` into a Parquet table written to `sink`.
///
/// # Errors
/// - [`ConvertError::Decoding`](crate::ConvertError::Decoding) for a malformed or non-object document
/// - [`ConvertError::SpillStorage`](crate::ConvertError::SpillStorage) if the sampled strategy cannot use its spill file
/// - [`ConvertError::Write`](crate::ConvertError::Write) if the writer rejects a row or fails to finalize
pub fn convert<R, W>(input: R, sink: W, config: &ConvertConfig) -> Result<ConvertReport>
where
    R: Read,
    W: Write + Send,
{
    let report = match config.strategy {
        Strategy::Buffered => convert_buffered(input, sink, config)?,
        Strategy::Sampled => convert_sampled(input, sink, config)?,
    };
    tracing::info!(
        strategy = ?config.strategy,
        rows_read = report.rows_read,
        rows_written = report.rows_written,
        batches = report.batches_written,
        columns = report.schema.as_ref().map_or(0, TableSchema::len),
        "conversion finished"
    );
    Ok(report)
}

/// Infer the schema `convert` would use, without writing anything.
///
/// Observes all rows for [`Strategy::Buffered`] and the first `sample_size`
/// rows for [`Strategy::Sampled`]. Only the observed rows are decoded.
///
/// # Errors
/// Returns [`ConvertError::Decoding`](crate::ConvertError::Decoding) for a malformed document within the
/// observed rows.
pub fn infer_schema<R: Read>(input: R, config: &ConvertConfig) -> Result<Option<TableSchema>> {
    let limit = match config.strategy {
        Strategy::Buffered => usize::MAX,
        Strategy::Sampled => config.sample_size.max(1),
    };
    let mut stats = StatisticsCollector::new();
    for row in RowDecoder::new(input).take(limit) {
        stats.observe(&row?);
    }
    schema_or_empty(&stats)
}

/// Build the schema, mapping "nothing to infer from" to `None`.
fn schema_or_empty(stats: &StatisticsCollector) -> Result<Option<TableSchema>> {
    match build_schema(stats) {
        Ok(schema) => Ok(Some(schema)),
        Err(e) if e.is_empty_input() => {
            tracing::debug!(rows = stats.rows_observed(), "no fields to infer a schema from");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn convert_buffered<R: Read, W: Write + Send>(
    input: R,
    sink: W,
    config: &ConvertConfig,
) -> Result<ConvertReport> {
    let rows = RowDecoder::new(input).collect::<Result<Vec<Row>>>()?;
    let mut stats = StatisticsCollector::new();
    for row in &rows {
        stats.observe(row);
    }
    let Some(schema) = schema_or_empty(&stats)? else {
        return Ok(ConvertReport {
            rows_read: rows.len(),
            ..ConvertReport::default()
        });
    };
    let rows_read = rows.len();
    write_rows(rows.into_iter().map(Ok), sink, schema, config, rows_read, None)
}

fn convert_sampled<R: Read, W: Write + Send>(
    input: R,
    sink: W,
    config: &ConvertConfig,
) -> Result<ConvertReport> {
    let sample_size = config.sample_size.max(1);
    let mut spill = SpillStore::create(config.spill_dir.as_deref())?;
    let mut stats = StatisticsCollector::new();
    for row in RowDecoder::new(input) {
        let row = row?;
        if spill.rows() < sample_size {
            stats.observe(&row);
        }
        spill.append(&row)?;
    }
    let rows_read = spill.rows();
    tracing::debug!(
        rows = rows_read,
        sampled = stats.rows_observed(),
        "input spilled"
    );

    let Some(schema) = schema_or_empty(&stats)? else {
        spill.close();
        return Ok(ConvertReport {
            rows_read,
            ..ConvertReport::default()
        });
    };
    let replay = spill.replay()?;
    let report = write_rows(replay, sink, schema, config, rows_read, Some(&stats))?;
    spill.close();
    Ok(report)
}

/// Normalize and write rows in input order.
///
/// With `sampled` set, fields missing from the sample are reported once each.
fn write_rows<I, W>(
    rows: I,
    sink: W,
    schema: TableSchema,
    config: &ConvertConfig,
    rows_read: usize,
    sampled: Option<&StatisticsCollector>,
) -> Result<ConvertReport>
where
    I: Iterator<Item = Result<Row>>,
    W: Write + Send,
{
    let schema = Arc::new(schema);
    let mut writer =
        ColumnarWriter::try_new(sink, schema.clone(), &config.writer, config.batch_size)?;
    let mut unseen: IndexSet<String> = IndexSet::new();
    for (i, row) in rows.enumerate() {
        let row = row?;
        if let Some(stats) = sampled {
            for name in row.keys().filter(|k| !stats.contains(k)) {
                if unseen.insert(name.clone()) {
                    tracing::warn!(
                        field = %name,
                        row = i + 1,
                        "field not present in schema sample; dropped"
                    );
                }
            }
        }
        writer.push(i + 1, normalize(&row, &schema))?;
    }
    let (mut sink, rows_written, batches_written) = writer.finish()?;
    sink.flush()?;
    Ok(ConvertReport {
        rows_read,
        rows_written,
        batches_written,
        schema: Some(Arc::unwrap_or_clone(schema)),
    })
}
