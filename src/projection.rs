//! Reverse conversion: a Parquet table back to JSON Lines, optionally windowed.
//!
//! The whole table is loaded (full scans are cheap for the columnar reader;
//! no predicate or column pushdown is attempted). Only the rows inside the
//! head/tail window are converted back into [`Row`]s.

use crate::error::{ConvertError, Result};
use crate::io::jsonl::write_rows;
use crate::io::parquet::{batch_row, read_table};
use crate::value::Row;
use bytes::Bytes;
use parquet::file::reader::ChunkReader;
use std::fs::File;
use std::io::Write;
use std::ops::Range;
use std::path::Path;

/// Row index range selected by `head` / `tail` over `total` rows.
///
/// `head > 0` wins over `tail`; callers are expected to pass at most one.
/// Both zero selects everything. The range is always in file order.
#[must_use]
pub fn window(total: usize, head: usize, tail: usize) -> Range<usize> {
    if head > 0 {
        0..head.min(total)
    } else if tail > 0 {
        total.saturating_sub(tail)..total
    } else {
        0..total
    }
}

/// Read a table and return the rows inside the head/tail window.
///
/// # Errors
/// Returns [`ConvertError::Projection`] if the table cannot be opened, read or
/// materialized.
pub fn project<R: ChunkReader + 'static>(source: R, head: usize, tail: usize) -> Result<Vec<Row>> {
    let table = read_table(source)?;
    if table.declared_rows == 0 {
        return Ok(Vec::new());
    }
    let range = window(table.num_rows(), head, tail);
    let mut out = Vec::with_capacity(range.len());
    let mut offset = 0;
    for batch in &table.batches {
        let batch_range = offset..offset + batch.num_rows();
        offset = batch_range.end;
        let start = range.start.max(batch_range.start);
        let end = range.end.min(batch_range.end);
        for i in start..end {
            out.push(batch_row(batch, i - batch_range.start)?);
        }
        if offset >= range.end {
            break;
        }
    }
    Ok(out)
}

/// [`project`] over a file. A zero-length file is treated as an empty table.
///
/// # Errors
/// Returns [`ConvertError::Projection`] naming `path` if it cannot be opened
/// or read as a table.
pub fn project_file(path: impl AsRef<Path>, head: usize, tail: usize) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ConvertError::projection(format!("open {}: {e}", path.display())))?;
    let len = file
        .metadata()
        .map_err(|e| ConvertError::projection(format!("stat {}: {e}", path.display())))?
        .len();
    if len == 0 {
        return Ok(Vec::new());
    }
    project(file, head, tail).map_err(|e| match e {
        ConvertError::Projection(msg) => {
            ConvertError::projection(format!("{}: {msg}", path.display()))
        }
        other => other,
    })
}

/// [`project`] over an in-memory table. Empty input is an empty table.
///
/// # Errors
/// Returns [`ConvertError::Projection`] if the bytes are not a readable table.
pub fn project_bytes(data: impl Into<Bytes>, head: usize, tail: usize) -> Result<Vec<Row>> {
    let data = data.into();
    if data.is_empty() {
        return Ok(Vec::new());
    }
    project(data, head, tail)
}

/// Write projected rows as JSON Lines.
///
/// # Errors
/// Returns [`ConvertError::Io`] if the sink fails.
pub fn write_projection<W: Write>(rows: &[Row], sink: W) -> Result<usize> {
    write_rows(std::io::BufWriter::new(sink), rows)
}
