//! JSON Lines decoding and encoding of dynamic rows.
//!
//! This module provides:
//! - **Lazy decoding**: [`RowDecoder`] yields one [`Row`] per JSON document
//! - **Eager decoding**: [`read_rows`] collects a whole stream into `Vec<Row>`
//! - **Encoding**: [`write_row`] / [`write_rows`] emit one compact document per line
//!
//! # Notes
//! - Documents are separated by newlines (any JSON whitespace is tolerated, so a
//!   pretty-printed object spanning several lines still decodes as one row).
//! - Blank or whitespace-only input decodes to zero rows.
//! - Every document must be a JSON object; anything else is a decoding error.
//! - Row numbers in errors are 1-based document positions.

use crate::error::{ConvertError, Result};
use crate::value::{Row, ValueKind};
use serde_json::de::{IoRead, StreamDeserializer};
use serde_json::{Deserializer, Value};
use std::io::{Read, Write};

/// Lazy iterator of rows over a byte stream.
///
/// Stops after the first error; a malformed document is never skipped.
pub struct RowDecoder<R: Read> {
    stream: StreamDeserializer<'static, IoRead<R>, Value>,
    rows: usize,
    failed: bool,
}

impl<R: Read> RowDecoder<R> {
    /// Wrap `reader`. Wrap it in a `BufReader` first if it is unbuffered.
    pub fn new(reader: R) -> Self {
        Self {
            stream: Deserializer::from_reader(reader).into_iter::<Value>(),
            rows: 0,
            failed: false,
        }
    }

    /// Number of rows decoded so far.
    #[must_use]
    pub fn rows_decoded(&self) -> usize {
        self.rows
    }
}

impl<R: Read> Iterator for RowDecoder<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let row = self.rows + 1;
        let item = match self.stream.next()? {
            Ok(Value::Object(map)) => {
                self.rows = row;
                Ok(map)
            }
            Ok(other) => Err(ConvertError::decoding(
                row,
                format!("expected a JSON object, found {}", ValueKind::of(&other)),
            )),
            Err(e) => Err(ConvertError::decoding(row, format!("parse JSON: {e}"))),
        };
        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}

/// Decode a whole stream into memory.
///
/// # Errors
/// Returns [`ConvertError::Decoding`] for the first malformed document.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>> {
    RowDecoder::new(reader).collect()
}

/// Write one row as a compact JSON document followed by `\n`.
///
/// # Errors
/// Returns [`ConvertError::Io`] if the sink fails.
pub fn write_row<W: Write>(mut w: W, row: &Row) -> Result<()> {
    serde_json::to_writer(&mut w, row).map_err(std::io::Error::from)?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write rows as JSON Lines and flush the sink.
///
/// # Returns
/// The number of rows written.
///
/// # Errors
/// Returns [`ConvertError::Io`] if the sink fails.
pub fn write_rows<'a, W, I>(mut w: W, rows: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Row>,
{
    let mut n = 0;
    for row in rows {
        write_row(&mut w, row)?;
        n += 1;
    }
    w.flush()?;
    Ok(n)
}
