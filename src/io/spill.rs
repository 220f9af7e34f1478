//! Scoped spill storage for the two-pass sampled conversion.
//!
//! A [`SpillStore`] owns one named temporary file holding every decoded row as
//! JSON Lines. It lives for exactly one conversion call:
//! - [`SpillStore::close`] removes the file on the success path and logs (but
//!   does not propagate) a removal failure;
//! - on every error path the store is dropped, and the underlying
//!   [`tempfile::NamedTempFile`] removes the file in its `Drop`.

use crate::error::{ConvertError, Result};
use crate::io::jsonl::{RowDecoder, write_row};
use crate::value::Row;
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Temporary JSON Lines file of spilled rows.
pub struct SpillStore {
    writer: BufWriter<NamedTempFile>,
    rows: usize,
}

impl SpillStore {
    /// Create a spill file in `dir`, or in the system temp dir if `None`.
    ///
    /// # Errors
    /// Returns [`ConvertError::SpillStorage`] if the file cannot be created.
    pub fn create(dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("jsonlpq-spill-").suffix(".jsonl");
        let file = match dir {
            Some(d) => builder.tempfile_in(d),
            None => builder.tempfile(),
        }
        .map_err(|e| ConvertError::spill("create spill file", e))?;
        tracing::debug!(path = %file.path().display(), "created spill file");
        Ok(Self {
            writer: BufWriter::new(file),
            rows: 0,
        })
    }

    /// Path of the spill file while it exists.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.writer.get_ref().path().to_path_buf()
    }

    /// Rows appended so far.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append one row.
    ///
    /// # Errors
    /// Returns [`ConvertError::SpillStorage`] if the write fails.
    pub fn append(&mut self, row: &Row) -> Result<()> {
        write_row(&mut self.writer, row).map_err(|e| match e {
            ConvertError::Io(io) => ConvertError::spill("write spill file", io),
            other => other,
        })?;
        self.rows += 1;
        Ok(())
    }

    /// Flush pending writes and iterate every spilled row from the start.
    ///
    /// Can be called more than once; each call starts a fresh pass.
    ///
    /// # Errors
    /// Returns [`ConvertError::SpillStorage`] if the file cannot be flushed,
    /// reopened or rewound. Errors while iterating are mapped the same way.
    pub fn replay(&mut self) -> Result<impl Iterator<Item = Result<Row>> + use<>> {
        self.writer
            .flush()
            .map_err(|e| ConvertError::spill("flush spill file", e))?;
        let mut file: File = self
            .writer
            .get_ref()
            .reopen()
            .map_err(|e| ConvertError::spill("reopen spill file", e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| ConvertError::spill("rewind spill file", e))?;
        Ok(RowDecoder::new(BufReader::new(file)).map(|r| {
            r.map_err(|e| {
                ConvertError::spill(
                    "read spill file",
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
                )
            })
        }))
    }

    /// Remove the spill file. A removal failure is logged, not returned.
    pub fn close(self) {
        let path = self.path();
        let file = match self.writer.into_inner() {
            Ok(f) => f,
            Err(e) => {
                // Dropping the error drops the temp file, which still removes it.
                tracing::warn!(path = %path.display(), error = %e.error(), "flush spill file before removal");
                return;
            }
        };
        match file.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "removed spill file"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "remove spill file"),
        }
    }
}
