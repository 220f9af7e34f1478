//! Error type shared by the conversion and projection paths.

use thiserror::Error;

/// Errors surfaced by `jsonlpq` operations.
///
/// Every variant carries enough context (row number, column, path or operation)
/// to diagnose a failure without re-running the conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// A document in the input stream is malformed or is not a JSON object.
    /// `row` is 1-based.
    #[error("decode row {row}: {message}")]
    Decoding { row: usize, message: String },

    /// No rows (or no fields) were available to infer a schema from.
    #[error("schema error: {0}")]
    Schema(String),

    /// The columnar writer rejected a row or failed to finalize the table.
    #[error("write failed{}: {message}", location(.row, .column))]
    Write {
        row: Option<usize>,
        column: Option<String>,
        message: String,
    },

    /// The temporary spill file could not be created, written or read back.
    #[error("spill storage: {op}: {source}")]
    SpillStorage {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A columnar table could not be opened, read or materialized.
    #[error("projection error: {0}")]
    Projection(String),

    /// Writing to the output sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Create a new decoding error for the given 1-based row.
    pub fn decoding<S: Into<String>>(row: usize, msg: S) -> Self {
        ConvertError::Decoding {
            row,
            message: msg.into(),
        }
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        ConvertError::Schema(msg.into())
    }

    /// Create a write error without row context (e.g. finalize failures).
    pub fn write<S: Into<String>>(msg: S) -> Self {
        ConvertError::Write {
            row: None,
            column: None,
            message: msg.into(),
        }
    }

    /// Create a write error pinned to a specific row and column.
    pub fn write_at<S: Into<String>>(row: usize, column: &str, msg: S) -> Self {
        ConvertError::Write {
            row: Some(row),
            column: Some(column.to_string()),
            message: msg.into(),
        }
    }

    /// Wrap a spill-file I/O failure.
    pub fn spill(op: &'static str, source: std::io::Error) -> Self {
        ConvertError::SpillStorage { op, source }
    }

    /// Create a new projection error.
    pub fn projection<S: Into<String>>(msg: S) -> Self {
        ConvertError::Projection(msg.into())
    }

    /// `true` for the "nothing to infer from" case the pipeline treats as an empty conversion.
    #[must_use]
    pub fn is_empty_input(&self) -> bool {
        matches!(self, ConvertError::Schema(_))
    }
}

fn location(row: &Option<usize>, column: &Option<String>) -> String {
    match (row, column) {
        (Some(r), Some(c)) => format!(" at row {r}, column '{c}'"),
        (Some(r), None) => format!(" at row {r}"),
        (None, Some(c)) => format!(" in column '{c}'"),
        (None, None) => String::new(),
    }
}
