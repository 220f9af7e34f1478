//! # jsonlpq
//!
//! A **streaming converter** between newline-delimited JSON and Parquet.
//! JSON rows are schema-less; Parquet columns are strongly typed. The crate
//! infers one flat table schema from heterogeneous rows, normalizes every row
//! against it and streams the result through `parquet`'s `ArrowWriter` in
//! bounded batches. The reverse path reads a table back as JSON Lines, whole
//! or windowed to its first or last rows.
//!
//! ## Quick Start
//!
//! ```no_run
//! use jsonlpq::{convert, project_file, write_projection, ConvertConfig};
//! use std::fs::File;
//! # fn main() -> anyhow::Result<()> {
//!
//! // JSON Lines to Parquet
//! let input = File::open("events.jsonl")?;
//! let output = File::create("events.parquet")?;
//! let report = convert(input, output, &ConvertConfig::default())?;
//! println!("wrote {} rows", report.rows_written);
//!
//! // Parquet back to JSON Lines, last 10 rows
//! let rows = project_file("events.parquet", 0, 10)?;
//! write_projection(&rows, std::io::stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Schema inference
//!
//! - Each field gets the physical type of its most frequent value kind:
//!   string → text, float → float64, integer → int64, boolean → boolean.
//!   Integers count as floats in a field that also holds floats.
//! - Arrays and objects are always stored as text holding their JSON
//!   re-serialization; no repeated or nested Parquet types are written.
//! - A field is nullable if it was ever `null` or missing from a sampled row.
//! - Columns appear in field discovery order; ties between equally frequent
//!   kinds are broken by a fixed ranking, so inference is reproducible.
//!
//! ## Strategies
//!
//! - [`Strategy::Buffered`] (default) holds all rows in memory and infers from all of them.
//! - [`Strategy::Sampled`] infers from the first rows only and spills the input to a
//!   temporary file, which is replayed for writing. Use it for inputs larger than memory.
//!
//! ## Module Overview
//!
//! - [`value`] - Row type and value kinds
//! - [`stats`] - Per-field statistics collection
//! - [`schema`] - Schema building and physical types
//! - [`normalize`] - Row normalization against a schema
//! - [`pipeline`] - Forward conversion
//! - [`projection`] - Reverse conversion with head/tail windows
//! - [`io`] - JSON Lines, Parquet, spill storage and input decompression
//! - [`config`] - Writer and conversion settings
//! - [`testing`] - Helpers for tests

pub mod config;
pub mod error;
pub mod io;
pub mod normalize;
pub mod pipeline;
pub mod projection;
pub mod schema;
pub mod stats;
pub mod testing;
pub mod value;

pub use config::{Codec, ConvertConfig, Strategy, WriterConfig};
pub use error::{ConvertError, Result};
pub use io::jsonl::{RowDecoder, read_rows};
pub use normalize::{NormalizedRow, normalize};
pub use pipeline::{ConvertReport, convert, infer_schema};
pub use projection::{project, project_bytes, project_file, window, write_projection};
pub use schema::{ColumnSchema, PhysicalType, TableSchema, build_schema};
pub use stats::{FieldStatistics, StatisticsCollector};
pub use value::{Row, ValueKind};
