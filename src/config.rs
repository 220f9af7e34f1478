//! Conversion and writer configuration.
//!
//! Everything here is passed through: [`WriterConfig`] maps onto Parquet
//! [`WriterProperties`], [`ConvertConfig`] selects the pipeline strategy and its
//! memory bounds. Defaults favour large inputs (zstd, 2^20-row row groups).

use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties, WriterVersion};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of rows observed by the sampled strategy.
pub const DEFAULT_SAMPLE_SIZE: usize = 1024;
/// Default number of rows per record batch handed to the writer.
pub const DEFAULT_BATCH_SIZE: usize = 131_072;
/// Default data page size limit in bytes.
pub const DEFAULT_PAGE_BUFFER_SIZE: usize = 256 * 1024;
/// Default maximum rows per row group.
pub const DEFAULT_MAX_ROWS_PER_ROW_GROUP: usize = 1_048_576;

/// Compression codec for the output table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Codec {
    /// No compression.
    None,
    /// Fast codec (Snappy).
    Snappy,
    /// General-purpose codec (Gzip).
    Gzip,
    /// High-ratio codec (Zstd).
    #[default]
    Zstd,
}

impl Codec {
    fn to_parquet(self) -> Compression {
        match self {
            Codec::None => Compression::UNCOMPRESSED,
            Codec::Snappy => Compression::SNAPPY,
            Codec::Gzip => Compression::GZIP(GzipLevel::default()),
            Codec::Zstd => Compression::ZSTD(ZstdLevel::default()),
        }
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Codec::None),
            "snappy" => Ok(Codec::Snappy),
            "gzip" => Ok(Codec::Gzip),
            "zstd" => Ok(Codec::Zstd),
            other => Err(format!(
                "unknown codec '{other}' (expected none, snappy, gzip or zstd)"
            )),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Codec::None => "none",
            Codec::Snappy => "snappy",
            Codec::Gzip => "gzip",
            Codec::Zstd => "zstd",
        })
    }
}

/// Settings passed through to the Parquet writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    pub compression: Codec,
    /// Data page size limit in bytes.
    pub page_buffer_size: usize,
    pub max_rows_per_row_group: usize,
    /// Data page format version, 1 or 2.
    pub data_page_version: u8,
    pub use_dictionary: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: Codec::default(),
            page_buffer_size: DEFAULT_PAGE_BUFFER_SIZE,
            max_rows_per_row_group: DEFAULT_MAX_ROWS_PER_ROW_GROUP,
            data_page_version: 2,
            use_dictionary: true,
        }
    }
}

impl WriterConfig {
    /// Build the Parquet writer properties. Page statistics are always on.
    #[must_use]
    pub fn properties(&self) -> WriterProperties {
        let version = if self.data_page_version <= 1 {
            WriterVersion::PARQUET_1_0
        } else {
            WriterVersion::PARQUET_2_0
        };
        WriterProperties::builder()
            .set_compression(self.compression.to_parquet())
            .set_data_page_size_limit(self.page_buffer_size.max(1))
            .set_max_row_group_row_count(Some(self.max_rows_per_row_group.max(1)))
            .set_writer_version(version)
            .set_dictionary_enabled(self.use_dictionary)
            .set_statistics_enabled(EnabledStatistics::Page)
            .build()
    }
}

/// How the pipeline bridges input to the writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Decode everything into memory and infer the schema from all rows.
    #[default]
    Buffered,
    /// Infer the schema from the first `sample_size` rows, spill every row to a
    /// temporary file and replay it for writing.
    Sampled,
}

/// Top-level conversion settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertConfig {
    pub strategy: Strategy,
    /// Rows observed for schema inference by [`Strategy::Sampled`].
    pub sample_size: usize,
    /// Rows per record batch handed to the writer.
    pub batch_size: usize,
    /// Directory for spill files; the system temp dir if `None`.
    pub spill_dir: Option<PathBuf>,
    pub writer: WriterConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            spill_dir: None,
            writer: WriterConfig::default(),
        }
    }
}

impl ConvertConfig {
    /// Default settings with the sampled strategy.
    #[must_use]
    pub fn sampled() -> Self {
        Self {
            strategy: Strategy::Sampled,
            ..Self::default()
        }
    }
}
