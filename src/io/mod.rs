//! Input and output formats: JSON Lines rows, Parquet tables, the spill file
//! of the sampled strategy and transparent input decompression.

pub mod compression;
pub mod jsonl;
pub mod parquet;
pub mod spill;
