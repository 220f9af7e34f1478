//! Testing utilities for conversions.
//!
//! Helpers to build JSON Lines input, run a conversion into memory and read the
//! resulting table back, so tests can assert on rows instead of bytes.
//!
//! ```no_run
//! use jsonlpq::testing::*;
//! use jsonlpq::ConvertConfig;
//! # fn main() -> anyhow::Result<()> {
//! let input = jsonl(&[serde_json::json!({"id": 1}), serde_json::json!({"id": 2})]);
//! let (table, report) = convert_to_vec(&input, &ConvertConfig::default())?;
//! assert_eq!(report.rows_written, 2);
//! let rows = read_back(table, 0, 0)?;
//! assert_eq!(rows.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::config::ConvertConfig;
use crate::error::Result;
use crate::pipeline::{ConvertReport, convert};
use crate::projection::project_bytes;
use crate::value::Row;
use serde_json::{Value, json};

/// Render values as JSON Lines, one compact document per line.
#[must_use]
pub fn jsonl(values: &[Value]) -> String {
    let mut out = String::new();
    for v in values {
        out.push_str(&v.to_string());
        out.push('\n');
    }
    out
}

/// Build a [`Row`] from a `json!` object literal. Non-objects give an empty row.
#[must_use]
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

/// Run [`convert`] over `input` into an in-memory table.
///
/// # Errors
/// Propagates any conversion error.
pub fn convert_to_vec(input: &str, config: &ConvertConfig) -> Result<(Vec<u8>, ConvertReport)> {
    let mut out = Vec::new();
    let report = convert(input.as_bytes(), &mut out, config)?;
    Ok((out, report))
}

/// Read an in-memory table back as rows.
///
/// # Errors
/// Propagates any projection error.
pub fn read_back(table: Vec<u8>, head: usize, tail: usize) -> Result<Vec<Row>> {
    project_bytes(table, head, tail)
}

/// `n` user records with an integer id, a name, a float score, a boolean flag
/// and a tag array. Every third record has a `null` score.
#[must_use]
pub fn sample_users(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            let score = if i % 3 == 2 {
                Value::Null
            } else {
                json!(60.5 + (i % 40) as f64)
            };
            json!({
                "id": i,
                "name": format!("user{i}"),
                "score": score,
                "active": i % 2 == 0,
                "tags": ["a", i % 5],
            })
        })
        .collect()
}
