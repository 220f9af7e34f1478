//! Row normalization against a [`TableSchema`].
//!
//! Normalization is a pure function of `(row, schema)`: the input row is never
//! mutated and a second pass over an already normalized row is a no-op.

use crate::schema::{PhysicalType, TableSchema};
use crate::value::Row;
use serde_json::{Number, Value};
use std::ops::Deref;

/// A row whose present values match their column's physical type.
///
/// Fields the schema does not know about are carried along untouched; the
/// columnar writer only reads declared columns, so they are dropped on write.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRow(Row);

impl NormalizedRow {
    #[must_use]
    pub fn into_inner(self) -> Row {
        self.0
    }

    #[must_use]
    pub fn as_row(&self) -> &Row {
        &self.0
    }
}

impl Deref for NormalizedRow {
    type Target = Row;

    fn deref(&self) -> &Row {
        &self.0
    }
}

/// Rewrite `row` so each value conforms to the schema.
///
/// - Values the column already accepts are kept (integral floats in an
///   integer column become integers).
/// - In a text column, arrays, objects and outvoted scalars are replaced by
///   their JSON re-serialization.
/// - In other columns an incompatible value is kept as is; the writer reports
///   it with the row and column.
#[must_use]
pub fn normalize(row: &Row, schema: &TableSchema) -> NormalizedRow {
    let mut out = Row::with_capacity(row.len());
    for (name, value) in row {
        let value = match schema.column(name) {
            Some(col) => conform(value, col.physical_type),
            None => value.clone(),
        };
        out.insert(name.clone(), value);
    }
    NormalizedRow(out)
}

fn conform(value: &Value, ty: PhysicalType) -> Value {
    if ty.accepts(value) {
        return value.clone();
    }
    match ty {
        PhysicalType::Text => Value::String(reserialize(value)),
        PhysicalType::Int64 | PhysicalType::Int32 => {
            integral(value, ty).unwrap_or_else(|| value.clone())
        }
        PhysicalType::Float64 | PhysicalType::Boolean => value.clone(),
    }
}

/// An integral float (`3.0`) that fits the integer column, as an integer.
///
/// Only real floats are converted; integers outside `i64` (large `u64`s) are
/// left for the writer to reject.
fn integral(value: &Value, ty: PhysicalType) -> Option<Value> {
    // 2^63, the first float past `i64::MAX`
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    let n = value.as_number().filter(|n| n.is_f64())?;
    let f = n.as_f64()?;
    if f.fract() != 0.0 || !(-I64_BOUND..I64_BOUND).contains(&f) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let v = Value::Number(Number::from(f as i64));
    ty.accepts(&v).then_some(v)
}

/// Canonical JSON text for `value`, or its debug rendering if that fails.
#[must_use]
pub fn reserialize(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}
