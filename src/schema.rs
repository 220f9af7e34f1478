//! Table schema derived from accumulated field statistics.
//!
//! The schema is deliberately flat: arrays, maps and nested objects are stored
//! as [`PhysicalType::Text`] holding their JSON re-serialization. Parquet's
//! repeated and nested group types are never emitted.

use crate::error::{ConvertError, Result};
use crate::stats::{FieldStatistics, StatisticsCollector};
use crate::value::ValueKind;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Physical column types, in declaration order.
///
/// The order matters: it breaks ties between equally frequent kinds
/// (see [`ValueKind::RANKED`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhysicalType {
    Text,
    Float64,
    Int64,
    Int32,
    Boolean,
}

impl PhysicalType {
    /// Map a dominant value kind to its column type. Text is the fallback.
    #[must_use]
    pub const fn for_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Float => PhysicalType::Float64,
            ValueKind::Integer => PhysicalType::Int64,
            ValueKind::Boolean => PhysicalType::Boolean,
            ValueKind::String | ValueKind::Array | ValueKind::Object | ValueKind::Null => {
                PhysicalType::Text
            }
        }
    }

    /// Arrow data type used when building record batches for this column.
    #[must_use]
    pub fn arrow_type(self) -> DataType {
        match self {
            PhysicalType::Text => DataType::Utf8,
            PhysicalType::Float64 => DataType::Float64,
            PhysicalType::Int64 => DataType::Int64,
            PhysicalType::Int32 => DataType::Int32,
            PhysicalType::Boolean => DataType::Boolean,
        }
    }

    /// `true` if `value` can be written to a column of this type as is.
    ///
    /// `null` is always accepted here; nullability is enforced by the writer.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (PhysicalType::Text, Value::String(_)) => true,
            (PhysicalType::Float64, Value::Number(_)) => true,
            (PhysicalType::Int64, Value::Number(n)) => n.is_i64(),
            (PhysicalType::Int32, Value::Number(n)) => {
                n.as_i64().is_some_and(|i| i32::try_from(i).is_ok())
            }
            (PhysicalType::Boolean, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PhysicalType::Text => "text",
            PhysicalType::Float64 => "float64",
            PhysicalType::Int64 => "int64",
            PhysicalType::Int32 => "int32",
            PhysicalType::Boolean => "boolean",
        })
    }
}

/// One output column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub physical_type: PhysicalType,
    pub nullable: bool,
}

impl ColumnSchema {
    #[must_use]
    pub fn new(name: impl Into<String>, physical_type: PhysicalType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            physical_type,
            nullable,
        }
    }

    fn from_stats(name: &str, stats: &FieldStatistics, rows_observed: u64) -> Self {
        let nullable = stats.null_count > 0 || stats.total_count < rows_observed;
        let physical_type = stats
            .kinds
            .numbers_unified()
            .dominant()
            .map_or(PhysicalType::Text, PhysicalType::for_kind);
        Self::new(name, physical_type, nullable)
    }
}

/// The complete, ordered column set handed to the columnar writer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Build a schema from explicit columns.
    ///
    /// # Errors
    /// Returns [`ConvertError::Schema`] if `columns` is empty or a name repeats.
    pub fn new(columns: Vec<ColumnSchema>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ConvertError::schema("a table needs at least one column"));
        }
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].iter().any(|prev| prev.name == c.name) {
                return Err(ConvertError::schema(format!("duplicate column '{}'", c.name)));
            }
        }
        Ok(Self { columns })
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Arrow schema with one flat field per column.
    #[must_use]
    pub fn to_arrow(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(&c.name, c.physical_type.arrow_type(), c.nullable))
            .collect();
        Arc::new(Schema::new(fields))
    }
}

/// Reduce accumulated statistics to one column per field.
///
/// Per field: nullable if it was ever `null` or missing from any observed row;
/// physical type from the dominant kind of the field's own values, counting
/// integers as floats once any float was seen (arrays and objects always map
/// to text, whatever their element kinds). The result
/// depends only on the statistics, so repeated builds are identical.
///
/// # Errors
/// Returns [`ConvertError::Schema`] when no rows, or no fields, were observed.
pub fn build_schema(stats: &StatisticsCollector) -> Result<TableSchema> {
    if stats.rows_observed() == 0 || stats.is_empty() {
        return Err(ConvertError::schema("no sampled rows to infer a schema from"));
    }
    let rows = stats.rows_observed();
    let columns = stats
        .fields()
        .map(|(name, field)| ColumnSchema::from_stats(name, field, rows))
        .collect();
    let schema = TableSchema::new(columns)?;
    tracing::debug!(
        columns = schema.len(),
        rows_sampled = rows,
        schema = %serde_json::to_string(&schema).unwrap_or_default(),
        "inferred table schema"
    );
    Ok(schema)
}
