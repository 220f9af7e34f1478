//! Parquet I/O for dynamic rows.
//!
//! This module provides:
//! - **Batched writing**: [`ColumnarWriter`] buffers [`NormalizedRow`]s, turns
//!   each full buffer into an Arrow [`RecordBatch`] shaped by a [`TableSchema`],
//!   and hands it to `parquet::arrow::ArrowWriter`.
//! - **Full-table reading**: [`read_table`] loads every record batch of a table
//!   together with its declared row count, and [`batch_row`] turns one batch row
//!   back into a [`Row`].
//!
//! Column values are built with typed Arrow builders, one per physical type, so
//! a rejected value is reported with its row number and column name.

use crate::config::WriterConfig;
use crate::error::{ConvertError, Result};
use crate::normalize::{NormalizedRow, reserialize};
use crate::schema::{ColumnSchema, PhysicalType, TableSchema};
use crate::value::Row;
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanBuilder, Float64Builder, Int32Builder, Int64Builder,
    StringBuilder,
};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, SchemaRef,
    UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::reader::ChunkReader;
use serde_json::{Number, Value};
use std::io::Write;
use std::sync::Arc;

/// Rows per record batch when reading a table back.
const READ_BATCH_SIZE: usize = 64 * 1024;

/// Streams normalized rows into a Parquet file in fixed-size batches.
///
/// Rows are written in the order they are pushed. Nothing is buffered beyond
/// one batch of rows plus whatever the underlying `ArrowWriter` holds for the
/// current row group.
pub struct ColumnarWriter<W: Write + Send> {
    inner: ArrowWriter<W>,
    schema: Arc<TableSchema>,
    arrow_schema: SchemaRef,
    pending: Vec<(usize, NormalizedRow)>,
    batch_size: usize,
    rows_written: usize,
    batches_written: usize,
}

impl<W: Write + Send> ColumnarWriter<W> {
    /// Open a writer for `schema` over `sink`.
    ///
    /// # Errors
    /// Returns [`ConvertError::Write`] if the Parquet writer cannot be created.
    pub fn try_new(
        sink: W,
        schema: Arc<TableSchema>,
        config: &WriterConfig,
        batch_size: usize,
    ) -> Result<Self> {
        let arrow_schema = schema.to_arrow();
        let inner = ArrowWriter::try_new(sink, arrow_schema.clone(), Some(config.properties()))
            .map_err(|e| ConvertError::write(format!("create ArrowWriter: {e}")))?;
        let batch_size = batch_size.max(1);
        Ok(Self {
            inner,
            schema,
            arrow_schema,
            pending: Vec::with_capacity(batch_size.min(READ_BATCH_SIZE)),
            batch_size,
            rows_written: 0,
            batches_written: 0,
        })
    }

    /// Queue one row; `row_number` (1-based input position) is used in errors.
    /// A full buffer is flushed as one record batch.
    ///
    /// # Errors
    /// Returns [`ConvertError::Write`] if a flushed batch is rejected.
    pub fn push(&mut self, row_number: usize, row: NormalizedRow) -> Result<()> {
        self.pending.push((row_number, row));
        if self.pending.len() >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    /// Write the buffered rows as one record batch.
    ///
    /// # Errors
    /// Returns [`ConvertError::Write`] if a value does not fit its column or
    /// the Parquet writer fails.
    pub fn flush_batch(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = build_batch(&self.schema, &self.arrow_schema, &self.pending)?;
        self.inner.write(&batch).map_err(|e| {
            ConvertError::write(format!(
                "write batch of {} rows starting at row {}: {e}",
                self.pending.len(),
                self.pending[0].0
            ))
        })?;
        self.rows_written += self.pending.len();
        self.batches_written += 1;
        tracing::debug!(
            rows = self.pending.len(),
            total = self.rows_written,
            "flushed record batch"
        );
        self.pending.clear();
        Ok(())
    }

    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    #[must_use]
    pub fn batches_written(&self) -> usize {
        self.batches_written
    }

    /// Flush remaining rows, write the footer and return the sink.
    ///
    /// # Errors
    /// Returns [`ConvertError::Write`] if flushing or finalizing fails.
    pub fn finish(mut self) -> Result<(W, usize, usize)> {
        self.flush_batch()?;
        let rows = self.rows_written;
        let batches = self.batches_written;
        let sink = self
            .inner
            .into_inner()
            .map_err(|e| ConvertError::write(format!("finalize parquet file: {e}")))?;
        Ok((sink, rows, batches))
    }
}

fn build_batch(
    schema: &TableSchema,
    arrow_schema: &SchemaRef,
    rows: &[(usize, NormalizedRow)],
) -> Result<RecordBatch> {
    let columns = schema
        .columns()
        .iter()
        .map(|col| build_column(col, rows))
        .collect::<Result<Vec<ArrayRef>>>()?;
    RecordBatch::try_new(arrow_schema.clone(), columns)
        .map_err(|e| ConvertError::write(format!("assemble record batch: {e}")))
}

fn build_column(col: &ColumnSchema, rows: &[(usize, NormalizedRow)]) -> Result<ArrayRef> {
    let name = col.name.as_str();
    let cells = rows.iter().map(|(n, row)| {
        let value = row.get(name).filter(|v| !v.is_null());
        if value.is_none() && !col.nullable {
            return Err(ConvertError::write_at(
                *n,
                name,
                "missing value for non-nullable column",
            ));
        }
        Ok((*n, value))
    });
    let mismatch = |n: usize, v: &Value| {
        ConvertError::write_at(
            n,
            name,
            format!("cannot store {} as {}", reserialize(v), col.physical_type),
        )
    };

    let array: ArrayRef = match col.physical_type {
        PhysicalType::Text => {
            let mut b = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
            for cell in cells {
                match cell? {
                    (_, None) => b.append_null(),
                    (_, Some(Value::String(s))) => b.append_value(s),
                    (n, Some(v)) => return Err(mismatch(n, v)),
                }
            }
            Arc::new(b.finish())
        }
        PhysicalType::Float64 => {
            let mut b = Float64Builder::with_capacity(rows.len());
            for cell in cells {
                match cell? {
                    (_, None) => b.append_null(),
                    (n, Some(v)) => b.append_value(v.as_f64().ok_or_else(|| mismatch(n, v))?),
                }
            }
            Arc::new(b.finish())
        }
        PhysicalType::Int64 => {
            let mut b = Int64Builder::with_capacity(rows.len());
            for cell in cells {
                match cell? {
                    (_, None) => b.append_null(),
                    (n, Some(v)) => b.append_value(v.as_i64().ok_or_else(|| mismatch(n, v))?),
                }
            }
            Arc::new(b.finish())
        }
        PhysicalType::Int32 => {
            let mut b = Int32Builder::with_capacity(rows.len());
            for cell in cells {
                match cell? {
                    (_, None) => b.append_null(),
                    (n, Some(v)) => {
                        let i = v
                            .as_i64()
                            .and_then(|i| i32::try_from(i).ok())
                            .ok_or_else(|| mismatch(n, v))?;
                        b.append_value(i);
                    }
                }
            }
            Arc::new(b.finish())
        }
        PhysicalType::Boolean => {
            let mut b = BooleanBuilder::with_capacity(rows.len());
            for cell in cells {
                match cell? {
                    (_, None) => b.append_null(),
                    (n, Some(v)) => b.append_value(v.as_bool().ok_or_else(|| mismatch(n, v))?),
                }
            }
            Arc::new(b.finish())
        }
    };
    Ok(array)
}

/// A table loaded fully into memory.
pub struct LoadedTable {
    pub schema: SchemaRef,
    /// Row count declared by the file footer.
    pub declared_rows: usize,
    pub batches: Vec<RecordBatch>,
}

impl LoadedTable {
    /// Rows actually present in the loaded batches.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

/// Read every record batch of a Parquet table.
///
/// A table whose footer declares zero rows is returned without reading any
/// batch.
///
/// # Errors
/// Returns [`ConvertError::Projection`] if the table cannot be opened or read,
/// or its declared row count cannot be materialized.
pub fn read_table<R: ChunkReader + 'static>(source: R) -> Result<LoadedTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(source)
        .map_err(|e| ConvertError::projection(format!("open parquet table: {e}")))?;
    let schema = builder.schema().clone();
    let declared = builder.metadata().file_metadata().num_rows();
    let declared_rows = usize::try_from(declared).map_err(|_| {
        ConvertError::projection(format!("table declares an invalid row count ({declared})"))
    })?;
    if declared_rows == 0 {
        return Ok(LoadedTable {
            schema,
            declared_rows,
            batches: Vec::new(),
        });
    }

    let mut reader = builder
        .with_batch_size(READ_BATCH_SIZE)
        .build()
        .map_err(|e| ConvertError::projection(format!("build parquet reader: {e}")))?;
    let mut batches = Vec::new();
    batches
        .try_reserve(declared_rows.div_ceil(READ_BATCH_SIZE))
        .map_err(|_| {
            ConvertError::projection(format!(
                "table claims {declared_rows} rows, more than can be materialized"
            ))
        })?;
    while let Some(batch) = reader
        .next()
        .transpose()
        .map_err(|e| ConvertError::projection(format!("read record batch: {e}")))?
    {
        batches.push(batch);
    }
    let table = LoadedTable {
        schema,
        declared_rows,
        batches,
    };
    if table.num_rows() != declared_rows {
        tracing::warn!(
            declared = declared_rows,
            read = table.num_rows(),
            "row count differs from table footer"
        );
    }
    Ok(table)
}

/// Convert row `i` of `batch` into a [`Row`] in column order, `null` for nulls.
///
/// # Errors
/// Returns [`ConvertError::Projection`] if a value cannot be rendered.
pub fn batch_row(batch: &RecordBatch, i: usize) -> Result<Row> {
    let schema = batch.schema();
    let mut row = Row::with_capacity(batch.num_columns());
    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        let value = cell_value(array.as_ref(), i).map_err(|e| {
            ConvertError::projection(format!("render column '{}': {e}", field.name()))
        })?;
        row.insert(field.name().clone(), value);
    }
    Ok(row)
}

fn cell_value(array: &dyn Array, i: usize) -> std::result::Result<Value, arrow::error::ArrowError> {
    if array.is_null(i) {
        return Ok(Value::Null);
    }
    let v = match array.data_type() {
        DataType::Null => Value::Null,
        DataType::Boolean => Value::Bool(array.as_boolean().value(i)),
        DataType::Utf8 => Value::String(array.as_string::<i32>().value(i).to_string()),
        DataType::LargeUtf8 => Value::String(array.as_string::<i64>().value(i).to_string()),
        DataType::Utf8View => Value::String(array.as_string_view().value(i).to_string()),
        DataType::Int8 => Value::from(array.as_primitive::<Int8Type>().value(i)),
        DataType::Int16 => Value::from(array.as_primitive::<Int16Type>().value(i)),
        DataType::Int32 => Value::from(array.as_primitive::<Int32Type>().value(i)),
        DataType::Int64 => Value::from(array.as_primitive::<Int64Type>().value(i)),
        DataType::UInt8 => Value::from(array.as_primitive::<UInt8Type>().value(i)),
        DataType::UInt16 => Value::from(array.as_primitive::<UInt16Type>().value(i)),
        DataType::UInt32 => Value::from(array.as_primitive::<UInt32Type>().value(i)),
        DataType::UInt64 => Value::from(array.as_primitive::<UInt64Type>().value(i)),
        DataType::Float32 => {
            float_value(f64::from(array.as_primitive::<Float32Type>().value(i)))
        }
        DataType::Float64 => float_value(array.as_primitive::<Float64Type>().value(i)),
        _ => {
            let formatter = ArrayFormatter::try_new(array, &FormatOptions::default())?;
            Value::String(formatter.value(i).to_string())
        }
    };
    Ok(v)
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}
