use anyhow::Result;
use bytes::Bytes;
use jsonlpq::io::parquet::{ColumnarWriter, batch_row, read_table};
use jsonlpq::testing::*;
use jsonlpq::{
    Codec, ColumnSchema, ConvertConfig, ConvertError, PhysicalType, TableSchema, WriterConfig,
    normalize,
};
use parquet::basic::Compression;
use parquet::file::reader::{FileReader, SerializedFileReader};
use serde_json::json;
use std::sync::Arc;

fn table_with(writer: WriterConfig, n: i64) -> Result<Bytes> {
    let input = jsonl(&(0..n).map(|i| json!({"i": i, "s": format!("v{i}")})).collect::<Vec<_>>());
    let config = ConvertConfig {
        writer,
        ..ConvertConfig::default()
    };
    let (table, _) = convert_to_vec(&input, &config)?;
    Ok(Bytes::from(table))
}

#[test]
fn compression_is_recorded_per_column_chunk() -> Result<()> {
    for (codec, expected) in [
        (Codec::None, Compression::UNCOMPRESSED),
        (Codec::Snappy, Compression::SNAPPY),
    ] {
        let writer = WriterConfig {
            compression: codec,
            ..WriterConfig::default()
        };
        let reader = SerializedFileReader::new(table_with(writer, 5)?)?;
        let chunk = reader.metadata().row_group(0).column(0).compression();
        assert_eq!(chunk, expected, "{codec}");
    }

    let reader = SerializedFileReader::new(table_with(WriterConfig::default(), 5)?)?;
    let chunk = reader.metadata().row_group(0).column(0).compression();
    assert!(matches!(chunk, Compression::ZSTD(_)), "{chunk:?}");
    Ok(())
}

#[test]
fn row_groups_respect_the_row_limit() -> Result<()> {
    let writer = WriterConfig {
        max_rows_per_row_group: 4,
        ..WriterConfig::default()
    };
    let reader = SerializedFileReader::new(table_with(writer, 10)?)?;
    let meta = reader.metadata();
    assert_eq!(meta.num_row_groups(), 3);
    assert_eq!(meta.file_metadata().num_rows(), 10);
    Ok(())
}

#[test]
fn read_table_reports_declared_rows() -> Result<()> {
    let table = read_table(table_with(WriterConfig::default(), 7)?)?;
    assert_eq!(table.declared_rows, 7);
    assert_eq!(table.num_rows(), 7);
    assert_eq!(table.schema.fields().len(), 2);

    let first = batch_row(&table.batches[0], 0)?;
    assert_eq!(first, row(json!({"i": 0, "s": "v0"})));
    Ok(())
}

#[test]
fn writer_errors_name_row_and_column() -> Result<()> {
    let schema = Arc::new(TableSchema::new(vec![
        ColumnSchema::new("flag", PhysicalType::Boolean, false),
    ])?);
    let mut writer = ColumnarWriter::try_new(Vec::new(), schema.clone(), &WriterConfig::default(), 2)?;
    writer.push(1, normalize(&row(json!({"flag": true})), &schema))?;
    let err = writer
        .push(2, normalize(&row(json!({"flag": "yes"})), &schema))
        .unwrap_err();
    match err {
        ConvertError::Write { row, column, message } => {
            assert_eq!(row, Some(2));
            assert_eq!(column.as_deref(), Some("flag"));
            assert!(message.contains("boolean"), "{message}");
        }
        other => panic!("expected write error, got {other}"),
    }
    Ok(())
}

#[test]
fn int32_columns_reject_out_of_range_values() -> Result<()> {
    let schema = Arc::new(TableSchema::new(vec![
        ColumnSchema::new("small", PhysicalType::Int32, true),
    ])?);
    let mut writer = ColumnarWriter::try_new(Vec::new(), schema.clone(), &WriterConfig::default(), 10)?;
    writer.push(1, normalize(&row(json!({"small": 7})), &schema))?;
    writer.push(2, normalize(&row(json!({"small": null})), &schema))?;
    assert_eq!(writer.rows_written(), 0);
    writer.flush_batch()?;
    assert_eq!((writer.rows_written(), writer.batches_written()), (2, 1));
    let (bytes, rows, batches) = writer.finish()?;
    assert_eq!((rows, batches), (2, 1));
    let table = read_table(Bytes::from(bytes))?;
    assert_eq!(batch_row(&table.batches[0], 0)?, row(json!({"small": 7})));
    assert_eq!(batch_row(&table.batches[0], 1)?, row(json!({"small": null})));

    let mut writer = ColumnarWriter::try_new(Vec::new(), schema.clone(), &WriterConfig::default(), 1)?;
    let err = writer
        .push(1, normalize(&row(json!({"small": 1_i64 << 40})), &schema))
        .unwrap_err();
    assert!(err.to_string().contains("at row 1, column 'small'"), "{err}");
    Ok(())
}

#[test]
fn integers_fit_float_columns() -> Result<()> {
    let schema = Arc::new(TableSchema::new(vec![
        ColumnSchema::new("x", PhysicalType::Float64, false),
    ])?);
    let mut writer = ColumnarWriter::try_new(Vec::new(), schema.clone(), &WriterConfig::default(), 10)?;
    writer.push(1, normalize(&row(json!({"x": 2})), &schema))?;
    let (bytes, _, _) = writer.finish()?;
    let table = read_table(Bytes::from(bytes))?;
    assert_eq!(batch_row(&table.batches[0], 0)?["x"], json!(2.0));
    Ok(())
}
