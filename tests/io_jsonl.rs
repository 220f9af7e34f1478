use anyhow::Result;
use jsonlpq::io::jsonl::{read_rows, write_rows};
use jsonlpq::testing::row;
use jsonlpq::{ConvertError, RowDecoder};
use serde_json::json;

#[test]
fn blank_input_decodes_to_nothing() -> Result<()> {
    assert!(read_rows("".as_bytes())?.is_empty());
    assert!(read_rows("\n\n   \n".as_bytes())?.is_empty());
    Ok(())
}

#[test]
fn one_row_per_document() -> Result<()> {
    let input = "{\"a\":1}\n\n{\"a\":2,\"b\":[1]}\n";
    let rows = read_rows(input.as_bytes())?;
    assert_eq!(rows, vec![row(json!({"a": 1})), row(json!({"a": 2, "b": [1]}))]);
    Ok(())
}

#[test]
fn documents_may_span_lines() -> Result<()> {
    let input = "{\n  \"a\": 1\n}\n{\"a\": 2}";
    assert_eq!(read_rows(input.as_bytes())?.len(), 2);
    Ok(())
}

#[test]
fn field_order_follows_the_document() -> Result<()> {
    let rows = read_rows("{\"z\":1,\"a\":2,\"m\":3}".as_bytes())?;
    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
    Ok(())
}

#[test]
fn truncated_document_reports_its_row() {
    let input = "{\"a\":1}\n{\"a\":2}\n{\"a\":";
    match read_rows(input.as_bytes()) {
        Err(ConvertError::Decoding { row, .. }) => assert_eq!(row, 3),
        other => panic!("expected decoding error, got {other:?}"),
    }
}

#[test]
fn non_object_documents_are_rejected() {
    let err = read_rows("{\"a\":1}\n[1,2]\n".as_bytes()).unwrap_err();
    assert!(matches!(err, ConvertError::Decoding { row: 2, .. }));
    assert!(err.to_string().contains("expected a JSON object, found array"));
}

#[test]
fn decoder_is_lazy_and_stops_after_an_error() {
    let input = "{\"a\":1}\n{oops}\n{\"a\":3}\n";
    let mut decoder = RowDecoder::new(input.as_bytes());
    assert!(decoder.next().unwrap().is_ok());
    assert_eq!(decoder.rows_decoded(), 1);
    assert!(decoder.next().unwrap().is_err());
    assert!(decoder.next().is_none());
}

#[test]
fn write_rows_emits_one_line_each() -> Result<()> {
    let rows = vec![row(json!({"b": 1, "a": null})), row(json!({"b": "x"}))];
    let mut out = Vec::new();
    let n = write_rows(&mut out, &rows)?;
    assert_eq!(n, 2);
    assert_eq!(String::from_utf8(out)?, "{\"b\":1,\"a\":null}\n{\"b\":\"x\"}\n");
    Ok(())
}
