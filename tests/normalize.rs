use jsonlpq::testing::row;
use jsonlpq::{ColumnSchema, PhysicalType, TableSchema, normalize};
use serde_json::{Value, json};

fn schema() -> TableSchema {
    TableSchema::new(vec![
        ColumnSchema::new("text", PhysicalType::Text, true),
        ColumnSchema::new("n", PhysicalType::Int64, true),
        ColumnSchema::new("f", PhysicalType::Float64, true),
        ColumnSchema::new("b", PhysicalType::Boolean, true),
    ])
    .unwrap()
}

#[test]
fn containers_in_text_columns_are_reserialized() {
    let input = row(json!({"text": [1, "a", {"k": null}]}));
    let out = normalize(&input, &schema());
    assert_eq!(out["text"], json!(r#"[1,"a",{"k":null}]"#));

    let input = row(json!({"text": {"z": 1, "a": [true]}}));
    let out = normalize(&input, &schema());
    assert_eq!(out["text"], json!(r#"{"z":1,"a":[true]}"#));
}

#[test]
fn outvoted_scalars_in_text_columns_become_strings() {
    let out = normalize(&row(json!({"text": 5})), &schema());
    assert_eq!(out["text"], json!("5"));

    let out = normalize(&row(json!({"text": false})), &schema());
    assert_eq!(out["text"], json!("false"));
}

#[test]
fn reserialized_arrays_parse_back_identically() {
    let original = json!([1, "two", 3.5, null, [false]]);
    let out = normalize(&row(json!({"text": original.clone()})), &schema());
    let text = out["text"].as_str().unwrap();
    let parsed: Value = serde_json::from_str(text).unwrap();
    assert_eq!(parsed, original);
}

#[test]
fn matching_values_are_kept() {
    let input = row(json!({"text": "x", "n": 3, "f": 2, "b": true}));
    let out = normalize(&input, &schema());
    assert_eq!(out.as_row(), &input);
}

#[test]
fn integral_floats_fit_integer_columns() {
    let out = normalize(&row(json!({"n": 3.0})), &schema());
    assert_eq!(out["n"], json!(3));
    assert!(out["n"].is_i64());

    // left for the writer to reject
    let out = normalize(&row(json!({"n": 3.5})), &schema());
    assert_eq!(out["n"], json!(3.5));
}

#[test]
fn nulls_absent_and_unknown_fields() {
    let input = row(json!({"text": null, "extra": [1]}));
    let out = normalize(&input, &schema());
    assert_eq!(out["text"], Value::Null);
    assert_eq!(out["extra"], json!([1]));
    assert!(!out.contains_key("n"));
}

#[test]
fn normalizing_twice_is_a_no_op() {
    let input = row(json!({"text": {"a": [1, 2]}, "n": 4.0, "f": 1, "b": false}));
    let once = normalize(&input, &schema());
    let twice = normalize(once.as_row(), &schema());
    assert_eq!(once, twice);
}

#[test]
fn input_row_is_not_mutated() {
    let input = row(json!({"text": [1, 2]}));
    let before = input.clone();
    let _ = normalize(&input, &schema());
    assert_eq!(input, before);
}

#[test]
fn field_order_is_preserved() {
    let input = row(json!({"b": true, "text": [1], "n": 1}));
    let out = normalize(&input, &schema());
    let keys: Vec<&String> = out.keys().collect();
    assert_eq!(keys, vec!["b", "text", "n"]);
}

#[test]
fn integers_beyond_i64_are_not_clamped() {
    let big = json!(9_223_372_036_854_775_808_u64);
    let out = normalize(&row(json!({"n": big.clone()})), &schema());
    assert_eq!(out["n"], big);
    assert!(!out["n"].is_i64());

    let out = normalize(&row(json!({"n": 9.223_372_036_854_776e18})), &schema());
    assert!(out["n"].is_f64());

    let out = normalize(&row(json!({"n": -9.223_372_036_854_775_808e18})), &schema());
    assert_eq!(out["n"], json!(i64::MIN));
}
