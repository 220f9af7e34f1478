use jsonlpq::testing::row;
use jsonlpq::{StatisticsCollector, ValueKind};
use serde_json::json;

#[test]
fn null_counts_without_kind() {
    let mut stats = StatisticsCollector::new();
    stats.observe(&row(json!({"a": null})));
    stats.observe(&row(json!({"a": "x"})));

    let a = stats.field("a").unwrap();
    assert_eq!(a.total_count, 2);
    assert_eq!(a.null_count, 1);
    assert_eq!(a.kinds.total(), 1);
    assert_eq!(a.kinds.get(ValueKind::String), 1);
    assert_eq!(a.kinds.get(ValueKind::Null), 0);
}

#[test]
fn array_elements_are_pooled_across_rows() {
    let mut stats = StatisticsCollector::new();
    stats.observe(&row(json!({"tags": [1, "a"]})));
    stats.observe(&row(json!({"tags": [2.5, null, true]})));

    let tags = stats.field("tags").unwrap();
    assert_eq!(tags.kinds.get(ValueKind::Array), 2);
    assert_eq!(tags.element_kinds.get(ValueKind::Integer), 1);
    assert_eq!(tags.element_kinds.get(ValueKind::String), 1);
    assert_eq!(tags.element_kinds.get(ValueKind::Float), 1);
    assert_eq!(tags.element_kinds.get(ValueKind::Boolean), 1);
    // nulls inside arrays are not element kinds
    assert_eq!(tags.element_kinds.total(), 4);
}

#[test]
fn empty_containers_are_ordinary_observations() {
    let mut stats = StatisticsCollector::new();
    stats.observe(&row(json!({"list": [], "obj": {}})));

    let list = stats.field("list").unwrap();
    assert_eq!(list.kinds.get(ValueKind::Array), 1);
    assert!(list.element_kinds.is_empty());

    let obj = stats.field("obj").unwrap();
    assert_eq!(obj.kinds.get(ValueKind::Object), 1);
    assert_eq!(obj.total_count, 1);
}

#[test]
fn nested_objects_are_not_flattened() {
    let mut stats = StatisticsCollector::new();
    stats.observe(&row(json!({"user": {"id": 1, "name": "x"}})));

    assert_eq!(stats.len(), 1);
    assert!(stats.contains("user"));
    assert!(!stats.contains("id"));
}

#[test]
fn fields_iterate_in_discovery_order() {
    let mut stats = StatisticsCollector::new();
    stats.observe(&row(json!({"z": 1, "b": 2})));
    stats.observe(&row(json!({"a": 3, "z": 4})));

    let names: Vec<&str> = stats.fields().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["z", "b", "a"]);
    assert_eq!(stats.rows_observed(), 2);
}

#[test]
fn integers_and_floats_are_distinct_kinds() {
    let mut stats = StatisticsCollector::new();
    stats.observe(&row(json!({"n": 1})));
    stats.observe(&row(json!({"n": 1.5})));
    stats.observe(&row(json!({"n": u64::MAX})));

    let n = stats.field("n").unwrap();
    assert_eq!(n.kinds.get(ValueKind::Integer), 1);
    // u64::MAX does not fit in i64
    assert_eq!(n.kinds.get(ValueKind::Float), 2);
}

#[test]
fn dominant_kind_breaks_ties_by_rank() {
    let mut stats = StatisticsCollector::new();
    stats.observe(&row(json!({"v": true})));
    stats.observe(&row(json!({"v": 1})));

    assert_eq!(stats.field("v").unwrap().kinds.dominant(), Some(ValueKind::Integer));
}

#[test]
fn numbers_unify_only_when_a_float_was_seen() {
    let mut stats = StatisticsCollector::new();
    stats.observe(&row(json!({"mixed": 1, "ints": 1})));
    stats.observe(&row(json!({"mixed": 2.5, "ints": 2})));

    let mixed = stats.field("mixed").unwrap().kinds.numbers_unified();
    assert_eq!(mixed.get(ValueKind::Float), 2);
    assert_eq!(mixed.get(ValueKind::Integer), 0);
    // raw counts are untouched
    assert_eq!(stats.field("mixed").unwrap().kinds.get(ValueKind::Integer), 1);

    let ints = stats.field("ints").unwrap().kinds.numbers_unified();
    assert_eq!(ints.get(ValueKind::Integer), 2);
}
