//! End-to-end tests for compiled feature filters.

use feature_filter::{compile_filter, FeatureFilter, FilterError};
use serde_json::{json, Value as JsonValue};
use style_expression::{
    CanonicalTileId, EvaluationContext, Feature, GeometryType, GlobalProperties, Point, Value,
    ValueMap,
};

fn compile(raw: JsonValue) -> FeatureFilter {
    compile_filter(&raw).unwrap_or_else(|e| panic!("compile({}) failed: {}", raw, e))
}

fn passes(filter: &FeatureFilter, feature: &Feature) -> bool {
    filter.evaluate(&EvaluationContext::default().with_feature(feature))
}

fn point() -> Feature {
    Feature::new(GeometryType::Point)
}

#[test]
fn test_legacy_equality() {
    let filter = compile(json!(["==", "class", "river"]));
    assert!(!filter.needs_geometry());
    assert!(passes(&filter, &point().with_property("class", "river")));
    assert!(!passes(&filter, &point().with_property("class", "lake")));
    assert!(!passes(&filter, &point()));

    let filter = compile(json!(["!=", "class", "river"]));
    assert!(!passes(&filter, &point().with_property("class", "river")));
    assert!(passes(&filter, &point()));
}

#[test]
fn test_legacy_id_membership() {
    let filter = compile(json!(["in", "$id", 1, 2, 3]));
    for id in [1.0, 2.0, 3.0] {
        assert!(passes(&filter, &point().with_id(id)), "id {}", id);
    }
    assert!(!passes(&filter, &point().with_id(4.0)));
    assert!(!passes(&filter, &point().with_id("1")));
    assert!(!passes(&filter, &point()));
}

#[test]
fn test_null_filter_accepts_everything() {
    let filter = compile(json!(null));
    assert!(!filter.needs_geometry());
    assert!(filter.global_state_refs().is_empty());
    assert!(filter.evaluate(&EvaluationContext::default()));
    assert!(passes(&filter, &point().with_property("class", "river")));
}

#[test]
fn test_within_without_geometry_is_false() {
    let polygon = json!({
        "type": "Polygon",
        "coordinates": [[[-10, -10], [10, -10], [10, 10], [-10, 10], [-10, -10]]]
    });
    let filter = compile(json!(["within", polygon]));
    assert!(filter.needs_geometry());
    assert!(!passes(&filter, &point()));

    let inside = point().with_geometry(vec![vec![Point::new(4096.0, 4096.0)]]);
    let ctx = EvaluationContext::default()
        .with_feature(&inside)
        .with_canonical(CanonicalTileId::new(0, 0, 0));
    assert!(filter.evaluate(&ctx));
}

#[test]
fn test_needs_geometry_through_branches() {
    let target = json!({"type": "Point", "coordinates": [0, 0]});
    let filter = compile(json!([
        "any",
        ["==", ["get", "class"], "river"],
        ["<", ["distance", target], 1000]
    ]));
    assert!(filter.needs_geometry());
    assert!(!compile(json!(["all", ["==", "a", 1], ["has", "b"]])).needs_geometry());
}

#[test]
fn test_legacy_forms() {
    let river = point().with_property("class", "river").with_property("rank", 2.0);
    let line = Feature::new(GeometryType::LineString).with_property("rank", 7.0);

    let filter = compile(json!(["==", "$type", "LineString"]));
    assert!(!passes(&filter, &river));
    assert!(passes(&filter, &line));

    let filter = compile(json!(["in", "$type", "Point", "Polygon"]));
    assert!(passes(&filter, &river));
    assert!(!passes(&filter, &line));

    let filter = compile(json!(["<", "rank", 5]));
    assert!(passes(&filter, &river));
    assert!(!passes(&filter, &line));
    assert!(!passes(&filter, &point().with_property("rank", "1")));

    let filter = compile(json!(["has", "$type"]));
    assert!(passes(&filter, &river));

    let filter = compile(json!(["!has", "class"]));
    assert!(!passes(&filter, &river));
    assert!(passes(&filter, &line));

    let filter = compile(json!(["none", ["==", "class", "river"], [">", "rank", 5]]));
    assert!(!passes(&filter, &river));
    assert!(!passes(&filter, &line));
    assert!(passes(&filter, &point()));

    let filter = compile(json!(["in", "class"]));
    assert!(!passes(&filter, &river));

    let filter = compile(json!(["any"]));
    assert!(!passes(&filter, &river));
}

#[test]
fn test_expression_filters() {
    let filter = compile(json!(["<", ["zoom"], 5]));
    let f = point();
    let low = EvaluationContext::new(GlobalProperties::at_zoom(3.0)).with_feature(&f);
    let high = EvaluationContext::new(GlobalProperties::at_zoom(8.0)).with_feature(&f);
    assert!(filter.evaluate(&low));
    assert!(!filter.evaluate(&high));

    let filter = compile(json!(["in", ["get", "class"], ["literal", ["river", "canal"]]]));
    assert!(passes(&filter, &point().with_property("class", "canal")));
    assert!(!passes(&filter, &point().with_property("class", "lake")));
}

#[test]
fn test_non_boolean_results_reject() {
    let filter = compile(json!(["get", "flag"]));
    assert!(passes(&filter, &point().with_property("flag", true)));
    assert!(!passes(&filter, &point().with_property("flag", "yes")));
    assert!(!passes(&filter, &point()));
}

#[test]
fn test_arithmetic_on_missing_property_rejects() {
    let filter = compile(json!([">", ["+", ["get", "missing"], 1], 0]));
    assert!(!passes(&filter, &point()));
    assert!(!passes(&filter, &point().with_property("missing", "x")));
    assert!(passes(&filter, &point().with_property("missing", 1.0)));
}

#[test]
fn test_global_state() {
    let filter = compile(json!([
        "all",
        ["==", ["global-state", "mode"], "dark"],
        ["!=", ["global-state", "mode"], "light"],
        ["to-boolean", ["global-state", "mode"]],
        ["to-boolean", ["global-state", "visible"]]
    ]));
    let refs: Vec<&str> = filter.global_state_refs().iter().map(String::as_str).collect();
    assert_eq!(refs, vec!["mode", "visible"]);

    let f = point();
    let mut state = ValueMap::new();
    state.insert("mode".to_string(), Value::from("dark"));
    state.insert("visible".to_string(), Value::Boolean(true));
    let ctx = EvaluationContext::default()
        .with_feature(&f)
        .with_global_state(&state);
    assert!(filter.evaluate(&ctx));

    // Unset variables read as null.
    assert!(!passes(&filter, &f));
}

#[test]
fn test_compile_errors() {
    let err = compile_filter(&json!(["nope", 1])).unwrap_err();
    let FilterError::Compile(inner) = &err;
    assert_eq!(inner.errors()[0].key, "[0]");
    assert!(err.to_string().starts_with("invalid filter: [0]: Unknown expression \"nope\""));

    // Legacy comparisons on `$type` need string values.
    assert!(compile_filter(&json!(["==", "$type", 1])).is_err());
}

#[test]
fn test_filters_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FeatureFilter>();
}
