//! Integration tests for compiling and evaluating style expressions.

use serde_json::{json, Value as JsonValue};
use style_expression::property_spec::{PropertySpecification, PropertyType};
use style_expression::{
    create_expression, CanonicalTileId, EvalError, EvaluationContext, Feature, GeometryType,
    GlobalProperties, OperatorRegistry, Point, Value, ValueMap,
};

/// Routes the crate's debug events to the test output.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

fn properties(json: JsonValue) -> ValueMap {
    match Value::from(json) {
        Value::Object(map) => map,
        Value::Null => ValueMap::new(),
        other => panic!("expected an object, got {:?}", other),
    }
}

fn feature(props: JsonValue) -> Feature {
    Feature::new(GeometryType::Point).with_properties(properties(props))
}

fn eval_with(expression: &JsonValue, ctx: &EvaluationContext<'_>) -> Result<JsonValue, String> {
    let registry = OperatorRegistry::standard();
    let compiled = create_expression(expression, None, &registry)
        .unwrap_or_else(|e| panic!("compile({}) failed: {}", expression, e));
    compiled
        .evaluate_raw(ctx)
        .map(|v| v.to_json())
        .map_err(|e| e.to_string())
}

fn check(expression: JsonValue, expected: JsonValue, props: JsonValue) {
    let f = feature(props);
    let ctx = EvaluationContext::default().with_feature(&f);
    let result = eval_with(&expression, &ctx)
        .unwrap_or_else(|e| panic!("evaluate({}) failed: {}", expression, e));
    assert_eq!(result, expected, "expression: {}", expression);
}

fn check_approx(expression: JsonValue, expected: f64, props: JsonValue) {
    let f = feature(props);
    let ctx = EvaluationContext::default().with_feature(&f);
    let result = eval_with(&expression, &ctx)
        .unwrap_or_else(|e| panic!("evaluate({}) failed: {}", expression, e));
    let n = result.as_f64().unwrap_or_else(|| panic!("not a number: {}", result));
    assert!((n - expected).abs() < 1e-9, "{} evaluated to {}", expression, n);
}

fn check_err(expression: JsonValue, props: JsonValue) -> String {
    let f = feature(props);
    let ctx = EvaluationContext::default().with_feature(&f);
    eval_with(&expression, &ctx)
        .err()
        .unwrap_or_else(|| panic!("expected error for {}", expression))
}

// ----------------------------------------------------------------- Arithmetic

#[test]
fn test_arithmetic() {
    check(json!(["+", 1, 2]), json!(3), json!(null));
    check(json!(["+", 1, 2, 3, 4]), json!(10), json!(null));
    check(json!(["*", 2, ["+", 1, 1]]), json!(4), json!(null));
    check(json!(["-", 5]), json!(-5), json!(null));
    check(json!(["-", 5, 7]), json!(-2), json!(null));
    check(json!(["/", 1, 4]), json!(0.25), json!(null));
    check(json!(["%", 7, 3]), json!(1), json!(null));
    check(json!(["^", 2, 10]), json!(1024), json!(null));
}

#[test]
fn test_math_functions() {
    check(json!(["min", 3, 1, 2]), json!(1), json!(null));
    check(json!(["max", 3, 1, 2]), json!(3), json!(null));
    check(json!(["abs", -4]), json!(4), json!(null));
    check(json!(["sqrt", 16]), json!(4), json!(null));
    check(json!(["floor", 1.7]), json!(1), json!(null));
    check(json!(["ceil", 1.2]), json!(2), json!(null));
    check(json!(["round", 2.5]), json!(3), json!(null));
    check(json!(["round", -2.5]), json!(-3), json!(null));
    check_approx(json!(["pi"]), std::f64::consts::PI, json!(null));
    check_approx(json!(["ln", ["e"]]), 1.0, json!(null));
    check_approx(json!(["log2", 8]), 3.0, json!(null));
}

#[test]
fn test_arithmetic_on_feature_data() {
    check(json!(["*", ["get", "n"], 2]), json!(8), json!({"n": 4}));
    let err = check_err(json!(["*", ["get", "n"], 2]), json!({"n": "x"}));
    assert_eq!(
        err,
        "Expected value to be of type number, but found string instead."
    );
}

#[test]
fn test_arithmetic_on_missing_property() {
    let raw = json!(["+", ["get", "missing"], 1]);
    let err = check_err(raw.clone(), json!({}));
    assert_eq!(err, "Expected value to be of type number, but found null instead.");

    let registry = OperatorRegistry::standard();
    let spec = PropertySpecification::new(PropertyType::Number).with_default(json!(7));
    let expr = create_expression(&raw, Some(&spec), &registry).unwrap();
    let f = feature(json!({}));
    let ctx = EvaluationContext::default().with_feature(&f);
    assert!(matches!(
        expr.evaluate_raw(&ctx),
        Err(EvalError::TypeMismatch { .. })
    ));
    assert_eq!(expr.evaluate(&ctx), Value::Number(7.0));
}

// ----------------------------------------------------------------- Feature data

#[test]
fn test_get_and_has() {
    check(json!(["get", "a"]), json!(5), json!({"a": 5}));
    check(json!(["get", "missing"]), json!(null), json!({"a": 5}));
    check(json!(["has", "a"]), json!(true), json!({"a": null}));
    check(json!(["has", "b"]), json!(false), json!({"a": null}));
    check(
        json!(["get", "k", ["literal", {"k": "v"}]]),
        json!("v"),
        json!(null),
    );
    check(json!(["properties"]), json!({"a": 1, "b": "x"}), json!({"a": 1, "b": "x"}));
}

#[test]
fn test_feature_metadata() {
    let f = Feature::new(GeometryType::LineString).with_id(7.0);
    let ctx = EvaluationContext::default().with_feature(&f);
    assert_eq!(eval_with(&json!(["id"]), &ctx), Ok(json!(7)));
    assert_eq!(eval_with(&json!(["geometry-type"]), &ctx), Ok(json!("LineString")));

    let no_id = Feature::new(GeometryType::Point);
    let ctx = EvaluationContext::default().with_feature(&no_id);
    assert_eq!(eval_with(&json!(["id"]), &ctx), Ok(json!(null)));
}

#[test]
fn test_feature_state_and_globals() {
    let state = properties(json!({"hover": true}));
    let ctx = EvaluationContext::new(GlobalProperties::at_zoom(5.0)).with_feature_state(&state);
    assert_eq!(eval_with(&json!(["feature-state", "hover"]), &ctx), Ok(json!(true)));
    assert_eq!(eval_with(&json!(["feature-state", "other"]), &ctx), Ok(json!(null)));
    assert_eq!(eval_with(&json!(["zoom"]), &ctx), Ok(json!(5)));
    assert_eq!(eval_with(&json!(["heatmap-density"]), &ctx), Ok(json!(0)));
    assert_eq!(eval_with(&json!(["accumulated"]), &ctx), Ok(json!(null)));
}

#[test]
fn test_global_state() {
    let globals = properties(json!({"theme": "dark"}));
    let ctx = EvaluationContext::default().with_global_state(&globals);
    assert_eq!(eval_with(&json!(["global-state", "theme"]), &ctx), Ok(json!("dark")));
    assert_eq!(eval_with(&json!(["global-state", "unset"]), &ctx), Ok(json!(null)));

    let bare = EvaluationContext::default();
    assert_eq!(eval_with(&json!(["global-state", "theme"]), &bare), Ok(json!(null)));
}

// ----------------------------------------------------------------- Strings

#[test]
fn test_strings() {
    check(json!(["upcase", "abc"]), json!("ABC"), json!(null));
    check(json!(["downcase", "AbC"]), json!("abc"), json!(null));
    check(json!(["concat", "a", 1, true, null]), json!("a1true"), json!(null));
    check(json!(["concat", "n=", ["get", "n"]]), json!("n=1.5"), json!({"n": 1.5}));
    check(json!(["typeof", ["get", "a"]]), json!("array<number, 2>"), json!({"a": [1, 2]}));
    check(json!(["typeof", ["get", "a"]]), json!("string"), json!({"a": "x"}));
}

// ----------------------------------------------------------------- Types

#[test]
fn test_assertions_and_coercions() {
    check(json!(["number", ["get", "a"], 0]), json!(3), json!({"a": 3}));
    check(json!(["number", ["get", "a"], 0]), json!(0), json!({"a": "x"}));
    check(json!(["to-number", ["get", "a"]]), json!(12), json!({"a": "12"}));
    check(json!(["to-number", ["get", "a"]]), json!(0), json!({"a": null}));
    check(json!(["to-boolean", ["get", "a"]]), json!(false), json!({"a": ""}));
    check(json!(["to-string", ["get", "a"]]), json!("1.5"), json!({"a": 1.5}));
    let err = check_err(json!(["to-number", ["get", "a"]]), json!({"a": "abc"}));
    assert!(err.contains("Could not convert"), "got: {}", err);
    let err = check_err(json!(["string", ["get", "a"]]), json!({"a": 1}));
    assert_eq!(err, "Expected value to be of type string, but found number instead.");
}

#[test]
fn test_colors() {
    check(json!(["to-rgba", ["rgb", 255, 0, 0]]), json!([255, 0, 0, 1]), json!(null));
    check(json!(["to-rgba", ["to-color", "#00ff00"]]), json!([0, 255, 0, 1]), json!(null));
    check(
        json!(["to-string", ["rgba", 0, 0, 255, 0.5]]),
        json!("rgba(0,0,255,0.5)"),
        json!(null),
    );
    let err = check_err(json!(["to-color", ["get", "c"]]), json!({"c": "nope"}));
    assert_eq!(err, "Could not parse color from value 'nope'");
}

// ----------------------------------------------------------------- Control flow

#[test]
fn test_case_match_coalesce() {
    let case = json!(["case", [">", ["get", "x"], 5], "big", "small"]);
    check(case.clone(), json!("big"), json!({"x": 10}));
    check(case, json!("small"), json!({"x": 1}));

    let m = json!(["match", ["get", "k"], ["a", "b"], 1, "c", 2, 0]);
    check(m.clone(), json!(1), json!({"k": "b"}));
    check(m.clone(), json!(2), json!({"k": "c"}));
    check(m, json!(0), json!({"k": "z"}));

    check(
        json!(["coalesce", ["get", "missing"], ["get", "x"]]),
        json!(3),
        json!({"x": 3}),
    );
}

#[test]
fn test_let_var() {
    check(
        json!(["let", "v", 2, ["*", ["var", "v"], ["get", "x"]]]),
        json!(8),
        json!({"x": 4}),
    );
}

#[test]
fn test_logic() {
    check(json!(["all", true, ["get", "b"]]), json!(false), json!({"b": false}));
    check(json!(["any", false, ["get", "b"]]), json!(true), json!({"b": true}));
    check(json!(["!", ["get", "b"]]), json!(false), json!({"b": true}));
    check(json!(["all"]), json!(true), json!(null));
    check(json!(["any"]), json!(false), json!(null));
    // Short-circuits before the failing operand.
    check(json!(["any", true, ["boolean", ["get", "x"]]]), json!(true), json!({"x": 1}));
}

#[test]
fn test_error_operator() {
    let err = check_err(json!(["error", "boom"]), json!(null));
    assert_eq!(err, "boom");
}

// ----------------------------------------------------------------- Comparison

#[test]
fn test_comparisons() {
    check(json!(["==", ["get", "x"], 1]), json!(true), json!({"x": 1}));
    check(json!(["==", ["get", "x"], 1]), json!(false), json!({"x": "1"}));
    check(json!(["!=", ["get", "x"], 1]), json!(true), json!({}));
    check(json!(["<", ["get", "s"], "b"]), json!(true), json!({"s": "a"}));
    check(json!([">=", ["get", "n"], 3]), json!(true), json!({"n": 3}));
    let err = check_err(json!(["<", ["get", "x"], 1]), json!({"x": "a"}));
    assert_eq!(err, "Expected value to be of type number, but found string instead.");
}

#[test]
fn test_ordering_mixed_runtime_kinds() {
    let registry = OperatorRegistry::standard();
    let expr =
        create_expression(&json!(["<", ["get", "x"], ["get", "y"]]), None, &registry).unwrap();
    let f = feature(json!({"x": 1, "y": "a"}));
    let ctx = EvaluationContext::default().with_feature(&f);
    let err = expr.evaluate_raw(&ctx).unwrap_err();
    assert_eq!(
        err,
        EvalError::NotComparable {
            op: "<",
            lhs: "number",
            rhs: "string"
        }
    );
    assert_eq!(
        err.to_string(),
        "Expected arguments for \"<\" to be (string, string) or (number, number), but found (number, string) instead."
    );
}

// ----------------------------------------------------------------- Collections

#[test]
fn test_collections() {
    check(json!(["at", 1, ["literal", ["a", "b", "c"]]]), json!("b"), json!(null));
    check(json!(["in", "b", ["literal", ["a", "b"]]]), json!(true), json!(null));
    check(json!(["in", "ell", "hello"]), json!(true), json!(null));
    check(json!(["index-of", "c", ["literal", ["a", "b", "c"]]]), json!(2), json!(null));
    check(json!(["index-of", "z", ["literal", ["a", "b", "c"]]]), json!(-1), json!(null));
    check(json!(["slice", ["literal", [1, 2, 3, 4]], 1, 3]), json!([2, 3]), json!(null));
    check(json!(["slice", "hello", 1]), json!("ello"), json!(null));
    check(json!(["length", "abc"]), json!(3), json!(null));
    check(json!(["length", ["get", "a"]]), json!(2), json!({"a": [1, 2]}));

    let err = check_err(json!(["at", ["get", "i"], ["literal", [1, 2, 3]]]), json!({"i": 5}));
    assert_eq!(err, "Array index out of bounds: 5 > 2.");
}

// ----------------------------------------------------------------- Curves

#[test]
fn test_step() {
    let step = json!(["step", ["get", "x"], "a", 10, "b", 20, "c"]);
    check(step.clone(), json!("a"), json!({"x": 5}));
    check(step.clone(), json!("b"), json!({"x": 10}));
    check(step.clone(), json!("b"), json!({"x": 15}));
    check(step, json!("c"), json!({"x": 25}));
}

#[test]
fn test_interpolate() {
    let linear = json!(["interpolate", ["linear"], ["get", "x"], 0, 0, 10, 100]);
    check_approx(linear.clone(), 25.0, json!({"x": 2.5}));
    check_approx(linear.clone(), 0.0, json!({"x": -5}));
    check_approx(linear, 100.0, json!({"x": 50}));

    let exponential = json!(["interpolate", ["exponential", 2], ["get", "x"], 0, 0, 2, 3]);
    check_approx(exponential, 1.0, json!({"x": 1}));

    let arrays = json!([
        "interpolate", ["linear"], ["get", "x"],
        0, ["literal", [0, 10]],
        10, ["literal", [10, 20]]
    ]);
    check(arrays, json!([5, 15]), json!({"x": 5}));

    let fixed = json!([
        "interpolate", ["linear"], ["get", "x"],
        0, ["array", "number", 3, ["get", "a"]],
        10, ["array", "number", 3, ["get", "b"]]
    ]);
    check(
        fixed.clone(),
        json!([5, 5, 10]),
        json!({"x": 5, "a": [0, 10, 0], "b": [10, 0, 20]}),
    );
    let err = check_err(fixed, json!({"x": 5, "a": [0, 10], "b": [10, 0, 20]}));
    assert_eq!(
        err,
        "Expected value to be of type array<number, 3>, but found array<number, 2> instead."
    );
}

#[test]
fn test_interpolate_colors() {
    let registry = OperatorRegistry::standard();
    let spec = PropertySpecification::new(PropertyType::Color);
    let rgb = create_expression(
        &json!(["interpolate", ["linear"], ["get", "x"], 0, "#000000", 10, "#ffffff"]),
        Some(&spec),
        &registry,
    )
    .unwrap();
    let f = feature(json!({"x": 5}));
    let ctx = EvaluationContext::default().with_feature(&f);
    assert_eq!(rgb.evaluate(&ctx).to_json(), json!("rgba(128,128,128,1)"));

    let hcl = create_expression(
        &json!(["interpolate-hcl", ["linear"], ["get", "x"], 0, "red", 10, "blue"]),
        Some(&spec),
        &registry,
    )
    .unwrap();
    let f = feature(json!({"x": 0}));
    let ctx = EvaluationContext::default().with_feature(&f);
    assert_eq!(hcl.evaluate(&ctx).to_json(), json!("rgba(255,0,0,1)"));

    let fade = create_expression(
        &json!(["to-rgba", [
            "interpolate", ["linear"], ["zoom"], 0, "red", 10, "rgba(0,0,0,0)"
        ]]),
        None,
        &registry,
    )
    .unwrap();
    let ctx = EvaluationContext::new(GlobalProperties::at_zoom(5.0));
    assert_eq!(fade.evaluate(&ctx).to_json(), json!([255, 0, 0, 0.5]));
}

// ----------------------------------------------------------------- Geometry

fn square(half: f64) -> JsonValue {
    json!({
        "type": "Polygon",
        "coordinates": [[[-half, -half], [half, -half], [half, half], [-half, half], [-half, -half]]]
    })
}

#[test]
fn test_within() {
    let center = Feature::new(GeometryType::Point)
        .with_geometry(vec![vec![Point::new(4096.0, 4096.0)]]);
    let corner = Feature::new(GeometryType::Point)
        .with_geometry(vec![vec![Point::new(10.0, 10.0)]]);
    let canonical = CanonicalTileId::new(0, 0, 0);
    let expr = json!(["within", square(10.0)]);

    let ctx = EvaluationContext::default()
        .with_feature(&center)
        .with_canonical(canonical);
    assert_eq!(eval_with(&expr, &ctx), Ok(json!(true)));

    let ctx = EvaluationContext::default()
        .with_feature(&corner)
        .with_canonical(canonical);
    assert_eq!(eval_with(&expr, &ctx), Ok(json!(false)));

    // Without a tile id there is nothing to project.
    let ctx = EvaluationContext::default().with_feature(&center);
    assert_eq!(eval_with(&expr, &ctx), Ok(json!(false)));
}

#[test]
fn test_distance() {
    let center = Feature::new(GeometryType::Point)
        .with_geometry(vec![vec![Point::new(4096.0, 4096.0)]]);
    let canonical = CanonicalTileId::new(0, 0, 0);
    let ctx = EvaluationContext::default()
        .with_feature(&center)
        .with_canonical(canonical);

    let inside = eval_with(&json!(["distance", square(10.0)]), &ctx).unwrap();
    assert_eq!(inside.as_f64(), Some(0.0));

    let point = json!({"type": "Point", "coordinates": [1, 0]});
    let d = eval_with(&json!(["distance", point]), &ctx)
        .unwrap()
        .as_f64()
        .unwrap();
    assert!((d - 111_319.0).abs() < 100.0, "{}", d);

    let ctx = EvaluationContext::default().with_feature(&center);
    assert_eq!(eval_with(&json!(["distance", square(1.0)]), &ctx), Ok(json!(null)));
}

// ----------------------------------------------------------------- Fallbacks

#[test]
fn test_default_value_fallback() {
    init_tracing();
    let registry = OperatorRegistry::standard();
    let spec = PropertySpecification::new(PropertyType::Number).with_default(json!(1));
    let expr = create_expression(&json!(["get", "size"]), Some(&spec), &registry).unwrap();

    let f = feature(json!({"size": 4}));
    let ctx = EvaluationContext::default().with_feature(&f);
    assert_eq!(expr.evaluate(&ctx), Value::Number(4.0));

    let f = feature(json!({"size": "big"}));
    let ctx = EvaluationContext::default().with_feature(&f);
    assert_eq!(expr.evaluate(&ctx), Value::Number(1.0));

    let f = feature(json!({}));
    let ctx = EvaluationContext::default().with_feature(&f);
    assert_eq!(expr.evaluate(&ctx), Value::Number(1.0));
}

#[test]
fn test_enum_values_are_validated() {
    let registry = OperatorRegistry::standard();
    let spec: PropertySpecification = serde_json::from_value(json!({
        "type": "enum",
        "values": ["butt", "round", "square"],
        "default": "butt"
    }))
    .unwrap();
    let expr = create_expression(&json!(["get", "cap"]), Some(&spec), &registry).unwrap();

    let f = feature(json!({"cap": "round"}));
    let ctx = EvaluationContext::default().with_feature(&f);
    assert_eq!(expr.evaluate(&ctx), Value::from("round"));

    let f = feature(json!({"cap": "pointy"}));
    let ctx = EvaluationContext::default().with_feature(&f);
    let err = expr.evaluate_raw(&ctx).unwrap_err().to_string();
    assert_eq!(
        err,
        "Expected value to be one of \"butt\", \"round\", \"square\", but found \"pointy\" instead."
    );
    assert_eq!(expr.evaluate(&ctx), Value::from("butt"));
}
