//! Integration tests for property expression classification.

use serde_json::{json, Value as JsonValue};
use style_expression::{
    create_property_expression, EvaluationContext, ExpressionKind, GlobalProperties,
    OperatorRegistry, PropertyExpression, PropertySpecification, Value,
};

fn data_driven() -> PropertySpecification {
    serde_json::from_value(json!({
        "type": "number",
        "default": 1,
        "expression": {
            "interpolated": true,
            "parameters": ["zoom", "feature", "feature-state"]
        },
        "property-type": "data-driven"
    }))
    .unwrap()
}

fn zoom_only(interpolated: bool) -> PropertySpecification {
    serde_json::from_value(json!({
        "type": "number",
        "default": 0,
        "expression": {"interpolated": interpolated, "parameters": ["zoom"]},
        "property-type": "data-constant"
    }))
    .unwrap()
}

fn create(raw: JsonValue, spec: &PropertySpecification) -> PropertyExpression {
    let registry = OperatorRegistry::standard();
    create_property_expression(&raw, spec, &registry)
        .unwrap_or_else(|e| panic!("create({}) failed: {}", raw, e))
}

fn create_err(raw: JsonValue, spec: &PropertySpecification) -> String {
    let registry = OperatorRegistry::standard();
    create_property_expression(&raw, spec, &registry)
        .err()
        .unwrap_or_else(|| panic!("expected error for {}", raw))
        .errors()[0]
        .message
        .clone()
}

#[test]
fn test_kinds() {
    let spec = data_driven();
    assert_eq!(create(json!(5), &spec).kind(), ExpressionKind::Constant);
    assert_eq!(create(json!(["get", "x"]), &spec).kind(), ExpressionKind::Source);
    assert_eq!(
        create(json!(["interpolate", ["linear"], ["zoom"], 0, 1, 10, 5]), &spec).kind(),
        ExpressionKind::Camera
    );
    assert_eq!(
        create(
            json!(["interpolate", ["linear"], ["zoom"], 0, ["get", "a"], 10, ["get", "b"]]),
            &spec
        )
        .kind(),
        ExpressionKind::Composite
    );
}

#[test]
fn test_zoom_curve_details() {
    let spec = data_driven();
    let camera = create(json!(["interpolate", ["linear"], ["zoom"], 0, 1, 10, 5]), &spec);
    assert_eq!(camera.zoom_stops(), &[0.0, 10.0]);
    assert!(camera.is_interpolated());
    assert_eq!(camera.interpolation_factor(5.0, 0.0, 10.0), 0.5);

    let ctx = EvaluationContext::new(GlobalProperties::at_zoom(5.0));
    assert_eq!(camera.evaluate(&ctx), Value::Number(3.0));

    let step = create(json!(["step", ["zoom"], 0, 5, 1]), &spec);
    assert_eq!(step.kind(), ExpressionKind::Camera);
    assert_eq!(step.zoom_stops(), &[f64::NEG_INFINITY, 5.0]);
    assert!(!step.is_interpolated());
    assert_eq!(step.interpolation_factor(7.0, 5.0, 10.0), 0.0);

    let constant = create(json!(5), &spec);
    assert!(constant.zoom_stops().is_empty());
}

#[test]
fn test_zoom_curve_through_let() {
    let spec = data_driven();
    let expr = create(
        json!(["let", "base", 2, ["interpolate", ["linear"], ["zoom"], 0, ["var", "base"], 10, 4]]),
        &spec,
    );
    assert_eq!(expr.kind(), ExpressionKind::Camera);
}

#[test]
fn test_parameter_restrictions() {
    assert_eq!(
        create_err(json!(["get", "x"]), &zoom_only(true)),
        "data expressions not supported"
    );

    let feature_only: PropertySpecification = serde_json::from_value(json!({
        "type": "number",
        "expression": {"interpolated": false, "parameters": ["feature"]}
    }))
    .unwrap();
    assert_eq!(
        create_err(json!(["zoom"]), &feature_only),
        "zoom expressions not supported"
    );
    assert_eq!(
        create_err(json!(["feature-state", "x"]), &feature_only),
        "\"feature-state\" data expressions are not supported with this property"
    );
}

#[test]
fn test_zoom_placement() {
    let spec = zoom_only(true);
    assert_eq!(
        create_err(json!(["+", ["zoom"], 1]), &spec),
        "\"zoom\" expression may only be used as input to a top-level \"step\" or \"interpolate\" expression."
    );
    assert_eq!(
        create_err(
            json!(["step", ["zoom"], ["step", ["zoom"], 0, 3, 1], 5, 2]),
            &spec
        ),
        "Only one zoom-based \"step\" or \"interpolate\" subexpression may be used in an expression."
    );
    assert_eq!(
        create_err(
            json!(["interpolate", ["linear"], ["zoom"], 0, 0, 10, 1]),
            &zoom_only(false)
        ),
        "\"interpolate\" expressions cannot be used with this property"
    );
    // Step curves are fine without interpolation support.
    let step = create(json!(["step", ["zoom"], 0, 5, 1]), &zoom_only(false));
    assert_eq!(step.kind(), ExpressionKind::Camera);
}

#[test]
fn test_state_dependence() {
    let spec = data_driven();
    assert!(create(json!(["feature-state", "x"]), &spec).is_state_dependent());
    assert!(!create(json!(["get", "x"]), &spec).is_state_dependent());
}
