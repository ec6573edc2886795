//! Property-based tests for compilation and curve evaluation.

use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};
use style_expression::{
    create_expression, global_state_refs, EvaluationContext, GlobalProperties, OperatorRegistry,
    Value,
};

fn scalar() -> impl Strategy<Value = JsonValue> {
    prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::from),
        (-100i64..100).prop_map(JsonValue::from),
        (-1e3f64..1e3).prop_map(JsonValue::from),
        prop::sample::select(vec!["a", "x", "red", "zoom", "Point", ""]).prop_map(JsonValue::from),
    ]
}

fn operator() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "+", "-", "*", "/", "%", "^", "get", "has", "at", "in", "index-of", "slice", "length",
        "case", "match", "coalesce", "let", "var", "step", "interpolate", "literal", "!", "all",
        "any", "==", "<", "to-string", "to-number", "to-color", "number", "array", "concat",
        "upcase", "rgba", "global-state", "zoom", "nope",
    ])
}

/// Arbitrary expression-shaped JSON: arrays usually start with an operator
/// name, operands are arbitrary.
fn raw_expression() -> impl Strategy<Value = JsonValue> {
    scalar().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            (operator(), prop::collection::vec(inner.clone(), 0..6)).prop_map(|(op, args)| {
                let mut out = vec![JsonValue::from(op)];
                out.extend(args);
                JsonValue::Array(out)
            }),
            prop::collection::vec(inner, 0..4).prop_map(JsonValue::Array),
        ]
    })
}

fn at_zoom(zoom: f64) -> EvaluationContext<'static> {
    EvaluationContext::new(GlobalProperties::at_zoom(zoom))
}

proptest! {
    #[test]
    fn prop_compile_is_total(raw in raw_expression()) {
        let registry = OperatorRegistry::standard();
        if let Ok(expr) = create_expression(&raw, None, &registry) {
            let _ = expr.evaluate_raw(&EvaluationContext::default());
        }
    }

    #[test]
    fn prop_linear_interpolation_stays_between_outputs(
        lo in -1e3f64..1e3,
        hi in -1e3f64..1e3,
        zoom in -5.0f64..30.0,
    ) {
        let registry = OperatorRegistry::standard();
        let raw = json!(["interpolate", ["linear"], ["zoom"], 0, lo, 20, hi]);
        let expr = create_expression(&raw, None, &registry).unwrap();
        let Value::Number(n) = expr.evaluate(&at_zoom(zoom)) else {
            panic!("expected a number");
        };
        let (min, max) = (lo.min(hi), lo.max(hi));
        prop_assert!(n >= min - 1e-9 && n <= max + 1e-9, "{} not in [{}, {}]", n, min, max);
    }

    #[test]
    fn prop_step_selects_the_last_passed_stop(zoom in -5.0f64..30.0) {
        let registry = OperatorRegistry::standard();
        let raw = json!(["step", ["zoom"], "low", 5, "mid", 15, "high"]);
        let expr = create_expression(&raw, None, &registry).unwrap();
        let expected = if zoom < 5.0 {
            "low"
        } else if zoom < 15.0 {
            "mid"
        } else {
            "high"
        };
        prop_assert_eq!(expr.evaluate(&at_zoom(zoom)), Value::from(expected));
    }

    #[test]
    fn prop_global_state_refs_are_distinct_names(
        names in prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 1..8),
    ) {
        let registry = OperatorRegistry::standard();
        let mut raw = vec![json!("coalesce")];
        raw.extend(names.iter().map(|n| json!(["global-state", n])));
        let expr = create_expression(&JsonValue::Array(raw), None, &registry).unwrap();
        let refs: Vec<String> = global_state_refs(expr.expression()).into_iter().collect();

        let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(refs, expected);
    }
}
