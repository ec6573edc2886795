//! Compiled boolean filters over features.

use crate::error::FilterError;
use crate::legacy;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use style_expression::{
    create_expression, global_state_refs, EvaluationContext, OperatorRegistry, Parameter,
    PropertySpecification, PropertyType, StyleExpression, Value,
};

/// The property specification filters are compiled against: a
/// non-interpolated boolean over zoom and feature data, `false` by default.
pub fn filter_spec() -> PropertySpecification {
    PropertySpecification::new(PropertyType::Boolean)
        .with_default(JsonValue::Bool(false))
        .with_parameters(false, vec![Parameter::Zoom, Parameter::Feature])
}

fn standard_registry() -> &'static OperatorRegistry {
    static REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(OperatorRegistry::standard)
}

/// A compiled filter with the static facts callers cache alongside it.
#[derive(Debug, Clone)]
pub struct FeatureFilter {
    expression: StyleExpression,
    needs_geometry: bool,
    global_state_refs: BTreeSet<String>,
}

impl FeatureFilter {
    /// Only a `true` result passes; `null`, non-boolean results and runtime
    /// errors all reject the feature.
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> bool {
        matches!(self.expression.evaluate(ctx), Value::Boolean(true))
    }

    /// Whether evaluation reads decoded feature geometry.
    pub fn needs_geometry(&self) -> bool {
        self.needs_geometry
    }

    /// Names of the global-state variables the filter reads.
    pub fn global_state_refs(&self) -> &BTreeSet<String> {
        &self.global_state_refs
    }

    pub fn expression(&self) -> &StyleExpression {
        &self.expression
    }
}

/// Compiles a legacy or expression filter with the standard operators.
/// `null` compiles to a filter that accepts every feature.
pub fn compile_filter(raw: &JsonValue) -> Result<FeatureFilter, FilterError> {
    compile_filter_with(raw, standard_registry())
}

#[tracing::instrument(level = "debug", skip(registry))]
pub fn compile_filter_with(
    raw: &JsonValue,
    registry: &OperatorRegistry,
) -> Result<FeatureFilter, FilterError> {
    let filter = legacy::normalize(raw);
    let expression = create_expression(&filter, Some(&filter_spec()), registry)?;
    let global_state_refs = global_state_refs(expression.expression());
    Ok(FeatureFilter {
        needs_geometry: needs_geometry(&filter),
        global_state_refs,
        expression,
    })
}

/// Structural scan for `within` and `distance` anywhere in `raw`.
///
/// Works on raw JSON so callers can decide whether to decode geometry
/// before compiling. Both operators survive legacy conversion unchanged, so
/// the answer is the same before and after normalization.
pub fn needs_geometry(raw: &JsonValue) -> bool {
    let JsonValue::Array(items) = raw else {
        return false;
    };
    if matches!(
        items.first().and_then(JsonValue::as_str),
        Some("within" | "distance")
    ) {
        return true;
    }
    items.iter().skip(1).any(needs_geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_needs_geometry() {
        assert!(needs_geometry(&json!(["within", {"type": "Point", "coordinates": [0, 0]}])));
        assert!(needs_geometry(&json!([
            "case",
            ["has", "a"],
            ["<", ["distance", {"type": "Point", "coordinates": [0, 0]}], 10],
            false
        ])));
        assert!(!needs_geometry(&json!(["==", ["get", "within"], "distance"])));
        assert!(!needs_geometry(&json!(null)));
    }

    #[test]
    fn test_filter_spec() {
        let spec = filter_spec();
        assert!(!spec.interpolated());
        assert!(spec.allows(Parameter::Feature));
        assert_eq!(spec.default_value(), Some(Value::Boolean(false)));
    }
}
