//! Compiled expressions bound to a property specification.

use crate::analysis::{self, ZOOM_NOT_TOP_LEVEL};
use crate::context::{EvaluationContext, Parameter};
use crate::error::{CompileError, EvalError, EvalResult, ParsingError};
use crate::expression::{Expression, Interpolation};
use crate::parsing_context::{ParsingContext, TypeAnnotation};
use crate::property_spec::{EnumValues, PropertySpecification, PropertyType};
use crate::registry::OperatorRegistry;
use crate::value::Value;
use serde_json::Value as JsonValue;

/// A compiled expression that resolves runtime failures to the property's
/// default value.
#[derive(Debug, Clone)]
pub struct StyleExpression {
    expression: Expression,
    default_value: Value,
    enum_values: Option<EnumValues>,
}

impl StyleExpression {
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// Evaluates without any fallback, validating enum results.
    pub fn evaluate_raw(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let value = self.expression.evaluate(ctx)?;
        if let (Some(values), Value::String(s)) = (&self.enum_values, &value) {
            if !values.contains(s) {
                return Err(EvalError::NotInEnum {
                    allowed: values
                        .names()
                        .iter()
                        .map(|v| JsonValue::from(*v).to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    found: value.to_json_string(),
                });
            }
        }
        Ok(value)
    }

    /// Evaluates for rendering: `null`, NaN and runtime errors all resolve
    /// to the default value.
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Value {
        match self.evaluate_raw(ctx) {
            Ok(Value::Null) => self.default_value.clone(),
            Ok(Value::Number(n)) if n.is_nan() => self.default_value.clone(),
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(%error, "expression evaluation fell back to default");
                self.default_value.clone()
            }
        }
    }
}

/// Compiles `raw`, typed against `spec` when given.
#[tracing::instrument(level = "debug", skip(spec, registry))]
pub fn create_expression(
    raw: &JsonValue,
    spec: Option<&PropertySpecification>,
    registry: &OperatorRegistry,
) -> Result<StyleExpression, CompileError> {
    let mut ctx = ParsingContext::new(registry, spec.map(PropertySpecification::expected_type));
    let annotation = spec
        .filter(|s| s.kind == PropertyType::String)
        .map(|_| TypeAnnotation::Coerce);
    let expression = match ctx.parse_root(raw, annotation) {
        Some(expression) if !ctx.has_errors() => expression,
        _ => {
            let errors = ctx.into_errors();
            tracing::debug!(errors = errors.len(), "expression failed to compile");
            return Err(CompileError(errors));
        }
    };
    Ok(StyleExpression {
        expression,
        default_value: spec
            .and_then(PropertySpecification::default_value)
            .unwrap_or(Value::Null),
        enum_values: spec
            .filter(|s| s.kind == PropertyType::Enum)
            .and_then(|s| s.values.clone()),
    })
}

/// What a property expression depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    /// Neither feature data nor zoom.
    Constant,
    /// Feature data, constant over zoom.
    Source,
    /// A zoom curve, constant over features.
    Camera,
    /// A zoom curve over feature data.
    Composite,
}

/// A style expression validated against the parameters its property
/// allows.
#[derive(Debug, Clone)]
pub struct PropertyExpression {
    kind: ExpressionKind,
    expression: StyleExpression,
    state_dependent: bool,
    zoom_stops: Vec<f64>,
    interpolation: Option<Interpolation>,
}

impl PropertyExpression {
    pub fn kind(&self) -> ExpressionKind {
        self.kind
    }

    pub fn style_expression(&self) -> &StyleExpression {
        &self.expression
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Value {
        self.expression.evaluate(ctx)
    }

    pub fn is_state_dependent(&self) -> bool {
        self.state_dependent
    }

    /// Stop inputs of the zoom curve; empty for zoom-constant kinds.
    pub fn zoom_stops(&self) -> &[f64] {
        &self.zoom_stops
    }

    pub fn is_interpolated(&self) -> bool {
        self.interpolation.is_some()
    }

    /// Interpolation position of `input` between two zoom stops. Step curves
    /// always report zero.
    pub fn interpolation_factor(&self, input: f64, lower: f64, upper: f64) -> f64 {
        self.interpolation
            .map_or(0.0, |i| i.factor(input, lower, upper))
    }
}

fn rejected(message: &str) -> CompileError {
    CompileError(vec![ParsingError::new("", message)])
}

/// Compiles `raw` for a property and classifies it.
#[tracing::instrument(level = "debug", skip(spec, registry))]
pub fn create_property_expression(
    raw: &JsonValue,
    spec: &PropertySpecification,
    registry: &OperatorRegistry,
) -> Result<PropertyExpression, CompileError> {
    let expression = create_expression(raw, Some(spec), registry)?;
    let parsed = expression.expression();

    let feature_constant = analysis::is_feature_constant(parsed);
    if !feature_constant && !spec.allows(Parameter::Feature) {
        return Err(rejected("data expressions not supported"));
    }
    let state_constant = analysis::is_state_constant(parsed);
    if !state_constant && !spec.allows(Parameter::FeatureState) {
        return Err(rejected(
            "\"feature-state\" data expressions are not supported with this property",
        ));
    }
    let zoom_constant = analysis::is_global_property_constant(parsed, &[Parameter::Zoom]);
    if !zoom_constant && !spec.allows(Parameter::Zoom) {
        return Err(rejected("zoom expressions not supported"));
    }

    let curve = analysis::find_zoom_curve(parsed).map_err(|e| rejected(&e))?;
    let (zoom_stops, interpolation) = match curve {
        None if !zoom_constant => return Err(rejected(ZOOM_NOT_TOP_LEVEL)),
        None => (Vec::new(), None),
        Some(Expression::Interpolate(_)) if !spec.interpolated() => {
            return Err(rejected(
                "\"interpolate\" expressions cannot be used with this property",
            ));
        }
        Some(Expression::Interpolate(i)) => (i.labels.clone(), Some(i.interpolation)),
        Some(Expression::Step(s)) => (s.labels.clone(), None),
        Some(_) => (Vec::new(), None),
    };

    let kind = match (curve.is_some(), feature_constant) {
        (false, true) => ExpressionKind::Constant,
        (false, false) => ExpressionKind::Source,
        (true, true) => ExpressionKind::Camera,
        (true, false) => ExpressionKind::Composite,
    };
    tracing::debug!(?kind, "property expression classified");
    Ok(PropertyExpression {
        kind,
        state_dependent: !state_constant,
        zoom_stops,
        interpolation,
        expression,
    })
}
