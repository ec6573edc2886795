//! `step` and `interpolate`: piecewise functions over numeric stops.

use super::{eval_color, eval_number, Expression};
use crate::color::Color;
use crate::color_spaces::{interpolate_hcl, interpolate_lab};
use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::parsing_context::ParsingContext;
use crate::types::{check_subtype, Type};
use crate::value::Value;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct Step {
    pub ty: Type,
    pub input: Box<Expression>,
    /// Stop inputs; the first is always negative infinity.
    pub labels: Vec<f64>,
    pub outputs: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolation {
    Linear,
    Exponential { base: f64 },
    CubicBezier([f64; 4]),
}

impl Interpolation {
    /// Position of `input` between `lower` and `upper`, in `0..=1` for inputs
    /// inside the range.
    pub fn factor(&self, input: f64, lower: f64, upper: f64) -> f64 {
        match *self {
            Interpolation::Linear => exponential_factor(input, 1.0, lower, upper),
            Interpolation::Exponential { base } => exponential_factor(input, base, lower, upper),
            Interpolation::CubicBezier([x1, y1, x2, y2]) => UnitBezier::new(x1, y1, x2, y2)
                .solve(exponential_factor(input, 1.0, lower, upper), 1e-6),
        }
    }
}

fn exponential_factor(input: f64, base: f64, lower: f64, upper: f64) -> f64 {
    let difference = upper - lower;
    let progress = input - lower;
    if difference == 0.0 {
        0.0
    } else if base == 1.0 {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}

/// Color space used to blend color outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolateSpace {
    Rgb,
    Hcl,
    Lab,
}

#[derive(Debug, Clone)]
pub struct Interpolate {
    pub ty: Type,
    pub space: InterpolateSpace,
    pub interpolation: Interpolation,
    pub input: Box<Expression>,
    pub labels: Vec<f64>,
    pub outputs: Vec<Expression>,
}

/// Cubic bezier easing through `(0, 0)`, `(x1, y1)`, `(x2, y2)`, `(1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitBezier {
    cx: f64,
    bx: f64,
    ax: f64,
    cy: f64,
    by: f64,
    ay: f64,
}

impl UnitBezier {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let cx = 3.0 * x1;
        let bx = 3.0 * (x2 - x1) - cx;
        let cy = 3.0 * y1;
        let by = 3.0 * (y2 - y1) - cy;
        UnitBezier {
            cx,
            bx,
            ax: 1.0 - cx - bx,
            cy,
            by,
            ay: 1.0 - cy - by,
        }
    }

    fn sample_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_dx(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    fn solve_x(&self, x: f64, epsilon: f64) -> f64 {
        if x < 0.0 {
            return 0.0;
        }
        if x > 1.0 {
            return 1.0;
        }
        // Newton first, bisection when the slope flattens out.
        let mut t = x;
        for _ in 0..8 {
            let dx = self.sample_x(t) - x;
            if dx.abs() < epsilon {
                return t;
            }
            let d = self.sample_dx(t);
            if d.abs() < 1e-6 {
                break;
            }
            t -= dx / d;
        }
        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        for _ in 0..20 {
            let sx = self.sample_x(t);
            if (sx - x).abs() < epsilon {
                break;
            }
            if x > sx {
                lo = t;
            } else {
                hi = t;
            }
            t = (hi - lo) * 0.5 + lo;
        }
        t
    }

    pub fn solve(&self, x: f64, epsilon: f64) -> f64 {
        self.sample_y(self.solve_x(x, epsilon))
    }
}

/// Index of the last label `<= input`.
fn find_stop(labels: &[f64], input: f64) -> usize {
    labels.partition_point(|&l| l <= input).saturating_sub(1)
}

fn locate(labels: &[f64], input: f64) -> EvalResult<usize> {
    if input.is_nan() {
        return Err(EvalError::InputNotANumber);
    }
    Ok(find_stop(labels, input))
}

impl Step {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        if self.labels.len() == 1 {
            return self.outputs[0].evaluate(ctx);
        }
        let value = eval_number(&self.input, ctx)?;
        let last = self.labels.len() - 1;
        if value <= self.labels[0] {
            return self.outputs[0].evaluate(ctx);
        }
        if value >= self.labels[last] {
            return self.outputs[last].evaluate(ctx);
        }
        let index = locate(&self.labels, value)?;
        self.outputs[index].evaluate(ctx)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Blends premultiplied channels, then divides by the blended alpha.
fn lerp_color(a: &Color, b: &Color, t: f64) -> Color {
    let alpha = lerp(a.a, b.a, t);
    if alpha == 0.0 {
        return Color::TRANSPARENT;
    }
    let channel = |x: f64, y: f64| lerp(x * a.a, y * b.a, t) / alpha;
    Color::new(channel(a.r, b.r), channel(a.g, b.g), channel(a.b, b.b), alpha)
}

impl Interpolate {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        if self.labels.len() == 1 {
            return self.outputs[0].evaluate(ctx);
        }
        let value = eval_number(&self.input, ctx)?;
        let last = self.labels.len() - 1;
        if value <= self.labels[0] {
            return self.outputs[0].evaluate(ctx);
        }
        if value >= self.labels[last] {
            return self.outputs[last].evaluate(ctx);
        }
        let index = locate(&self.labels, value)?;
        let (lower, upper) = (self.labels[index], self.labels[index + 1]);
        let t = self.interpolation.factor(value, lower, upper);
        let (from, to) = (&self.outputs[index], &self.outputs[index + 1]);

        match &self.ty {
            Type::Color => {
                let (a, b) = (eval_color(from, ctx)?, eval_color(to, ctx)?);
                let blended = match self.space {
                    InterpolateSpace::Rgb => lerp_color(&a, &b, t),
                    InterpolateSpace::Hcl => interpolate_hcl(&a, &b, t),
                    InterpolateSpace::Lab => interpolate_lab(&a, &b, t),
                };
                Ok(Value::Color(blended))
            }
            Type::Array { .. } => {
                let a = from.evaluate(ctx)?;
                let b = to.evaluate(ctx)?;
                let (Some(a), Some(b)) = (a.as_array(), b.as_array()) else {
                    return Err(EvalError::NotInterpolatable("non-array values".into()));
                };
                if a.len() != b.len() {
                    return Err(EvalError::ArrayLengthMismatch {
                        from: a.len(),
                        to: b.len(),
                    });
                }
                a.iter()
                    .zip(b)
                    .map(|(x, y)| match (x.as_number(), y.as_number()) {
                        (Some(x), Some(y)) => Ok(Value::Number(lerp(x, y, t))),
                        _ => Err(EvalError::NotInterpolatable(
                            "non-numeric array items".into(),
                        )),
                    })
                    .collect::<EvalResult<Vec<_>>>()
                    .map(Value::Array)
            }
            _ => {
                let (a, b) = (eval_number(from, ctx)?, eval_number(to, ctx)?);
                Ok(Value::Number(lerp(a, b, t)))
            }
        }
    }
}

fn check_even_stops(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> bool {
    let operands = args.len() - 1;
    if operands < 4 {
        ctx.error(format!(
            "Expected at least 4 arguments, but found only {}.",
            operands
        ));
        return false;
    }
    if operands % 2 != 0 {
        ctx.error("Expected an even number of arguments.");
        return false;
    }
    true
}

/// Parses `label, output` pairs starting at `first`. Labels must be
/// strictly ascending numeric literals.
fn parse_stops(
    args: &[JsonValue],
    first: usize,
    name: &str,
    mut output: Option<Type>,
    labels: &mut Vec<f64>,
    outputs: &mut Vec<Expression>,
    ctx: &mut ParsingContext<'_>,
) -> Option<Type> {
    for i in (first..args.len()).step_by(2) {
        let Some(label) = args[i].as_f64() else {
            ctx.error_at(
                format!(
                    "Input/output pairs for \"{}\" expressions must be defined using literal numeric values (not computed expressions) for the input values.",
                    name
                ),
                &[i],
            );
            return None;
        };
        if labels.last().is_some_and(|&prev| prev >= label) {
            ctx.error_at(
                format!(
                    "Input/output pairs for \"{}\" expressions must be arranged with input values in strictly ascending order.",
                    name
                ),
                &[i],
            );
            return None;
        }
        let parsed = ctx.parse(&args[i + 1], i + 1, output.clone())?;
        output.get_or_insert_with(|| parsed.ty().clone());
        labels.push(label);
        outputs.push(parsed);
    }
    output
}

pub(super) fn parse_step(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if !check_even_stops(args, ctx) {
        return None;
    }
    let input = ctx.parse(&args[1], 1, Some(Type::Number))?;
    let declared = ctx.expected_type().filter(|t| !t.is_value()).cloned();

    let mut labels = vec![f64::NEG_INFINITY];
    let first = ctx.parse(&args[2], 2, declared.clone())?;
    let output = declared.unwrap_or_else(|| first.ty().clone());
    let mut outputs = vec![first];
    let ty = parse_stops(args, 3, "step", Some(output), &mut labels, &mut outputs, ctx)?;

    Some(Expression::Step(Step {
        ty,
        input: Box::new(input),
        labels,
        outputs,
    }))
}

fn parse_interpolation(raw: &JsonValue, ctx: &mut ParsingContext<'_>) -> Option<Interpolation> {
    let items = match raw {
        JsonValue::Array(items) if !items.is_empty() => items,
        _ => {
            ctx.error_at("Expected an interpolation type expression.", &[1]);
            return None;
        }
    };
    match items[0].as_str() {
        Some("linear") => Some(Interpolation::Linear),
        Some("exponential") => match items.get(1).and_then(JsonValue::as_f64) {
            Some(base) => Some(Interpolation::Exponential { base }),
            None => {
                ctx.error_at("Exponential interpolation requires a numeric base.", &[1, 1]);
                None
            }
        },
        Some("cubic-bezier") => {
            let points: Vec<f64> = items[1..]
                .iter()
                .filter_map(JsonValue::as_f64)
                .filter(|t| (0.0..=1.0).contains(t))
                .collect();
            if items.len() != 5 || points.len() != 4 {
                ctx.error_at(
                    "Cubic bezier interpolation requires four numeric arguments with values between 0 and 1.",
                    &[1],
                );
                return None;
            }
            Some(Interpolation::CubicBezier([points[0], points[1], points[2], points[3]]))
        }
        _ => {
            let shown = match &items[0] {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            ctx.error_at(format!("Unknown interpolation type {}", shown), &[1, 0]);
            None
        }
    }
}

/// Numbers, colors and number arrays of a fixed length.
fn is_interpolatable(t: &Type) -> bool {
    match t {
        Type::Array { item, len: Some(_) } => check_subtype(&Type::Number, item).is_none(),
        Type::Array { .. } => false,
        _ => [Type::Number, Type::Color]
            .iter()
            .any(|expected| check_subtype(expected, t).is_none()),
    }
}

pub(super) fn parse_interpolate(
    args: &[JsonValue],
    ctx: &mut ParsingContext<'_>,
) -> Option<Expression> {
    if args.len() < 2 {
        return ctx.error_at("Expected an interpolation type expression.", &[1]);
    }
    let interpolation = parse_interpolation(&args[1], ctx)?;
    if !check_even_stops(args, ctx) {
        return None;
    }
    let input = ctx.parse(&args[2], 2, Some(Type::Number))?;

    let space = match args[0].as_str() {
        Some("interpolate-hcl") => InterpolateSpace::Hcl,
        Some("interpolate-lab") => InterpolateSpace::Lab,
        _ => InterpolateSpace::Rgb,
    };
    let declared = match space {
        InterpolateSpace::Rgb => ctx.expected_type().filter(|t| !t.is_value()).cloned(),
        _ => Some(Type::Color),
    };

    let mut labels = Vec::new();
    let mut outputs = Vec::new();
    let name = args[0].as_str().unwrap_or("interpolate");
    let ty = parse_stops(args, 3, name, declared, &mut labels, &mut outputs, ctx)?;
    if !is_interpolatable(&ty) {
        return ctx.error(format!("Type {} is not interpolatable.", ty));
    }

    Some(Expression::Interpolate(Interpolate {
        ty,
        space,
        interpolation,
        input: Box::new(input),
        labels,
        outputs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Literal;

    #[test]
    fn finds_bracketing_stop() {
        let labels = [f64::NEG_INFINITY, 0.0, 10.0, 20.0];
        assert_eq!(find_stop(&labels, 5.0), 1);
        assert_eq!(find_stop(&labels, 10.0), 2);
        assert_eq!(find_stop(&labels, -3.0), 0);
        assert_eq!(find_stop(&labels, 25.0), 3);
    }

    #[test]
    fn exponential_factor_matches_linear_for_base_one() {
        assert_eq!(exponential_factor(5.0, 1.0, 0.0, 10.0), 0.5);
        let t = exponential_factor(5.0, 2.0, 0.0, 10.0);
        assert!((t - (2f64.powi(5) - 1.0) / (2f64.powi(10) - 1.0)).abs() < 1e-12);
        assert_eq!(exponential_factor(3.0, 2.0, 3.0, 3.0), 0.0);
    }

    #[test]
    fn bezier_end_points() {
        let ease = UnitBezier::new(0.42, 0.0, 0.58, 1.0);
        assert!(ease.solve(0.0, 1e-6).abs() < 1e-6);
        assert!((ease.solve(1.0, 1e-6) - 1.0).abs() < 1e-6);
        assert!((ease.solve(0.5, 1e-6) - 0.5).abs() < 1e-3);
        let linear = UnitBezier::new(0.0, 0.0, 1.0, 1.0);
        assert!((linear.solve(0.25, 1e-6) - 0.25).abs() < 1e-4);
    }

    #[test]
    fn only_fixed_length_number_arrays_interpolate() {
        assert!(is_interpolatable(&Type::Number));
        assert!(is_interpolatable(&Type::Color));
        assert!(is_interpolatable(&Type::array(Type::Number, Some(2))));
        assert!(!is_interpolatable(&Type::array(Type::Number, None)));
        assert!(!is_interpolatable(&Type::array(Type::String, Some(2))));
        assert!(!is_interpolatable(&Type::String));
    }

    #[test]
    fn color_blend_is_premultiplied() {
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let half = lerp_color(&red, &Color::TRANSPARENT, 0.5);
        assert_eq!(half, Color::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(lerp_color(&Color::TRANSPARENT, &Color::TRANSPARENT, 0.3), Color::TRANSPARENT);
    }

    fn number_array(items: &[f64]) -> Expression {
        let value = Value::Array(items.iter().map(|n| Value::Number(*n)).collect());
        Expression::Literal(Literal::new(
            Type::array(Type::Number, Some(items.len())),
            value,
        ))
    }

    #[test]
    fn array_outputs_of_different_lengths_fail() {
        let curve = Interpolate {
            ty: Type::array(Type::Number, Some(2)),
            space: InterpolateSpace::Rgb,
            interpolation: Interpolation::Linear,
            input: Box::new(Expression::Literal(Literal::new(Type::Number, Value::Number(5.0)))),
            labels: vec![0.0, 10.0],
            outputs: vec![number_array(&[0.0, 10.0]), number_array(&[10.0, 20.0, 30.0])],
        };
        let ctx = EvaluationContext::default();
        assert_eq!(
            curve.evaluate(&ctx),
            Err(EvalError::ArrayLengthMismatch { from: 2, to: 3 })
        );
    }

    #[test]
    fn nan_input_has_its_own_error() {
        assert_eq!(locate(&[0.0, 1.0], f64::NAN), Err(EvalError::InputNotANumber));
    }
}
