use super::Expression;
use crate::color::{validate_rgba, Color};
use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::parsing_context::ParsingContext;
use crate::types::Type;
use crate::value::Value;
use serde_json::Value as JsonValue;

/// Runtime conversion to `boolean`, `number`, `string` or `color`.
#[derive(Debug, Clone)]
pub struct Coercion {
    pub ty: Type,
    pub args: Vec<Expression>,
}

impl Coercion {
    pub fn new(ty: Type, args: Vec<Expression>) -> Self {
        Coercion { ty, args }
    }

    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        match self.ty {
            Type::Boolean => Ok(Value::Boolean(self.first(ctx)?.is_truthy())),
            Type::Color => self.to_color(ctx).map(Value::Color),
            Type::Number => self.to_number(ctx).map(Value::Number),
            _ => Ok(Value::String(self.first(ctx)?.to_display_string())),
        }
    }

    fn first(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        match self.args.first() {
            Some(arg) => arg.evaluate(ctx),
            None => Ok(Value::Null),
        }
    }

    fn to_color(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Color> {
        let mut input = Value::Null;
        let mut error = None;
        for arg in &self.args {
            input = arg.evaluate(ctx)?;
            error = None;
            match &input {
                Value::Color(c) => return Ok(*c),
                Value::String(s) => {
                    if let Some(c) = Color::parse(s) {
                        return Ok(c);
                    }
                }
                Value::Array(items) => {
                    if items.len() < 3 || items.len() > 4 {
                        error = Some(format!(
                            "Invalid rbga value {}: expected an array containing either three or four numeric values.",
                            input.to_json_string()
                        ));
                    } else {
                        let channel = |i: usize| items.get(i).and_then(Value::as_number);
                        let r = channel(0).unwrap_or(f64::NAN);
                        let g = channel(1).unwrap_or(f64::NAN);
                        let b = channel(2).unwrap_or(f64::NAN);
                        let a = if items.len() == 4 {
                            Some(channel(3).unwrap_or(f64::NAN))
                        } else {
                            None
                        };
                        match validate_rgba(r, g, b, a) {
                            Ok(()) => return Ok(Color::from_rgba8(r, g, b, a.unwrap_or(1.0))),
                            Err(e) => error = Some(e),
                        }
                    }
                }
                _ => {}
            }
        }
        Err(EvalError::InvalidColor(error.unwrap_or_else(|| {
            let shown = match &input {
                Value::String(s) => s.clone(),
                other => other.to_json_string(),
            };
            format!("Could not parse color from value '{}'", shown)
        })))
    }

    fn to_number(&self, ctx: &EvaluationContext<'_>) -> EvalResult<f64> {
        let mut value = Value::Null;
        for arg in &self.args {
            value = arg.evaluate(ctx)?;
            if value.is_null() {
                return Ok(0.0);
            }
            let n = to_number(&value);
            if !n.is_nan() {
                return Ok(n);
            }
        }
        Err(EvalError::NotANumber(value.to_json_string()))
    }
}

/// Numeric conversion with JavaScript `Number()` semantics for scalars.
/// Containers and colors do not convert.
pub(crate) fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => parse_numeric_string(s),
        Value::Color(_) | Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn parse_numeric_string(s: &str) -> f64 {
    let s = s.trim();
    match s {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) =>
        {
            s.parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

pub(super) fn parse(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if args.len() < 2 {
        return ctx.error("Expected at least one argument.");
    }
    let ty = match args[0].as_str() {
        Some("to-boolean") => Type::Boolean,
        Some("to-color") => Type::Color,
        Some("to-number") => Type::Number,
        _ => Type::String,
    };
    if matches!(ty, Type::Boolean | Type::String) && args.len() != 2 {
        return ctx.error("Expected one argument.");
    }
    let parsed = super::parse_operands(args, 1, &Type::Value, ctx)?;
    Some(Expression::Coercion(Coercion::new(ty, parsed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings() {
        assert_eq!(to_number(&"  12.5 ".into()), 12.5);
        assert_eq!(to_number(&"".into()), 0.0);
        assert_eq!(to_number(&"-Infinity".into()), f64::NEG_INFINITY);
        assert!(to_number(&"12px".into()).is_nan());
        assert!(to_number(&"nan".into()).is_nan());
        assert_eq!(to_number(&Value::Boolean(true)), 1.0);
    }
}
