//! Color construction and decomposition.

use crate::color::{validate_rgba, Color};
use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::expression::{eval_color, eval_number, Expression};
use crate::registry::{CompoundDefinition, Overload, Params};
use crate::types::Type;
use crate::value::Value;

/// Builds a color from 0-255 channels and an optional 0-1 alpha.
fn build(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let r = eval_number(&args[0], ctx)?;
    let g = eval_number(&args[1], ctx)?;
    let b = eval_number(&args[2], ctx)?;
    let a = match args.get(3) {
        Some(alpha) => Some(eval_number(alpha, ctx)?),
        None => None,
    };
    validate_rgba(r, g, b, a).map_err(EvalError::InvalidColor)?;
    Ok(Value::Color(Color::from_rgba8(r, g, b, a.unwrap_or(1.0))))
}

fn to_rgba_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let color = eval_color(&args[0], ctx)?;
    Ok(Value::Array(
        color
            .to_rgba_array()
            .into_iter()
            .map(Value::Number)
            .collect(),
    ))
}

pub fn operators() -> Vec<CompoundDefinition> {
    let n = || Type::Number;
    vec![
        CompoundDefinition::new(
            "rgb",
            Type::Color,
            vec![Overload::new(Params::Fixed(vec![n(), n(), n()]), build)],
        ),
        CompoundDefinition::new(
            "rgba",
            Type::Color,
            vec![Overload::new(Params::Fixed(vec![n(), n(), n(), n()]), build)],
        ),
        CompoundDefinition::new(
            "to-rgba",
            Type::array(Type::Number, Some(4)),
            vec![Overload::new(Params::Fixed(vec![Type::Color]), to_rgba_eval)],
        ),
    ]
}
