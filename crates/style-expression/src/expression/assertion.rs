use super::{type_mismatch, Expression};
use crate::context::EvaluationContext;
use crate::error::EvalResult;
use crate::parsing_context::ParsingContext;
use crate::types::{check_subtype, type_of, Type};
use crate::value::Value;
use serde_json::Value as JsonValue;

/// Runtime type check. Operands are tried in order; the first one whose
/// value has the asserted type wins.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub ty: Type,
    pub args: Vec<Expression>,
}

impl Assertion {
    pub fn new(ty: Type, args: Vec<Expression>) -> Self {
        Assertion { ty, args }
    }

    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let mut last = Value::Null;
        for arg in &self.args {
            let value = arg.evaluate(ctx)?;
            if check_subtype(&self.ty, &type_of(&value)).is_none() {
                return Ok(value);
            }
            last = value;
        }
        Err(type_mismatch(&self.ty, &last))
    }
}

fn scalar_type(name: &str) -> Option<Type> {
    match name {
        "string" => Some(Type::String),
        "number" => Some(Type::Number),
        "boolean" => Some(Type::Boolean),
        "object" => Some(Type::Object),
        _ => None,
    }
}

pub(super) fn parse(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if args.len() < 2 {
        return ctx.error("Expected at least one argument.");
    }
    let name = args[0].as_str().unwrap_or_default();
    let mut first = 1;

    let ty = if name == "array" {
        let mut item = Type::Value;
        if args.len() > 2 {
            match args[1].as_str().and_then(scalar_type) {
                Some(t) if t != Type::Object => item = t,
                _ => {
                    return ctx.error_at(
                        "The item type argument of \"array\" must be one of string, number, boolean",
                        &[1],
                    )
                }
            }
            first += 1;
        }
        let mut len = None;
        if args.len() > 3 {
            match &args[2] {
                JsonValue::Null => {}
                JsonValue::Number(n) => match n.as_f64() {
                    Some(n) if n >= 0.0 && n.fract() == 0.0 => len = Some(n as usize),
                    _ => {
                        return ctx.error_at(
                            "The length argument to \"array\" must be a positive integer literal",
                            &[2],
                        )
                    }
                },
                _ => {
                    return ctx.error_at(
                        "The length argument to \"array\" must be a positive integer literal",
                        &[2],
                    )
                }
            }
            first += 1;
        }
        Type::array(item, len)
    } else {
        match scalar_type(name) {
            Some(t) => t,
            None => return ctx.error(format!("Unknown type assertion \"{}\".", name)),
        }
    };

    let parsed = super::parse_operands(args, first, &Type::Value, ctx)?;
    Some(Expression::Assertion(Assertion::new(ty, parsed)))
}
