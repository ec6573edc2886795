use super::{eval_bool, Expression};
use crate::context::EvaluationContext;
use crate::error::EvalResult;
use crate::parsing_context::ParsingContext;
use crate::types::Type;
use crate::value::Value;
use serde_json::Value as JsonValue;

/// True when every operand is true. Stops at the first false operand.
#[derive(Debug, Clone)]
pub struct All {
    pub ty: Type,
    pub args: Vec<Expression>,
}

/// True when some operand is true. Stops at the first true operand.
#[derive(Debug, Clone)]
pub struct Any {
    pub ty: Type,
    pub args: Vec<Expression>,
}

impl All {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        for arg in &self.args {
            if !eval_bool(arg, ctx)? {
                return Ok(Value::Boolean(false));
            }
        }
        Ok(Value::Boolean(true))
    }
}

impl Any {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        for arg in &self.args {
            if eval_bool(arg, ctx)? {
                return Ok(Value::Boolean(true));
            }
        }
        Ok(Value::Boolean(false))
    }
}

pub(super) fn parse_all(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    let args = super::parse_operands(args, 1, &Type::Boolean, ctx)?;
    Some(Expression::All(All {
        ty: Type::Boolean,
        args,
    }))
}

pub(super) fn parse_any(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    let args = super::parse_operands(args, 1, &Type::Boolean, ctx)?;
    Some(Expression::Any(Any {
        ty: Type::Boolean,
        args,
    }))
}
