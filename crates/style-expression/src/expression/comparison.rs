use super::{Assertion, Expression};
use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::parsing_context::ParsingContext;
use crate::types::{type_of, Type};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl ComparisonOp {
    pub fn from_name(name: &str) -> Option<ComparisonOp> {
        Some(match name {
            "==" => ComparisonOp::Eq,
            "!=" => ComparisonOp::Ne,
            "<" => ComparisonOp::Lt,
            ">" => ComparisonOp::Gt,
            "<=" => ComparisonOp::Le,
            ">=" => ComparisonOp::Ge,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
        }
    }

    pub fn is_ordering(&self) -> bool {
        !matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }

    fn comparable(&self, t: &Type) -> bool {
        if self.is_ordering() {
            matches!(t, Type::String | Type::Number | Type::Value)
        } else {
            matches!(
                t,
                Type::Boolean | Type::String | Type::Number | Type::Null | Type::Value
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub ty: Type,
    pub op: ComparisonOp,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
    /// Either operand is `value`-typed, so operand kinds are checked at
    /// runtime.
    pub has_untyped: bool,
}

/// Orders two values of the same scalar kind. `None` for mixed kinds.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

impl Comparison {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let lhs = self.lhs.evaluate(ctx)?;
        let rhs = self.rhs.evaluate(ctx)?;
        let result = match self.op {
            ComparisonOp::Eq => lhs.strict_eq(&rhs),
            ComparisonOp::Ne => !lhs.strict_eq(&rhs),
            op => {
                if self.has_untyped {
                    let (lt, rt) = (type_of(&lhs), type_of(&rhs));
                    if !lt.same_kind(&rt) || !matches!(lt, Type::String | Type::Number) {
                        return Err(EvalError::NotComparable {
                            op: op.name(),
                            lhs: lt.kind(),
                            rhs: rt.kind(),
                        });
                    }
                }
                match compare_values(&lhs, &rhs) {
                    Some(ordering) => match op {
                        ComparisonOp::Lt => ordering == Ordering::Less,
                        ComparisonOp::Gt => ordering == Ordering::Greater,
                        ComparisonOp::Le => ordering != Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    },
                    None => false,
                }
            }
        };
        Ok(Value::Boolean(result))
    }
}

pub(super) fn parse(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    let Some(op) = args[0].as_str().and_then(ComparisonOp::from_name) else {
        return ctx.error("Unknown comparison operator.");
    };
    if args.len() == 4 {
        return ctx.error_at("Collator arguments are not supported.", &[3]);
    }
    if args.len() != 3 {
        return ctx.error("Expected two or three arguments.");
    }

    let mut lhs = ctx.parse(&args[1], 1, Some(Type::Value))?;
    if !op.comparable(lhs.ty()) {
        return ctx.error_at(
            format!(
                "\"{}\" comparisons are not supported for type '{}'.",
                op.name(),
                lhs.ty()
            ),
            &[1],
        );
    }
    let mut rhs = ctx.parse(&args[2], 2, Some(Type::Value))?;
    if !op.comparable(rhs.ty()) {
        return ctx.error_at(
            format!(
                "\"{}\" comparisons are not supported for type '{}'.",
                op.name(),
                rhs.ty()
            ),
            &[2],
        );
    }
    let (lt, rt) = (lhs.ty().clone(), rhs.ty().clone());
    if !lt.same_kind(&rt) && !lt.is_value() && !rt.is_value() {
        return ctx.error(format!("Cannot compare types '{}' and '{}'.", lt, rt));
    }
    if op.is_ordering() {
        if lt.is_value() && !rt.is_value() {
            lhs = Expression::Assertion(Assertion::new(rt.clone(), vec![lhs]));
        } else if !lt.is_value() && rt.is_value() {
            rhs = Expression::Assertion(Assertion::new(lt.clone(), vec![rhs]));
        }
    }
    let has_untyped = lhs.ty().is_value() || rhs.ty().is_value();
    Some(Expression::Comparison(Comparison {
        ty: Type::Boolean,
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        has_untyped,
    }))
}
