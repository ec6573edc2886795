//! The compiled expression tree.
//!
//! Every node is resolved to one variant of [`Expression`] at compile time
//! and carries its output [`Type`]. Evaluation is a plain tree walk.

mod assertion;
mod binding;
mod branch;
mod coercion;
mod collection;
mod comparison;
pub(crate) mod compound;
mod curve;
mod distance;
pub mod geometry;
mod global_state;
mod literal;
mod logical;
mod within;

pub use assertion::Assertion;
pub use binding::{Let, Var};
pub use branch::{Case, Coalesce, Match, MatchLabel};
pub use coercion::Coercion;
pub use collection::{At, In, IndexOf, Length, Slice};
pub use comparison::{Comparison, ComparisonOp};
pub use compound::CompoundExpression;
pub use curve::{Interpolate, InterpolateSpace, Interpolation, Step, UnitBezier};
pub use distance::Distance;
pub use global_state::GlobalState;
pub use literal::Literal;
pub use logical::{All, Any};
pub use within::Within;

pub(crate) use comparison::compare_values;

use crate::color::Color;
use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::registry::OperatorRegistry;
use crate::types::{type_of, Type};
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Assertion(Assertion),
    Coercion(Coercion),
    Let(Let),
    Var(Var),
    At(At),
    In(In),
    IndexOf(IndexOf),
    Slice(Slice),
    Length(Length),
    Case(Case),
    Match(Match),
    Coalesce(Coalesce),
    Step(Step),
    Interpolate(Interpolate),
    Comparison(Comparison),
    All(All),
    Any(Any),
    GlobalState(GlobalState),
    Within(Within),
    Distance(Distance),
    Compound(CompoundExpression),
}

impl Expression {
    pub fn ty(&self) -> &Type {
        match self {
            Expression::Literal(e) => &e.ty,
            Expression::Assertion(e) => &e.ty,
            Expression::Coercion(e) => &e.ty,
            Expression::Let(e) => e.result.ty(),
            Expression::Var(e) => e.bound.ty(),
            Expression::At(e) => &e.ty,
            Expression::In(e) => &e.ty,
            Expression::IndexOf(e) => &e.ty,
            Expression::Slice(e) => &e.ty,
            Expression::Length(e) => &e.ty,
            Expression::Case(e) => &e.ty,
            Expression::Match(e) => &e.ty,
            Expression::Coalesce(e) => &e.ty,
            Expression::Step(e) => &e.ty,
            Expression::Interpolate(e) => &e.ty,
            Expression::Comparison(e) => &e.ty,
            Expression::All(e) => &e.ty,
            Expression::Any(e) => &e.ty,
            Expression::GlobalState(e) => &e.ty,
            Expression::Within(e) => &e.ty,
            Expression::Distance(e) => &e.ty,
            Expression::Compound(e) => &e.ty,
        }
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        match self {
            Expression::Literal(e) => Ok(e.value.clone()),
            Expression::Assertion(e) => e.evaluate(ctx),
            Expression::Coercion(e) => e.evaluate(ctx),
            Expression::Let(e) => e.result.evaluate(ctx),
            Expression::Var(e) => e.bound.evaluate(ctx),
            Expression::At(e) => e.evaluate(ctx),
            Expression::In(e) => e.evaluate(ctx),
            Expression::IndexOf(e) => e.evaluate(ctx),
            Expression::Slice(e) => e.evaluate(ctx),
            Expression::Length(e) => e.evaluate(ctx),
            Expression::Case(e) => e.evaluate(ctx),
            Expression::Match(e) => e.evaluate(ctx),
            Expression::Coalesce(e) => e.evaluate(ctx),
            Expression::Step(e) => e.evaluate(ctx),
            Expression::Interpolate(e) => e.evaluate(ctx),
            Expression::Comparison(e) => e.evaluate(ctx),
            Expression::All(e) => e.evaluate(ctx),
            Expression::Any(e) => e.evaluate(ctx),
            Expression::GlobalState(e) => Ok(ctx.global_state_value(&e.key)),
            Expression::Within(e) => Ok(Value::Boolean(e.evaluate(ctx))),
            Expression::Distance(e) => Ok(e.evaluate(ctx)),
            Expression::Compound(e) => (e.eval)(ctx, &e.args),
        }
    }

    /// Visits direct children. A `var` has none: its bound expression is a
    /// child of the enclosing `let`.
    pub fn each_child<'s>(&'s self, f: &mut dyn FnMut(&'s Expression)) {
        match self {
            Expression::Literal(_)
            | Expression::Var(_)
            | Expression::GlobalState(_)
            | Expression::Within(_)
            | Expression::Distance(_) => {}
            Expression::Assertion(e) => e.args.iter().for_each(f),
            Expression::Coercion(e) => e.args.iter().for_each(f),
            Expression::Let(e) => {
                for (_, binding) in &e.bindings {
                    f(binding);
                }
                f(&e.result);
            }
            Expression::At(e) => {
                f(&e.index);
                f(&e.input);
            }
            Expression::In(e) => {
                f(&e.needle);
                f(&e.haystack);
            }
            Expression::IndexOf(e) => {
                f(&e.needle);
                f(&e.haystack);
                if let Some(from) = &e.from_index {
                    f(from);
                }
            }
            Expression::Slice(e) => {
                f(&e.input);
                f(&e.begin);
                if let Some(end) = &e.end {
                    f(end);
                }
            }
            Expression::Length(e) => f(&e.input),
            Expression::Case(e) => {
                for (test, result) in &e.branches {
                    f(test);
                    f(result);
                }
                f(&e.otherwise);
            }
            Expression::Match(e) => {
                f(&e.input);
                e.outputs.iter().for_each(&mut *f);
                f(&e.otherwise);
            }
            Expression::Coalesce(e) => e.args.iter().for_each(f),
            Expression::Step(e) => {
                f(&e.input);
                e.outputs.iter().for_each(f);
            }
            Expression::Interpolate(e) => {
                f(&e.input);
                e.outputs.iter().for_each(f);
            }
            Expression::Comparison(e) => {
                f(&e.lhs);
                f(&e.rhs);
            }
            Expression::All(e) => e.args.iter().for_each(f),
            Expression::Any(e) => e.args.iter().for_each(f),
            Expression::Compound(e) => e.args.iter().for_each(f),
        }
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Expression::Literal(l) => Some(&l.value),
            _ => None,
        }
    }
}

/// Registers every special form on `registry`.
pub(crate) fn register_special_forms(registry: &mut OperatorRegistry) {
    registry.register_special("literal", literal::parse);
    for name in ["array", "boolean", "number", "string", "object"] {
        registry.register_special(name, assertion::parse);
    }
    for name in ["to-boolean", "to-color", "to-number", "to-string"] {
        registry.register_special(name, coercion::parse);
    }
    registry
        .register_special("let", binding::parse_let)
        .register_special("var", binding::parse_var)
        .register_special("at", collection::parse_at)
        .register_special("in", collection::parse_in)
        .register_special("index-of", collection::parse_index_of)
        .register_special("slice", collection::parse_slice)
        .register_special("length", collection::parse_length)
        .register_special("case", branch::parse_case)
        .register_special("match", branch::parse_match)
        .register_special("coalesce", branch::parse_coalesce)
        .register_special("step", curve::parse_step)
        .register_special("interpolate", curve::parse_interpolate)
        .register_special("interpolate-hcl", curve::parse_interpolate)
        .register_special("interpolate-lab", curve::parse_interpolate)
        .register_special("all", logical::parse_all)
        .register_special("any", logical::parse_any)
        .register_special("global-state", global_state::parse)
        .register_special("within", within::parse)
        .register_special("distance", distance::parse);
    for name in ["==", "!=", "<", ">", "<=", ">="] {
        registry.register_special(name, comparison::parse);
    }
}

pub(crate) fn type_mismatch(expected: &Type, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected: expected.to_string(),
        found: type_of(found).to_string(),
    }
}

pub(crate) fn eval_number(expr: &Expression, ctx: &EvaluationContext<'_>) -> EvalResult<f64> {
    match expr.evaluate(ctx)? {
        Value::Number(n) => Ok(n),
        other => Err(type_mismatch(&Type::Number, &other)),
    }
}

pub(crate) fn eval_string(expr: &Expression, ctx: &EvaluationContext<'_>) -> EvalResult<String> {
    match expr.evaluate(ctx)? {
        Value::String(s) => Ok(s),
        other => Err(type_mismatch(&Type::String, &other)),
    }
}

pub(crate) fn eval_bool(expr: &Expression, ctx: &EvaluationContext<'_>) -> EvalResult<bool> {
    match expr.evaluate(ctx)? {
        Value::Boolean(b) => Ok(b),
        other => Err(type_mismatch(&Type::Boolean, &other)),
    }
}

pub(crate) fn eval_color(expr: &Expression, ctx: &EvaluationContext<'_>) -> EvalResult<Color> {
    match expr.evaluate(ctx)? {
        Value::Color(c) => Ok(c),
        other => Err(type_mismatch(&Type::Color, &other)),
    }
}

/// Parses each operand from `start` against `expected`, stopping at the
/// first failure.
pub(crate) fn parse_operands(
    args: &[serde_json::Value],
    start: usize,
    expected: &Type,
    ctx: &mut crate::parsing_context::ParsingContext<'_>,
) -> Option<Vec<Expression>> {
    let mut parsed = Vec::with_capacity(args.len().saturating_sub(start));
    for (i, arg) in args.iter().enumerate().skip(start) {
        parsed.push(ctx.parse(arg, i, Some(expected.clone()))?);
    }
    Some(parsed)
}
