//! The `filter-*` operators targeted by legacy filter conversion.
//!
//! They read feature properties directly and differ from their modern
//! counterparts in one respect: an absent property never matches, whereas
//! `["get", key]` would read it as `null`.

use crate::context::{EvaluationContext, Parameter};
use crate::error::EvalResult;
use crate::expression::{compare_values, eval_string, type_mismatch, Expression};
use crate::registry::{CompoundDefinition, Overload, Params};
use crate::types::Type;
use crate::value::Value;
use std::cmp::Ordering;

const FEATURE: &[Parameter] = &[Parameter::Feature];

fn eval_array(expr: &Expression, ctx: &EvaluationContext<'_>) -> EvalResult<Vec<Value>> {
    match expr.evaluate(ctx)? {
        Value::Array(items) => Ok(items),
        other => Err(type_mismatch(&Type::any_array(), &other)),
    }
}

fn geometry_type(ctx: &EvaluationContext<'_>) -> Option<&'static str> {
    ctx.geometry_type().map(|t| t.as_str())
}

fn eq_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = eval_string(&args[0], ctx)?;
    let value = args[1].evaluate(ctx)?;
    Ok(Value::Boolean(
        ctx.property(&key).is_some_and(|p| p.strict_eq(&value)),
    ))
}

fn id_eq_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let value = args[0].evaluate(ctx)?;
    Ok(Value::Boolean(ctx.id().strict_eq(&value)))
}

fn type_eq_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let name = eval_string(&args[0], ctx)?;
    Ok(Value::Boolean(geometry_type(ctx) == Some(name.as_str())))
}

/// Orders the property against the operand. Operands of different kinds,
/// and absent properties, never satisfy an ordering.
fn ordering(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Option<Ordering>> {
    let key = eval_string(&args[0], ctx)?;
    let value = args[1].evaluate(ctx)?;
    Ok(ctx
        .property(&key)
        .and_then(|p| compare_values(p, &value)))
}

fn lt_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Boolean(ordering(ctx, args)? == Some(Ordering::Less)))
}

fn gt_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Boolean(ordering(ctx, args)? == Some(Ordering::Greater)))
}

fn le_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Boolean(matches!(
        ordering(ctx, args)?,
        Some(Ordering::Less | Ordering::Equal)
    )))
}

fn ge_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Boolean(matches!(
        ordering(ctx, args)?,
        Some(Ordering::Greater | Ordering::Equal)
    )))
}

fn has_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = args[0].evaluate(ctx)?.to_display_string();
    Ok(Value::Boolean(ctx.property(&key).is_some()))
}

fn has_id_eval(ctx: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Boolean(!ctx.id().is_null()))
}

fn type_in_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let types = eval_array(&args[0], ctx)?;
    let found = geometry_type(ctx)
        .is_some_and(|name| types.iter().any(|t| t.as_str() == Some(name)));
    Ok(Value::Boolean(found))
}

fn id_in_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let ids = eval_array(&args[0], ctx)?;
    let id = ctx.id();
    Ok(Value::Boolean(ids.iter().any(|v| v.strict_eq(&id))))
}

fn in_small_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = eval_string(&args[0], ctx)?;
    let values = eval_array(&args[1], ctx)?;
    let found = ctx
        .property(&key)
        .is_some_and(|p| values.iter().any(|v| v.strict_eq(p)));
    Ok(Value::Boolean(found))
}

/// Binary search over values sorted by their natural order.
fn in_large_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = eval_string(&args[0], ctx)?;
    let values = eval_array(&args[1], ctx)?;
    let Some(property) = ctx.property(&key) else {
        return Ok(Value::Boolean(false));
    };
    let (mut lo, mut hi) = (0, values.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match compare_values(&values[mid], property) {
            Some(Ordering::Equal) => return Ok(Value::Boolean(true)),
            Some(Ordering::Less) => lo = mid + 1,
            Some(Ordering::Greater) => hi = mid,
            None => return Ok(Value::Boolean(false)),
        }
    }
    Ok(Value::Boolean(false))
}

fn filter_op(
    name: &'static str,
    params: Vec<Type>,
    eval: crate::registry::CompoundEvalFn,
) -> CompoundDefinition {
    CompoundDefinition::new(
        name,
        Type::Boolean,
        vec![Overload::new(Params::Fixed(params), eval).reading(FEATURE)],
    )
}

pub fn operators() -> Vec<CompoundDefinition> {
    let key_value = || vec![Type::String, Type::Value];
    let key_list = || vec![Type::String, Type::any_array()];
    vec![
        filter_op("filter-==", key_value(), eq_eval),
        filter_op("filter-id-==", vec![Type::Value], id_eq_eval),
        filter_op("filter-type-==", vec![Type::String], type_eq_eval),
        filter_op("filter-<", key_value(), lt_eval),
        filter_op("filter->", key_value(), gt_eval),
        filter_op("filter-<=", key_value(), le_eval),
        filter_op("filter->=", key_value(), ge_eval),
        filter_op("filter-has", vec![Type::Value], has_eval),
        filter_op("filter-has-id", vec![], has_id_eval),
        filter_op(
            "filter-type-in",
            vec![Type::array(Type::String, None)],
            type_in_eval,
        ),
        filter_op("filter-id-in", vec![Type::any_array()], id_in_eval),
        filter_op("filter-in-small", key_list(), in_small_eval),
        filter_op("filter-in-large", key_list(), in_large_eval),
    ]
}
