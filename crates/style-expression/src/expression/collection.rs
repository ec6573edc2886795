use super::{eval_number, Expression};
use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::parsing_context::ParsingContext;
use crate::types::{type_of, Type};
use crate::value::{format_number, Value};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct At {
    pub ty: Type,
    pub index: Box<Expression>,
    pub input: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct In {
    pub ty: Type,
    pub needle: Box<Expression>,
    pub haystack: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct IndexOf {
    pub ty: Type,
    pub needle: Box<Expression>,
    pub haystack: Box<Expression>,
    pub from_index: Option<Box<Expression>>,
}

#[derive(Debug, Clone)]
pub struct Slice {
    pub ty: Type,
    pub input: Box<Expression>,
    pub begin: Box<Expression>,
    pub end: Option<Box<Expression>>,
}

#[derive(Debug, Clone)]
pub struct Length {
    pub ty: Type,
    pub input: Box<Expression>,
}

fn is_searchable_needle(value: &Value) -> bool {
    matches!(
        value,
        Value::Boolean(_) | Value::String(_) | Value::Number(_) | Value::Null
    )
}

fn needle_type_ok(t: &Type) -> bool {
    matches!(
        t,
        Type::Boolean | Type::String | Type::Number | Type::Null | Type::Value
    )
}

/// Resolves a JavaScript-style relative index against `len`.
fn relative_index(index: f64, len: usize) -> usize {
    let len_f = len as f64;
    let index = if index.is_nan() { 0.0 } else { index.trunc() };
    let resolved = if index < 0.0 {
        (len_f + index).max(0.0)
    } else {
        index.min(len_f)
    };
    resolved as usize
}

impl At {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let index = eval_number(&self.index, ctx)?;
        let input = self.input.evaluate(ctx)?;
        let items = input
            .as_array()
            .ok_or_else(|| super::type_mismatch(self.input.ty(), &input))?;
        if index < 0.0 {
            return Err(EvalError::IndexBelowZero {
                index: format_number(index),
            });
        }
        if index >= items.len() as f64 {
            return Err(EvalError::IndexAboveMax {
                index: format_number(index),
                max: format_number(items.len() as f64 - 1.0),
            });
        }
        if index.fract() != 0.0 {
            return Err(EvalError::FractionalIndex(format_number(index)));
        }
        Ok(items[index as usize].clone())
    }
}

impl In {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let needle = self.needle.evaluate(ctx)?;
        let haystack = self.haystack.evaluate(ctx)?;
        if !haystack.is_truthy() {
            return Ok(Value::Boolean(false));
        }
        if !is_searchable_needle(&needle) {
            return Err(EvalError::InvalidNeedle(type_of(&needle).to_string()));
        }
        match &haystack {
            Value::String(s) => Ok(Value::Boolean(s.contains(&needle.to_search_string()))),
            Value::Array(items) => Ok(Value::Boolean(
                items.iter().any(|item| item.strict_eq(&needle)),
            )),
            other => Err(EvalError::InvalidHaystack(type_of(other).to_string())),
        }
    }
}

impl IndexOf {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let needle = self.needle.evaluate(ctx)?;
        let haystack = self.haystack.evaluate(ctx)?;
        if !is_searchable_needle(&needle) {
            return Err(EvalError::InvalidNeedle(type_of(&needle).to_string()));
        }
        let from = match &self.from_index {
            Some(from) => Some(eval_number(from, ctx)?),
            None => None,
        };
        let found = match &haystack {
            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let start = relative_index(from.unwrap_or(0.0).max(0.0), chars.len());
                let pattern: Vec<char> = needle.to_search_string().chars().collect();
                (start..=chars.len())
                    .find(|&i| chars[i..].starts_with(&pattern))
            }
            Value::Array(items) => {
                let start = relative_index(from.unwrap_or(0.0), items.len());
                items[start..]
                    .iter()
                    .position(|item| item.strict_eq(&needle))
                    .map(|p| p + start)
            }
            other => return Err(EvalError::InvalidHaystack(type_of(other).to_string())),
        };
        Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
    }
}

impl Slice {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let input = self.input.evaluate(ctx)?;
        let begin = eval_number(&self.begin, ctx)?;
        let end = match &self.end {
            Some(end) => Some(eval_number(end, ctx)?),
            None => None,
        };
        let range = |len: usize| {
            let start = relative_index(begin, len);
            let stop = end.map_or(len, |e| relative_index(e, len));
            (start, stop.max(start))
        };
        match &input {
            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let (start, stop) = range(chars.len());
                Ok(Value::String(chars[start..stop].iter().collect()))
            }
            Value::Array(items) => {
                let (start, stop) = range(items.len());
                Ok(Value::Array(items[start..stop].to_vec()))
            }
            other => Err(EvalError::WrongOperandType {
                expected: "first argument to be of type array or string",
                found: type_of(other).to_string(),
            }),
        }
    }
}

impl Length {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        match self.input.evaluate(ctx)? {
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            Value::Array(items) => Ok(Value::Number(items.len() as f64)),
            other => Err(EvalError::WrongOperandType {
                expected: "value to be of type string or array",
                found: type_of(&other).to_string(),
            }),
        }
    }
}

fn expect_operands(
    args: &[JsonValue],
    ctx: &mut ParsingContext<'_>,
    allowed: std::ops::RangeInclusive<usize>,
) -> bool {
    let found = args.len() - 1;
    if allowed.contains(&found) {
        return true;
    }
    let (lo, hi) = (*allowed.start(), *allowed.end());
    let wanted = match (lo, hi) {
        (1, 1) => "1 argument".to_string(),
        (lo, hi) if lo == hi => format!("{} arguments", lo),
        (lo, hi) => format!("{} or {} arguments", lo, hi),
    };
    ctx.error(format!("Expected {}, but found {} instead.", wanted, found));
    false
}

pub(super) fn parse_at(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if !expect_operands(args, ctx, 2..=2) {
        return None;
    }
    let item = ctx.expected_type().cloned().unwrap_or(Type::Value);
    let index = ctx.parse(&args[1], 1, Some(Type::Number));
    let input = ctx.parse(&args[2], 2, Some(Type::array(item, None)));
    let (index, input) = (index?, input?);
    let ty = match input.ty() {
        Type::Array { item, .. } => (**item).clone(),
        _ => Type::Value,
    };
    Some(Expression::At(At {
        ty,
        index: Box::new(index),
        input: Box::new(input),
    }))
}

fn parse_needle_haystack(
    args: &[JsonValue],
    ctx: &mut ParsingContext<'_>,
) -> Option<(Expression, Expression)> {
    let needle = ctx.parse(&args[1], 1, Some(Type::Value));
    let haystack = ctx.parse(&args[2], 2, Some(Type::Value));
    let (needle, haystack) = (needle?, haystack?);
    if !needle_type_ok(needle.ty()) {
        let message = EvalError::InvalidNeedle(needle.ty().to_string()).to_string();
        ctx.error(message.trim_end_matches('.'));
        return None;
    }
    if !matches!(haystack.ty(), Type::String | Type::Array { .. } | Type::Value) {
        let message = EvalError::InvalidHaystack(haystack.ty().to_string()).to_string();
        ctx.error(message.trim_end_matches('.'));
        return None;
    }
    Some((needle, haystack))
}

pub(super) fn parse_in(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if !expect_operands(args, ctx, 2..=2) {
        return None;
    }
    let (needle, haystack) = parse_needle_haystack(args, ctx)?;
    Some(Expression::In(In {
        ty: Type::Boolean,
        needle: Box::new(needle),
        haystack: Box::new(haystack),
    }))
}

pub(super) fn parse_index_of(
    args: &[JsonValue],
    ctx: &mut ParsingContext<'_>,
) -> Option<Expression> {
    if !expect_operands(args, ctx, 2..=3) {
        return None;
    }
    let (needle, haystack) = parse_needle_haystack(args, ctx)?;
    let from_index = match args.get(3) {
        Some(raw) => Some(Box::new(ctx.parse(raw, 3, Some(Type::Number))?)),
        None => None,
    };
    Some(Expression::IndexOf(IndexOf {
        ty: Type::Number,
        needle: Box::new(needle),
        haystack: Box::new(haystack),
        from_index,
    }))
}

pub(super) fn parse_slice(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if !expect_operands(args, ctx, 2..=3) {
        return None;
    }
    let input = ctx.parse(&args[1], 1, Some(Type::Value));
    let begin = ctx.parse(&args[2], 2, Some(Type::Number));
    let (input, begin) = (input?, begin?);
    let ty = match input.ty() {
        Type::Array { item, .. } => Type::Array {
            item: item.clone(),
            len: None,
        },
        Type::String => Type::String,
        Type::Value => Type::Value,
        other => {
            return ctx.error(format!(
                "Expected first argument to be of type array or string, but found {} instead",
                other
            ))
        }
    };
    let end = match args.get(3) {
        Some(raw) => Some(Box::new(ctx.parse(raw, 3, Some(Type::Number))?)),
        None => None,
    };
    Some(Expression::Slice(Slice {
        ty,
        input: Box::new(input),
        begin: Box::new(begin),
        end,
    }))
}

pub(super) fn parse_length(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if !expect_operands(args, ctx, 1..=1) {
        return None;
    }
    let input = ctx.parse(&args[1], 1, None)?;
    if !matches!(input.ty(), Type::Array { .. } | Type::String | Type::Value) {
        return ctx.error(format!(
            "Expected argument of type string or array, but found {} instead.",
            input.ty()
        ));
    }
    Some(Expression::Length(Length {
        ty: Type::Number,
        input: Box::new(input),
    }))
}

#[cfg(test)]
mod tests {
    use super::relative_index;

    #[test]
    fn relative_indices_follow_slice_rules() {
        assert_eq!(relative_index(1.0, 5), 1);
        assert_eq!(relative_index(-2.0, 5), 3);
        assert_eq!(relative_index(-9.0, 5), 0);
        assert_eq!(relative_index(9.0, 5), 5);
        assert_eq!(relative_index(1.7, 5), 1);
    }
}
