use super::Expression;
use crate::context::EvaluationContext;
use crate::error::EvalResult;
use crate::parsing_context::{ParsingContext, TypeAnnotation};
use crate::types::{check_subtype, Type};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Largest integer a `match` label may hold.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone)]
pub struct Case {
    pub ty: Type,
    pub branches: Vec<(Expression, Expression)>,
    pub otherwise: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchLabel {
    Integer(i64),
    String(String),
}

impl MatchLabel {
    fn from_value(value: &Value) -> Option<MatchLabel> {
        match value {
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                Some(MatchLabel::Integer(*n as i64))
            }
            Value::String(s) => Some(MatchLabel::String(s.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Match {
    pub ty: Type,
    pub input_type: Type,
    pub input: Box<Expression>,
    /// Label to index into `outputs`.
    pub cases: HashMap<MatchLabel, usize>,
    pub outputs: Vec<Expression>,
    pub otherwise: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct Coalesce {
    pub ty: Type,
    pub args: Vec<Expression>,
}

impl Case {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        for (test, result) in &self.branches {
            if test.evaluate(ctx)?.is_truthy() {
                return result.evaluate(ctx);
            }
        }
        self.otherwise.evaluate(ctx)
    }
}

impl Match {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let input = self.input.evaluate(ctx)?;
        let typed = match (&input, &self.input_type) {
            (Value::Number(_), Type::Number) | (Value::String(_), Type::String) => true,
            _ => false,
        };
        let output = typed
            .then(|| MatchLabel::from_value(&input))
            .flatten()
            .and_then(|label| self.cases.get(&label))
            .map_or(&*self.otherwise, |&i| &self.outputs[i]);
        output.evaluate(ctx)
    }
}

impl Coalesce {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> EvalResult<Value> {
        let mut result = Value::Null;
        for arg in &self.args {
            result = arg.evaluate(ctx)?;
            if !result.is_null() {
                break;
            }
        }
        Ok(result)
    }
}

/// The declared output type flowing into branches, unless it is `value`.
fn declared_output(ctx: &ParsingContext<'_>) -> Option<Type> {
    ctx.expected_type().filter(|t| !t.is_value()).cloned()
}

pub(super) fn parse_case(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if args.len() < 4 {
        return ctx.error(format!(
            "Expected at least 3 arguments, but found only {}.",
            args.len() - 1
        ));
    }
    if args.len() % 2 != 0 {
        return ctx.error("Expected an odd number of arguments.");
    }
    let mut output = declared_output(ctx);
    let last = args.len() - 1;
    let mut branches = Vec::new();
    for i in (1..last).step_by(2) {
        let test = ctx.parse(&args[i], i, Some(Type::Boolean))?;
        let result = ctx.parse(&args[i + 1], i + 1, output.clone())?;
        output.get_or_insert_with(|| result.ty().clone());
        branches.push((test, result));
    }
    let otherwise = ctx.parse(&args[last], last, output.clone())?;
    let ty = output.unwrap_or_else(|| otherwise.ty().clone());
    Some(Expression::Case(Case {
        ty,
        branches,
        otherwise: Box::new(otherwise),
    }))
}

pub(super) fn parse_match(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if args.len() < 5 {
        return ctx.error(format!(
            "Expected at least 4 arguments, but found only {}.",
            args.len() - 1
        ));
    }
    if args.len() % 2 != 1 {
        return ctx.error("Expected an even number of arguments.");
    }

    let mut input_type: Option<Type> = None;
    let mut output = declared_output(ctx);
    let mut cases = HashMap::new();
    let mut outputs = Vec::new();
    let last = args.len() - 1;

    for i in (2..last).step_by(2) {
        let labels: Vec<&JsonValue> = match &args[i] {
            JsonValue::Array(items) => items.iter().collect(),
            single => vec![single],
        };
        if labels.is_empty() {
            return ctx.error_at("Expected at least one branch label.", &[i]);
        }
        for label in labels {
            let value = match label {
                JsonValue::Number(n) => {
                    let n = n.as_f64().unwrap_or(f64::NAN);
                    if n.abs() > MAX_SAFE_INTEGER {
                        return ctx.error_at(
                            format!(
                                "Branch labels must be integers no larger than {}.",
                                MAX_SAFE_INTEGER as i64
                            ),
                            &[i],
                        );
                    }
                    if n.fract() != 0.0 {
                        return ctx.error_at("Numeric branch labels must be integer values.", &[i]);
                    }
                    Value::Number(n)
                }
                JsonValue::String(s) => Value::String(s.clone()),
                _ => return ctx.error_at("Branch labels must be numbers or strings.", &[i]),
            };
            let label_type = crate::types::type_of(&value);
            match &input_type {
                None => input_type = Some(label_type),
                Some(expected) => {
                    if let Some(message) = check_subtype(expected, &label_type) {
                        return ctx.error_at(message, &[i]);
                    }
                }
            }
            let Some(key) = MatchLabel::from_value(&value) else {
                return ctx.error_at("Branch labels must be numbers or strings.", &[i]);
            };
            if cases.insert(key, outputs.len()).is_some() {
                return ctx.error_at("Branch labels must be unique.", &[i]);
            }
        }
        let result = ctx.parse(&args[i + 1], i + 1, output.clone())?;
        output.get_or_insert_with(|| result.ty().clone());
        outputs.push(result);
    }

    let input = ctx.parse(&args[1], 1, Some(Type::Value))?;
    let otherwise = ctx.parse(&args[last], last, output.clone())?;
    let input_type = input_type.unwrap_or(Type::Value);
    if !input.ty().is_value() && ctx.check_subtype_at(1, &input_type, input.ty()) {
        return None;
    }
    let ty = output.unwrap_or_else(|| otherwise.ty().clone());
    Some(Expression::Match(Match {
        ty,
        input_type,
        input: Box::new(input),
        cases,
        outputs,
        otherwise: Box::new(otherwise),
    }))
}

pub(super) fn parse_coalesce(
    args: &[JsonValue],
    ctx: &mut ParsingContext<'_>,
) -> Option<Expression> {
    if args.len() < 2 {
        return ctx.error("Expected at least one argument.");
    }
    let expected = ctx.expected_type().cloned();
    let mut output = declared_output(ctx);
    let mut parsed = Vec::with_capacity(args.len() - 1);
    for (i, arg) in args.iter().enumerate().skip(1) {
        let expr = ctx.parse_annotated(arg, i, output.clone(), TypeAnnotation::Omit)?;
        output.get_or_insert_with(|| expr.ty().clone());
        parsed.push(expr);
    }
    // Operands stay unannotated so `null` can fall through. If any is wider
    // than expected the node widens to `value` and is narrowed by its parent.
    let needs_annotation = expected
        .as_ref()
        .is_some_and(|e| parsed.iter().any(|arg| check_subtype(e, arg.ty()).is_some()));
    let ty = if needs_annotation {
        Type::Value
    } else {
        output.unwrap_or(Type::Value)
    };
    Some(Expression::Coalesce(Coalesce { ty, args: parsed }))
}
