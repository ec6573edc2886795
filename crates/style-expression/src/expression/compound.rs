//! Compound operators: typed overloads backed by an evaluation function.

use super::Expression;
use crate::context::Parameter;
use crate::parsing_context::ParsingContext;
use crate::registry::{CompoundDefinition, CompoundEvalFn};
use crate::types::Type;
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Clone)]
pub struct CompoundExpression {
    pub name: &'static str,
    pub ty: Type,
    pub eval: CompoundEvalFn,
    pub args: Vec<Expression>,
    /// Runtime parameters the selected overload reads.
    pub reads: &'static [Parameter],
    pub impure: bool,
}

impl CompoundExpression {
    pub fn reads(&self, parameter: Parameter) -> bool {
        self.reads.contains(&parameter)
    }
}

impl fmt::Debug for CompoundExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundExpression")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("args", &self.args)
            .finish()
    }
}

/// Resolves the first overload whose parameters accept the operands.
pub(crate) fn parse(
    definition: &CompoundDefinition,
    args: &[JsonValue],
    ctx: &mut ParsingContext<'_>,
) -> Option<Expression> {
    let operands = &args[1..];
    let available: Vec<_> = definition
        .overloads
        .iter()
        .filter(|o| o.params.arity().accepts(operands.len()))
        .collect();

    let mut last_errors = None;
    for overload in &available {
        // A fresh context per attempt, so only the last attempt's errors
        // survive.
        let mut attempt = ctx.fork();
        let mut parsed = Vec::with_capacity(operands.len());
        for (i, raw) in operands.iter().enumerate() {
            let expected = overload.params.expected(i).clone();
            match attempt.parse(raw, i + 1, Some(expected)) {
                Some(expr) => parsed.push(expr),
                None => break,
            }
        }
        if parsed.len() == operands.len() {
            for (i, arg) in parsed.iter().enumerate() {
                attempt.check_subtype_at(i + 1, overload.params.expected(i), arg.ty());
            }
        }
        if !attempt.has_errors() && parsed.len() == operands.len() {
            return Some(Expression::Compound(CompoundExpression {
                name: definition.name,
                ty: definition.output.clone(),
                eval: overload.eval,
                args: parsed,
                reads: overload.reads,
                impure: definition.impure,
            }));
        }
        last_errors = Some(attempt);
    }

    if available.len() == 1 {
        if let Some(attempt) = last_errors {
            ctx.absorb(attempt);
        }
        return None;
    }

    let signatures: Vec<String> = if available.is_empty() {
        definition.overloads.iter().map(|o| o.params.to_string()).collect()
    } else {
        available.iter().map(|o| o.params.to_string()).collect()
    };
    // Re-parse without expectations to report what was actually passed.
    let mut actual = Vec::with_capacity(operands.len());
    for (i, raw) in operands.iter().enumerate() {
        let parsed = ctx.parse(raw, i + 1, None)?;
        actual.push(parsed.ty().to_string());
    }
    ctx.error(format!(
        "Expected arguments of type {}, but found ({}) instead.",
        signatures.join(" | "),
        actual.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use crate::registry::OperatorRegistry;
    use crate::style_expression::create_expression;
    use serde_json::json;

    #[test]
    fn single_overload_reports_operand_errors() {
        let registry = OperatorRegistry::standard();
        let err = create_expression(&json!(["upcase", 1]), None, &registry).unwrap_err();
        assert_eq!(err.errors()[0].key, "[1]");
        assert_eq!(err.errors()[0].message, "Expected string but found number instead.");
    }

    #[test]
    fn arity_mismatch_lists_all_overloads() {
        let registry = OperatorRegistry::standard();
        let err = create_expression(&json!(["get"]), None, &registry).unwrap_err();
        assert_eq!(
            err.errors()[0].message,
            "Expected arguments of type (string) | (string, object), but found () instead."
        );
    }
}
