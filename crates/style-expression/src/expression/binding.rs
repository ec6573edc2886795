use super::Expression;
use crate::parsing_context::ParsingContext;
use serde_json::Value as JsonValue;

/// `["let", name, value, ..., body]`.
#[derive(Debug, Clone)]
pub struct Let {
    pub bindings: Vec<(String, Expression)>,
    pub result: Box<Expression>,
}

/// `["var", name]`. Holds a copy of the bound expression; evaluating a
/// variable evaluates that copy.
#[derive(Debug, Clone)]
pub struct Var {
    pub name: String,
    pub bound: Box<Expression>,
}

fn valid_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(super) fn parse_let(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if args.len() < 4 {
        return ctx.error(format!(
            "Expected at least 3 arguments, but found {} instead.",
            args.len() - 1
        ));
    }
    let last = args.len() - 1;
    let mut bindings = Vec::new();
    let mut i = 1;
    while i < last {
        let name = match &args[i] {
            JsonValue::String(name) => name,
            other => {
                return ctx.error_at(
                    format!(
                        "Expected string, but found {} instead.",
                        crate::parsing_context::json_typeof(other)
                    ),
                    &[i],
                )
            }
        };
        if !valid_name(name) {
            return ctx.error_at(
                "Variable names must contain only alphanumeric characters or '_'.",
                &[i],
            );
        }
        let value = ctx.parse(&args[i + 1], i + 1, None)?;
        bindings.push((name.clone(), value));
        i += 2;
    }

    let expected = ctx.expected_type().cloned();
    let result = ctx.parse_with(&args[last], last, expected, Some(bindings.clone()), None)?;
    Some(Expression::Let(Let {
        bindings,
        result: Box::new(result),
    }))
}

pub(super) fn parse_var(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    let name = match args {
        [_, JsonValue::String(name)] => name,
        _ => return ctx.error("'var' expression requires exactly one string literal argument."),
    };
    match ctx.scope().get(name).cloned() {
        Some(bound) => Some(Expression::Var(Var {
            name: name.clone(),
            bound: Box::new(bound),
        })),
        None => ctx.error_at(
            format!(
                "Unknown variable \"{0}\". Make sure \"{0}\" has been bound in an enclosing \"let\" expression before using it.",
                name
            ),
            &[1],
        ),
    }
}
