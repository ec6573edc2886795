use super::Expression;
use crate::parsing_context::ParsingContext;
use crate::types::{type_of, Type};
use crate::value::Value;
use serde_json::Value as JsonValue;

/// A constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub ty: Type,
    pub value: Value,
}

impl Literal {
    pub fn new(ty: Type, value: Value) -> Self {
        Literal { ty, value }
    }

    pub fn from_json(raw: &JsonValue) -> Self {
        let value = Value::from(raw);
        Literal {
            ty: type_of(&value),
            value,
        }
    }
}

pub(super) fn parse(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if args.len() != 2 {
        return ctx.error(format!(
            "'literal' expression requires exactly one argument, but found {} instead.",
            args.len() - 1
        ));
    }
    let mut literal = Literal::from_json(&args[1]);

    // `["literal", []]` has no item type of its own.
    if let (Type::Array { len: Some(0), .. }, Some(expected @ Type::Array { len, .. })) =
        (&literal.ty, ctx.expected_type())
    {
        if len.map_or(true, |n| n == 0) {
            literal.ty = expected.clone();
        }
    }
    Some(Expression::Literal(literal))
}
