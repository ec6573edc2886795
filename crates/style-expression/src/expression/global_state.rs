use super::Expression;
use crate::parsing_context::ParsingContext;
use crate::types::Type;
use serde_json::Value as JsonValue;

/// `["global-state", name]`: reads a host-supplied variable, `null` when
/// unset.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalState {
    pub ty: Type,
    pub key: String,
}

pub(super) fn parse(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    match args {
        [_, JsonValue::String(key)] => Some(Expression::GlobalState(GlobalState {
            ty: Type::Value,
            key: key.clone(),
        })),
        _ => ctx.error("Global state property must be defined"),
    }
}
