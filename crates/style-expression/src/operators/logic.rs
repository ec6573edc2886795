use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::expression::{eval_bool, eval_string, Expression};
use crate::registry::{CompoundDefinition, Overload, Params};
use crate::types::Type;
use crate::value::Value;

fn not_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Boolean(!eval_bool(&args[0], ctx)?))
}

fn error_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Err(EvalError::Thrown(eval_string(&args[0], ctx)?))
}

pub fn operators() -> Vec<CompoundDefinition> {
    vec![
        CompoundDefinition::new(
            "!",
            Type::Boolean,
            vec![Overload::new(Params::Fixed(vec![Type::Boolean]), not_eval)],
        ),
        // `error` is a subtype of every type, so it can stand in any branch.
        CompoundDefinition::new(
            "error",
            Type::Error,
            vec![Overload::new(Params::Fixed(vec![Type::String]), error_eval)],
        )
        .impure(),
    ]
}
