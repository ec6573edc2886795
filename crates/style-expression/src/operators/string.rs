use crate::context::EvaluationContext;
use crate::error::EvalResult;
use crate::expression::{eval_string, Expression};
use crate::registry::{CompoundDefinition, Overload, Params};
use crate::types::{type_of, Type};
use crate::value::Value;

fn upcase_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Ok(Value::String(eval_string(&args[0], ctx)?.to_uppercase()))
}

fn downcase_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Ok(Value::String(eval_string(&args[0], ctx)?.to_lowercase()))
}

fn concat_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&arg.evaluate(ctx)?.to_display_string());
    }
    Ok(Value::String(out))
}

fn typeof_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let value = args[0].evaluate(ctx)?;
    Ok(Value::String(type_of(&value).to_string()))
}

pub fn operators() -> Vec<CompoundDefinition> {
    vec![
        CompoundDefinition::new(
            "upcase",
            Type::String,
            vec![Overload::new(Params::Fixed(vec![Type::String]), upcase_eval)],
        ),
        CompoundDefinition::new(
            "downcase",
            Type::String,
            vec![Overload::new(Params::Fixed(vec![Type::String]), downcase_eval)],
        ),
        CompoundDefinition::new(
            "concat",
            Type::String,
            vec![Overload::new(Params::Varargs(Type::Value), concat_eval)],
        ),
        CompoundDefinition::new(
            "typeof",
            Type::String,
            vec![Overload::new(Params::Fixed(vec![Type::Value]), typeof_eval)],
        ),
    ]
}
