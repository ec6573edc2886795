//! Arithmetic and math operators.

use crate::context::EvaluationContext;
use crate::error::EvalResult;
use crate::expression::{eval_number, Expression};
use crate::registry::{CompoundDefinition, Overload, Params};
use crate::types::Type;
use crate::value::Value;

fn numbers(args: &[Expression], ctx: &EvaluationContext<'_>) -> EvalResult<Vec<f64>> {
    args.iter().map(|a| eval_number(a, ctx)).collect()
}

fn add_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    args.iter()
        .try_fold(0.0, |acc, a| Ok(acc + eval_number(a, ctx)?))
        .map(Value::Number)
}

fn multiply_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    args.iter()
        .try_fold(1.0, |acc, a| Ok(acc * eval_number(a, ctx)?))
        .map(Value::Number)
}

fn subtract_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let a = eval_number(&args[0], ctx)?;
    let b = eval_number(&args[1], ctx)?;
    Ok(Value::Number(a - b))
}

fn negate_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Number(-eval_number(&args[0], ctx)?))
}

fn divide_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let a = eval_number(&args[0], ctx)?;
    let b = eval_number(&args[1], ctx)?;
    Ok(Value::Number(a / b))
}

fn mod_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let a = eval_number(&args[0], ctx)?;
    let b = eval_number(&args[1], ctx)?;
    Ok(Value::Number(a % b))
}

fn pow_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let base = eval_number(&args[0], ctx)?;
    let exponent = eval_number(&args[1], ctx)?;
    Ok(Value::Number(base.powf(exponent)))
}

/// `Math.min` semantics: NaN wins, no operands gives infinity.
fn min_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let values = numbers(args, ctx)?;
    let m = if values.iter().any(|n| n.is_nan()) {
        f64::NAN
    } else {
        values.into_iter().fold(f64::INFINITY, f64::min)
    };
    Ok(Value::Number(m))
}

fn max_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let values = numbers(args, ctx)?;
    let m = if values.iter().any(|n| n.is_nan()) {
        f64::NAN
    } else {
        values.into_iter().fold(f64::NEG_INFINITY, f64::max)
    };
    Ok(Value::Number(m))
}

fn ln2_eval(_: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Number(std::f64::consts::LN_2))
}

fn pi_eval(_: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Number(std::f64::consts::PI))
}

fn e_eval(_: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Number(std::f64::consts::E))
}

macro_rules! unary {
    ($($name:ident => $f:expr;)*) => {
        $(
            fn $name(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
                let f: fn(f64) -> f64 = $f;
                Ok(Value::Number(f(eval_number(&args[0], ctx)?)))
            }
        )*
    };
}

unary! {
    sqrt_eval => f64::sqrt;
    log10_eval => f64::log10;
    ln_eval => f64::ln;
    log2_eval => f64::log2;
    sin_eval => f64::sin;
    cos_eval => f64::cos;
    tan_eval => f64::tan;
    asin_eval => f64::asin;
    acos_eval => f64::acos;
    atan_eval => f64::atan;
    abs_eval => f64::abs;
    // Half-way cases round away from zero.
    round_eval => f64::round;
    floor_eval => f64::floor;
    ceil_eval => f64::ceil;
}

fn number_op(
    name: &'static str,
    params: Vec<Type>,
    eval: crate::registry::CompoundEvalFn,
) -> CompoundDefinition {
    CompoundDefinition::new(
        name,
        Type::Number,
        vec![Overload::new(Params::Fixed(params), eval)],
    )
}

pub fn operators() -> Vec<CompoundDefinition> {
    let n = || Type::Number;
    let mut ops = vec![
        CompoundDefinition::new(
            "+",
            Type::Number,
            vec![Overload::new(Params::Varargs(Type::Number), add_eval)],
        ),
        CompoundDefinition::new(
            "*",
            Type::Number,
            vec![Overload::new(Params::Varargs(Type::Number), multiply_eval)],
        ),
        CompoundDefinition::new(
            "-",
            Type::Number,
            vec![
                Overload::new(Params::Fixed(vec![n(), n()]), subtract_eval),
                Overload::new(Params::Fixed(vec![n()]), negate_eval),
            ],
        ),
        number_op("/", vec![n(), n()], divide_eval),
        number_op("%", vec![n(), n()], mod_eval),
        number_op("^", vec![n(), n()], pow_eval),
        number_op("ln2", vec![], ln2_eval),
        number_op("pi", vec![], pi_eval),
        number_op("e", vec![], e_eval),
        CompoundDefinition::new(
            "min",
            Type::Number,
            vec![Overload::new(Params::Varargs(Type::Number), min_eval)],
        ),
        CompoundDefinition::new(
            "max",
            Type::Number,
            vec![Overload::new(Params::Varargs(Type::Number), max_eval)],
        ),
    ];
    let unary: [(&'static str, crate::registry::CompoundEvalFn); 14] = [
        ("sqrt", sqrt_eval),
        ("log10", log10_eval),
        ("ln", ln_eval),
        ("log2", log2_eval),
        ("sin", sin_eval),
        ("cos", cos_eval),
        ("tan", tan_eval),
        ("asin", asin_eval),
        ("acos", acos_eval),
        ("atan", atan_eval),
        ("abs", abs_eval),
        ("round", round_eval),
        ("floor", floor_eval),
        ("ceil", ceil_eval),
    ];
    ops.extend(
        unary
            .into_iter()
            .map(|(name, eval)| number_op(name, vec![n()], eval)),
    );
    ops
}
