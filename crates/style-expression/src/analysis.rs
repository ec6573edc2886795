//! Static analyses over compiled expressions.
//!
//! Compound operators declare the runtime [`Parameter`]s they read, so the
//! analyses here never look at operator names.

use crate::context::Parameter;
use crate::expression::Expression;
use std::collections::BTreeSet;
use std::ptr;

fn all_children(expr: &Expression, mut pred: impl FnMut(&Expression) -> bool) -> bool {
    let mut result = true;
    expr.each_child(&mut |child| {
        if result && !pred(child) {
            result = false;
        }
    });
    result
}

/// Whether `expr` reads nothing from the feature: properties, id, geometry
/// or feature state.
pub fn is_feature_constant(expr: &Expression) -> bool {
    match expr {
        Expression::Compound(c)
            if c.reads(Parameter::Feature) || c.reads(Parameter::FeatureState) =>
        {
            false
        }
        Expression::Within(_) | Expression::Distance(_) => false,
        _ => all_children(expr, is_feature_constant),
    }
}

/// Whether `expr` never reads feature state.
pub fn is_state_constant(expr: &Expression) -> bool {
    match expr {
        Expression::Compound(c) if c.reads(Parameter::FeatureState) => false,
        _ => all_children(expr, is_state_constant),
    }
}

/// Whether `expr` reads none of `params`.
pub fn is_global_property_constant(expr: &Expression, params: &[Parameter]) -> bool {
    match expr {
        Expression::Compound(c) if params.iter().any(|p| c.reads(*p)) => false,
        _ => all_children(expr, |child| is_global_property_constant(child, params)),
    }
}

/// Whether `expr` can be evaluated once at compile time.
///
/// Type annotations fold when their operands do; every other node folds
/// only once its operands are already literals.
pub fn is_constant(expr: &Expression) -> bool {
    match expr {
        Expression::Var(v) => return is_constant(&v.bound),
        Expression::Compound(c) if c.impure => return false,
        Expression::Within(_) | Expression::Distance(_) | Expression::GlobalState(_) => {
            return false
        }
        _ => {}
    }
    let is_annotation = matches!(expr, Expression::Assertion(_) | Expression::Coercion(_));
    let children_constant = all_children(expr, |child| {
        if is_annotation {
            is_constant(child)
        } else {
            matches!(child, Expression::Literal(_))
        }
    });
    children_constant
        && is_feature_constant(expr)
        && is_global_property_constant(expr, &Parameter::GLOBALS)
}

/// Names read by `global-state` anywhere in `expr`, deduplicated.
pub fn global_state_refs(expr: &Expression) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    collect_global_state_refs(expr, &mut refs);
    refs
}

fn collect_global_state_refs(expr: &Expression, refs: &mut BTreeSet<String>) {
    if let Expression::GlobalState(g) = expr {
        refs.insert(g.key.clone());
    }
    expr.each_child(&mut |child| collect_global_state_refs(child, refs));
}

pub(crate) const ZOOM_NOT_TOP_LEVEL: &str =
    "\"zoom\" expression may only be used as input to a top-level \"step\" or \"interpolate\" expression.";
pub(crate) const MULTIPLE_ZOOM_CURVES: &str =
    "Only one zoom-based \"step\" or \"interpolate\" subexpression may be used in an expression.";

fn is_zoom_input(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::Compound(c) if c.args.is_empty() && c.reads == [Parameter::Zoom]
    )
}

/// Finds the `step`/`interpolate` node driven by `["zoom"]`.
///
/// The curve may sit at the top level or be reached through `let` results
/// and `coalesce` operands. A zoom curve anywhere else, or a second one,
/// is an error.
pub fn find_zoom_curve(expr: &Expression) -> Result<Option<&Expression>, String> {
    let result = match expr {
        Expression::Let(l) => find_zoom_curve(&l.result)?,
        Expression::Coalesce(c) => {
            let mut found = None;
            for arg in &c.args {
                found = find_zoom_curve(arg)?;
                if found.is_some() {
                    break;
                }
            }
            found
        }
        Expression::Step(s) if is_zoom_input(&s.input) => Some(expr),
        Expression::Interpolate(i) if is_zoom_input(&i.input) => Some(expr),
        _ => None,
    };

    let mut error = None;
    expr.each_child(&mut |child| {
        if error.is_some() {
            return;
        }
        match find_zoom_curve(child) {
            Err(e) => error = Some(e),
            Ok(Some(curve)) => match result {
                None => error = Some(ZOOM_NOT_TOP_LEVEL.to_string()),
                Some(existing) if !ptr::eq(existing, curve) => {
                    error = Some(MULTIPLE_ZOOM_CURVES.to_string())
                }
                Some(_) => {}
            },
            Ok(None) => {}
        }
    });
    match error {
        Some(e) => Err(e),
        None => Ok(result),
    }
}
