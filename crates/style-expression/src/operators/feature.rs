//! Feature accessors and ambient renderer inputs.

use crate::context::{EvaluationContext, Feature, GeometryType, Parameter};
use crate::error::EvalResult;
use crate::expression::{eval_string, geometry, type_mismatch, Expression};
use crate::registry::{CompoundDefinition, Overload, Params};
use crate::types::Type;
use crate::value::{Value, ValueMap};

const FEATURE: &[Parameter] = &[Parameter::Feature];

fn eval_object(expr: &Expression, ctx: &EvaluationContext<'_>) -> EvalResult<ValueMap> {
    match expr.evaluate(ctx)? {
        Value::Object(map) => Ok(map),
        other => Err(type_mismatch(&Type::Object, &other)),
    }
}

fn get_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = eval_string(&args[0], ctx)?;
    Ok(ctx.property(&key).cloned().unwrap_or(Value::Null))
}

fn get_from_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = eval_string(&args[0], ctx)?;
    let object = eval_object(&args[1], ctx)?;
    Ok(object.get(&key).cloned().unwrap_or(Value::Null))
}

fn has_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = eval_string(&args[0], ctx)?;
    Ok(Value::Boolean(ctx.property(&key).is_some()))
}

fn has_in_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = eval_string(&args[0], ctx)?;
    let object = eval_object(&args[1], ctx)?;
    Ok(Value::Boolean(object.contains_key(&key)))
}

fn feature_state_eval(ctx: &EvaluationContext<'_>, args: &[Expression]) -> EvalResult<Value> {
    let key = eval_string(&args[0], ctx)?;
    Ok(ctx.feature_state_value(&key))
}

fn properties_eval(ctx: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Object(ctx.properties().cloned().unwrap_or_default()))
}

fn id_eval(ctx: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(ctx.id())
}

/// Geometry type name, distinguishing multi-part geometries when the
/// decoded geometry is available.
pub fn geometry_type_name(feature: &Feature) -> &'static str {
    match (feature.geometry_type, feature.geometry.as_deref()) {
        (GeometryType::Point, Some(g)) if g.iter().map(Vec::len).sum::<usize>() > 1 => {
            "MultiPoint"
        }
        (GeometryType::LineString, Some(g)) if g.len() > 1 => "MultiLineString",
        (GeometryType::Polygon, Some(g)) if geometry::classify_rings(g).len() > 1 => {
            "MultiPolygon"
        }
        (kind, _) => kind.as_str(),
    }
}

fn geometry_type_eval(ctx: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    let name = ctx
        .feature
        .map_or(GeometryType::Unknown.as_str(), geometry_type_name);
    Ok(Value::String(name.to_string()))
}

fn zoom_eval(ctx: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Number(ctx.globals.zoom))
}

fn heatmap_density_eval(ctx: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Number(ctx.globals.heatmap_density.unwrap_or(0.0)))
}

fn line_progress_eval(ctx: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(Value::Number(ctx.globals.line_progress.unwrap_or(0.0)))
}

fn accumulated_eval(ctx: &EvaluationContext<'_>, _: &[Expression]) -> EvalResult<Value> {
    Ok(ctx.globals.accumulated.map_or(Value::Null, Value::Number))
}

fn nullary(
    name: &'static str,
    output: Type,
    eval: crate::registry::CompoundEvalFn,
    reads: &'static [Parameter],
) -> CompoundDefinition {
    CompoundDefinition::new(
        name,
        output,
        vec![Overload::new(Params::Fixed(vec![]), eval).reading(reads)],
    )
}

pub fn operators() -> Vec<CompoundDefinition> {
    vec![
        CompoundDefinition::new(
            "get",
            Type::Value,
            vec![
                Overload::new(Params::Fixed(vec![Type::String]), get_eval).reading(FEATURE),
                Overload::new(Params::Fixed(vec![Type::String, Type::Object]), get_from_eval),
            ],
        ),
        CompoundDefinition::new(
            "has",
            Type::Boolean,
            vec![
                Overload::new(Params::Fixed(vec![Type::String]), has_eval).reading(FEATURE),
                Overload::new(Params::Fixed(vec![Type::String, Type::Object]), has_in_eval),
            ],
        ),
        CompoundDefinition::new(
            "feature-state",
            Type::Value,
            vec![Overload::new(Params::Fixed(vec![Type::String]), feature_state_eval)
                .reading(&[Parameter::FeatureState])],
        ),
        nullary("properties", Type::Object, properties_eval, FEATURE),
        nullary("geometry-type", Type::String, geometry_type_eval, FEATURE),
        nullary("id", Type::Value, id_eval, FEATURE),
        nullary("zoom", Type::Number, zoom_eval, &[Parameter::Zoom]),
        nullary(
            "heatmap-density",
            Type::Number,
            heatmap_density_eval,
            &[Parameter::HeatmapDensity],
        ),
        nullary(
            "line-progress",
            Type::Number,
            line_progress_eval,
            &[Parameter::LineProgress],
        ),
        nullary(
            "accumulated",
            Type::Number,
            accumulated_eval,
            &[Parameter::Accumulated],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Point;

    #[test]
    fn multi_part_geometry_types() {
        let points = Feature::new(GeometryType::Point)
            .with_geometry(vec![vec![Point::new(1.0, 1.0)], vec![Point::new(2.0, 2.0)]]);
        assert_eq!(geometry_type_name(&points), "MultiPoint");

        let line = Feature::new(GeometryType::LineString)
            .with_geometry(vec![vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]]);
        assert_eq!(geometry_type_name(&line), "LineString");

        let bare = Feature::new(GeometryType::Polygon);
        assert_eq!(geometry_type_name(&bare), "Polygon");
    }
}
