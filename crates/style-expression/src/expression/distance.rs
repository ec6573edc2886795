use super::geometry::{self, CheapRuler, GeoJson, Position, Shape};
use super::Expression;
use crate::context::{CanonicalTileId, EvaluationContext, GeometryType, Point};
use crate::parsing_context::ParsingContext;
use crate::types::Type;
use crate::value::Value;
use serde_json::Value as JsonValue;

/// `["distance", geojson]`: shortest distance in meters between the feature
/// and the given geometry. Zero when they overlap.
#[derive(Debug, Clone)]
pub struct Distance {
    pub ty: Type,
    pub shapes: Vec<Shape>,
}

impl Distance {
    /// `null` when the feature geometry or its tile is unknown.
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Value {
        let (Some(geometry), Some(canonical), Some(kind)) =
            (ctx.geometry(), ctx.canonical, ctx.geometry_type())
        else {
            return Value::Null;
        };
        let feature = feature_shapes(geometry, kind, &canonical);
        let Some(lat) = feature.iter().find_map(first_position).map(|p| p[1]) else {
            return Value::Null;
        };
        let ruler = CheapRuler::new(lat);
        let mut best = f64::INFINITY;
        for a in &feature {
            for b in &self.shapes {
                best = best.min(shape_distance(a, b, &ruler));
                if best == 0.0 {
                    return Value::Number(0.0);
                }
            }
        }
        if best.is_finite() {
            Value::Number(best)
        } else {
            Value::Null
        }
    }
}

fn first_position(shape: &Shape) -> Option<Position> {
    match shape {
        Shape::Points(ps) | Shape::Line(ps) => ps.first().copied(),
        Shape::Polygon(rings) => rings.first().and_then(|r| r.first()).copied(),
    }
}

fn feature_shapes(
    geometry: &[Vec<Point>],
    kind: GeometryType,
    canonical: &CanonicalTileId,
) -> Vec<Shape> {
    let convert = |points: &[Point]| -> Vec<Position> {
        points
            .iter()
            .map(|p| geometry::tile_to_lng_lat(p, canonical))
            .collect()
    };
    match kind {
        GeometryType::Point => {
            let points: Vec<Point> = geometry.iter().flatten().copied().collect();
            vec![Shape::Points(convert(&points))]
        }
        GeometryType::LineString => geometry.iter().map(|line| Shape::Line(convert(line))).collect(),
        GeometryType::Polygon => geometry::classify_rings(geometry)
            .into_iter()
            .map(|rings| Shape::Polygon(rings.into_iter().map(convert).collect()))
            .collect(),
        GeometryType::Unknown => Vec::new(),
    }
}

fn point_to_line(p: Position, line: &[Position], ruler: &CheapRuler) -> f64 {
    match line {
        [] => f64::INFINITY,
        [only] => ruler.distance(p, *only),
        _ => line
            .windows(2)
            .map(|s| ruler.point_to_segment(p, s[0], s[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

fn point_to_shape(p: Position, shape: &Shape, ruler: &CheapRuler) -> f64 {
    match shape {
        Shape::Points(qs) => qs
            .iter()
            .map(|&q| ruler.distance(p, q))
            .fold(f64::INFINITY, f64::min),
        Shape::Line(line) => point_to_line(p, line, ruler),
        Shape::Polygon(rings) => {
            if geometry::point_in_polygon(p, rings, true) {
                0.0
            } else {
                rings
                    .iter()
                    .map(|ring| point_to_line(p, ring, ruler))
                    .fold(f64::INFINITY, f64::min)
            }
        }
    }
}

fn lines_intersect(a: &[Position], b: &[Position]) -> bool {
    a.windows(2).any(|s| {
        b.windows(2)
            .any(|t| geometry::segments_intersect(s[0], s[1], t[0], t[1]))
    })
}

/// Vertices and edges of a shape, for the pairwise fallbacks.
fn vertices(shape: &Shape) -> Vec<Position> {
    match shape {
        Shape::Points(ps) | Shape::Line(ps) => ps.clone(),
        Shape::Polygon(rings) => rings.iter().flatten().copied().collect(),
    }
}

fn edges(shape: &Shape) -> Vec<&[Position]> {
    match shape {
        Shape::Points(_) => Vec::new(),
        Shape::Line(line) => vec![line.as_slice()],
        Shape::Polygon(rings) => rings.iter().map(Vec::as_slice).collect(),
    }
}

fn shape_distance(a: &Shape, b: &Shape, ruler: &CheapRuler) -> f64 {
    match (a, b) {
        (Shape::Points(ps), other) | (other, Shape::Points(ps)) => ps
            .iter()
            .map(|&p| point_to_shape(p, other, ruler))
            .fold(f64::INFINITY, f64::min),
        _ => {
            let overlaps = edges(a)
                .iter()
                .any(|ea| edges(b).iter().any(|eb| lines_intersect(ea, eb)))
                || vertices(a).iter().any(|&p| point_to_shape(p, b, ruler) == 0.0)
                || vertices(b).iter().any(|&p| point_to_shape(p, a, ruler) == 0.0);
            if overlaps {
                return 0.0;
            }
            let ab = vertices(a)
                .iter()
                .map(|&p| point_to_shape(p, b, ruler))
                .fold(f64::INFINITY, f64::min);
            let ba = vertices(b)
                .iter()
                .map(|&p| point_to_shape(p, a, ruler))
                .fold(f64::INFINITY, f64::min);
            ab.min(ba)
        }
    }
}

pub(super) fn parse(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if args.len() != 2 {
        return ctx.error(format!(
            "'distance' expression requires exactly one argument, but found {} instead.",
            args.len() - 1
        ));
    }
    let shapes = GeoJson::from_json(&args[1])
        .and_then(|g| geometry::shapes(&g))
        .unwrap_or_default();
    if shapes.is_empty() {
        return ctx.error(
            "'distance' expression requires valid geojson object that contains polygon geometry type.",
        );
    }
    Some(Expression::Distance(Distance {
        ty: Type::Number,
        shapes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_inside_polygon_is_zero() {
        let ruler = CheapRuler::new(0.0);
        let square = Shape::Polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [0.0, 0.0],
        ]]);
        let point = Shape::Points(vec![[0.5, 0.5]]);
        assert_eq!(shape_distance(&point, &square, &ruler), 0.0);
        let outside = Shape::Points(vec![[0.5, 2.0]]);
        let d = shape_distance(&outside, &square, &ruler);
        assert!((d - 110_574.0).abs() < 200.0, "{}", d);
    }

    #[test]
    fn crossing_lines_touch() {
        let ruler = CheapRuler::new(0.0);
        let a = Shape::Line(vec![[0.0, 0.0], [1.0, 1.0]]);
        let b = Shape::Line(vec![[0.0, 1.0], [1.0, 0.0]]);
        assert_eq!(shape_distance(&a, &b, &ruler), 0.0);
    }
}
