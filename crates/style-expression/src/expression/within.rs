use super::geometry::{self, BBox, GeoJson, Polygon, Position, Shape};
use super::Expression;
use crate::context::{CanonicalTileId, EvaluationContext, GeometryType, Point};
use crate::parsing_context::ParsingContext;
use crate::types::Type;
use serde_json::Value as JsonValue;

/// `["within", geojson]`: whether the feature lies inside any of the given
/// polygons. Only point and line features can be inside.
#[derive(Debug, Clone)]
pub struct Within {
    pub ty: Type,
    /// Polygons in longitude/latitude.
    pub polygons: Vec<Polygon>,
}

impl Within {
    pub(super) fn evaluate(&self, ctx: &EvaluationContext<'_>) -> bool {
        let (Some(geometry), Some(canonical)) = (ctx.geometry(), ctx.canonical) else {
            return false;
        };
        match ctx.geometry_type() {
            Some(GeometryType::Point) => self.points_within(geometry, &canonical),
            Some(GeometryType::LineString) => self.lines_within(geometry, &canonical),
            _ => false,
        }
    }

    fn tile_polygons(&self, canonical: &CanonicalTileId, bbox: &mut BBox) -> Vec<Polygon> {
        self.polygons
            .iter()
            .map(|polygon| {
                polygon
                    .iter()
                    .map(|ring| {
                        ring.iter()
                            .map(|&p| {
                                let world = geometry::to_world(p, canonical);
                                bbox.extend(world);
                                world
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    fn points_within(&self, geometry: &[Vec<Point>], canonical: &CanonicalTileId) -> bool {
        let mut poly_bbox = BBox::default();
        let polygons = self.tile_polygons(canonical, &mut poly_bbox);
        let world_size = world_size(canonical);
        let mut point_bbox = BBox::default();
        let points: Vec<Position> = geometry
            .iter()
            .flatten()
            .map(|p| {
                let mut world = geometry::tile_to_world(p, canonical);
                wrap_into(&mut world, &poly_bbox, world_size);
                point_bbox.extend(world);
                world
            })
            .collect();
        if !point_bbox.within(&poly_bbox) {
            return false;
        }
        points.iter().all(|&p| {
            polygons
                .iter()
                .any(|polygon| geometry::point_in_polygon(p, polygon, false))
        })
    }

    fn lines_within(&self, geometry: &[Vec<Point>], canonical: &CanonicalTileId) -> bool {
        let mut poly_bbox = BBox::default();
        let polygons = self.tile_polygons(canonical, &mut poly_bbox);
        let world_size = world_size(canonical);

        let mut line_bbox = BBox::default();
        let mut lines: Vec<Vec<Position>> = geometry
            .iter()
            .map(|line| {
                line.iter()
                    .map(|p| {
                        let world = geometry::tile_to_world(p, canonical);
                        line_bbox.extend(world);
                        world
                    })
                    .collect()
            })
            .collect();
        // Lines spanning less than half the world may be shifted across the
        // antimeridian as a whole.
        if line_bbox.0[2] - line_bbox.0[0] <= world_size / 2.0 {
            line_bbox = BBox::default();
            for p in lines.iter_mut().flatten() {
                wrap_into(p, &poly_bbox, world_size);
                line_bbox.extend(*p);
            }
        }
        if !line_bbox.within(&poly_bbox) {
            return false;
        }
        lines.iter().all(|line| {
            polygons
                .iter()
                .any(|polygon| line_within_polygon(line, polygon))
        })
    }
}

fn world_size(canonical: &CanonicalTileId) -> f64 {
    2f64.powi(canonical.z as i32) * crate::context::EXTENT
}

/// Shifts `p` by one world width when that brings it next to `bbox`.
fn wrap_into(p: &mut Position, bbox: &BBox, world_size: f64) {
    if p[0] >= bbox.0[0] && p[0] <= bbox.0[2] {
        return;
    }
    let half = world_size * 0.5;
    let shift_towards = |edge: f64| {
        if p[0] - edge > half {
            -world_size
        } else if edge - p[0] > half {
            world_size
        } else {
            0.0
        }
    };
    let mut shift = shift_towards(bbox.0[0]);
    if shift == 0.0 {
        shift = shift_towards(bbox.0[2]);
    }
    p[0] += shift;
}

fn line_within_polygon(line: &[Position], polygon: &Polygon) -> bool {
    if !line
        .iter()
        .all(|&p| geometry::point_in_polygon(p, polygon, false))
    {
        return false;
    }
    !line.windows(2).any(|segment| {
        polygon.iter().any(|ring| {
            ring.windows(2)
                .any(|edge| geometry::segments_cross(segment[0], segment[1], edge[0], edge[1]))
        })
    })
}

pub(super) fn parse(args: &[JsonValue], ctx: &mut ParsingContext<'_>) -> Option<Expression> {
    if args.len() != 2 {
        return ctx.error(format!(
            "'within' expression requires exactly one argument, but found {} instead.",
            args.len() - 1
        ));
    }
    let polygons: Vec<Polygon> = GeoJson::from_json(&args[1])
        .filter(|g| {
            matches!(
                g,
                GeoJson::Polygon { .. }
                    | GeoJson::MultiPolygon { .. }
                    | GeoJson::Feature { .. }
                    | GeoJson::FeatureCollection { .. }
            )
        })
        .and_then(|g| geometry::shapes(&g))
        .map(|shapes| {
            shapes
                .into_iter()
                .filter_map(|shape| match shape {
                    Shape::Polygon(p) => Some(p),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    if polygons.is_empty() {
        return ctx.error(
            "'within' expression requires valid geojson object that contains polygon geometry type.",
        );
    }
    Some(Expression::Within(Within {
        ty: Type::Boolean,
        polygons,
    }))
}
