//! Geometry helpers shared by `within` and `distance`.

use crate::context::{CanonicalTileId, Point, EXTENT};
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// `[lng, lat]` or a tile-space `[x, y]`, depending on context.
pub type Position = [f64; 2];
pub type Ring = Vec<Position>;
pub type Polygon = Vec<Ring>;

/// The subset of GeoJSON accepted by `within` and `distance`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Point {
        coordinates: Vec<f64>,
    },
    MultiPoint {
        coordinates: Vec<Vec<f64>>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    Feature {
        geometry: Option<Box<GeoJson>>,
    },
    FeatureCollection {
        features: Vec<GeoJson>,
    },
}

impl GeoJson {
    pub fn from_json(raw: &JsonValue) -> Option<GeoJson> {
        serde_json::from_value(raw.clone()).ok()
    }
}

/// A geometry in longitude/latitude, flattened to the three shapes the
/// distance and containment checks work with.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Points(Vec<Position>),
    Line(Vec<Position>),
    Polygon(Polygon),
}

fn position(raw: &[f64]) -> Option<Position> {
    match raw {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some([*x, *y]),
        _ => None,
    }
}

fn positions(raw: &[Vec<f64>]) -> Option<Vec<Position>> {
    raw.iter().map(|p| position(p)).collect()
}

fn polygon(raw: &[Vec<Vec<f64>>]) -> Option<Polygon> {
    raw.iter().map(|ring| positions(ring)).collect()
}

/// Flattens `geojson` into shapes. `None` when any coordinate is malformed.
pub fn shapes(geojson: &GeoJson) -> Option<Vec<Shape>> {
    let mut out = Vec::new();
    collect_shapes(geojson, &mut out)?;
    Some(out)
}

fn collect_shapes(geojson: &GeoJson, out: &mut Vec<Shape>) -> Option<()> {
    match geojson {
        GeoJson::Point { coordinates } => out.push(Shape::Points(vec![position(coordinates)?])),
        GeoJson::MultiPoint { coordinates } => out.push(Shape::Points(positions(coordinates)?)),
        GeoJson::LineString { coordinates } => out.push(Shape::Line(positions(coordinates)?)),
        GeoJson::MultiLineString { coordinates } => {
            for line in coordinates {
                out.push(Shape::Line(positions(line)?));
            }
        }
        GeoJson::Polygon { coordinates } => out.push(Shape::Polygon(polygon(coordinates)?)),
        GeoJson::MultiPolygon { coordinates } => {
            for p in coordinates {
                out.push(Shape::Polygon(polygon(p)?));
            }
        }
        GeoJson::Feature { geometry } => {
            if let Some(geometry) = geometry {
                collect_shapes(geometry, out)?;
            }
        }
        GeoJson::FeatureCollection { features } => {
            for feature in features {
                collect_shapes(feature, out)?;
            }
        }
    }
    Some(())
}

pub fn mercator_x(lng: f64) -> f64 {
    (180.0 + lng) / 360.0
}

pub fn mercator_y(lat: f64) -> f64 {
    (180.0
        - (180.0 / std::f64::consts::PI
            * (std::f64::consts::PI / 4.0 + lat * std::f64::consts::PI / 360.0)
                .tan()
                .ln()))
        / 360.0
}

pub fn lng_from_mercator_x(x: f64) -> f64 {
    x * 360.0 - 180.0
}

pub fn lat_from_mercator_y(y: f64) -> f64 {
    let y2 = 180.0 - y * 360.0;
    360.0 / std::f64::consts::PI * (y2 * std::f64::consts::PI / 180.0).exp().atan() - 90.0
}

/// Projects a longitude/latitude into world tile space at `canonical.z`.
pub fn to_world(p: Position, canonical: &CanonicalTileId) -> Position {
    let tiles = 2f64.powi(canonical.z as i32);
    [
        (mercator_x(p[0]) * tiles * EXTENT).round(),
        (mercator_y(p[1]) * tiles * EXTENT).round(),
    ]
}

/// Converts a tile-local point to world tile space.
pub fn tile_to_world(p: &Point, canonical: &CanonicalTileId) -> Position {
    [
        p.x + canonical.x as f64 * EXTENT,
        p.y + canonical.y as f64 * EXTENT,
    ]
}

/// Converts a tile-local point to longitude/latitude.
pub fn tile_to_lng_lat(p: &Point, canonical: &CanonicalTileId) -> Position {
    let tiles = 2f64.powi(canonical.z as i32);
    let x = (p.x / EXTENT + canonical.x as f64) / tiles;
    let y = (p.y / EXTENT + canonical.y as f64) / tiles;
    [lng_from_mercator_x(x), lat_from_mercator_y(y)]
}

/// Axis-aligned bounds `[min_x, min_y, max_x, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox(pub [f64; 4]);

impl Default for BBox {
    fn default() -> Self {
        BBox([
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        ])
    }
}

impl BBox {
    pub fn extend(&mut self, p: Position) {
        self.0[0] = self.0[0].min(p[0]);
        self.0[1] = self.0[1].min(p[1]);
        self.0[2] = self.0[2].max(p[0]);
        self.0[3] = self.0[3].max(p[1]);
    }

    /// Strict containment of `self` inside `outer`.
    pub fn within(&self, outer: &BBox) -> bool {
        self.0[0] > outer.0[0]
            && self.0[2] < outer.0[2]
            && self.0[1] > outer.0[1]
            && self.0[3] < outer.0[3]
    }
}

fn on_boundary(p: Position, a: Position, b: Position) -> bool {
    let (x1, y1) = (p[0] - a[0], p[1] - a[1]);
    let (x2, y2) = (p[0] - b[0], p[1] - b[1]);
    x1 * y2 - x2 * y1 == 0.0 && x1 * x2 <= 0.0 && y1 * y2 <= 0.0
}

fn ray_intersect(p: Position, a: Position, b: Position) -> bool {
    (a[1] > p[1]) != (b[1] > p[1]) && p[0] < (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0]
}

/// Even-odd containment test. Points on an edge yield `on_boundary`.
pub fn point_in_polygon(p: Position, polygon: &[Ring], on_edge: bool) -> bool {
    let mut inside = false;
    for ring in polygon {
        for edge in ring.windows(2) {
            if on_boundary(p, edge[0], edge[1]) {
                return on_edge;
            }
            if ray_intersect(p, edge[0], edge[1]) {
                inside = !inside;
            }
        }
    }
    inside
}

fn cross(v1: Position, v2: Position) -> f64 {
    v1[0] * v2[1] - v1[1] * v2[0]
}

fn two_sided(p1: Position, p2: Position, q1: Position, q2: Position) -> bool {
    let (x1, y1) = (p1[0] - q1[0], p1[1] - q1[1]);
    let (x2, y2) = (p2[0] - q1[0], p2[1] - q1[1]);
    let (x3, y3) = (q2[0] - q1[0], q2[1] - q1[1]);
    let det1 = x1 * y3 - x3 * y1;
    let det2 = x2 * y3 - x3 * y2;
    (det1 > 0.0 && det2 < 0.0) || (det1 < 0.0 && det2 > 0.0)
}

/// Proper crossing of segments `a-b` and `c-d`. Parallel segments never
/// cross.
pub fn segments_cross(a: Position, b: Position, c: Position, d: Position) -> bool {
    let p = [b[0] - a[0], b[1] - a[1]];
    let q = [d[0] - c[0], d[1] - c[1]];
    if cross(q, p) == 0.0 {
        return false;
    }
    two_sided(a, b, c, d) && two_sided(c, d, a, b)
}

/// Segment intersection including touching and collinear overlap.
pub fn segments_intersect(a: Position, b: Position, c: Position, d: Position) -> bool {
    fn orient(p: Position, q: Position, r: Position) -> f64 {
        (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
    }
    fn on_segment(p: Position, q: Position, r: Position) -> bool {
        r[0] >= p[0].min(q[0])
            && r[0] <= p[0].max(q[0])
            && r[1] >= p[1].min(q[1])
            && r[1] <= p[1].max(q[1])
    }
    let (d1, d2) = (orient(c, d, a), orient(c, d, b));
    let (d3, d4) = (orient(a, b, c), orient(a, b, d));
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(c, d, a))
        || (d2 == 0.0 && on_segment(c, d, b))
        || (d3 == 0.0 && on_segment(a, b, c))
        || (d4 == 0.0 && on_segment(a, b, d))
}

/// Twice the signed area of a tile-space ring. Positive for clockwise rings
/// in y-down tile coordinates.
pub fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[(i + n - 1) % n];
        sum += (p2.x - p1.x) * (p1.y + p2.y);
    }
    sum
}

/// Groups tile rings into polygons: each ring with the winding of the first
/// ring starts a new polygon, the others are its holes. Degenerate rings are
/// dropped.
pub fn classify_rings(rings: &[Vec<Point>]) -> Vec<Vec<&[Point]>> {
    let mut polygons: Vec<Vec<&[Point]>> = Vec::new();
    let mut exterior_ccw: Option<bool> = None;
    for ring in rings {
        let area = signed_area(ring);
        if area == 0.0 {
            continue;
        }
        let ccw = area < 0.0;
        let first = *exterior_ccw.get_or_insert(ccw);
        if ccw == first || polygons.is_empty() {
            polygons.push(vec![ring.as_slice()]);
        } else if let Some(current) = polygons.last_mut() {
            current.push(ring.as_slice());
        }
    }
    polygons
}

/// Flat-earth distance approximation, accurate for short distances at a
/// fixed latitude. Results are in meters.
#[derive(Debug, Clone, Copy)]
pub struct CheapRuler {
    kx: f64,
    ky: f64,
}

impl CheapRuler {
    const RE: f64 = 6378.137;
    const FE: f64 = 1.0 / 298.257223563;

    pub fn new(lat: f64) -> Self {
        let e2 = Self::FE * (2.0 - Self::FE);
        let m = std::f64::consts::PI / 180.0 * Self::RE * 1000.0;
        let coslat = lat.to_radians().cos();
        let w2 = 1.0 / (1.0 - e2 * (1.0 - coslat * coslat));
        let w = w2.sqrt();
        CheapRuler {
            kx: m * w * coslat,
            ky: m * w * w2 * (1.0 - e2),
        }
    }

    fn wrap(mut deg: f64) -> f64 {
        while deg < -180.0 {
            deg += 360.0;
        }
        while deg > 180.0 {
            deg -= 360.0;
        }
        deg
    }

    pub fn distance(&self, a: Position, b: Position) -> f64 {
        let dx = Self::wrap(a[0] - b[0]) * self.kx;
        let dy = (a[1] - b[1]) * self.ky;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn point_to_segment(&self, p: Position, a: Position, b: Position) -> f64 {
        let (mut x, mut y) = (a[0], a[1]);
        let dx = Self::wrap(b[0] - x) * self.kx;
        let dy = (b[1] - y) * self.ky;
        if dx != 0.0 || dy != 0.0 {
            let t = (Self::wrap(p[0] - x) * self.kx * dx + (p[1] - y) * self.ky * dy)
                / (dx * dx + dy * dy);
            if t > 1.0 {
                x = b[0];
                y = b[1];
            } else if t > 0.0 {
                x += dx / self.kx * t;
                y += dy / self.ky * t;
            }
        }
        self.distance(p, [x, y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mercator_round_trip() {
        for lat in [-60.0, 0.0, 12.5, 45.0] {
            assert!((lat_from_mercator_y(mercator_y(lat)) - lat).abs() < 1e-9);
        }
        assert!((lng_from_mercator_x(mercator_x(33.0)) - 33.0).abs() < 1e-12);
    }

    #[test]
    fn point_in_square() {
        let square = vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]];
        assert!(point_in_polygon([5.0, 5.0], &square, false));
        assert!(!point_in_polygon([15.0, 5.0], &square, false));
        assert!(!point_in_polygon([10.0, 5.0], &square, false));
        assert!(point_in_polygon([10.0, 5.0], &square, true));
    }

    #[test]
    fn crossing_segments() {
        assert!(segments_cross([0.0, 0.0], [2.0, 2.0], [0.0, 2.0], [2.0, 0.0]));
        assert!(!segments_cross([0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]));
        assert!(segments_intersect([0.0, 0.0], [1.0, 1.0], [1.0, 1.0], [2.0, 0.0]));
    }

    #[test]
    fn parses_geojson_shapes() {
        let geojson = GeoJson::from_json(&json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1, 2]}},
                {"type": "Feature", "geometry": {"type": "MultiLineString", "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3, 10]]]}}
            ]
        }))
        .unwrap();
        let shapes = shapes(&geojson).unwrap();
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[0], Shape::Points(vec![[1.0, 2.0]]));
    }

    #[test]
    fn ruler_measures_a_degree_of_latitude() {
        let ruler = CheapRuler::new(0.0);
        let d = ruler.distance([0.0, 0.0], [0.0, 1.0]);
        assert!((d - 110_574.0).abs() < 100.0, "{}", d);
    }

    #[test]
    fn classifies_holes() {
        let outer = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 0.0),
        ];
        let mut hole = outer.clone();
        hole.reverse();
        let rings = [outer.clone(), hole, outer];
        let polygons = classify_rings(&rings);
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].len(), 2);
    }
}
