//! Runtime inputs for evaluation.

use crate::value::{Value, ValueMap};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tile extent of decoded feature geometry.
pub const EXTENT: f64 = 8192.0;

/// A runtime input an expression may read. Property specifications list the
/// parameters their expressions are allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Parameter {
    Zoom,
    Feature,
    FeatureState,
    HeatmapDensity,
    LineProgress,
    Accumulated,
}

impl Parameter {
    /// The global (non-feature) parameters.
    pub const GLOBALS: [Parameter; 4] = [
        Parameter::Zoom,
        Parameter::HeatmapDensity,
        Parameter::LineProgress,
        Parameter::Accumulated,
    ];
}

/// Ambient renderer scalars.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalProperties {
    pub zoom: f64,
    pub heatmap_density: Option<f64>,
    pub line_progress: Option<f64>,
    pub accumulated: Option<f64>,
}

impl GlobalProperties {
    pub fn at_zoom(zoom: f64) -> Self {
        GlobalProperties {
            zoom,
            ..Default::default()
        }
    }
}

/// Tile-local geometry type as reported by the tile decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryType {
    #[default]
    Unknown,
    Point,
    LineString,
    Polygon,
}

impl GeometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Unknown => "Unknown",
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in tile coordinates (`0..EXTENT`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// The `(z, x, y)` address of the tile a feature's geometry is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanonicalTileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl CanonicalTileId {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        CanonicalTileId { z, x, y }
    }
}

/// A feature as seen by expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub id: Option<Value>,
    pub geometry_type: GeometryType,
    pub properties: ValueMap,
    /// Decoded geometry: one ring/line/point-group per entry.
    pub geometry: Option<Vec<Vec<Point>>>,
}

impl Feature {
    pub fn new(geometry_type: GeometryType) -> Self {
        Feature {
            geometry_type,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: ValueMap) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_geometry(mut self, geometry: Vec<Vec<Point>>) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// Everything one evaluation may read. Borrowed, never retained.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub globals: GlobalProperties,
    pub feature: Option<&'a Feature>,
    pub feature_state: Option<&'a ValueMap>,
    pub canonical: Option<CanonicalTileId>,
    pub global_state: Option<&'a ValueMap>,
}

impl Default for EvaluationContext<'_> {
    fn default() -> Self {
        EvaluationContext::new(GlobalProperties::default())
    }
}

impl<'a> EvaluationContext<'a> {
    pub fn new(globals: GlobalProperties) -> Self {
        EvaluationContext {
            globals,
            feature: None,
            feature_state: None,
            canonical: None,
            global_state: None,
        }
    }

    pub fn with_feature(mut self, feature: &'a Feature) -> Self {
        self.feature = Some(feature);
        self
    }

    pub fn with_feature_state(mut self, state: &'a ValueMap) -> Self {
        self.feature_state = Some(state);
        self
    }

    pub fn with_canonical(mut self, canonical: CanonicalTileId) -> Self {
        self.canonical = Some(canonical);
        self
    }

    pub fn with_global_state(mut self, state: &'a ValueMap) -> Self {
        self.global_state = Some(state);
        self
    }

    /// Feature id, `null` when absent.
    pub fn id(&self) -> Value {
        self.feature
            .and_then(|f| f.id.clone())
            .unwrap_or(Value::Null)
    }

    pub fn geometry_type(&self) -> Option<GeometryType> {
        self.feature.map(|f| f.geometry_type)
    }

    /// Looks up a feature property. `None` means the key is absent, which
    /// some legacy filter operators distinguish from an explicit `null`.
    pub fn property(&self, key: &str) -> Option<&'a Value> {
        self.feature.and_then(|f| f.properties.get(key))
    }

    pub fn properties(&self) -> Option<&'a ValueMap> {
        self.feature.map(|f| &f.properties)
    }

    pub fn geometry(&self) -> Option<&'a [Vec<Point>]> {
        self.feature.and_then(|f| f.geometry.as_deref())
    }

    pub fn feature_state_value(&self, key: &str) -> Value {
        self.feature_state
            .and_then(|s| s.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn global_state_value(&self, key: &str) -> Value {
        self.global_state
            .and_then(|s| s.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    }
}
