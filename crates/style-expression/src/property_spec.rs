//! Style property specifications, as found in the style reference JSON.

use crate::color::Color;
use crate::context::Parameter;
use crate::types::Type;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Declared value type of a style property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Number,
    String,
    Boolean,
    Color,
    Enum,
    Array,
    Formatted,
    ResolvedImage,
    #[serde(other)]
    Other,
}

/// How a property may vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyKind {
    Constant,
    DataConstant,
    DataDriven,
    CrossFaded,
    CrossFadedDataDriven,
    ColorRamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionSpec {
    #[serde(default)]
    pub interpolated: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Enum values are either a plain list or an object keyed by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValues {
    List(Vec<String>),
    Documented(serde_json::Map<String, JsonValue>),
}

impl EnumValues {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            EnumValues::List(values) => values.iter().any(|v| v == value),
            EnumValues::Documented(map) => map.contains_key(value),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            EnumValues::List(values) => values.iter().map(String::as_str).collect(),
            EnumValues::Documented(map) => map.keys().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PropertySpecification {
    #[serde(rename = "type")]
    pub kind: PropertyType,
    /// Item type of array properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<EnumValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyKind>,
}

fn scalar_type(kind: PropertyType) -> Type {
    match kind {
        PropertyType::Number => Type::Number,
        PropertyType::String | PropertyType::Enum => Type::String,
        PropertyType::Boolean => Type::Boolean,
        PropertyType::Color => Type::Color,
        PropertyType::Formatted | PropertyType::ResolvedImage => Type::String,
        PropertyType::Array => Type::any_array(),
        PropertyType::Other => Type::Value,
    }
}

impl PropertySpecification {
    pub fn new(kind: PropertyType) -> Self {
        PropertySpecification {
            kind,
            value: None,
            length: None,
            default: None,
            values: None,
            expression: None,
            property_type: None,
        }
    }

    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_parameters(mut self, interpolated: bool, parameters: Vec<Parameter>) -> Self {
        self.expression = Some(ExpressionSpec {
            interpolated,
            parameters,
        });
        self
    }

    /// The type a compiled expression must produce for this property.
    pub fn expected_type(&self) -> Type {
        match self.kind {
            PropertyType::Array => Type::array(
                self.value.map_or(Type::Value, scalar_type),
                self.length,
            ),
            kind => scalar_type(kind),
        }
    }

    /// Whether the property accepts an expression that reads `parameter`.
    pub fn allows(&self, parameter: Parameter) -> bool {
        self.expression
            .as_ref()
            .is_some_and(|e| e.parameters.contains(&parameter))
    }

    pub fn interpolated(&self) -> bool {
        self.expression.as_ref().is_some_and(|e| e.interpolated)
    }

    /// The declared default as a runtime value. Color defaults are parsed.
    pub fn default_value(&self) -> Option<Value> {
        let raw = self.default.as_ref()?;
        match (self.kind, raw) {
            (PropertyType::Color, JsonValue::String(s)) => Color::parse(s).map(Value::Color),
            _ => Some(Value::from(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_reference_entries() {
        let spec: PropertySpecification = serde_json::from_value(json!({
            "type": "enum",
            "values": {"map": {"doc": ""}, "viewport": {"doc": ""}},
            "default": "map",
            "expression": {"interpolated": false, "parameters": ["zoom"]},
            "property-type": "data-constant"
        }))
        .unwrap();
        assert_eq!(spec.expected_type(), Type::String);
        assert!(spec.values.as_ref().unwrap().contains("viewport"));
        assert!(spec.allows(Parameter::Zoom));
        assert!(!spec.allows(Parameter::Feature));
        assert_eq!(spec.property_type, Some(PropertyKind::DataConstant));
    }

    #[test]
    fn array_and_color_types() {
        let spec: PropertySpecification = serde_json::from_value(json!({
            "type": "array", "value": "number", "length": 2, "default": [0, 0]
        }))
        .unwrap();
        assert_eq!(spec.expected_type(), Type::array(Type::Number, Some(2)));

        let color = PropertySpecification::new(PropertyType::Color).with_default(json!("red"));
        assert_eq!(color.default_value(), Some(Value::Color(Color::new(1.0, 0.0, 0.0, 1.0))));
    }
}
