//! Typed expression compiler and evaluator for map style specifications.
//!
//! # Overview
//!
//! Style expressions are JSON arrays of the form `[operator, ...operands]`.
//! They are compiled once against an [`OperatorRegistry`] into a typed
//! [`Expression`] tree, then evaluated many times against an
//! [`EvaluationContext`] describing the zoom level, the current feature and
//! its state.
//!
//! # Example
//!
//! ```
//! use style_expression::{create_expression, EvaluationContext, Feature, GeometryType};
//! use style_expression::{OperatorRegistry, Value};
//! use serde_json::json;
//!
//! let registry = OperatorRegistry::standard();
//! let expr = create_expression(&json!(["*", ["get", "size"], 2]), None, &registry).unwrap();
//!
//! let feature = Feature::new(GeometryType::Point).with_property("size", 21.0);
//! let ctx = EvaluationContext::default().with_feature(&feature);
//! assert_eq!(expr.evaluate(&ctx), Value::Number(42.0));
//! ```

pub mod analysis;
pub mod color;
mod color_spaces;
pub mod context;
pub mod error;
pub mod expression;
pub mod operators;
pub mod parsing_context;
pub mod property_spec;
pub mod registry;
pub mod style_expression;
pub mod types;
pub mod value;

pub use analysis::{
    find_zoom_curve, global_state_refs, is_constant, is_feature_constant,
    is_global_property_constant, is_state_constant,
};
pub use color::Color;
pub use context::{
    CanonicalTileId, EvaluationContext, Feature, GeometryType, GlobalProperties, Parameter, Point,
};
pub use error::{CompileError, EvalError, EvalResult, ParsingError};
pub use expression::Expression;
pub use parsing_context::{ParsingContext, TypeAnnotation};
pub use property_spec::{PropertySpecification, PropertyType};
pub use registry::{CompoundDefinition, OperatorDefinition, OperatorRegistry, Overload, Params};
pub use style_expression::{
    create_expression, create_property_expression, ExpressionKind, PropertyExpression,
    StyleExpression,
};
pub use types::Type;
pub use value::{Value, ValueMap};
