//! Feature filters for map styles.
//!
//! Filters decide which features a layer renders. They come in two
//! grammars: the deprecated positional form (`["==", "class", "river"]`)
//! and the general expression language. [`compile_filter`] accepts both,
//! converting legacy filters through [`normalize`] before compiling.
//!
//! # Example
//!
//! ```
//! use feature_filter::compile_filter;
//! use serde_json::json;
//! use style_expression::{EvaluationContext, Feature, GeometryType};
//!
//! let filter = compile_filter(&json!(["==", "class", "river"])).unwrap();
//! assert!(!filter.needs_geometry());
//!
//! let river = Feature::new(GeometryType::LineString).with_property("class", "river");
//! assert!(filter.evaluate(&EvaluationContext::default().with_feature(&river)));
//! ```

pub mod error;
pub mod filter;
pub mod legacy;

pub use error::FilterError;
pub use filter::{compile_filter, compile_filter_with, filter_spec, needs_geometry, FeatureFilter};
pub use legacy::{is_expression_filter, normalize, LARGE_IN_THRESHOLD};
