use std::fmt;
use thiserror::Error;

/// A single compile-time diagnostic.
///
/// `key` is the bracketed index path from the root of the raw expression to
/// the offending node, e.g. `[2][1]`. The root itself has an empty key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingError {
    pub key: String,
    pub message: String,
}

impl ParsingError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        ParsingError {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.key, self.message)
        }
    }
}

/// Aggregated compile failure. Never accompanied by a usable expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_errors(.0))]
pub struct CompileError(pub Vec<ParsingError>);

impl CompileError {
    pub fn errors(&self) -> &[ParsingError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<ParsingError> {
        self.0
    }
}

fn join_errors(errors: &[ParsingError]) -> String {
    errors
        .iter()
        .map(ParsingError::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runtime failure inside the tree walk.
///
/// These never escape the public evaluation wrappers: `StyleExpression`
/// maps them to the property default and filters map them to `false`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Expected value to be of type {expected}, but found {found} instead.")]
    TypeMismatch { expected: String, found: String },

    #[error("{0}")]
    InvalidColor(String),

    #[error("Could not convert {0} to number.")]
    NotANumber(String),

    #[error("Array index out of bounds: {index} < 0.")]
    IndexBelowZero { index: String },

    #[error("Array index out of bounds: {index} > {max}.")]
    IndexAboveMax { index: String, max: String },

    #[error("Array index must be an integer, but found {0} instead.")]
    FractionalIndex(String),

    #[error("Expected value to be one of {allowed}, but found {found} instead.")]
    NotInEnum { allowed: String, found: String },

    #[error("{0}")]
    Thrown(String),

    #[error("Input is not a number.")]
    InputNotANumber,

    #[error("Cannot interpolate {0}.")]
    NotInterpolatable(String),

    #[error("Cannot interpolate arrays of different lengths: {from} and {to}.")]
    ArrayLengthMismatch { from: usize, to: usize },

    #[error("Expected arguments for \"{op}\" to be (string, string) or (number, number), but found ({lhs}, {rhs}) instead.")]
    NotComparable {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("Expected first argument to be of type boolean, string, number or null, but found {0} instead.")]
    InvalidNeedle(String),

    #[error("Expected second argument to be of type array or string, but found {0} instead.")]
    InvalidHaystack(String),

    #[error("Expected {expected}, but found {found} instead.")]
    WrongOperandType { expected: &'static str, found: String },
}

pub type EvalResult<T> = Result<T, EvalError>;
