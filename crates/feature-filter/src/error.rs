use style_expression::CompileError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The (possibly converted) filter was rejected by the expression
    /// compiler.
    #[error("invalid filter: {0}")]
    Compile(#[from] CompileError),
}
