//! The operator registry consulted by the parser.
//!
//! Operators come in two flavours. *Special forms* own their parsing
//! (`let`, `match`, `interpolate`, ...) and produce a dedicated node.
//! *Compound operators* are described declaratively by typed overloads and
//! an evaluation function; the parser picks the first overload whose
//! parameters type-check.

use crate::context::{EvaluationContext, Parameter};
use crate::error::EvalResult;
use crate::expression::Expression;
use crate::parsing_context::ParsingContext;
use crate::types::{Arity, Type};
use crate::value::Value;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Parses a special form. `args` is the full expression array, operator
/// name included at index 0.
pub type ParseFn = fn(&[JsonValue], &mut ParsingContext<'_>) -> Option<Expression>;

/// Evaluates a compound operator given its parsed operands. Operands are
/// passed unevaluated so that operators can short-circuit.
pub type CompoundEvalFn = fn(&EvaluationContext<'_>, &[Expression]) -> EvalResult<Value>;

/// Parameter list of a compound overload.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Fixed(Vec<Type>),
    /// Any number of operands of one type.
    Varargs(Type),
}

impl Params {
    pub fn arity(&self) -> Arity {
        match self {
            Params::Fixed(types) => Arity::Fixed(types.len()),
            Params::Varargs(_) => Arity::Variadic,
        }
    }

    /// Expected type of the operand at `index` (0-based, operator excluded).
    pub fn expected(&self, index: usize) -> &Type {
        match self {
            Params::Fixed(types) => &types[index],
            Params::Varargs(t) => t,
        }
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Params::Fixed(types) => {
                let names: Vec<String> = types.iter().map(Type::to_string).collect();
                write!(f, "({})", names.join(", "))
            }
            Params::Varargs(t) => write!(f, "({}...)", t),
        }
    }
}

/// One signature of a compound operator.
#[derive(Debug, Clone)]
pub struct Overload {
    pub params: Params,
    pub eval: CompoundEvalFn,
    /// Runtime parameters this overload reads. Drives constant folding and
    /// the constancy analyses.
    pub reads: &'static [Parameter],
}

impl Overload {
    pub fn new(params: Params, eval: CompoundEvalFn) -> Self {
        Overload {
            params,
            eval,
            reads: &[],
        }
    }

    pub fn reading(mut self, reads: &'static [Parameter]) -> Self {
        self.reads = reads;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CompoundDefinition {
    pub name: &'static str,
    pub output: Type,
    pub overloads: Vec<Overload>,
    /// Never folded at compile time even when all operands are constant.
    pub impure: bool,
}

impl CompoundDefinition {
    pub fn new(name: &'static str, output: Type, overloads: Vec<Overload>) -> Self {
        CompoundDefinition {
            name,
            output,
            overloads,
            impure: false,
        }
    }

    pub fn impure(mut self) -> Self {
        self.impure = true;
        self
    }
}

#[derive(Clone)]
pub enum OperatorDefinition {
    Special { name: &'static str, parse: ParseFn },
    Compound(Arc<CompoundDefinition>),
}

impl OperatorDefinition {
    pub fn name(&self) -> &'static str {
        match self {
            OperatorDefinition::Special { name, .. } => name,
            OperatorDefinition::Compound(def) => def.name,
        }
    }
}

impl fmt::Debug for OperatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorDefinition::Special { name, .. } => {
                f.debug_struct("Special").field("name", name).finish()
            }
            OperatorDefinition::Compound(def) => f
                .debug_struct("Compound")
                .field("name", &def.name)
                .field("output", &def.output)
                .finish(),
        }
    }
}

/// Immutable table of operators, built once and handed to the compiler.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: HashMap<&'static str, OperatorDefinition>,
}

impl OperatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full standard operator set.
    pub fn standard() -> Self {
        let mut registry = OperatorRegistry::new();
        crate::expression::register_special_forms(&mut registry);
        crate::operators::register_all(&mut registry);
        registry
    }

    pub fn register_special(&mut self, name: &'static str, parse: ParseFn) -> &mut Self {
        self.operators
            .insert(name, OperatorDefinition::Special { name, parse });
        self
    }

    pub fn register_compound(&mut self, definition: CompoundDefinition) -> &mut Self {
        self.operators.insert(
            definition.name,
            OperatorDefinition::Compound(Arc::new(definition)),
        );
        self
    }

    /// Adds or replaces an operator.
    pub fn register(&mut self, definition: OperatorDefinition) -> &mut Self {
        self.operators.insert(definition.name(), definition);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&OperatorDefinition> {
        self.operators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operators.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Sorted operator names.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.operators.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Whether `raw` looks like an expression: a non-empty array whose head
    /// names a registered operator.
    pub fn is_expression(&self, raw: &JsonValue) -> bool {
        match raw {
            JsonValue::Array(items) => matches!(
                items.first(),
                Some(JsonValue::String(op)) if self.contains(op)
            ),
            _ => false,
        }
    }
}
