//! Parser state threaded through every node while compiling an expression.

use crate::analysis::is_constant;
use crate::context::EvaluationContext;
use crate::error::ParsingError;
use crate::expression::{Assertion, Coercion, Expression, Literal};
use crate::registry::{OperatorDefinition, OperatorRegistry};
use crate::types::{check_subtype, Type};
use serde_json::Value as JsonValue;
use std::rc::Rc;

/// How a node whose type is wider than expected gets narrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeAnnotation {
    /// Wrap in a runtime assertion.
    Assert,
    /// Wrap in a runtime coercion.
    Coerce,
    /// Leave as is; the caller handles the wider type.
    Omit,
}

/// Lexical `let` bindings visible to a node.
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<Rc<Scope>>,
    bindings: Vec<(String, Expression)>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
            .or_else(|| self.parent.as_deref().and_then(|p| p.get(name)))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

pub struct ParsingContext<'r> {
    registry: &'r OperatorRegistry,
    path: Vec<usize>,
    scope: Rc<Scope>,
    expected: Option<Type>,
    errors: Vec<ParsingError>,
}

impl<'r> ParsingContext<'r> {
    pub fn new(registry: &'r OperatorRegistry, expected: Option<Type>) -> Self {
        ParsingContext {
            registry,
            path: Vec::new(),
            scope: Rc::new(Scope::default()),
            expected,
            errors: Vec::new(),
        }
    }

    pub fn registry(&self) -> &'r OperatorRegistry {
        self.registry
    }

    pub fn expected_type(&self) -> Option<&Type> {
        self.expected.as_ref()
    }

    /// Bracketed index path of the node being parsed, e.g. `[2][1]`.
    pub fn key(&self) -> String {
        self.path.iter().map(|i| format!("[{}]", i)).collect()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn errors(&self) -> &[ParsingError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ParsingError> {
        self.errors
    }

    /// Records an error at the current node. Always returns `None` so parse
    /// functions can `return ctx.error(...)`.
    pub fn error(&mut self, message: impl Into<String>) -> Option<Expression> {
        let key = self.key();
        self.errors.push(ParsingError::new(key, message));
        None
    }

    /// Records an error at a descendant of the current node.
    pub fn error_at(&mut self, message: impl Into<String>, keys: &[usize]) -> Option<Expression> {
        let mut key = self.key();
        for k in keys {
            key.push_str(&format!("[{}]", k));
        }
        self.errors.push(ParsingError::new(key, message));
        None
    }

    /// Reports a subtype failure. Returns `true` when an error was recorded.
    pub fn check_subtype(&mut self, expected: &Type, t: &Type) -> bool {
        match check_subtype(expected, t) {
            Some(message) => {
                self.error(message);
                true
            }
            None => false,
        }
    }

    /// A child context for the operand at `index`, optionally extending the
    /// scope. Its errors must be handed back with [`absorb`](Self::absorb).
    pub fn concat(
        &self,
        index: usize,
        expected: Option<Type>,
        bindings: Option<Vec<(String, Expression)>>,
    ) -> ParsingContext<'r> {
        let mut path = self.path.clone();
        path.push(index);
        let scope = match bindings {
            Some(bindings) => Rc::new(Scope {
                parent: Some(Rc::clone(&self.scope)),
                bindings,
            }),
            None => Rc::clone(&self.scope),
        };
        ParsingContext {
            registry: self.registry,
            path,
            scope,
            expected,
            errors: Vec::new(),
        }
    }

    pub fn absorb(&mut self, child: ParsingContext<'r>) {
        self.errors.extend(child.errors);
    }

    /// A sibling context at the same path and scope with no expected type
    /// and no errors. Used to try alternatives without polluting `self`.
    pub fn fork(&self) -> ParsingContext<'r> {
        ParsingContext {
            registry: self.registry,
            path: self.path.clone(),
            scope: Rc::clone(&self.scope),
            expected: None,
            errors: Vec::new(),
        }
    }

    /// Like [`check_subtype`](Self::check_subtype), reporting at operand `index`.
    pub fn check_subtype_at(&mut self, index: usize, expected: &Type, t: &Type) -> bool {
        match check_subtype(expected, t) {
            Some(message) => {
                self.error_at(message, &[index]);
                true
            }
            None => false,
        }
    }

    /// Parses the operand at `index` against `expected`.
    pub fn parse(
        &mut self,
        raw: &JsonValue,
        index: usize,
        expected: Option<Type>,
    ) -> Option<Expression> {
        self.parse_with(raw, index, expected, None, None)
    }

    pub fn parse_annotated(
        &mut self,
        raw: &JsonValue,
        index: usize,
        expected: Option<Type>,
        annotation: TypeAnnotation,
    ) -> Option<Expression> {
        self.parse_with(raw, index, expected, None, Some(annotation))
    }

    pub fn parse_with(
        &mut self,
        raw: &JsonValue,
        index: usize,
        expected: Option<Type>,
        bindings: Option<Vec<(String, Expression)>>,
        annotation: Option<TypeAnnotation>,
    ) -> Option<Expression> {
        let mut child = self.concat(index, expected, bindings);
        let parsed = child.parse_node(raw, annotation);
        self.absorb(child);
        parsed
    }

    /// Parses `raw` as the root node of this context.
    pub fn parse_root(
        &mut self,
        raw: &JsonValue,
        annotation: Option<TypeAnnotation>,
    ) -> Option<Expression> {
        self.parse_node(raw, annotation)
    }

    fn parse_node(
        &mut self,
        raw: &JsonValue,
        annotation: Option<TypeAnnotation>,
    ) -> Option<Expression> {
        let parsed = match raw {
            JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) | JsonValue::String(_) => {
                Expression::Literal(Literal::from_json(raw))
            }
            JsonValue::Array(items) => self.parse_operator(items)?,
            JsonValue::Object(_) => {
                return self.error("Bare objects invalid. Use [\"literal\", {...}] instead.");
            }
        };

        let parsed = match self.expected.clone() {
            Some(expected) => self.annotate(parsed, expected, annotation)?,
            None => parsed,
        };

        if !matches!(parsed, Expression::Literal(_)) && is_constant(&parsed) {
            return match parsed.evaluate(&EvaluationContext::default()) {
                Ok(value) => Some(Expression::Literal(Literal::new(parsed.ty().clone(), value))),
                Err(e) => self.error(e.to_string()),
            };
        }
        Some(parsed)
    }

    fn parse_operator(&mut self, items: &[JsonValue]) -> Option<Expression> {
        let Some(head) = items.first() else {
            return self.error(
                "Expected an array with at least one element. If you wanted a literal array, use [\"literal\", []].",
            );
        };
        let JsonValue::String(op) = head else {
            return self.error_at(
                format!(
                    "Expression name must be a string, but found {} instead. If you wanted a literal array, use [\"literal\", [...]].",
                    json_typeof(head)
                ),
                &[0],
            );
        };
        match self.registry.lookup(op) {
            Some(OperatorDefinition::Special { parse, .. }) => parse(items, self),
            Some(OperatorDefinition::Compound(definition)) => {
                let definition = std::sync::Arc::clone(definition);
                crate::expression::compound::parse(&definition, items, self)
            }
            None => self.error_at(
                format!(
                    "Unknown expression \"{}\". If you wanted a literal array, use [\"literal\", [...]].",
                    op
                ),
                &[0],
            ),
        }
    }

    fn annotate(
        &mut self,
        parsed: Expression,
        expected: Type,
        annotation: Option<TypeAnnotation>,
    ) -> Option<Expression> {
        let actual = parsed.ty().clone();
        let narrowable = matches!(
            expected,
            Type::String | Type::Number | Type::Boolean | Type::Object | Type::Array { .. }
        );
        if narrowable && actual.is_value() {
            return Some(wrap(parsed, expected, annotation.unwrap_or(TypeAnnotation::Assert)));
        }
        if expected == Type::Color && (actual.is_value() || actual == Type::String) {
            return Some(wrap(parsed, expected, annotation.unwrap_or(TypeAnnotation::Coerce)));
        }
        if self.check_subtype(&expected, &actual) {
            return None;
        }
        Some(parsed)
    }
}

fn wrap(parsed: Expression, expected: Type, annotation: TypeAnnotation) -> Expression {
    let coercible = matches!(
        expected,
        Type::String | Type::Number | Type::Boolean | Type::Color
    );
    match annotation {
        TypeAnnotation::Coerce if coercible => {
            Expression::Coercion(Coercion::new(expected, vec![parsed]))
        }
        TypeAnnotation::Omit => parsed,
        _ => Expression::Assertion(Assertion::new(expected, vec![parsed])),
    }
}

/// JavaScript-style `typeof` name of a JSON value, used in diagnostics.
pub(crate) fn json_typeof(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: JsonValue, expected: Option<Type>) -> Result<Expression, Vec<ParsingError>> {
        let registry = OperatorRegistry::standard();
        let mut ctx = ParsingContext::new(&registry, expected);
        match ctx.parse_root(&raw, None) {
            Some(e) if !ctx.has_errors() => Ok(e),
            _ => Err(ctx.into_errors()),
        }
    }

    #[test]
    fn keys_follow_operand_paths() {
        let errors = parse(json!(["+", 1, ["+", 2, "x"]]), None).unwrap_err();
        assert_eq!(errors[0].key, "[2][2]");
    }

    #[test]
    fn unknown_operator_reports_head() {
        let errors = parse(json!(["nope"]), None).unwrap_err();
        assert_eq!(errors[0].key, "[0]");
        assert!(errors[0].message.starts_with("Unknown expression \"nope\""));
    }

    #[test]
    fn non_string_head() {
        let errors = parse(json!([1, 2]), None).unwrap_err();
        assert_eq!(
            errors[0].message,
            "Expression name must be a string, but found number instead. If you wanted a literal array, use [\"literal\", [...]]."
        );
    }

    #[test]
    fn bare_object_rejected() {
        let errors = parse(json!({"a": 1}), None).unwrap_err();
        assert_eq!(errors[0].message, "Bare objects invalid. Use [\"literal\", {...}] instead.");
    }

    #[test]
    fn value_is_asserted_against_expected() {
        let expr = parse(json!(["get", "x"]), Some(Type::Number)).unwrap();
        assert!(matches!(expr, Expression::Assertion(_)));
        assert_eq!(expr.ty(), &Type::Number);
    }

    #[test]
    fn strings_are_coerced_to_color() {
        let expr = parse(json!(["get", "c"]), Some(Type::Color)).unwrap();
        assert!(matches!(expr, Expression::Coercion(_)));
    }

    #[test]
    fn scope_shadows_outer_bindings() {
        let registry = OperatorRegistry::standard();
        let root = ParsingContext::new(&registry, None);
        let lit = |n: f64| Expression::Literal(Literal::new(Type::Number, crate::value::Value::Number(n)));
        let outer = root.concat(1, None, Some(vec![("a".into(), lit(1.0))]));
        let inner = outer.concat(2, None, Some(vec![("a".into(), lit(2.0))]));
        let bound = inner.scope().get("a").unwrap();
        assert!(matches!(bound, Expression::Literal(l) if l.value == crate::value::Value::Number(2.0)));
        assert!(!inner.scope().has("b"));
        assert_eq!(inner.key(), "[1][2]");
    }
}
