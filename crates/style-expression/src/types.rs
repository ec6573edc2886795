use crate::value::Value;
use std::fmt;

/// Static type of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Null,
    Number,
    String,
    Boolean,
    Color,
    Object,
    /// Any of the member types; requires a runtime check to narrow.
    Value,
    /// The type of `["error", ...]`; a subtype of everything.
    Error,
    Array {
        item: Box<Type>,
        len: Option<usize>,
    },
}

impl Type {
    pub fn array(item: Type, len: Option<usize>) -> Type {
        Type::Array {
            item: Box::new(item),
            len,
        }
    }

    /// `array<value>` with no fixed length.
    pub fn any_array() -> Type {
        Type::array(Type::Value, None)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Type::Null => "null",
            Type::Number => "number",
            Type::String => "string",
            Type::Boolean => "boolean",
            Type::Color => "color",
            Type::Object => "object",
            Type::Value => "value",
            Type::Error => "error",
            Type::Array { .. } => "array",
        }
    }

    pub fn same_kind(&self, other: &Type) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Type::Value)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Array { item, len: Some(n) } => write!(f, "array<{}, {}>", item, n),
            Type::Array { item, len: None } if item.is_value() => write!(f, "array"),
            Type::Array { item, len: None } => write!(f, "array<{}>", item),
            other => write!(f, "{}", other.kind()),
        }
    }
}

fn value_member_types() -> [Type; 8] {
    [
        Type::Null,
        Type::Number,
        Type::String,
        Type::Boolean,
        Type::Color,
        Type::Object,
        Type::any_array(),
        Type::Error,
    ]
}

/// Returns `None` if `t` is a subtype of `expected`, or the diagnostic
/// message otherwise.
pub fn check_subtype(expected: &Type, t: &Type) -> Option<String> {
    if matches!(t, Type::Error) {
        return None;
    }
    let ok = match expected {
        Type::Array {
            item: expected_item,
            len: expected_len,
        } => match t {
            Type::Array { item, len } => {
                let item_ok = (*len == Some(0) && item.is_value())
                    || check_subtype(expected_item, item).is_none();
                let len_ok = expected_len.is_none() || expected_len == len;
                item_ok && len_ok
            }
            _ => false,
        },
        Type::Value => {
            t.is_value()
                || value_member_types()
                    .iter()
                    .any(|member| check_subtype(member, t).is_none())
        }
        other => other.same_kind(t),
    };
    if ok {
        None
    } else {
        Some(format!("Expected {} but found {} instead.", expected, t))
    }
}

/// Runtime type of a value. Arrays report a common item type when all
/// items share one, `value` otherwise.
pub fn type_of(value: &Value) -> Type {
    match value {
        Value::Null => Type::Null,
        Value::Boolean(_) => Type::Boolean,
        Value::Number(_) => Type::Number,
        Value::String(_) => Type::String,
        Value::Color(_) => Type::Color,
        Value::Object(_) => Type::Object,
        Value::Array(items) => {
            let mut item_type: Option<Type> = None;
            for item in items {
                let t = type_of(item);
                match &item_type {
                    None => item_type = Some(t),
                    Some(existing) if *existing == t => {}
                    Some(_) => {
                        item_type = Some(Type::Value);
                        break;
                    }
                }
            }
            Type::array(item_type.unwrap_or(Type::Value), Some(items.len()))
        }
    }
}

/// Operand count accepted by an operator overload.
#[derive(Debug, Clone, PartialEq)]
pub enum Arity {
    /// Exactly `n` operands.
    Fixed(usize),
    /// Any number of operands, including none.
    Variadic,
}

impl Arity {
    pub fn accepts(&self, operands: usize) -> bool {
        match self {
            Arity::Fixed(n) => *n == operands,
            Arity::Variadic => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn displays_types() {
        assert_eq!(Type::Number.to_string(), "number");
        assert_eq!(Type::any_array().to_string(), "array");
        assert_eq!(Type::array(Type::String, None).to_string(), "array<string>");
        assert_eq!(Type::array(Type::Number, Some(2)).to_string(), "array<number, 2>");
    }

    #[test]
    fn value_accepts_members() {
        assert!(check_subtype(&Type::Value, &Type::Number).is_none());
        assert!(check_subtype(&Type::Value, &Type::array(Type::Number, Some(3))).is_none());
        assert!(check_subtype(&Type::Number, &Type::Value).is_some());
    }

    #[test]
    fn array_subtyping() {
        let expected = Type::array(Type::Number, None);
        assert!(check_subtype(&expected, &Type::array(Type::Number, Some(4))).is_none());
        assert!(check_subtype(&expected, &Type::array(Type::Value, Some(0))).is_none());
        assert_eq!(
            check_subtype(&expected, &Type::array(Type::String, Some(1))),
            Some("Expected array<number> but found array<string, 1> instead.".to_string())
        );
        let fixed = Type::array(Type::Number, Some(2));
        assert!(check_subtype(&fixed, &Type::array(Type::Number, Some(3))).is_some());
    }

    #[test]
    fn error_is_bottom() {
        assert!(check_subtype(&Type::Color, &Type::Error).is_none());
    }

    #[test]
    fn types_of_values() {
        assert_eq!(
            type_of(&Value::from(json!([1, 2]))),
            Type::array(Type::Number, Some(2))
        );
        assert_eq!(
            type_of(&Value::from(json!([1, "a"]))),
            Type::array(Type::Value, Some(2))
        );
        assert_eq!(type_of(&Value::from(json!([]))), Type::array(Type::Value, Some(0)));
    }
}
