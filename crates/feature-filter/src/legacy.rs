//! Conversion of the deprecated positional filter grammar.
//!
//! Legacy filters look like `["==", "class", "river"]` or
//! `["in", "$type", "Point", "LineString"]`: the field comes first and the
//! remaining operands are plain values, never nested expressions. They are
//! rewritten into the `filter-*` operator family, which keeps the legacy
//! semantics (an absent property never matches) while running on the
//! expression evaluator.

use serde_json::{json, Value as JsonValue};
use std::cmp::Ordering;

/// Value lists longer than this are sorted at conversion time and searched
/// with a binary search at evaluation time.
pub const LARGE_IN_THRESHOLD: usize = 200;

const COMPARISON_OPS: [&str; 6] = ["==", "!=", "<", "<=", ">", ">="];

fn is_reserved_field(field: &JsonValue) -> bool {
    matches!(field.as_str(), Some("$id" | "$type"))
}

/// Whether `filter` already uses the expression grammar and can be compiled
/// without conversion.
pub fn is_expression_filter(filter: &JsonValue) -> bool {
    let items = match filter {
        JsonValue::Bool(_) => return true,
        JsonValue::Array(items) if !items.is_empty() => items,
        _ => return false,
    };
    let Some(op) = items[0].as_str() else {
        return true;
    };
    match op {
        "has" => items.len() >= 2 && !is_reserved_field(&items[1]),
        "in" => items.len() >= 3 && (!items[1].is_string() || items[2].is_array()),
        "!in" | "!has" | "none" => false,
        op if COMPARISON_OPS.contains(&op) => {
            items.len() != 3 || items[1].is_array() || items[2].is_array()
        }
        "any" | "all" => items[1..].iter().all(is_expression_filter),
        _ => true,
    }
}

/// Rewrites `filter` into the expression grammar.
///
/// `null` becomes `true`; expression filters are returned unchanged.
/// Conversion is total: unknown legacy heads become `true`.
pub fn normalize(filter: &JsonValue) -> JsonValue {
    if filter.is_null() {
        return JsonValue::Bool(true);
    }
    if is_expression_filter(filter) {
        return filter.clone();
    }
    let converted = convert(filter);
    tracing::trace!(%filter, %converted, "converted legacy filter");
    converted
}

fn convert(filter: &JsonValue) -> JsonValue {
    let JsonValue::Array(items) = filter else {
        return JsonValue::Bool(true);
    };
    let op = items.first().and_then(JsonValue::as_str).unwrap_or_default();
    if items.len() <= 1 {
        return JsonValue::Bool(op != "any");
    }
    let field = &items[1];
    let operand = || items.get(2).cloned().unwrap_or(JsonValue::Null);

    match op {
        "==" => convert_eq(field, operand()),
        "!=" => negate(convert_eq(field, operand())),
        "<" | ">" | "<=" | ">=" => json!([format!("filter-{op}"), field, operand()]),
        "any" => convert_all("any", &items[1..]),
        "all" => convert_all("all", &items[1..]),
        "none" => {
            let mut out = vec![JsonValue::from("all")];
            out.extend(items[1..].iter().map(|f| negate(convert(f))));
            JsonValue::Array(out)
        }
        "in" => convert_in(field, &items[2..]),
        "!in" => negate(convert_in(field, &items[2..])),
        "has" => convert_has(field),
        "!has" => negate(convert_has(field)),
        _ => JsonValue::Bool(true),
    }
}

fn negate(filter: JsonValue) -> JsonValue {
    json!(["!", filter])
}

fn convert_all(op: &str, filters: &[JsonValue]) -> JsonValue {
    let mut out = vec![JsonValue::from(op)];
    out.extend(filters.iter().map(convert));
    JsonValue::Array(out)
}

fn convert_eq(field: &JsonValue, value: JsonValue) -> JsonValue {
    match field.as_str() {
        Some("$type") => json!(["filter-type-==", value]),
        Some("$id") => json!(["filter-id-==", value]),
        _ => json!(["filter-==", field, value]),
    }
}

fn convert_has(field: &JsonValue) -> JsonValue {
    match field.as_str() {
        Some("$type") => JsonValue::Bool(true),
        Some("$id") => json!(["filter-has-id"]),
        _ => json!(["filter-has", field]),
    }
}

fn convert_in(field: &JsonValue, values: &[JsonValue]) -> JsonValue {
    if values.is_empty() {
        return JsonValue::Bool(false);
    }
    match field.as_str() {
        Some("$type") => json!(["filter-type-in", ["literal", values]]),
        Some("$id") => json!(["filter-id-in", ["literal", values]]),
        _ if values.len() > LARGE_IN_THRESHOLD && is_homogeneous(values) => {
            let mut sorted = values.to_vec();
            sorted.sort_by(natural_order);
            json!(["filter-in-large", field, ["literal", sorted]])
        }
        _ => json!(["filter-in-small", field, ["literal", values]]),
    }
}

/// Whether every value is a number, every value a string, or every value a
/// boolean.
fn is_homogeneous(values: &[JsonValue]) -> bool {
    let same = |pred: fn(&JsonValue) -> bool| values.iter().all(pred);
    same(JsonValue::is_number) || same(JsonValue::is_string) || same(JsonValue::is_boolean)
}

/// Matches the ordering the evaluator's binary search relies on.
fn natural_order(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_filters() {
        assert_eq!(convert(&json!(["any"])), json!(false));
        assert_eq!(convert(&json!(["all"])), json!(true));
        assert_eq!(convert(&json!(["none"])), json!(true));
        assert_eq!(convert(&json!([])), json!(true));
    }

    #[test]
    fn test_missing_value_becomes_null() {
        assert_eq!(convert(&json!(["==", "a"])), json!(["filter-==", "a", null]));
    }

    #[test]
    fn test_homogeneity() {
        assert!(is_homogeneous(&[json!(1), json!(2.5)]));
        assert!(!is_homogeneous(&[json!(1), json!("2")]));
        assert!(!is_homogeneous(&[json!(null), json!(null)]));
    }

    #[test]
    fn test_natural_order() {
        let mut values = vec![json!(10), json!(-1), json!(2.5)];
        values.sort_by(natural_order);
        assert_eq!(values, vec![json!(-1), json!(2.5), json!(10)]);
    }
}
