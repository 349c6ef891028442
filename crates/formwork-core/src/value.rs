//! # Value Helpers — Deep Equality and Type Names
//!
//! Runtime values are plain `serde_json::Value`s. Absence ("undefined") is
//! modelled as `None` wherever a slot may be empty, so that an explicit
//! `null` and a missing value stay distinguishable.

use serde_json::Value;

/// Structural equality between two possibly-absent values.
///
/// Objects compare key-by-key irrespective of insertion order, arrays compare
/// element-wise, and numbers compare by numeric value so `0` equals `0.0`.
pub fn deep_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => values_equal(a, b),
        _ => false,
    }
}

/// Structural equality between two present values.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i == j,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(i), Some(j)) => i == j,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// JSON type name of a value, for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_versus_null() {
        assert!(deep_equal(None, None));
        assert!(!deep_equal(None, Some(&Value::Null)));
        assert!(!deep_equal(Some(&Value::Null), None));
    }

    #[test]
    fn test_integer_and_float_zero_are_equal() {
        assert!(values_equal(&json!(0), &json!(0.0)));
        assert!(values_equal(&json!(2), &json!(2.0)));
        assert!(!values_equal(&json!(2), &json!(2.5)));
    }

    #[test]
    fn test_nested_structures() {
        let a = json!({"a": [1, {"b": "x"}], "c": null});
        let b = json!({"c": null, "a": [1.0, {"b": "x"}]});
        assert!(values_equal(&a, &b));
        let c = json!({"a": [1, {"b": "y"}], "c": null});
        assert!(!values_equal(&a, &c));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(json_type_name(&json!([])), "array");
        assert_eq!(json_type_name(&json!(1.5)), "number");
        assert_eq!(json_type_name(&json!("s")), "string");
    }
}
