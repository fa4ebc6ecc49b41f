//! JSON <-> runtime value conversion for scopes and results

use crate::Value;
use crate::error::ParseError;
use crate::matrix::Matrix;

/// Convert serde_json::Value to a runtime value
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            Value::Object(obj.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}

/// Convert a runtime value to serde_json::Value.
///
/// Matrices and ranges become nested arrays. Non-finite numbers become
/// `null`; big numbers become strings so no digits are lost. Anything with no
/// JSON shape (functions, units, expression trees) is written as its text.
pub fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null | Value::Undefined => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::BigNumber(d) => serde_json::Value::String(d.to_string()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) | Value::ResultSet(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Matrix(m) => value_to_json(&m.to_array()),
        Value::Range(r) => value_to_json(&r.to_array()),
        Value::Object(obj) => serde_json::Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
        other => serde_json::Value::String(other.to_string()),
    }
}

/// Parse errors as `[{kind, message, offset}]`, the shape editors consume to
/// underline the failing character.
pub fn errors_to_json(errors: &[ParseError]) -> serde_json::Value {
    errors
        .iter()
        .map(|e| {
            serde_json::json!({
                "kind": e.kind.as_str(),
                "message": e.message,
                "offset": e.offset,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_object_converts() {
        let v = json_to_value(json!({"a": 1, "b": [true, null], "c": "x"}));
        let Value::Object(map) = v else { panic!("expected object") };
        assert_eq!(map["a"], Value::Number(1.0));
        assert_eq!(map["b"], Value::Array(vec![Value::Boolean(true), Value::Null]));
        assert_eq!(map["c"], Value::String("x".into()));
    }

    #[test]
    fn test_non_finite_becomes_null() {
        assert_eq!(value_to_json(&Value::Number(f64::INFINITY)), json!(null));
        assert_eq!(value_to_json(&Value::Number(2.5)), json!(2.5));
    }

    #[test]
    fn test_errors_to_json() {
        let errors = crate::parse("1 +").errors;
        assert_eq!(
            errors_to_json(&errors),
            json!([{"kind": "SyntaxError", "message": "Unexpected end of expression", "offset": 3}])
        );
    }
}
