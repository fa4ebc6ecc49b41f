//! Property and method access rules for expression text.
//!
//! Only own keys of objects and a short whitelist of native members can be
//! reached. Names inherited from base objects and functions are always
//! rejected, whatever value they are read from.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::compiler::Function;
use crate::error::EvalError;
use crate::value::Value;

/// Members of the base object and function prototypes.
pub const BLOCKED_NAMES: &[&str] = &[
    "constructor",
    "__proto__",
    "__defineGetter__",
    "__defineSetter__",
    "__lookupGetter__",
    "__lookupSetter__",
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "toString",
    "valueOf",
    "toLocaleString",
    "apply",
    "bind",
    "call",
    "arguments",
    "caller",
];

pub const SAFE_NATIVE_PROPERTIES: &[&str] = &["length", "name"];

pub const SAFE_NATIVE_METHODS: &[&str] = &["toString", "valueOf", "toLocaleString"];

pub fn is_blocked(name: &str) -> bool {
    BLOCKED_NAMES.contains(&name)
}

pub fn check_property(name: &str) -> Result<(), EvalError> {
    if is_blocked(name) {
        return Err(EvalError::Reference(format!("No access to property \"{name}\"")));
    }
    Ok(())
}

/// Read `prop` from `object`. Missing own keys read as `undefined`.
pub fn get_safe_property(object: &Value, prop: &str) -> Result<Value, EvalError> {
    check_property(prop)?;
    Ok(match (object, prop) {
        (Value::Object(map), _) => map.get(prop).cloned().unwrap_or(Value::Undefined),
        (Value::Array(items), "length") => Value::Number(items.len() as f64),
        (Value::String(s), "length") => Value::Number(s.chars().count() as f64),
        (Value::Function(f), "name") => Value::String(f.name().to_string()),
        (Value::Matrix(_) | Value::Range(_), "length") => {
            Value::Number(object.size().iter().product::<usize>() as f64)
        }
        _ => Value::Undefined,
    })
}

pub fn set_safe_property(
    object: &mut BTreeMap<String, Value>,
    prop: &str,
    value: Value,
) -> Result<(), EvalError> {
    check_property(prop)?;
    object.insert(prop.to_string(), value);
    Ok(())
}

/// A method reachable from expression text.
pub enum Method {
    /// Own function-valued key of an object
    Own(Rc<Function>),
    /// Whitelisted native method
    Native(&'static str),
}

pub fn get_safe_method(object: &Value, name: &str) -> Result<Method, EvalError> {
    if !is_blocked(name)
        && let Value::Object(map) = object
        && let Some(Value::Function(f)) = map.get(name)
    {
        return Ok(Method::Own(Rc::clone(f)));
    }
    SAFE_NATIVE_METHODS
        .iter()
        .find(|m| **m == name)
        .map(|m| Method::Native(m))
        .ok_or_else(|| EvalError::Reference(format!("No access to method \"{name}\"")))
}

pub fn call_native(method: &str, object: &Value) -> Result<Value, EvalError> {
    match method {
        "valueOf" => Ok(object.clone()),
        "toString" | "toLocaleString" => Ok(Value::String(match object {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })),
        other => Err(EvalError::Reference(format!("No access to method \"{other}\""))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_names_fail_on_any_value() {
        for value in [Value::Number(1.0), Value::Object(BTreeMap::new()), Value::Array(vec![])] {
            let err = get_safe_property(&value, "constructor").unwrap_err();
            assert!(matches!(err, EvalError::Reference(_)));
        }
    }

    #[test]
    fn test_whitelisted_length() {
        let v = Value::Array(vec![Value::Null, Value::Null]);
        assert_eq!(get_safe_property(&v, "length").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_methods_outside_whitelist_rejected() {
        let obj = Value::Object(BTreeMap::new());
        assert!(get_safe_method(&obj, "toString").is_ok());
        assert!(get_safe_method(&obj, "bind").is_err());
    }

    #[test]
    fn test_cannot_write_proto() {
        let mut map = BTreeMap::new();
        assert!(set_safe_property(&mut map, "__proto__", Value::Null).is_err());
        assert!(map.is_empty());
    }
}
