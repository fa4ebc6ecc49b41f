//! Relational, logical and bitwise operators.

use std::cmp::Ordering;

use crate::error::EvalError;
use crate::namespace::arithmetic::{compare_numeric, map_collections, zip_collections};
use crate::params;
use crate::typed::{self, TypedFunction};
use crate::value::Value;

fn compare(args: &[Value]) -> Result<Ordering, EvalError> {
    match (&args[0], &args[1]) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Ok(a.cmp(b)),
        (a, b) => compare_numeric(a, b),
    }
}

fn relational(name: &'static str, accept: impl Fn(Ordering) -> bool + Copy + 'static) -> TypedFunction {
    let f = TypedFunction::new(name)
        .signature(params![Number, Number], move |_, args| Ok(Value::Boolean(accept(compare(args)?))))
        .signature(params![BigNumber, BigNumber], move |_, args| Ok(Value::Boolean(accept(compare(args)?))))
        .signature(params![Unit, Unit], move |_, args| Ok(Value::Boolean(accept(compare(args)?))))
        .signature(params![String, String], move |_, args| Ok(Value::Boolean(accept(compare(args)?))))
        .signature(params![Boolean, Boolean], move |_, args| Ok(Value::Boolean(accept(compare(args)?))));
    zip_collections(f)
}

/// Equality also accepts null and undefined on either side.
fn equality(name: &'static str, want: bool) -> TypedFunction {
    relational(name, move |o| (o == Ordering::Equal) == want)
        .signature(params![Null | Undefined, Any], move |_, args| {
            Ok(Value::Boolean((args[0] == args[1]) == want))
        })
        .signature(params![Any, Null | Undefined], move |_, args| {
            Ok(Value::Boolean((args[0] == args[1]) == want))
        })
}

pub fn relational_functions() -> Vec<TypedFunction> {
    vec![
        equality("equal", true),
        equality("unequal", false),
        relational("smaller", |o| o == Ordering::Less),
        relational("larger", |o| o == Ordering::Greater),
        relational("smallerEq", |o| o != Ordering::Greater),
        relational("largerEq", |o| o != Ordering::Less),
    ]
}

fn logical(name: &'static str, combine: fn(bool, bool) -> bool) -> TypedFunction {
    let f = TypedFunction::new(name).signature(
        params![
            Number | BigNumber | Boolean | String | Unit | Null | Undefined,
            Number | BigNumber | Boolean | String | Unit | Null | Undefined
        ],
        move |_, args| Ok(Value::Boolean(combine(args[0].is_truthy()?, args[1].is_truthy()?))),
    );
    zip_collections(f)
}

pub fn not() -> TypedFunction {
    let f = TypedFunction::new("not").signature(
        params![Number | BigNumber | Boolean | String | Unit | Null | Undefined],
        |_, args| Ok(Value::Boolean(!args[0].is_truthy()?)),
    );
    map_collections(f)
}

pub fn logical_functions() -> Vec<TypedFunction> {
    vec![
        logical("and", |a, b| a && b),
        logical("or", |a, b| a || b),
        logical("xor", |a, b| a != b),
        not(),
    ]
}

/// Operand of a bitwise operation as a 32-bit integer.
fn integer(name: &str, value: &Value) -> Result<i32, EvalError> {
    let n = typed::to_f64(value)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(EvalError::Type(format!(
            "Integers expected in function {name} (value: {n})"
        )));
    }
    Ok(n as i64 as i32)
}

fn bitwise(name: &'static str, op: fn(i32, i32) -> f64) -> TypedFunction {
    let f = TypedFunction::new(name).signature(params![Number | BigNumber, Number | BigNumber], move |_, args| {
        Ok(Value::Number(op(integer(name, &args[0])?, integer(name, &args[1])?)))
    });
    zip_collections(f)
}

pub fn bit_not() -> TypedFunction {
    let f = TypedFunction::new("bitNot").signature(params![Number | BigNumber], |_, args| {
        Ok(Value::Number(f64::from(!integer("bitNot", &args[0])?)))
    });
    map_collections(f)
}

pub fn bitwise_functions() -> Vec<TypedFunction> {
    vec![
        bitwise("bitAnd", |a, b| f64::from(a & b)),
        bitwise("bitOr", |a, b| f64::from(a | b)),
        bitwise("bitXor", |a, b| f64::from(a ^ b)),
        bit_not(),
        bitwise("leftShift", |a, b| f64::from(a.wrapping_shl(b as u32 & 31))),
        bitwise("rightArithShift", |a, b| f64::from(a.wrapping_shr(b as u32 & 31))),
        bitwise("rightLogShift", |a, b| f64::from((a as u32).wrapping_shr(b as u32 & 31))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn test_string_number_comparison_converts() {
        let smaller = relational("smaller", |o| o == Ordering::Less);
        assert_eq!(smaller.call(&[n(2.0), Value::from("10")]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_equal_with_null() {
        let equal = equality("equal", true);
        assert_eq!(equal.call(&[Value::Null, Value::Null]).unwrap(), Value::Boolean(true));
        assert_eq!(equal.call(&[n(0.0), Value::Null]).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_logical_xor() {
        let xor = logical("xor", |a, b| a != b);
        assert_eq!(xor.call(&[n(1.0), n(0.0)]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_right_logical_shift_is_unsigned() {
        let shift = bitwise("rightLogShift", |a, b| f64::from((a as u32).wrapping_shr(b as u32 & 31)));
        assert_eq!(shift.call(&[n(-1.0), n(28.0)]).unwrap(), n(15.0));
        assert!(shift.call(&[n(1.5), n(1.0)]).is_err());
    }
}
