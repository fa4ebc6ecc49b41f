//! Matrix construction, inspection and type conversion functions.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::error::EvalError;
use crate::matrix::{DenseMatrix, Matrix, MatrixValue, SparseMatrix};
use crate::namespace::arithmetic::{map_collections, map_elements, to_decimal};
use crate::params;
use crate::typed::{self, TypedFunction};
use crate::value::Value;

fn dense(value: &Value) -> Result<Value, EvalError> {
    DenseMatrix::from_value(value).map(|m| Value::Matrix(MatrixValue::Dense(m)))
}

fn sparse_of(value: &Value) -> Result<Value, EvalError> {
    SparseMatrix::from_value(value).map(|m| Value::Matrix(MatrixValue::Sparse(m)))
}

fn sizes(size: Vec<usize>) -> Vec<Value> {
    size.into_iter().map(|n| Value::Number(n as f64)).collect()
}

pub fn size() -> TypedFunction {
    TypedFunction::new("size")
        .signature(params![Matrix], |_, args| {
            let size = sizes(args[0].size());
            dense(&Value::Array(size))
        })
        .signature(params![Array | String | Range], |_, args| Ok(Value::Array(sizes(args[0].size()))))
        .signature(params![Any], |_, _| Ok(Value::Array(Vec::new())))
}

pub fn matrix() -> TypedFunction {
    TypedFunction::new("matrix")
        .signature(params![], |_, _| dense(&Value::Array(Vec::new())))
        .signature(params![Array | Matrix], |_, args| dense(&args[0]))
        .signature(params![Range], |_, args| match &args[0] {
            Value::Range(r) => dense(&r.to_array()),
            other => dense(other),
        })
        .signature(params![Array | Matrix, String], |_, args| match &args[1] {
            Value::String(format) if format == "dense" => dense(&args[0]),
            Value::String(format) if format == "sparse" => sparse_of(&args[0]),
            other => Err(EvalError::Type(format!("Unsupported matrix storage format: {other}"))),
        })
}

pub fn sparse() -> TypedFunction {
    TypedFunction::new("sparse")
        .signature(params![], |_, _| Ok(Value::Matrix(MatrixValue::Sparse(SparseMatrix::empty(0, 0)))))
        .signature(params![Array | Matrix], |_, args| sparse_of(&args[0]))
}

pub fn density() -> TypedFunction {
    TypedFunction::new("density")
        .signature(params![SparseMatrix], |_, args| match &args[0] {
            Value::Matrix(MatrixValue::Sparse(m)) => Ok(Value::Number(m.density())),
            other => Err(EvalError::Type(format!("SparseMatrix expected, got {}", other.type_name()))),
        })
        .signature(params![Array | Matrix], |_, args| {
            let values = args[0].flatten();
            if values.is_empty() {
                return Ok(Value::Number(0.0));
            }
            let stored = values.iter().filter(|v| !v.is_zero()).count();
            Ok(Value::Number(stored as f64 / values.len() as f64))
        })
}

pub fn transpose() -> TypedFunction {
    TypedFunction::new("transpose")
        .signature(params![Array], |_, args| {
            Ok(DenseMatrix::from_value(&args[0])?.transpose()?.to_array())
        })
        .signature(params![Matrix], |_, args| match &args[0] {
            Value::Matrix(MatrixValue::Sparse(m)) => {
                let flipped = m.to_dense().transpose()?;
                Ok(Value::Matrix(MatrixValue::Sparse(SparseMatrix::from_dense(&flipped)?)))
            }
            Value::Matrix(MatrixValue::Dense(m)) => Ok(Value::Matrix(MatrixValue::Dense(m.transpose()?))),
            other => Ok(other.clone()),
        })
        .signature(params![Number | BigNumber | Boolean | String | Unit], |_, args| Ok(args[0].clone()))
}

pub fn number() -> TypedFunction {
    let f = TypedFunction::new("number")
        .signature(params![], |_, _| Ok(Value::Number(0.0)))
        .signature(params![Number], |_, args| Ok(args[0].clone()))
        .signature(params![BigNumber | Boolean | Null], |_, args| Ok(Value::Number(typed::to_f64(&args[0])?)))
        .signature(params![String], |_, args| match &args[0] {
            Value::String(s) => typed::parse_number(s)
                .map(Value::Number)
                .ok_or_else(|| EvalError::Type(format!("Cannot convert \"{s}\" to a number"))),
            other => Err(EvalError::Type(format!("String expected, got {}", other.type_name()))),
        })
        .signature(params![Unit, String], |_, args| match (&args[0], &args[1]) {
            (Value::Unit(u), Value::String(target)) => {
                let target = crate::units::Unit::lookup(target)
                    .ok_or_else(|| EvalError::Reference(format!("Unit \"{target}\" not found")))?;
                Ok(Value::Number(u.to(&target)?.value().unwrap_or(0.0)))
            }
            _ => Err(EvalError::Type("Unit and string expected".into())),
        });
    map_collections(f)
}

pub fn string() -> TypedFunction {
    let f = TypedFunction::new("string")
        .signature(params![], |_, _| Ok(Value::String(String::new())))
        .signature(params![String], |_, args| Ok(args[0].clone()))
        .signature(params![Number], |_, args| {
            Ok(Value::String(crate::output::format_number(typed::to_f64(&args[0])?)))
        })
        .signature(params![BigNumber | Boolean | Null | Unit], |_, args| Ok(Value::String(args[0].to_string())));
    map_collections(f)
}

pub fn bignumber() -> TypedFunction {
    let f = TypedFunction::new("bignumber")
        .signature(params![], |_, _| Ok(Value::BigNumber(Decimal::ZERO)))
        .signature(params![Number], |_, args| {
            let n = typed::to_f64(&args[0])?;
            Decimal::from_f64(n)
                .map(Value::BigNumber)
                .ok_or_else(|| EvalError::Type(format!("Cannot convert {n} to BigNumber")))
        })
        .signature(params![BigNumber | String | Boolean | Null], |_, args| {
            to_decimal(&args[0]).map(Value::BigNumber)
        });
    map_collections(f)
}

pub fn type_of() -> TypedFunction {
    TypedFunction::new("typeof").signature(params![Any], |_, args| Ok(Value::from(args[0].type_name())))
}

/// Unit conversion, also the function behind the `to` operator.
pub fn to() -> TypedFunction {
    TypedFunction::new("to")
        .signature(params![Unit, Unit], |_, args| match (&args[0], &args[1]) {
            (Value::Unit(value), Value::Unit(target)) => Ok(Value::Unit(value.to(target)?)),
            _ => Err(EvalError::Type("Unit expected".into())),
        })
        .signature(params![Array | Matrix, Unit], |this, args| {
            map_elements(&args[0], &mut |x| this.call(&[x.clone(), args[1].clone()]))
        })
}

pub fn collection_functions() -> Vec<TypedFunction> {
    vec![
        size(),
        matrix(),
        sparse(),
        density(),
        transpose(),
        number(),
        string(),
        bignumber(),
        type_of(),
        to(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    fn grid() -> Value {
        Value::Array(vec![Value::Array(vec![n(1.0), n(0.0)]), Value::Array(vec![n(0.0), n(4.0)])])
    }

    #[test]
    fn test_size_of_array() {
        assert_eq!(size().call(&[grid()]).unwrap(), Value::Array(vec![n(2.0), n(2.0)]));
        assert_eq!(size().call(&[n(3.0)]).unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_sparse_density() {
        let m = sparse().call(&[grid()]).unwrap();
        assert_eq!(density().call(&[m]).unwrap(), n(0.5));
    }

    #[test]
    fn test_number_from_unit() {
        let cm = Value::Unit(crate::units::Unit::lookup("cm").unwrap().with_value(150.0));
        let Value::Number(meters) = number().call(&[cm, Value::from("m")]).unwrap() else {
            panic!("expected a number");
        };
        assert!((meters - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_typeof() {
        assert_eq!(type_of().call(&[grid()]).unwrap(), Value::from("Array"));
        let m = matrix().call(&[grid()]).unwrap();
        assert_eq!(type_of().call(&[m]).unwrap(), Value::from("Matrix"));
    }
}
