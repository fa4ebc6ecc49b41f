//! Arithmetic operators and scalar math functions.

use std::cmp::Ordering;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::EvalError;
use crate::matrix::{self, DenseMatrix, Matrix, MatrixValue, SparseMatrix};
use crate::params;
use crate::typed::{self, Param, TypeTag, TypedFunction};
use crate::units::{Dimension, Unit};
use crate::value::{Value, decimal_to_f64};

/// Apply `f` to every scalar inside arrays and matrices, keeping the shape.
pub(crate) fn map_elements(
    value: &Value,
    f: &mut dyn FnMut(&Value) -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| map_elements(item, f))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Matrix(MatrixValue::Dense(m)) => m.map(&mut |v, _| f(v)).map(|m| Value::Matrix(MatrixValue::Dense(m))),
        Value::Matrix(MatrixValue::Sparse(m)) => m.map(&mut |v, _| f(v)).map(|m| Value::Matrix(MatrixValue::Sparse(m))),
        scalar => f(scalar),
    }
}

/// Combine two operands element by element. A scalar operand is broadcast;
/// two collections must have the same size.
pub(crate) fn zip_elements(
    a: &Value,
    b: &Value,
    f: &mut dyn FnMut(&Value, &Value) -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    match (a.is_collection(), b.is_collection()) {
        (false, false) => f(a, b),
        (true, false) => map_elements(a, &mut |x| f(x, b)),
        (false, true) => map_elements(b, &mut |y| f(a, y)),
        (true, true) => {
            let (left, right) = (DenseMatrix::from_value(a)?, DenseMatrix::from_value(b)?);
            if left.size() != right.size() {
                return Err(EvalError::dimension_mismatch(left.size(), right.size()));
            }
            let data = left
                .data()
                .iter()
                .zip(right.data())
                .map(|(x, y)| f(x, y))
                .collect::<Result<Vec<_>, _>>()?;
            let result = DenseMatrix::from_parts(data, left.size())?;
            Ok(match (a, b) {
                (Value::Matrix(MatrixValue::Sparse(_)), Value::Matrix(MatrixValue::Sparse(_))) => {
                    Value::Matrix(MatrixValue::Sparse(SparseMatrix::from_dense(&result)?))
                }
                (Value::Matrix(_), _) | (_, Value::Matrix(_)) => Value::Matrix(MatrixValue::Dense(result)),
                _ => result.to_array(),
            })
        }
    }
}

/// Add signatures that map a unary function over arrays and matrices.
pub(crate) fn map_collections(f: TypedFunction) -> TypedFunction {
    f.signature(params![Array | Matrix], |this, args| {
        map_elements(&args[0], &mut |x| this.call(std::slice::from_ref(x)))
    })
}

/// Add signatures that apply a binary function element-wise.
pub(crate) fn zip_collections(f: TypedFunction) -> TypedFunction {
    let zip = |this: &TypedFunction, args: &[Value]| {
        zip_elements(&args[0], &args[1], &mut |x, y| this.call(&[x.clone(), y.clone()]))
    };
    f.signature(params![Array | Matrix, Array | Matrix], zip)
        .signature(params![Array | Matrix, Any], zip)
        .signature(params![Any, Array | Matrix], zip)
}

pub(crate) fn to_decimal(value: &Value) -> Result<Decimal, EvalError> {
    match value {
        Value::BigNumber(d) => Ok(*d),
        other => match typed::convert(other, TypeTag::BigNumber) {
            Some(Ok(Value::BigNumber(d))) => Ok(d),
            Some(Err(e)) => Err(e),
            _ => Err(EvalError::Type(format!(
                "Cannot convert {} to BigNumber",
                other.type_name()
            ))),
        },
    }
}

fn big(name: &str, result: Option<Decimal>) -> Result<Value, EvalError> {
    result
        .map(Value::BigNumber)
        .ok_or_else(|| EvalError::Type(format!("Result of {name} is not representable as a BigNumber")))
}

fn big_from_f64(name: &str, n: f64) -> Result<Value, EvalError> {
    big(name, Decimal::from_f64(n))
}

fn number2(args: &[Value], f: impl Fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    Ok(Value::Number(f(typed::to_f64(&args[0])?, typed::to_f64(&args[1])?)))
}

fn decimal2(
    name: &str,
    args: &[Value],
    f: impl Fn(Decimal, Decimal) -> Option<Decimal>,
) -> Result<Value, EvalError> {
    big(name, f(to_decimal(&args[0])?, to_decimal(&args[1])?))
}

fn unit_arg(value: &Value) -> Result<&Unit, EvalError> {
    match value {
        Value::Unit(u) => Ok(u),
        other => Err(EvalError::Type(format!("Unit expected, got {}", other.type_name()))),
    }
}

fn add_like(name: &'static str, sign: f64) -> TypedFunction {
    let f = TypedFunction::new(name)
        .signature(params![Number, Number], move |_, args| number2(args, |a, b| a + sign * b))
        .signature(params![BigNumber, BigNumber], move |_, args| {
            decimal2(name, args, |a, b| if sign > 0.0 { a.checked_add(b) } else { a.checked_sub(b) })
        })
        .signature(params![Unit, Unit], move |_, args| {
            Ok(Value::Unit(unit_arg(&args[0])?.add(unit_arg(&args[1])?, sign)?))
        });
    zip_collections(f)
}

pub fn add() -> TypedFunction {
    add_like("add", 1.0)
}

pub fn subtract() -> TypedFunction {
    add_like("subtract", -1.0)
}

fn scale_unit(args: &[Value]) -> Result<Value, EvalError> {
    let (unit, factor) = match args {
        [Value::Unit(u), other] | [other, Value::Unit(u)] => (u, typed::to_f64(other)?),
        _ => return Err(EvalError::Type("Unit expected".into())),
    };
    Ok(Value::Unit(unit.scale(factor)))
}

fn scalar_multiply(name: &'static str) -> TypedFunction {
    TypedFunction::new(name)
        .signature(params![Number, Number], |_, args| number2(args, |a, b| a * b))
        .signature(params![BigNumber, BigNumber], move |_, args| {
            decimal2(name, args, |a, b| a.checked_mul(b))
        })
        .signature(params![Number | BigNumber, Unit], |_, args| scale_unit(args))
        .signature(params![Unit, Number | BigNumber], |_, args| scale_unit(args))
}

/// Matrix product for two collections; scalars multiply element-wise.
pub fn multiply(add: TypedFunction) -> TypedFunction {
    scalar_multiply("multiply")
        .signature(params![Array | Matrix, Array | Matrix], move |this, args| {
            let (a, b) = (DenseMatrix::from_value(&args[0])?, DenseMatrix::from_value(&args[1])?);
            let product = matrix::multiply(
                &a,
                &b,
                &|x, y| this.call(&[x.clone(), y.clone()]),
                &|x, y| add.call(&[x.clone(), y.clone()]),
            )?;
            Ok(match (&args[0], &args[1], product) {
                (Value::Array(_), Value::Array(_), Value::Matrix(m)) => m.to_array(),
                (_, _, product) => product,
            })
        })
        .signature(params![Array | Matrix, Any], |this, args| {
            map_elements(&args[0], &mut |x| this.call(&[x.clone(), args[1].clone()]))
        })
        .signature(params![Any, Array | Matrix], |this, args| {
            map_elements(&args[1], &mut |y| this.call(&[args[0].clone(), y.clone()]))
        })
}

pub fn dot_multiply() -> TypedFunction {
    zip_collections(scalar_multiply("dotMultiply"))
}

fn scalar_divide(name: &'static str) -> TypedFunction {
    TypedFunction::new(name)
        .signature(params![Number, Number], |_, args| number2(args, |a, b| a / b))
        .signature(params![BigNumber, BigNumber], move |_, args| {
            decimal2(name, args, |a, b| a.checked_div(b))
        })
        .signature(params![Unit, Number | BigNumber], |_, args| {
            Ok(Value::Unit(unit_arg(&args[0])?.scale(1.0 / typed::to_f64(&args[1])?)))
        })
}

/// Division of a collection by a scalar is element-wise.
pub fn divide() -> TypedFunction {
    scalar_divide("divide").signature(params![Array | Matrix, Any], |this, args| {
        map_elements(&args[0], &mut |x| this.call(&[x.clone(), args[1].clone()]))
    })
}

pub fn dot_divide() -> TypedFunction {
    zip_collections(scalar_divide("dotDivide"))
}

fn modulo_f64(x: f64, y: f64) -> f64 {
    if y == 0.0 { x } else { x - y * (x / y).floor() }
}

fn modulo_decimal(x: Decimal, y: Decimal) -> Option<Decimal> {
    if y.is_zero() {
        return Some(x);
    }
    let r = x.checked_rem(y)?;
    if !r.is_zero() && r.is_sign_negative() != y.is_sign_negative() {
        r.checked_add(y)
    } else {
        Some(r)
    }
}

pub fn modulo() -> TypedFunction {
    let f = TypedFunction::new("mod")
        .signature(params![Number, Number], |_, args| number2(args, modulo_f64))
        .signature(params![BigNumber, BigNumber], |_, args| decimal2("mod", args, modulo_decimal));
    zip_collections(f)
}

fn pow_decimal(base: Decimal, exponent: i64) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut square = base;
    let mut n = exponent.unsigned_abs();
    while n > 0 {
        if n & 1 == 1 {
            result = result.checked_mul(square)?;
        }
        n >>= 1;
        if n > 0 {
            square = square.checked_mul(square)?;
        }
    }
    if exponent < 0 {
        Decimal::ONE.checked_div(result)
    } else {
        Some(result)
    }
}

fn scalar_pow(name: &'static str) -> TypedFunction {
    TypedFunction::new(name)
        .signature(params![Number, Number], |_, args| number2(args, f64::powf))
        .signature(params![BigNumber, BigNumber], move |_, args| {
            let (base, exponent) = (to_decimal(&args[0])?, to_decimal(&args[1])?);
            if exponent.fract().is_zero()
                && let Some(n) = exponent.to_i64()
            {
                return big(name, pow_decimal(base, n));
            }
            big_from_f64(name, decimal_to_f64(&base).powf(decimal_to_f64(&exponent)))
        })
}

/// Scalar power, or repeated matrix product for a square matrix and a
/// non-negative integer exponent.
pub fn pow(multiply: TypedFunction) -> TypedFunction {
    scalar_pow("pow").signature(params![Array | Matrix, Number], move |_, args| {
        let exponent = typed::to_f64(&args[1])?;
        let size = DenseMatrix::from_value(&args[0])?.size();
        if !matches!(size.as_slice(), [r, c] if r == c) {
            return Err(EvalError::Dimension(format!(
                "For A^b, A must be a square matrix (size: {size:?})"
            )));
        }
        if exponent < 0.0 || exponent.fract() != 0.0 {
            return Err(EvalError::Type(format!(
                "For A^b, b must be a non-negative integer (value: {exponent})"
            )));
        }
        let mut result = identity_like(&args[0], size[0])?;
        for _ in 0..exponent as usize {
            result = multiply.call(&[result, args[0].clone()])?;
        }
        Ok(result)
    })
}

fn identity_like(template: &Value, n: usize) -> Result<Value, EvalError> {
    let mut data = vec![Value::Number(0.0); n * n];
    for i in 0..n {
        data[i * n + i] = Value::Number(1.0);
    }
    let dense = DenseMatrix::from_parts(data, vec![n, n])?;
    Ok(match template {
        Value::Array(_) => dense.to_array(),
        _ => Value::Matrix(MatrixValue::Dense(dense)),
    })
}

pub fn dot_pow() -> TypedFunction {
    zip_collections(scalar_pow("dotPow"))
}

pub fn unary_minus() -> TypedFunction {
    let f = TypedFunction::new("unaryMinus")
        .signature(params![Number], |_, args| Ok(Value::Number(-typed::to_f64(&args[0])?)))
        .signature(params![BigNumber], |_, args| Ok(Value::BigNumber(-to_decimal(&args[0])?)))
        .signature(params![Unit], |_, args| Ok(Value::Unit(unit_arg(&args[0])?.scale(-1.0))));
    map_collections(f)
}

pub fn unary_plus() -> TypedFunction {
    let f = TypedFunction::new("unaryPlus")
        .signature(params![Number | BigNumber | Unit], |_, args| Ok(args[0].clone()));
    map_collections(f)
}

/// Lanczos approximation, g = 7.
fn gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        return std::f64::consts::PI / ((std::f64::consts::PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let t = x + 7.5;
    let mut sum = COEFFICIENTS[0];
    for (i, c) in COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * sum
}

fn factorial_f64(n: f64) -> Result<f64, EvalError> {
    if n < 0.0 {
        return Err(EvalError::Type(format!("Value must be non-negative (value: {n})")));
    }
    if n.fract() == 0.0 {
        if n > 170.0 {
            return Ok(f64::INFINITY);
        }
        return Ok((2..=n as u64).fold(1.0, |acc, k| acc * k as f64));
    }
    Ok(gamma(n + 1.0))
}

pub fn factorial() -> TypedFunction {
    let f = TypedFunction::new("factorial")
        .signature(params![Number], |_, args| factorial_f64(typed::to_f64(&args[0])?).map(Value::Number))
        .signature(params![BigNumber], |_, args| {
            let n = to_decimal(&args[0])?;
            if n.is_sign_negative() || !n.fract().is_zero() {
                return Err(EvalError::Type(format!(
                    "Value must be a non-negative integer (value: {n})"
                )));
            }
            let mut acc = Decimal::ONE;
            let mut k = Decimal::TWO;
            while k <= n {
                acc = acc
                    .checked_mul(k)
                    .ok_or_else(|| EvalError::Type("Result of factorial is not representable as a BigNumber".into()))?;
                k += Decimal::ONE;
            }
            Ok(Value::BigNumber(acc))
        });
    map_collections(f)
}

/// Unary function over numbers; BigNumbers are computed in floating point.
fn unary_math(name: &'static str, f: fn(f64) -> f64) -> TypedFunction {
    let function = TypedFunction::new(name)
        .signature(params![Number], move |_, args| Ok(Value::Number(f(typed::to_f64(&args[0])?))))
        .signature(params![BigNumber], move |_, args| {
            big_from_f64(name, f(decimal_to_f64(&to_decimal(&args[0])?)))
        });
    map_collections(function)
}

/// Trigonometric function that also accepts angles.
fn trig(name: &'static str, f: fn(f64) -> f64) -> TypedFunction {
    unary_math(name, f).signature(params![Unit], move |_, args| {
        let unit = unit_arg(&args[0])?;
        if unit.dimension() != Dimension::Angle {
            return Err(EvalError::Type(format!(
                "Unit in function {name} is no valid angle (unit: {})",
                unit.name()
            )));
        }
        Ok(Value::Number(f(unit.base_value())))
    })
}

pub fn abs() -> TypedFunction {
    let f = TypedFunction::new("abs")
        .signature(params![Number], |_, args| Ok(Value::Number(typed::to_f64(&args[0])?.abs())))
        .signature(params![BigNumber], |_, args| Ok(Value::BigNumber(to_decimal(&args[0])?.abs())))
        .signature(params![Unit], |_, args| {
            let unit = unit_arg(&args[0])?;
            Ok(Value::Unit(unit.with_value(unit.value().unwrap_or(1.0).abs())))
        });
    map_collections(f)
}

pub fn log() -> TypedFunction {
    unary_math("log", f64::ln)
        .signature(params![Number, Number], |_, args| number2(args, |x, base| x.ln() / base.ln()))
        .signature(params![BigNumber, BigNumber], |_, args| {
            let (x, base) = (decimal_to_f64(&to_decimal(&args[0])?), decimal_to_f64(&to_decimal(&args[1])?));
            big_from_f64("log", x.ln() / base.ln())
        })
}

fn round_f64(x: f64, decimals: f64) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (x * factor).round() / factor
}

fn check_decimals(n: f64) -> Result<u32, EvalError> {
    if n.fract() != 0.0 || !(0.0..=15.0).contains(&n) {
        return Err(EvalError::Type(format!(
            "Number of decimals in function round must be an integer from 0 to 15 inclusive (value: {n})"
        )));
    }
    Ok(n as u32)
}

pub fn round() -> TypedFunction {
    let f = TypedFunction::new("round")
        .signature(params![Number], |_, args| Ok(Value::Number(typed::to_f64(&args[0])?.round())))
        .signature(params![BigNumber], |_, args| {
            Ok(Value::BigNumber(
                to_decimal(&args[0])?.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            ))
        })
        .signature(params![Number, Number], |_, args| {
            let decimals = check_decimals(typed::to_f64(&args[1])?)?;
            Ok(Value::Number(round_f64(typed::to_f64(&args[0])?, decimals as f64)))
        })
        .signature(params![BigNumber, Number], |_, args| {
            let decimals = check_decimals(typed::to_f64(&args[1])?)?;
            Ok(Value::BigNumber(
                to_decimal(&args[0])?.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero),
            ))
        });
    map_collections(f)
}

pub fn floor() -> TypedFunction {
    let f = TypedFunction::new("floor")
        .signature(params![Number], |_, args| Ok(Value::Number(typed::to_f64(&args[0])?.floor())))
        .signature(params![BigNumber], |_, args| Ok(Value::BigNumber(to_decimal(&args[0])?.floor())));
    map_collections(f)
}

pub fn ceil() -> TypedFunction {
    let f = TypedFunction::new("ceil")
        .signature(params![Number], |_, args| Ok(Value::Number(typed::to_f64(&args[0])?.ceil())))
        .signature(params![BigNumber], |_, args| Ok(Value::BigNumber(to_decimal(&args[0])?.ceil())));
    map_collections(f)
}

pub fn math_functions() -> Vec<TypedFunction> {
    vec![
        abs(),
        unary_math("sqrt", f64::sqrt),
        unary_math("exp", f64::exp),
        log(),
        trig("sin", f64::sin),
        trig("cos", f64::cos),
        trig("tan", f64::tan),
        unary_math("asin", f64::asin),
        unary_math("acos", f64::acos),
        unary_math("atan", f64::atan),
        floor(),
        ceil(),
        round(),
    ]
}

/// Numeric ordering of two scalars.
pub(crate) fn compare_numeric(a: &Value, b: &Value) -> Result<Ordering, EvalError> {
    match (a, b) {
        (Value::BigNumber(x), Value::BigNumber(y)) => Ok(x.cmp(y)),
        (Value::Unit(x), Value::Unit(y)) if x.dimension() == y.dimension() => {
            Ok(x.base_value().total_cmp(&y.base_value()))
        }
        _ => {
            let (x, y) = (typed::to_f64(a)?, typed::to_f64(b)?);
            x.partial_cmp(&y)
                .ok_or_else(|| EvalError::Type("Cannot compare NaN".into()))
        }
    }
}

fn extreme(name: &'static str, keep: Ordering) -> TypedFunction {
    let reduce = move |values: Vec<Value>| -> Result<Value, EvalError> {
        let mut iter = values.into_iter();
        let mut best = iter
            .next()
            .ok_or_else(|| EvalError::Type(format!("Cannot calculate {name} of an empty array")))?;
        for value in iter {
            if compare_numeric(&value, &best)? == keep {
                best = value;
            }
        }
        Ok(best)
    };
    TypedFunction::new(name)
        .signature(params![Array | Matrix], move |_, args| reduce(args[0].flatten()))
        .variadic(
            params![Number | BigNumber | Unit],
            Param::of(&[TypeTag::Number, TypeTag::BigNumber, TypeTag::Unit]),
            move |_, args| reduce(args.to_vec()),
        )
}

pub fn min() -> TypedFunction {
    extreme("min", Ordering::Less)
}

pub fn max() -> TypedFunction {
    extreme("max", Ordering::Greater)
}

pub fn sum(add: TypedFunction) -> TypedFunction {
    let total = move |values: Vec<Value>| -> Result<Value, EvalError> {
        let mut iter = values.into_iter();
        let Some(mut acc) = iter.next() else {
            return Ok(Value::Number(0.0));
        };
        for value in iter {
            acc = add.call(&[acc, value])?;
        }
        Ok(acc)
    };
    let variadic_total = total.clone();
    TypedFunction::new("sum")
        .signature(params![], |_, _| Ok(Value::Number(0.0)))
        .signature(params![Array | Matrix], move |_, args| total(args[0].flatten()))
        .variadic(params![Any], Param::Any, move |_, args| variadic_total(args.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn test_mod_follows_divisor_sign() {
        assert_eq!(modulo().call(&[n(-7.0), n(3.0)]).unwrap(), n(2.0));
        assert_eq!(modulo().call(&[n(7.0), n(0.0)]).unwrap(), n(7.0));
    }

    #[test]
    fn test_mixed_number_bignumber_add() {
        let result = add().call(&[n(1.5), Value::BigNumber(Decimal::new(25, 1))]).unwrap();
        assert_eq!(result, Value::BigNumber(Decimal::new(40, 1)));
    }

    #[test]
    fn test_elementwise_broadcast() {
        let list = Value::Array(vec![n(1.0), n(2.0)]);
        assert_eq!(add().call(&[list, n(10.0)]).unwrap(), Value::Array(vec![n(11.0), n(12.0)]));
    }

    #[test]
    fn test_factorial_gamma() {
        assert_eq!(factorial_f64(5.0).unwrap(), 120.0);
        assert!((factorial_f64(0.5).unwrap() - 0.886_226_925_452_758).abs() < 1e-12);
        assert!(factorial_f64(-1.0).is_err());
    }

    #[test]
    fn test_bignumber_integer_power_is_exact() {
        let result = pow_decimal(Decimal::new(11, 1), 2).unwrap();
        assert_eq!(result, Decimal::new(121, 2));
    }
}
