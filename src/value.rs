use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::ast::NodeRef;
use crate::compiler::Function;
use crate::error::EvalError;
use crate::matrix::{Index, Matrix, MatrixValue, Range};
use crate::typed::TypeTag;
use crate::units::Unit;

/// A runtime value produced by evaluating an expression.
///
/// Every value classifies into exactly one [`TypeTag`]; the tag order decides
/// which tag wins, so a dense matrix reports `Matrix` rather than
/// `DenseMatrix`.
///
/// # Examples
///
/// ```
/// use graphcalc::Value;
///
/// let n = Value::Number(2.0);
/// let list = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
///
/// assert_eq!(n.type_name(), "number");
/// assert_eq!(list.to_string(), "[1, 2]");
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit float
    Number(f64),

    /// Arbitrary precision decimal
    BigNumber(Decimal),

    String(String),

    Boolean(bool),

    Null,

    Undefined,

    /// Nested array, the result of array literals and ranges
    Array(Vec<Value>),

    /// Dense or sparse matrix
    Matrix(MatrixValue),

    Range(Range),

    Index(Index),

    /// Object with ordered keys
    Object(BTreeMap<String, Value>),

    /// Builtin or user-defined function
    Function(Rc<Function>),

    /// Physical unit, with or without a value
    Unit(Unit),

    /// Unevaluated expression returned by `quote`
    Node(NodeRef),

    /// Visible results of a multi-statement block
    ResultSet(Vec<Value>),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        TypeTag::of(self)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_tag().as_str()
    }

    /// Scalars in row-major order; nested arrays and matrices are unrolled.
    pub fn flatten(&self) -> Vec<Value> {
        match self {
            Value::Array(items) => items.iter().flat_map(Value::flatten).collect(),
            Value::Matrix(m) => m.to_dense().into_data(),
            Value::Range(r) => r.values().into_iter().map(Value::Number).collect(),
            other => vec![other.clone()],
        }
    }

    /// Whether the value is a numeric zero; used by sparse storage.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Number(n) => *n == 0.0,
            Value::BigNumber(d) => d.is_zero(),
            Value::Boolean(b) => !b,
            _ => false,
        }
    }

    /// Truth value of a condition.
    pub fn is_truthy(&self) -> Result<bool, EvalError> {
        match self {
            Value::Number(n) => Ok(*n != 0.0 && !n.is_nan()),
            Value::BigNumber(d) => Ok(!d.is_zero()),
            Value::Boolean(b) => Ok(*b),
            Value::String(s) => Ok(!s.is_empty()),
            Value::Unit(u) => Ok(u.value().is_some_and(|v| v != 0.0)),
            Value::Null | Value::Undefined => Ok(false),
            _ => Err(EvalError::Type("Unsupported type of condition".into())),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::BigNumber(d) => Some(decimal_to_f64(d)),
            _ => None,
        }
    }

    /// Array and matrix shape, `[]` for scalars.
    pub fn size(&self) -> Vec<usize> {
        match self {
            Value::Array(items) => {
                let mut size = vec![items.len()];
                if let Some(first) = items.first() {
                    size.extend(first.size());
                }
                size
            }
            Value::Matrix(m) => m.size(),
            Value::String(s) => vec![s.chars().count()],
            Value::Range(r) => vec![r.size()],
            _ => Vec::new(),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Matrix(_))
    }
}

pub fn decimal_to_f64(d: &Decimal) -> f64 {
    d.to_f64().unwrap_or(f64::NAN)
}

pub fn f64_to_decimal(n: f64) -> Option<Decimal> {
    Decimal::from_f64(n)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Number(a), Number(b)) => a == b,
            (BigNumber(a), BigNumber(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Null, Null) | (Undefined, Undefined) => true,
            (Array(a), Array(b)) | (ResultSet(a), ResultSet(b)) => a == b,
            (Matrix(a), Matrix(b)) => a == b,
            (Range(a), Range(b)) => a == b,
            (Index(a), Index(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (Unit(a), Unit(b)) => a == b,
            (Node(a), Node(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::output::format_value(self))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::BigNumber(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<MatrixValue> for Value {
    fn from(m: MatrixValue) -> Self {
        Value::Matrix(m)
    }
}
