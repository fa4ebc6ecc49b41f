//! Runtime type registry and typed dispatch.
//!
//! Every [`Value`] classifies into exactly one [`TypeTag`] by scanning
//! [`TypeTag::ORDER`] and taking the first tag whose test matches. A
//! [`TypedFunction`] holds an ordered list of [`Signature`]s; a call first
//! looks for a signature whose parameters accept the arguments as they are,
//! then retries with the implicit conversions in [`CONVERSIONS`].
//!
//! ```
//! use graphcalc::typed::{Param, TypeTag, TypedFunction};
//! use graphcalc::Value;
//!
//! let double = TypedFunction::new("double")
//!     .signature(vec![Param::of(&[TypeTag::Number])], |_, args| match args {
//!         [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
//!         _ => unreachable!(),
//!     });
//!
//! // exact match
//! assert_eq!(double.call(&[Value::Number(2.0)]).unwrap(), Value::Number(4.0));
//! // boolean -> number conversion
//! assert_eq!(double.call(&[Value::Boolean(true)]).unwrap(), Value::Number(2.0));
//! ```

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::EvalError;
use crate::matrix::{DenseMatrix, Matrix, MatrixValue};
use crate::value::{Value, decimal_to_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Number,
    BigNumber,
    Unit,
    String,
    Array,
    Matrix,
    DenseMatrix,
    SparseMatrix,
    Range,
    Index,
    Boolean,
    ResultSet,
    Function,
    Object,
    Null,
    Undefined,
    OperatorNode,
    ConstantNode,
    SymbolNode,
    ParenthesisNode,
    FunctionNode,
    FunctionAssignmentNode,
    ArrayNode,
    AssignmentNode,
    BlockNode,
    ConditionalNode,
    IndexNode,
    RangeNode,
    AccessorNode,
    ObjectNode,
    Node,
}

impl TypeTag {
    /// Classification order. The first matching tag wins.
    pub const ORDER: &'static [TypeTag] = &[
        TypeTag::Number,
        TypeTag::BigNumber,
        TypeTag::Unit,
        TypeTag::String,
        TypeTag::Array,
        TypeTag::Matrix,
        TypeTag::DenseMatrix,
        TypeTag::SparseMatrix,
        TypeTag::Range,
        TypeTag::Index,
        TypeTag::Boolean,
        TypeTag::ResultSet,
        TypeTag::Function,
        TypeTag::Object,
        TypeTag::Null,
        TypeTag::Undefined,
        TypeTag::OperatorNode,
        TypeTag::ConstantNode,
        TypeTag::SymbolNode,
        TypeTag::ParenthesisNode,
        TypeTag::FunctionNode,
        TypeTag::FunctionAssignmentNode,
        TypeTag::ArrayNode,
        TypeTag::AssignmentNode,
        TypeTag::BlockNode,
        TypeTag::ConditionalNode,
        TypeTag::IndexNode,
        TypeTag::RangeNode,
        TypeTag::AccessorNode,
        TypeTag::ObjectNode,
        TypeTag::Node,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Number => "number",
            TypeTag::BigNumber => "BigNumber",
            TypeTag::Unit => "Unit",
            TypeTag::String => "string",
            TypeTag::Array => "Array",
            TypeTag::Matrix => "Matrix",
            TypeTag::DenseMatrix => "DenseMatrix",
            TypeTag::SparseMatrix => "SparseMatrix",
            TypeTag::Range => "Range",
            TypeTag::Index => "Index",
            TypeTag::Boolean => "boolean",
            TypeTag::ResultSet => "ResultSet",
            TypeTag::Function => "function",
            TypeTag::Object => "Object",
            TypeTag::Null => "null",
            TypeTag::Undefined => "undefined",
            TypeTag::OperatorNode => "OperatorNode",
            TypeTag::ConstantNode => "ConstantNode",
            TypeTag::SymbolNode => "SymbolNode",
            TypeTag::ParenthesisNode => "ParenthesisNode",
            TypeTag::FunctionNode => "FunctionNode",
            TypeTag::FunctionAssignmentNode => "FunctionAssignmentNode",
            TypeTag::ArrayNode => "ArrayNode",
            TypeTag::AssignmentNode => "AssignmentNode",
            TypeTag::BlockNode => "BlockNode",
            TypeTag::ConditionalNode => "ConditionalNode",
            TypeTag::IndexNode => "IndexNode",
            TypeTag::RangeNode => "RangeNode",
            TypeTag::AccessorNode => "AccessorNode",
            TypeTag::ObjectNode => "ObjectNode",
            TypeTag::Node => "Node",
        }
    }

    /// Whether `value` belongs to this type. More than one tag can accept
    /// the same value; [`TypeTag::of`] picks the first in order.
    pub fn test(self, value: &Value) -> bool {
        match (self, value) {
            (TypeTag::Number, Value::Number(_))
            | (TypeTag::BigNumber, Value::BigNumber(_))
            | (TypeTag::Unit, Value::Unit(_))
            | (TypeTag::String, Value::String(_))
            | (TypeTag::Array, Value::Array(_))
            | (TypeTag::Matrix, Value::Matrix(_))
            | (TypeTag::DenseMatrix, Value::Matrix(MatrixValue::Dense(_)))
            | (TypeTag::SparseMatrix, Value::Matrix(MatrixValue::Sparse(_)))
            | (TypeTag::Range, Value::Range(_))
            | (TypeTag::Index, Value::Index(_))
            | (TypeTag::Boolean, Value::Boolean(_))
            | (TypeTag::ResultSet, Value::ResultSet(_))
            | (TypeTag::Function, Value::Function(_))
            | (TypeTag::Object, Value::Object(_))
            | (TypeTag::Null, Value::Null)
            | (TypeTag::Undefined, Value::Undefined)
            | (TypeTag::Node, Value::Node(_)) => true,
            (tag, Value::Node(node)) => node.type_name() == tag.as_str(),
            _ => false,
        }
    }

    pub fn of(value: &Value) -> TypeTag {
        TypeTag::ORDER
            .iter()
            .copied()
            .find(|tag| tag.test(value))
            .unwrap_or(TypeTag::Undefined)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ORDER
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("Unknown type \"{s}\""))
    }
}

/// An implicit conversion tried when no signature matches exactly.
pub struct Conversion {
    pub from: TypeTag,
    pub to: TypeTag,
    pub convert: fn(&Value) -> Result<Value, EvalError>,
}

pub static CONVERSIONS: &[Conversion] = &[
    Conversion { from: TypeTag::Number, to: TypeTag::BigNumber, convert: number_to_bignumber },
    Conversion { from: TypeTag::Number, to: TypeTag::String, convert: to_string },
    Conversion { from: TypeTag::BigNumber, to: TypeTag::String, convert: to_string },
    Conversion { from: TypeTag::String, to: TypeTag::Number, convert: string_to_number },
    Conversion { from: TypeTag::String, to: TypeTag::BigNumber, convert: string_to_bignumber },
    Conversion { from: TypeTag::Boolean, to: TypeTag::Number, convert: boolean_to_number },
    Conversion { from: TypeTag::Boolean, to: TypeTag::BigNumber, convert: boolean_to_bignumber },
    Conversion { from: TypeTag::Boolean, to: TypeTag::String, convert: to_string },
    Conversion { from: TypeTag::Null, to: TypeTag::Number, convert: |_| Ok(Value::Number(0.0)) },
    Conversion { from: TypeTag::Null, to: TypeTag::BigNumber, convert: |_| Ok(Value::BigNumber(Decimal::ZERO)) },
    Conversion { from: TypeTag::Null, to: TypeTag::String, convert: |_| Ok(Value::String("null".into())) },
    Conversion { from: TypeTag::Array, to: TypeTag::Matrix, convert: array_to_matrix },
    Conversion { from: TypeTag::Matrix, to: TypeTag::Array, convert: matrix_to_array },
];

fn significant_digits(n: f64) -> usize {
    let text = format!("{:e}", n.abs());
    let mantissa = text.split('e').next().unwrap_or("");
    mantissa
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .trim_start_matches('0')
        .len()
}

fn number_to_bignumber(value: &Value) -> Result<Value, EvalError> {
    let Value::Number(n) = value else {
        return Err(EvalError::Type(format!("Cannot convert {} to BigNumber", value.type_name())));
    };
    if significant_digits(*n) > 15 {
        return Err(EvalError::Type(format!(
            "Cannot implicitly convert a number with >15 significant digits to BigNumber (value: {n})"
        )));
    }
    crate::value::f64_to_decimal(*n)
        .map(Value::BigNumber)
        .ok_or_else(|| EvalError::Type(format!("Cannot convert {n} to BigNumber")))
}

fn to_string(value: &Value) -> Result<Value, EvalError> {
    Ok(Value::String(match value {
        Value::Number(n) => crate::output::format_number(*n),
        other => other.to_string(),
    }))
}

fn string_to_number(value: &Value) -> Result<Value, EvalError> {
    let Value::String(s) = value else {
        return Err(EvalError::Type(format!("Cannot convert {} to a number", value.type_name())));
    };
    parse_number(s)
        .map(Value::Number)
        .ok_or_else(|| EvalError::Type(format!("Cannot convert \"{s}\" to a number")))
}

/// Numeric text as accepted by the `number` conversion.
pub fn parse_number(s: &str) -> Option<f64> {
    match s.trim() {
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        "" => None,
        t if t.eq_ignore_ascii_case("inf") || t.eq_ignore_ascii_case("nan") => None,
        t => t.parse::<f64>().ok(),
    }
}

fn string_to_bignumber(value: &Value) -> Result<Value, EvalError> {
    let Value::String(s) = value else {
        return Err(EvalError::Type(format!("Cannot convert {} to BigNumber", value.type_name())));
    };
    let trimmed = s.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(Value::BigNumber)
        .map_err(|_| EvalError::Type(format!("Cannot convert \"{s}\" to BigNumber")))
}

fn boolean_to_number(value: &Value) -> Result<Value, EvalError> {
    Ok(Value::Number(if matches!(value, Value::Boolean(true)) { 1.0 } else { 0.0 }))
}

fn boolean_to_bignumber(value: &Value) -> Result<Value, EvalError> {
    Ok(Value::BigNumber(if matches!(value, Value::Boolean(true)) {
        Decimal::ONE
    } else {
        Decimal::ZERO
    }))
}

fn array_to_matrix(value: &Value) -> Result<Value, EvalError> {
    DenseMatrix::from_value(value).map(|m| Value::Matrix(MatrixValue::Dense(m)))
}

fn matrix_to_array(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Matrix(m) => Ok(m.to_array()),
        other => Ok(other.clone()),
    }
}

/// Convert `value` so it satisfies `tag`, if a conversion exists.
pub fn convert(value: &Value, tag: TypeTag) -> Option<Result<Value, EvalError>> {
    if tag.test(value) {
        return Some(Ok(value.clone()));
    }
    CONVERSIONS
        .iter()
        .find(|c| c.to == tag && c.from.test(value))
        .map(|c| (c.convert)(value))
}

/// Numeric value of a number, BigNumber, boolean or null.
pub fn to_f64(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::BigNumber(d) => Ok(decimal_to_f64(d)),
        other => match convert(other, TypeTag::Number) {
            Some(Ok(Value::Number(n))) => Ok(n),
            Some(Err(e)) => Err(e),
            _ => Err(EvalError::Type(format!(
                "Cannot convert {} to a number",
                other.type_name()
            ))),
        },
    }
}

/// One signature parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Any,
    Types(Vec<TypeTag>),
}

impl Param {
    pub fn of(tags: &[TypeTag]) -> Param {
        Param::Types(tags.to_vec())
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Param::Any => true,
            Param::Types(tags) => tags.iter().any(|t| t.test(value)),
        }
    }

    fn conversion_for(&self, value: &Value) -> Option<&'static Conversion> {
        match self {
            Param::Any => None,
            Param::Types(tags) => tags
                .iter()
                .find_map(|tag| CONVERSIONS.iter().find(|c| c.to == *tag && c.from.test(value))),
        }
    }

    fn accepts_loosely(&self, value: &Value) -> bool {
        self.accepts(value) || self.conversion_for(value).is_some()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Any => f.write_str("any"),
            Param::Types(tags) => {
                let names: Vec<&str> = tags.iter().map(|t| t.as_str()).collect();
                f.write_str(&names.join(" | "))
            }
        }
    }
}

/// Builds a `Vec<Param>`: `params![Number, BigNumber | String, Any]`.
#[macro_export]
macro_rules! params {
    (@one Any) => { $crate::typed::Param::Any };
    (@one $($tag:ident)|+) => { $crate::typed::Param::of(&[$($crate::typed::TypeTag::$tag),+]) };
    ($($($tag:ident)|+),* $(,)?) => { vec![$($crate::params!(@one $($tag)|+)),*] };
}

/// Implementation behind a signature. It receives the function so that
/// collection handlers can dispatch again on each element.
pub type Handler = Rc<dyn Fn(&TypedFunction, &[Value]) -> Result<Value, EvalError>>;

#[derive(Clone)]
pub struct Signature {
    params: Vec<Param>,
    /// Parameter repeated for any further arguments
    rest: Option<Param>,
    handler: Handler,
}

impl Signature {
    fn param_at(&self, i: usize) -> Option<&Param> {
        self.params.get(i).or(self.rest.as_ref())
    }

    fn accepts_arity(&self, n: usize) -> bool {
        if self.rest.is_some() {
            n >= self.params.len()
        } else {
            n == self.params.len()
        }
    }

    fn matches_exact(&self, args: &[Value]) -> bool {
        self.accepts_arity(args.len())
            && args
                .iter()
                .enumerate()
                .all(|(i, arg)| self.param_at(i).is_some_and(|p| p.accepts(arg)))
    }

    fn convert_args(&self, args: &[Value]) -> Option<Result<Vec<Value>, EvalError>> {
        if !self.accepts_arity(args.len()) {
            return None;
        }
        let mut plan = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let param = self.param_at(i)?;
            if param.accepts(arg) {
                plan.push(None);
            } else {
                plan.push(Some(param.conversion_for(arg)?));
            }
        }
        Some(
            args.iter()
                .zip(plan)
                .map(|(arg, conversion)| match conversion {
                    Some(c) => (c.convert)(arg),
                    None => Ok(arg.clone()),
                })
                .collect(),
        )
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.params.iter().map(Param::to_string).collect();
        if let Some(rest) = &self.rest {
            parts.push(format!("...{rest}"));
        }
        f.write_str(&parts.join(", "))
    }
}

/// A function with multiple typed signatures.
#[derive(Clone)]
pub struct TypedFunction {
    name: String,
    signatures: Vec<Signature>,
}

impl fmt::Debug for TypedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signatures: Vec<String> = self.signatures.iter().map(Signature::to_string).collect();
        f.debug_struct("TypedFunction")
            .field("name", &self.name)
            .field("signatures", &signatures)
            .finish()
    }
}

impl TypedFunction {
    pub fn new(name: impl Into<String>) -> Self {
        TypedFunction {
            name: name.into(),
            signatures: Vec::new(),
        }
    }

    #[must_use]
    pub fn signature(
        mut self,
        params: Vec<Param>,
        handler: impl Fn(&TypedFunction, &[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.signatures.push(Signature {
            params,
            rest: None,
            handler: Rc::new(handler),
        });
        self
    }

    /// Signature whose last parameter repeats.
    #[must_use]
    pub fn variadic(
        mut self,
        params: Vec<Param>,
        rest: Param,
        handler: impl Fn(&TypedFunction, &[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.signatures.push(Signature {
            params,
            rest: Some(rest),
            handler: Rc::new(handler),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signatures(&self) -> impl Iterator<Item = String> + '_ {
        self.signatures.iter().map(Signature::to_string)
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        if let Some(sig) = self.signatures.iter().find(|s| s.matches_exact(args)) {
            return (sig.handler)(self, args);
        }
        for sig in &self.signatures {
            if let Some(converted) = sig.convert_args(args) {
                return (sig.handler)(self, &converted?);
            }
        }
        Err(self.mismatch(args))
    }

    fn mismatch(&self, args: &[Value]) -> EvalError {
        let mut candidates: Vec<&Signature> = self.signatures.iter().collect();
        for (i, arg) in args.iter().enumerate() {
            let next: Vec<&Signature> = candidates
                .iter()
                .copied()
                .filter(|s| s.param_at(i).is_some_and(|p| p.accepts_loosely(arg)))
                .collect();
            if next.is_empty() {
                let expected = expected_at(&candidates, i);
                if expected.is_empty() {
                    let max = candidates.iter().map(|s| s.params.len()).max().unwrap_or(0);
                    return EvalError::Type(format!(
                        "Too many arguments in function {} (expected: {}, actual: {})",
                        self.name,
                        max,
                        args.len()
                    ));
                }
                return EvalError::Type(format!(
                    "Unexpected type of argument in function {} (expected: {}, actual: {}, index: {})",
                    self.name,
                    expected,
                    arg.type_name(),
                    i
                ));
            }
            candidates = next;
        }
        EvalError::Type(format!(
            "Too few arguments in function {} (expected: {}, index: {})",
            self.name,
            expected_at(&candidates, args.len()),
            args.len()
        ))
    }
}

fn expected_at(candidates: &[&Signature], i: usize) -> String {
    let mut expected: Vec<String> = Vec::new();
    for sig in candidates {
        if let Some(p) = sig.param_at(i) {
            let text = p.to_string();
            if !expected.contains(&text) {
                expected.push(text);
            }
        }
    }
    expected.join(" | ")
}
