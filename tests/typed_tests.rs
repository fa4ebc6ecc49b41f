// tests/typed_tests.rs

use graphcalc::typed::{Param, TypeTag, TypedFunction, convert};
use graphcalc::{DenseMatrix, MatrixValue, Scope, SparseMatrix, Value, evaluate, params};
use rust_decimal::Decimal;

fn eval(input: &str) -> Value {
    let mut scope = Scope::new();
    evaluate(input, &mut scope).unwrap_or_else(|e| panic!("{input:?} failed: {e}"))
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_classification() {
    assert_eq!(TypeTag::of(&Value::Number(1.0)), TypeTag::Number);
    assert_eq!(TypeTag::of(&Value::from("x")), TypeTag::String);
    assert_eq!(TypeTag::of(&Value::Boolean(false)), TypeTag::Boolean);
    assert_eq!(TypeTag::of(&Value::Null), TypeTag::Null);
    assert_eq!(TypeTag::of(&Value::Undefined), TypeTag::Undefined);
    assert_eq!(TypeTag::of(&Value::Array(vec![])), TypeTag::Array);
}

#[test]
fn test_matrix_variants_classify_as_matrix() {
    let grid = Value::Array(vec![Value::Number(1.0), Value::Number(0.0)]);
    let dense = Value::Matrix(MatrixValue::Dense(DenseMatrix::from_value(&grid).unwrap()));
    let sparse = Value::Matrix(MatrixValue::Sparse(SparseMatrix::from_value(&grid).unwrap()));

    assert_eq!(TypeTag::of(&dense), TypeTag::Matrix);
    assert_eq!(TypeTag::of(&sparse), TypeTag::Matrix);
    assert!(TypeTag::SparseMatrix.test(&sparse));
    assert!(!TypeTag::SparseMatrix.test(&dense));
}

#[test]
fn test_quoted_nodes_classify_by_kind() {
    assert_eq!(eval("typeof(quote(1 + 2))"), Value::from("OperatorNode"));
    assert_eq!(eval("typeof(quote(x))"), Value::from("SymbolNode"));
}

#[test]
fn test_type_names_parse_back() {
    assert_eq!("Matrix".parse::<TypeTag>(), Ok(TypeTag::Matrix));
    assert_eq!("number".parse::<TypeTag>(), Ok(TypeTag::Number));
    assert!("matrix".parse::<TypeTag>().is_err());
}

// ============================================================================
// Conversions
// ============================================================================

#[test]
fn test_number_to_bignumber() {
    let converted = convert(&Value::Number(1.5), TypeTag::BigNumber).unwrap().unwrap();
    assert_eq!(converted, Value::BigNumber("1.5".parse::<Decimal>().unwrap()));
}

#[test]
fn test_number_to_bignumber_rejects_lost_precision() {
    let err = convert(&Value::Number(0.1 + 0.2), TypeTag::BigNumber)
        .unwrap()
        .unwrap_err();
    assert!(
        err.message()
            .starts_with("Cannot implicitly convert a number with >15 significant digits to BigNumber")
    );
}

#[test]
fn test_string_to_number() {
    assert_eq!(
        convert(&Value::from("12.5"), TypeTag::Number).unwrap().unwrap(),
        Value::Number(12.5)
    );
    let err = convert(&Value::from("abc"), TypeTag::Number).unwrap().unwrap_err();
    assert_eq!(err.message(), "Cannot convert \"abc\" to a number");
}

#[test]
fn test_null_and_boolean_to_number() {
    assert_eq!(convert(&Value::Null, TypeTag::Number).unwrap().unwrap(), Value::Number(0.0));
    assert_eq!(
        convert(&Value::Boolean(true), TypeTag::Number).unwrap().unwrap(),
        Value::Number(1.0)
    );
}

#[test]
fn test_no_conversion_available() {
    assert!(convert(&Value::Object(Default::default()), TypeTag::Number).is_none());
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_builtin_dispatch_with_conversion() {
    assert_eq!(eval("sqrt(\"16\")"), Value::Number(4.0));
    assert_eq!(eval("sqrt(true)"), Value::Number(1.0));
    assert_eq!(
        eval("sqrt([4, 9])").flatten(),
        vec![Value::Number(2.0), Value::Number(3.0)]
    );
}

#[test]
fn test_builtin_dispatch_error() {
    let mut scope = Scope::new();
    let err = evaluate("sqrt({a: 1})", &mut scope).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: Unexpected type of argument in function sqrt (expected: number | BigNumber | Array | Matrix, actual: Object, index: 0)"
    );
}

#[test]
fn test_variadic_signature() {
    let count = TypedFunction::new("count").variadic(params![Number], Param::Any, |_, args| {
        Ok(Value::Number(args.len() as f64))
    });
    let args = [Value::Number(1.0), Value::from("a"), Value::Null];
    assert_eq!(count.call(&args).unwrap(), Value::Number(3.0));
    assert_eq!(count.call(&[Value::Number(1.0)]).unwrap(), Value::Number(1.0));

    let err = count.call(&[]).unwrap_err();
    assert!(err.message().starts_with("Too few arguments in function count"));
}

#[test]
fn test_signatures_are_listed_in_order() {
    let f = TypedFunction::new("f")
        .signature(params![Number, String], |_, _| Ok(Value::Null))
        .signature(params![Array | Matrix], |_, _| Ok(Value::Null));
    let listed: Vec<String> = f.signatures().collect();
    assert_eq!(listed, vec!["number, string", "Array | Matrix"]);
}
