// tests/eval_tests.rs

use graphcalc::error::{CalcError, ErrorKind};
use graphcalc::{Config, Evaluator, NumberMode, Scope, Value, evaluate, parse};
use rust_decimal::Decimal;

fn eval(input: &str) -> Value {
    let mut scope = Scope::new();
    evaluate(input, &mut scope).unwrap_or_else(|e| panic!("{input:?} failed: {e}"))
}

fn eval_err(input: &str) -> CalcError {
    let mut scope = Scope::new();
    match evaluate(input, &mut scope) {
        Ok(value) => panic!("{input:?} unexpectedly evaluated to {value}"),
        Err(e) => e,
    }
}

fn num(n: f64) -> Value {
    Value::Number(n)
}

fn nums(ns: &[f64]) -> Value {
    Value::Array(ns.iter().copied().map(Value::Number).collect())
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_operator_precedence() {
    assert_eq!(eval("2 + 3 * 4"), num(14.0));
    assert_eq!(eval("(2 + 3) * 4"), num(20.0));
    assert_eq!(eval("2^3^2"), num(512.0));
    assert_eq!(eval("-2^2"), num(-4.0));
}

#[test]
fn test_modulo_follows_divisor_sign() {
    assert_eq!(eval("-7 % 3"), num(2.0));
    assert_eq!(eval("7 mod 3"), num(1.0));
}

#[test]
fn test_builtin_functions() {
    assert_eq!(eval("5!"), num(120.0));
    assert_eq!(eval("sqrt(16)"), num(4.0));
    assert_eq!(eval("abs(-3)"), num(3.0));
}

#[test]
fn test_relational_and_logical() {
    assert_eq!(eval("1 < 2"), Value::Boolean(true));
    assert_eq!(eval("1 == 1 and 2 > 3"), Value::Boolean(false));
    assert_eq!(eval("true ? 1 : 2"), num(1.0));
}

#[test]
fn test_bignumber_mode() {
    let evaluator = Evaluator::with_config(Config::default().with_number(NumberMode::BigNumber));
    let mut scope = Scope::new();
    let value = evaluator.evaluate("0.1 + 0.2", &mut scope).unwrap();
    assert_eq!(value, Value::BigNumber("0.3".parse::<Decimal>().unwrap()));
}

#[test]
fn test_typeof() {
    assert_eq!(eval("typeof([1])"), Value::from("Array"));
    assert_eq!(eval("typeof(1)"), Value::from("number"));
}

// ============================================================================
// Scope and Assignment
// ============================================================================

#[test]
fn test_block_returns_visible_results() {
    assert_eq!(eval("a = 3; a * 2"), Value::ResultSet(vec![num(6.0)]));
    assert_eq!(eval("a = 3\na * 2"), Value::ResultSet(vec![num(3.0), num(6.0)]));
}

#[test]
fn test_assignment_writes_scope() {
    let mut scope = Scope::new();
    assert_eq!(evaluate("x = 4", &mut scope).unwrap(), num(4.0));
    assert_eq!(scope.get("x"), Some(&num(4.0)));
    assert_eq!(evaluate("2x", &mut scope).unwrap(), num(8.0));
}

#[test]
fn test_function_assignment() {
    assert_eq!(eval("f(x) = x^2; f(3)"), Value::ResultSet(vec![num(9.0)]));
}

#[test]
fn test_function_closes_over_outer_parameter() {
    let value = eval("outer(a) = (inner(b) = a + b); add2 = outer(2); add2(5)");
    assert_eq!(value, Value::ResultSet(vec![num(7.0)]));
}

#[test]
fn test_evaluate_all_shares_scope() {
    let evaluator = Evaluator::new();
    let mut scope = Scope::new();
    let results = evaluator.evaluate_all(&["a = 2", "b = a + 1", "a * b"], &mut scope);
    let values: Vec<Value> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(values, vec![num(2.0), num(3.0), num(6.0)]);
}

#[test]
fn test_compiled_expression_is_reusable() {
    let evaluator = Evaluator::new();
    let node = parse("x + 1").into_result().unwrap();
    let compiled = evaluator.compile(&node).unwrap();

    let mut first: Scope = [("x".to_string(), num(1.0))].into_iter().collect();
    let mut second: Scope = [("x".to_string(), num(10.0))].into_iter().collect();
    assert_eq!(compiled.evaluate(&mut first).unwrap(), num(2.0));
    assert_eq!(compiled.evaluate(&mut second).unwrap(), num(11.0));
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn test_matrix_vector_product() {
    assert_eq!(eval("[1, 2; 3, 4] * [5, 6]"), nums(&[17.0, 39.0]));
}

#[test]
fn test_size() {
    assert_eq!(eval("size([1, 2; 3, 4])").flatten(), vec![num(2.0), num(2.0)]);
}

#[test]
fn test_ranges_exclude_end() {
    assert_eq!(eval("0:3"), nums(&[0.0, 1.0, 2.0]));
    assert_eq!(eval("1:2:6"), nums(&[1.0, 3.0, 5.0]));
}

#[test]
fn test_index_with_end() {
    assert_eq!(eval("[10, 20, 30][end - 1]"), num(30.0));
    assert_eq!(eval("[10, 20, 30][1:end]"), nums(&[20.0, 30.0]));
}

#[test]
fn test_open_range_starts_at_one() {
    let mut scope: Scope = [("a".to_string(), nums(&[10.0, 20.0, 30.0]))].into_iter().collect();
    assert_eq!(evaluate("a[:2]", &mut scope).unwrap(), nums(&[20.0]));
    assert_eq!(evaluate("a[:]", &mut scope).unwrap(), nums(&[20.0, 30.0]));
}

#[test]
fn test_indexed_assignment() {
    assert_eq!(
        eval("A = [1, 2, 3]; A[1] = 10; A"),
        Value::ResultSet(vec![nums(&[1.0, 10.0, 3.0])])
    );
}

#[test]
fn test_indexed_assignment_grows_with_zeros() {
    assert_eq!(
        eval("v = [1]; v[3] = 4; v"),
        Value::ResultSet(vec![nums(&[1.0, 0.0, 0.0, 4.0])])
    );
}

#[test]
fn test_out_of_range_index() {
    let err = eval_err("[1, 2][5]");
    assert!(matches!(err, CalcError::Eval(ref e) if e.kind() == ErrorKind::Dimension));
}

// ============================================================================
// Objects and Property Safety
// ============================================================================

#[test]
fn test_object_properties() {
    assert_eq!(eval("obj = {a: 1}; obj.a + 1"), Value::ResultSet(vec![num(2.0)]));
    assert_eq!(eval("obj = {a: 1}; obj.b"), Value::ResultSet(vec![Value::Undefined]));
}

#[test]
fn test_nested_property_assignment() {
    assert_eq!(
        eval("o = {a: {b: 1}}; o.a.b = 5; o.a.b"),
        Value::ResultSet(vec![num(5.0)])
    );
}

#[test]
fn test_blocked_property() {
    let err = eval_err("obj = {a: 1}; obj.constructor");
    assert_eq!(err.to_string(), "ReferenceError: No access to property \"constructor\"");
}

#[test]
fn test_blocked_method() {
    let err = eval_err("obj = {a: 1}; obj.bind()");
    assert_eq!(err.to_string(), "ReferenceError: No access to method \"bind\"");
}

#[test]
fn test_whitelisted_native_method() {
    assert_eq!(eval("(5).valueOf()"), num(5.0));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_undefined_symbol() {
    assert_eq!(eval_err("foo + 1").to_string(), "ReferenceError: Undefined symbol foo");
}

#[test]
fn test_undefined_function() {
    assert_eq!(eval_err("foo(1)").to_string(), "ReferenceError: Undefined function foo");
}

#[test]
fn test_wrong_argument_count() {
    assert_eq!(
        eval_err("g(x) = x; g(1, 2)").to_string(),
        "TypeError: Wrong number of arguments in function g (2 provided, 1 expected)"
    );
}

#[test]
fn test_parse_errors_prevent_evaluation() {
    let mut scope = Scope::new();
    let err = evaluate("a = 1 +", &mut scope).unwrap_err();
    assert!(matches!(err, CalcError::Parse(ref errors) if errors.len() == 1));
    assert!(scope.get("a").is_none());
}

#[test]
fn test_recursion_limit() {
    let evaluator = Evaluator::with_config(Config::default().with_max_call_depth(16));
    let mut scope = Scope::new();
    let err = evaluator.evaluate("f(n) = f(n + 1); f(0)", &mut scope).unwrap_err();
    assert!(matches!(err, CalcError::Eval(ref e) if e.kind() == ErrorKind::Limit));
}
