// tests/property_tests.rs
//
// End-to-end behaviour that must hold across the parser, the renderers and
// the evaluator together.

use std::rc::Rc;

use graphcalc::ast::{Node, OperatorFn};
use graphcalc::error::{CalcError, ErrorKind};
use graphcalc::{RenderOptions, Scope, Value, evaluate, parse, to_text};

fn parse_ok(input: &str) -> Node {
    let parsed = parse(input);
    assert!(parsed.is_ok(), "unexpected errors for {input:?}: {:?}", parsed.errors);
    parsed.node
}

fn scope_with(name: &str, value: Value) -> Scope {
    [(name.to_string(), value)].into_iter().collect()
}

// ============================================================================
// Text Round-Trip
// ============================================================================

#[test]
fn test_text_round_trip() {
    let inputs = [
        "2 + 3 * 4",
        "(1 + 2) * 3",
        "2x + y",
        "-x ^ 2",
        "5! + A'",
        "not a or b and c",
        "a mod b",
        "[1, 2; 3, 4]",
        r#"{a: 1, "b c": [1, 2]}"#,
        r#""tab\there""#,
        "a[1, end].b",
        "1:2:9",
        "c ? 1 : 2",
        "f(x, y) = x ^ y",
        "v[0] = 3",
        "sqrt(abs(-4))",
        "5 cm to inch",
    ];
    for input in inputs {
        let ast = parse_ok(input);
        let text = to_text(&ast, &RenderOptions::default());
        assert_eq!(parse_ok(&text), ast, "{input:?} rendered as {text:?}");
    }
}

#[test]
fn test_nested_assignment_round_trips_with_parentheses() {
    let ast = parse_ok("a = b = 3");
    let text = to_text(&ast, &RenderOptions::default());
    assert_eq!(text, "a = (b = 3)");

    let (Node::Assignment(original), Node::Assignment(reparsed)) = (&ast, &parse_ok(&text)) else {
        panic!("expected assignments");
    };
    match reparsed.value().as_ref() {
        Node::Parenthesis(p) => assert_eq!(p.content, *original.value()),
        other => panic!("unexpected {}", other.type_name()),
    }

    let mut scope = Scope::new();
    assert_eq!(evaluate(&text, &mut scope).unwrap(), Value::Number(3.0));
    assert_eq!(scope.get("b"), Some(&Value::Number(3.0)));
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_higher_precedence_binds_tighter() {
    let pairs = [
        ("*", "+", OperatorFn::Multiply, OperatorFn::Add),
        ("/", "-", OperatorFn::Divide, OperatorFn::Subtract),
        ("mod", "+", OperatorFn::Mod, OperatorFn::Add),
        ("^", "*", OperatorFn::Pow, OperatorFn::Multiply),
        ("+", "<", OperatorFn::Add, OperatorFn::Smaller),
        ("<<", "==", OperatorFn::LeftShift, OperatorFn::Equal),
        ("==", "and", OperatorFn::Equal, OperatorFn::And),
        ("&", "|", OperatorFn::BitAnd, OperatorFn::BitOr),
        ("and", "xor", OperatorFn::And, OperatorFn::Xor),
        ("xor", "or", OperatorFn::Xor, OperatorFn::Or),
    ];
    for (tight, loose, tight_fn, loose_fn) in pairs {
        let input = format!("a {tight} b {loose} c");
        match parse_ok(&input) {
            Node::Operator(root) => {
                assert_eq!(root.func, loose_fn, "{input}");
                assert!(
                    matches!(root.args[0].as_ref(), Node::Operator(lhs) if lhs.func == tight_fn),
                    "{input}"
                );
            }
            other => panic!("{input} parsed as {}", other.type_name()),
        }
    }
}

// ============================================================================
// Cloning
// ============================================================================

#[test]
fn test_clone_is_shallow_and_renders_the_same() {
    let options = RenderOptions::default();
    for input in ["a + b * c", "f(x) = x ^ 2", "[1, 2][0]", "{a: 1}.a", "x ? y : z"] {
        let node = parse_ok(input);
        let copy = node.clone();
        assert_eq!(to_text(&copy, &options), to_text(&node, &options));

        let mut original = Vec::new();
        node.for_each_child(&mut |child, _| original.push(Rc::clone(child)));
        let mut copied = Vec::new();
        copy.for_each_child(&mut |child, _| copied.push(Rc::clone(child)));
        assert_eq!(original.len(), copied.len());
        assert!(original.iter().zip(&copied).all(|(a, b)| Rc::ptr_eq(a, b)), "{input}");
    }
}

#[test]
fn test_deep_clone_shares_nothing() {
    let node = parse_ok("a + b");
    let copy = node.deep_clone();
    assert_eq!(copy, node);

    let mut original = Vec::new();
    node.for_each_child(&mut |child, _| original.push(Rc::clone(child)));
    let mut copied = Vec::new();
    copy.for_each_child(&mut |child, _| copied.push(Rc::clone(child)));
    assert!(original.iter().zip(&copied).all(|(a, b)| !Rc::ptr_eq(a, b)));
}

// ============================================================================
// Property Safety
// ============================================================================

#[test]
fn test_constructor_is_never_reachable() {
    let targets = [
        Value::Number(1.0),
        Value::from("text"),
        Value::Array(vec![Value::Number(1.0)]),
        Value::Object(Default::default()),
    ];
    for target in targets {
        for input in ["a.constructor", "a.__proto__", "a.constructor = 1", r#"a["constructor"]"#] {
            let mut scope = scope_with("a", target.clone());
            let err = evaluate(input, &mut scope).unwrap_err();
            assert!(
                matches!(err, CalcError::Eval(ref e) if e.kind() == ErrorKind::Reference),
                "{input} on {} gave {err}",
                target.type_name()
            );
        }
    }
}

#[test]
fn test_function_members_are_blocked() {
    for input in ["sqrt.call(1)", "sqrt.apply(1)", "sqrt.bind(1)"] {
        let mut scope = Scope::new();
        let err = evaluate(input, &mut scope).unwrap_err();
        assert!(matches!(err, CalcError::Eval(ref e) if e.kind() == ErrorKind::Reference), "{input}");
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_multiply_binds_tighter_than_add() {
    let mut scope = Scope::new();
    assert_eq!(evaluate("2 + 3 * 4", &mut scope).unwrap(), Value::Number(14.0));
}

#[test]
fn test_implicit_multiplication_with_scope() {
    let mut scope = scope_with("a", Value::Number(5.0));
    assert_eq!(evaluate("2a", &mut scope).unwrap(), Value::Number(10.0));
}

#[test]
fn test_function_defined_then_called() {
    let mut scope = Scope::new();
    evaluate("f(x) = x^2", &mut scope).unwrap();
    assert_eq!(evaluate("f(3)", &mut scope).unwrap(), Value::Number(9.0));
}

#[test]
fn test_ragged_matrix_still_yields_tree() {
    let parsed = parse("[1,2;3]");
    assert_eq!(parsed.errors.len(), 1);
    assert_eq!(parsed.errors[0].kind, ErrorKind::Syntax);
    assert!(matches!(parsed.node, Node::Array(ref a) if a.items.len() == 2));
}

#[test]
fn test_index_range_up_to_end() {
    let list = Value::Array(vec![Value::Number(10.0), Value::Number(20.0), Value::Number(30.0)]);
    let mut scope = scope_with("a", list);
    assert_eq!(
        evaluate("a[1:end]", &mut scope).unwrap(),
        Value::Array(vec![Value::Number(20.0), Value::Number(30.0)])
    );
}
