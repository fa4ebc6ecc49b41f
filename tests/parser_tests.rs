// tests/parser_tests.rs

use graphcalc::ast::{Node, OperatorFn, ValueType};
use graphcalc::error::ErrorKind;
use graphcalc::lexer::Lexer;
use graphcalc::parser::{Parser, parse, parse_all};

fn parse_ok(input: &str) -> Node {
    let parsed = parse(input);
    assert!(parsed.is_ok(), "unexpected errors for {input:?}: {:?}", parsed.errors);
    parsed.node
}

fn operator(node: &Node) -> (OperatorFn, Vec<Node>) {
    match node {
        Node::Operator(op) => (op.func, op.args.iter().map(|a| (**a).clone()).collect()),
        other => panic!("expected operator, got {}", other.type_name()),
    }
}

// ============================================================================
// Precedence and Associativity
// ============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let (func, args) = operator(&parse_ok("2 + 3 * 4"));
    assert_eq!(func, OperatorFn::Add);
    assert!(matches!(args[0], Node::Constant(_)));
    assert_eq!(operator(&args[1]).0, OperatorFn::Multiply);
}

#[test]
fn test_power_is_right_associative() {
    let (func, args) = operator(&parse_ok("2^3^2"));
    assert_eq!(func, OperatorFn::Pow);
    assert!(matches!(args[0], Node::Constant(_)));
    assert_eq!(operator(&args[1]).0, OperatorFn::Pow);
}

#[test]
fn test_unary_minus_applies_after_power() {
    let (func, args) = operator(&parse_ok("-2^2"));
    assert_eq!(func, OperatorFn::UnaryMinus);
    assert_eq!(operator(&args[0]).0, OperatorFn::Pow);
}

#[test]
fn test_subtraction_is_left_associative() {
    let (func, args) = operator(&parse_ok("1 - 2 - 3"));
    assert_eq!(func, OperatorFn::Subtract);
    assert_eq!(operator(&args[0]).0, OperatorFn::Subtract);
    assert!(matches!(args[1], Node::Constant(_)));
}

#[test]
fn test_logical_below_relational() {
    let (func, args) = operator(&parse_ok("a < 1 and b >= 2"));
    assert_eq!(func, OperatorFn::And);
    assert_eq!(operator(&args[0]).0, OperatorFn::Smaller);
    assert_eq!(operator(&args[1]).0, OperatorFn::LargerEq);
}

#[test]
fn test_postfix_operators() {
    assert_eq!(operator(&parse_ok("5!")).0, OperatorFn::Factorial);
    assert_eq!(operator(&parse_ok("A'")).0, OperatorFn::Transpose);
}

// ============================================================================
// Implicit Multiplication
// ============================================================================

#[test]
fn test_implicit_multiplication_forms() {
    for input in ["2x", "2 (a + b)", "x y", "(a)(b)"] {
        match parse_ok(input) {
            Node::Operator(op) => {
                assert_eq!(op.func, OperatorFn::Multiply, "{input}");
                assert!(op.implicit, "{input}");
            }
            other => panic!("{input} parsed as {}", other.type_name()),
        }
    }
}

#[test]
fn test_explicit_multiplication_is_not_implicit() {
    match parse_ok("2 * x") {
        Node::Operator(op) => assert!(!op.implicit),
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_implicit_multiplication_after_constant_and_group() {
    for input in ["2 in", "3! 2", "(1 + 2)3"] {
        match parse_ok(input) {
            Node::Operator(op) => {
                assert_eq!(op.func, OperatorFn::Multiply, "{input}");
                assert!(op.implicit, "{input}");
            }
            other => panic!("{input} parsed as {}", other.type_name()),
        }
    }
    let (_, args) = operator(&parse_ok("3! 2"));
    assert_eq!(operator(&args[0]).0, OperatorFn::Factorial);
}

#[test]
fn test_no_implicit_multiplication_after_operator_or_symbol() {
    for input in ["x in", "x' 2", "-x 2"] {
        let parsed = parse(input);
        assert_eq!(parsed.errors.len(), 1, "{input}: {:?}", parsed.errors);
        assert_eq!(parsed.errors[0].kind, ErrorKind::Syntax, "{input}");
    }
}

#[test]
fn test_adjacent_numbers_are_an_error() {
    let parsed = parse("2 3");
    assert_eq!(parsed.errors.len(), 1);
    assert_eq!(parsed.errors[0].kind, ErrorKind::Syntax);
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_function_assignment() {
    match parse_ok("f(x, y) = x + y") {
        Node::FunctionAssignment(f) => {
            assert_eq!(f.name(), "f");
            assert_eq!(f.params, vec!["x".to_string(), "y".to_string()]);
            assert_eq!(operator(&f.expr).0, OperatorFn::Add);
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_nested_accessor_assignment() {
    match parse_ok("a.b[1] = 3") {
        Node::Assignment(a) => {
            assert!(matches!(a.object().as_ref(), Node::Accessor(acc) if acc.name() == "b"));
            assert!(a.index().is_some());
            assert_eq!(a.name(), "");
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_cannot_assign_reserved_keyword() {
    let parsed = parse("end = 3");
    assert!(!parsed.is_ok());
    assert!(parsed.errors[0].message.contains("reserved keyword"));
}

#[test]
fn test_invalid_assignment_target() {
    let parsed = parse("2 = 3");
    assert_eq!(parsed.errors.len(), 1);
    assert_eq!(
        parsed.errors[0].message,
        "Invalid left hand side of assignment operator \"=\""
    );
}

// ============================================================================
// Literals and Containers
// ============================================================================

#[test]
fn test_matrix_rows() {
    match parse_ok("[1, 2; 3, 4]") {
        Node::Array(a) => {
            assert_eq!(a.items.len(), 2);
            assert!(a.items.iter().all(|row| matches!(row.as_ref(), Node::Array(r) if r.items.len() == 2)));
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_ragged_matrix_reported() {
    let parsed = parse("[1, 2; 3]");
    assert!(parsed.errors[0].message.starts_with("Column dimensions mismatch"));
}

#[test]
fn test_object_keys() {
    match parse_ok(r#"{a: 1, "b c": 2}"#) {
        Node::Object(o) => {
            let keys: Vec<&str> = o.properties.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(keys, vec!["a", "b c"]);
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_string_constant() {
    match parse_ok(r#""hi\tthere""#) {
        Node::Constant(c) => {
            assert_eq!(c.value_type(), ValueType::String);
            assert_eq!(c.value(), "hi\tthere");
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_operator_continues_on_next_line() {
    assert_eq!(operator(&parse_ok("1 +\n2")).0, OperatorFn::Add);
    assert_eq!(operator(&parse_ok("a and\n\nb")).0, OperatorFn::And);
    assert_eq!(operator(&parse_ok("-\nx")).0, OperatorFn::UnaryMinus);
    assert!(matches!(parse_ok("c ?\n1 :\n2"), Node::Conditional(_)));

    match parse_ok("x = 1 *\n 3") {
        Node::Assignment(a) => assert_eq!(operator(a.value()).0, OperatorFn::Multiply),
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_newline_without_operator_separates_statements() {
    assert!(matches!(parse_ok("1\n+2"), Node::Block(ref b) if b.blocks.len() == 2));
}

#[test]
fn test_open_range_in_index() {
    match parse_ok("a[:, 1]") {
        Node::Accessor(a) => {
            let dims = &a.index().dimensions;
            assert_eq!(dims.len(), 2);
            match dims[0].as_ref() {
                Node::Range(r) => {
                    assert!(matches!(r.start.as_ref(), Node::Constant(c) if c.value() == "1"));
                    assert!(r.end.is_symbol("end"));
                }
                other => panic!("unexpected {}", other.type_name()),
            }
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_stepped_range() {
    match parse_ok("1:2:9") {
        Node::Range(r) => assert!(r.step.is_some()),
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_conditional() {
    match parse_ok("a > 0 ? a : -a") {
        Node::Conditional(c) => {
            assert_eq!(operator(&c.condition).0, OperatorFn::Larger);
            assert_eq!(operator(&c.false_expr).0, OperatorFn::UnaryMinus);
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_property_then_call() {
    match parse_ok("obj.f(1)") {
        Node::Function(f) => {
            assert!(matches!(f.callee.as_ref(), Node::Accessor(_)));
            assert_eq!(f.args.len(), 1);
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

// ============================================================================
// Blocks
// ============================================================================

#[test]
fn test_block_visibility() {
    match parse_ok("a = 1; b = 2\nb") {
        Node::Block(b) => {
            let visible: Vec<bool> = b.blocks.iter().map(|e| e.visible).collect();
            assert_eq!(visible, vec![false, true, true]);
        }
        other => panic!("unexpected {}", other.type_name()),
    }
}

#[test]
fn test_empty_input() {
    assert!(matches!(parse_ok(""), Node::Constant(c) if c.value_type() == ValueType::Undefined));
}

// ============================================================================
// Error Recovery
// ============================================================================

#[test]
fn test_unexpected_end_offset() {
    let parsed = parse("1 + ");
    assert_eq!(parsed.errors.len(), 1);
    assert_eq!(parsed.errors[0].message, "Unexpected end of expression");
    assert_eq!(parsed.errors[0].offset, 4);
}

#[test]
fn test_missing_close_parenthesis() {
    let parsed = parse("(1 + 2");
    assert_eq!(parsed.errors[0].message, "Parenthesis ) expected");
}

#[test]
fn test_errors_sorted_by_offset() {
    let parsed = parse("1 + # 2");
    assert!(parsed.errors.windows(2).all(|w| w[0].offset <= w[1].offset));
    assert_eq!(parsed.errors[0].kind, ErrorKind::Lexical);
}

#[test]
fn test_nesting_limit() {
    let input = "(".repeat(40) + "1" + &")".repeat(40);
    let parsed = Parser::new(Lexer::new(&input)).with_max_depth(16).parse();
    assert!(parsed.errors.iter().any(|e| e.kind == ErrorKind::Limit));
    assert!(parse(&input).is_ok());
}

#[test]
fn test_parse_all_is_independent() {
    let results = parse_all(&["1 +", "2 * 3"]);
    assert!(!results[0].is_ok());
    assert!(results[1].is_ok());
}
