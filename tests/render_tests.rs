// tests/render_tests.rs

use graphcalc::ast::Node;
use graphcalc::parse;
use graphcalc::render::{
    ImplicitMode, ParenthesisMode, RenderOptions, calculate_necessary_parentheses, to_html,
    to_latex, to_text,
};

fn node(input: &str) -> Node {
    let parsed = parse(input);
    assert!(parsed.is_ok(), "unexpected errors for {input:?}: {:?}", parsed.errors);
    parsed.node
}

fn text(input: &str) -> String {
    to_text(&node(input), &RenderOptions::default())
}

fn auto(input: &str) -> String {
    let options = RenderOptions::new().with_parenthesis(ParenthesisMode::Auto);
    to_text(&node(input), &options)
}

fn latex(input: &str) -> String {
    to_latex(&node(input), &RenderOptions::default())
}

// ============================================================================
// Text
// ============================================================================

#[test]
fn test_text_operators() {
    assert_eq!(text("1+2*3"), "1 + 2 * 3");
    assert_eq!(text("-x"), "-x");
    assert_eq!(text("not x"), "not x");
    assert_eq!(text("5!"), "5!");
    assert_eq!(text("a mod b"), "a mod b");
}

#[test]
fn test_text_implicit_multiplication() {
    assert_eq!(text("2x"), "2 x");
    let show = RenderOptions::new().with_implicit(ImplicitMode::Show);
    assert_eq!(to_text(&node("2x"), &show), "2 * x");
}

#[test]
fn test_text_containers() {
    assert_eq!(text("[1,2;3,4]"), "[[1, 2], [3, 4]]");
    assert_eq!(text("{a: 1}"), "{\"a\": 1}");
    assert_eq!(text("a[1, 2]"), "a[1, 2]");
    assert_eq!(text("a.b"), "a.b");
    assert_eq!(text("1:2:9"), "1:2:9");
}

#[test]
fn test_text_strings_are_escaped() {
    assert_eq!(text(r#""say \"hi\"""#), r#""say \"hi\"""#);
}

#[test]
fn test_text_assignments_and_blocks() {
    assert_eq!(text("f(x)=x^2"), "f(x) = x ^ 2");
    assert_eq!(text("a=1;b=2"), "a = 1;\nb = 2");
    assert_eq!(text("a > 0 ? a : -a"), "(a > 0) ? a : -a");
    assert_eq!(text("c ? 1 : 2"), "c ? 1 : 2");
}

#[test]
fn test_display_uses_text() {
    assert_eq!(format!("{}", node("sqrt(x) + 1")), "sqrt(x) + 1");
}

// ============================================================================
// Parentheses
// ============================================================================

#[test]
fn test_auto_parentheses() {
    assert_eq!(auto("(1 * 2) + 3"), "1 * 2 + 3");
    assert_eq!(auto("(1 + 2) * 3"), "(1 + 2) * 3");
    assert_eq!(auto("a - (b + c)"), "a - (b + c)");
    assert_eq!(auto("a + (b + c)"), "a + b + c");
    assert_eq!(auto("(2 ^ 3) ^ 2"), "(2 ^ 3) ^ 2");
    assert_eq!(auto("2 ^ (3 ^ 2)"), "2 ^ 3 ^ 2");
}

#[test]
fn test_auto_keeps_parentheses_of_hidden_implicit_product() {
    assert_eq!(auto("2 (a)"), "2 (a)");
    let show = RenderOptions::new()
        .with_parenthesis(ParenthesisMode::Auto)
        .with_implicit(ImplicitMode::Show);
    assert_eq!(to_text(&node("2 (a)"), &show), "2 * a");
}

#[test]
fn test_necessary_parentheses_vector() {
    let root = node("a * (b + c)");
    let Node::Operator(op) = &root else { panic!("expected operator") };
    let options = RenderOptions::new().with_parenthesis(ParenthesisMode::Auto);
    assert_eq!(
        calculate_necessary_parentheses(&root, &op.args, &options, false),
        vec![false, true]
    );
}

#[test]
fn test_parenthesis_mode_from_str() {
    assert_eq!("auto".parse::<ParenthesisMode>(), Ok(ParenthesisMode::Auto));
    assert!("none".parse::<ParenthesisMode>().is_err());
}

// ============================================================================
// LaTeX
// ============================================================================

#[test]
fn test_latex_operators() {
    assert_eq!(latex("a/b"), r"\frac{a}{b}");
    assert_eq!(latex("x^2"), "{x}^{2}");
    assert_eq!(latex("2*x"), r"2\cdot x");
    assert_eq!(latex("a <= b"), r"a\leq b");
    assert_eq!(latex("2x"), "2~x");
}

#[test]
fn test_latex_functions() {
    assert_eq!(latex("sqrt(x)"), r"\sqrt{x}");
    assert_eq!(latex("f(x, y)"), r"\mathrm{f}\left(x,y\right)");
    assert_eq!(latex("abs(x)"), r"\left|x\right|");
}

#[test]
fn test_latex_symbols_and_units() {
    assert_eq!(latex("alpha_1 + beta"), r"\alpha_{1}+\beta");
    assert_eq!(latex("5 cm"), r"5~\mathrm{cm}");
    assert_eq!(latex("90 deg"), "90~˚");
}

#[test]
fn test_latex_matrix() {
    assert_eq!(latex("[1, 2; 3, 4]"), r"\begin{bmatrix}1&2\\3&4\end{bmatrix}");
}

#[test]
fn test_latex_keeps_source_parentheses() {
    assert_eq!(latex("(a + b) * c"), r"\left(a+b\right)\cdot c");
}

// ============================================================================
// HTML
// ============================================================================

#[test]
fn test_html_binary_operator() {
    assert_eq!(
        to_html(&node("a + 1"), &RenderOptions::default()),
        concat!(
            r#"<span class="math-symbol">a</span>"#,
            r#"<span class="math-operator math-binary-operator math-explicit-binary-operator">+</span>"#,
            r#"<span class="math-number">1</span>"#
        )
    );
}

#[test]
fn test_html_escapes_strings() {
    let out = to_html(&node(r#""<b>""#), &RenderOptions::default());
    assert_eq!(out, r#"<span class="math-string">&quot;&lt;b&gt;&quot;</span>"#);
}

// ============================================================================
// Custom Handlers
// ============================================================================

#[test]
fn test_handler_by_identifier() {
    let options = RenderOptions::new().with_handler("OperatorNode:add", |node, options| {
        let Node::Operator(op) = node else { return None };
        Some(format!(
            "plus({}, {})",
            to_text(&op.args[0], options),
            to_text(&op.args[1], options)
        ))
    });
    assert_eq!(to_text(&node("1 + 2 * 3"), &options), "plus(1, 2 * 3)");
}

#[test]
fn test_handler_can_decline() {
    let options = RenderOptions::new().with_handler("SymbolNode", |node, _| match node {
        Node::Symbol(s) if s.name == "x" => Some("X".to_string()),
        _ => None,
    });
    assert_eq!(to_text(&node("x + y"), &options), "X + y");
}
