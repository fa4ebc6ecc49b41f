// tests/lexer_tests.rs

use graphcalc::ast::TokenKind;
use graphcalc::error::ErrorKind;
use graphcalc::lexer::Lexer;

fn tokens(input: &str) -> Vec<(TokenKind, String)> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token();
        if token.is_end() {
            return out;
        }
        out.push((token.kind, token.text));
    }
}

fn delim(text: &str) -> (TokenKind, String) {
    (TokenKind::Delimiter, text.to_string())
}

fn sym(text: &str) -> (TokenKind, String) {
    (TokenKind::Symbol, text.to_string())
}

fn num(text: &str) -> (TokenKind, String) {
    (TokenKind::Number, text.to_string())
}

// ============================================================================
// Token Classification
// ============================================================================

#[test]
fn test_mixed_expression() {
    assert_eq!(
        tokens("2 x + sin(y)"),
        vec![num("2"), sym("x"), delim("+"), sym("sin"), delim("("), sym("y"), delim(")")]
    );
}

#[test]
fn test_single_char_delimiters() {
    for input in [",", "(", ")", "[", "]", "{", "}", ";", "+", "-", "*", "/", "%", "^", "~", "!", "&", "|", "'", "=", ":", "?", "<", ">"] {
        assert_eq!(tokens(input), vec![delim(input)], "Failed for input: {}", input);
    }
}

#[test]
fn test_multi_char_delimiters() {
    for input in [".*", "./", ".^", "^|", "==", "!=", "<=", ">=", "<<", ">>", ">>>"] {
        assert_eq!(tokens(input), vec![delim(input)], "Failed for input: {}", input);
    }
}

#[test]
fn test_named_delimiters() {
    assert_eq!(
        tokens("a mod b to c"),
        vec![sym("a"), delim("mod"), sym("b"), delim("to"), sym("c")]
    );
    assert_eq!(tokens("not x"), vec![delim("not"), sym("x")]);
    assert_eq!(tokens("notx"), vec![sym("notx")]);
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_number_forms() {
    assert_eq!(tokens("42"), vec![num("42")]);
    assert_eq!(tokens("3.14"), vec![num("3.14")]);
    assert_eq!(tokens(".5"), vec![num(".5")]);
    assert_eq!(tokens("1.2e-3"), vec![num("1.2e-3")]);
    assert_eq!(tokens("3E+2"), vec![num("3E+2")]);
}

#[test]
fn test_trailing_e_is_a_symbol() {
    assert_eq!(tokens("2e"), vec![num("2"), sym("e")]);
}

#[test]
fn test_incomplete_exponent_reports_digit_expected() {
    let mut lexer = Lexer::new("2e+");
    let token = lexer.next_token();
    assert_eq!(token.text, "2e+");
    let errors = lexer.take_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Lexical);
    assert!(errors[0].message.starts_with("Digit expected"));
}

// ============================================================================
// Whitespace, Newlines and Comments
// ============================================================================

#[test]
fn test_comment_runs_to_end_of_line() {
    assert_eq!(tokens("1 + 2 @ the rest"), vec![num("1"), delim("+"), num("2")]);
    assert_eq!(
        tokens("a @ first\nb"),
        vec![sym("a"), delim("\n"), sym("b")]
    );
}

#[test]
fn test_newline_is_statement_separator() {
    assert_eq!(tokens("a\nb"), vec![sym("a"), delim("\n"), sym("b")]);
    assert_eq!(tokens("a \t\r b"), vec![sym("a"), sym("b")]);
}

// ============================================================================
// Offsets and Errors
// ============================================================================

#[test]
fn test_offsets_count_characters() {
    let mut lexer = Lexer::new("αβ + 1");
    assert_eq!(lexer.next_token().offset, 0);
    assert_eq!(lexer.next_token().offset, 3);
    assert_eq!(lexer.next_token().offset, 5);
}

#[test]
fn test_unknown_character_consumes_rest() {
    let mut lexer = Lexer::new("1 # rest");
    assert_eq!(lexer.next_token().kind, TokenKind::Number);
    let unknown = lexer.next_token();
    assert_eq!(unknown.kind, TokenKind::Unknown);
    assert_eq!(unknown.text, "# rest");
    assert!(lexer.next_token().is_end());

    let errors = lexer.take_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].offset, 2);
}

// ============================================================================
// String Literals
// ============================================================================

#[test]
fn test_string_escapes() {
    let mut lexer = Lexer::new(r#""a\nbé\"""#);
    assert!(lexer.next_token().is("\""));
    let literal = lexer.read_string_literal();
    assert_eq!(literal.kind, TokenKind::String);
    assert_eq!(literal.text, "a\nbé\"");
    assert!(lexer.take_errors().is_empty());
}

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new("\"abc");
    assert!(lexer.next_token().is("\""));
    let literal = lexer.read_string_literal();
    assert_eq!(literal.text, "abc");
    let errors = lexer.take_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "End of string \" expected");
}
