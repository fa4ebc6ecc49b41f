//! # graphcalc
//!
//! A mathematical expression engine: a tokenizer and recursive-descent parser
//! producing an immutable expression tree, text/HTML/LaTeX renderers for that
//! tree, and a compiler that turns it into a chain of closures evaluated
//! against a mutable scope.
//!
//! ```
//! use graphcalc::{Scope, Value};
//!
//! let mut scope = Scope::new();
//! scope.set("a", Value::Number(5.0));
//! assert_eq!(graphcalc::evaluate("2a + 1", &mut scope).unwrap(), Value::Number(11.0));
//!
//! graphcalc::evaluate("f(x) = x^2", &mut scope).unwrap();
//! assert_eq!(graphcalc::evaluate("f(3)", &mut scope).unwrap(), Value::Number(9.0));
//! ```

pub mod ast;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod latex;
pub mod lexer;
pub mod matrix;
pub mod namespace;
pub mod output;
pub mod parser;
pub mod pretty;
pub mod render;
pub mod safety;
pub mod typed;
pub mod units;
pub mod value;

pub use ast::{Node, NodeRef, OperatorFn, Token, TokenKind};
pub use compiler::{Compiled, Evaluator, Function, Scope};
pub use config::{Config, NumberMode};
pub use error::{CalcError, ErrorKind, EvalError, NodeError, ParseError};
pub use lexer::Lexer;
pub use matrix::{DenseMatrix, Matrix, MatrixValue, SparseMatrix};
pub use namespace::Namespace;
pub use parser::{Parsed, Parser, parse};
pub use render::{ImplicitMode, ParenthesisMode, RenderOptions, to_html, to_latex, to_text};
pub use value::Value;

/// Parse and evaluate `input` with the standard namespace and default
/// configuration.
pub fn evaluate(input: &str, scope: &mut Scope) -> Result<Value, CalcError> {
    Evaluator::new().evaluate(input, scope)
}
