//! Error taxonomy shared by the lexer, parser, compiler and evaluator.
//!
//! Lexical and syntax problems are *accumulated* while parsing and handed back
//! next to the (possibly partial) AST. Everything that goes wrong while a
//! compiled expression runs is returned as an [`EvalError`] and aborts the run.

use std::fmt;

use thiserror::Error;

/// The closed set of error kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed numeric literal, unterminated string, unclassifiable character
    Lexical,
    /// Unexpected token, unbalanced brackets, invalid assignment target
    Syntax,
    /// Undefined symbol, reserved keyword in scope, unsafe property or method
    Reference,
    /// No signature or implicit conversion accepts the arguments
    Type,
    /// Index out of bounds or dimension mismatch
    Dimension,
    /// Parse nesting or call depth exceeded the configured limit
    Limit,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "LexicalError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Dimension => "DimensionError",
            ErrorKind::Limit => "LimitError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexical or syntax problem found while parsing, with the character offset
/// at which it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (char {offset})")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    #[must_use]
    pub fn lexical(message: impl Into<String>, offset: usize) -> Self {
        ParseError {
            kind: ErrorKind::Lexical,
            message: message.into(),
            offset,
        }
    }

    #[must_use]
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        ParseError {
            kind: ErrorKind::Syntax,
            message: message.into(),
            offset,
        }
    }

    #[must_use]
    pub fn limit(message: impl Into<String>, offset: usize) -> Self {
        ParseError {
            kind: ErrorKind::Limit,
            message: message.into(),
            offset,
        }
    }
}

/// Rejected attempt to build an AST node that would break a node invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("Unsupported type of value \"{0}\"")]
    UnsupportedValueType(String),

    #[error("Invalid numeric value \"{0}\"")]
    InvalidNumber(String),

    #[error("Dot notation requires a single string constant dimension")]
    InvalidDotNotation,

    #[error("Cannot assign to symbol \"{0}\": it is a reserved keyword")]
    ReservedKeyword(String),

    #[error("Index node expected as child \"{0}\"")]
    IndexExpected(String),

    #[error("Symbol or accessor expected as assignment target")]
    InvalidAssignmentTarget,
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NodeError::UnsupportedValueType(_) | NodeError::IndexExpected(_) => ErrorKind::Type,
            _ => ErrorKind::Syntax,
        }
    }
}

/// Errors raised while evaluating a compiled expression. The first one aborts
/// the evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("ReferenceError: {0}")]
    Reference(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("DimensionError: {0}")]
    Dimension(String),

    #[error("SyntaxError: {0}")]
    Syntax(String),

    #[error("LimitError: maximum call depth of {0} exceeded")]
    Limit(usize),
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Reference(_) => ErrorKind::Reference,
            EvalError::Type(_) => ErrorKind::Type,
            EvalError::Dimension(_) => ErrorKind::Dimension,
            EvalError::Syntax(_) => ErrorKind::Syntax,
            EvalError::Limit(_) => ErrorKind::Limit,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            EvalError::Reference(m)
            | EvalError::Type(m)
            | EvalError::Dimension(m)
            | EvalError::Syntax(m) => m.clone(),
            EvalError::Limit(depth) => format!("maximum call depth of {depth} exceeded"),
        }
    }

    pub(crate) fn undefined_symbol(name: &str) -> Self {
        EvalError::Reference(format!("Undefined symbol {name}"))
    }

    pub(crate) fn index_out_of_range(index: usize, size: usize) -> Self {
        let max = size as i64 - 1;
        EvalError::Dimension(format!("Index out of range ({index} > {max})"))
    }

    pub(crate) fn dimension_mismatch(actual: impl fmt::Debug, expected: impl fmt::Debug) -> Self {
        EvalError::Dimension(format!("Dimension mismatch ({actual:?} != {expected:?})"))
    }
}

impl From<NodeError> for EvalError {
    fn from(e: NodeError) -> Self {
        match e.kind() {
            ErrorKind::Type => EvalError::Type(e.to_string()),
            _ => EvalError::Syntax(e.to_string()),
        }
    }
}

/// Error returned by the string-in, value-out convenience entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{}", join_parse_errors(.0))]
    Parse(Vec<ParseError>),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl CalcError {
    /// Kind of the first reported problem.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::Parse(errors) => errors.first().map_or(ErrorKind::Syntax, |e| e.kind),
            CalcError::Eval(e) => e.kind(),
        }
    }
}

fn join_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.kind, e))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_offset() {
        let err = ParseError::syntax("Value expected", 4);
        assert_eq!(err.to_string(), "Value expected (char 4)");
    }

    #[test]
    fn test_node_error_maps_to_eval_kind() {
        let err: EvalError = NodeError::InvalidNumber("1.2.3".into()).into();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        let err: EvalError = NodeError::UnsupportedValueType("date".into()).into();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_calc_error_kind_uses_first_parse_error() {
        let err = CalcError::Parse(vec![
            ParseError::lexical("Digit expected, got \"x\"", 2),
            ParseError::syntax("Value expected", 3),
        ]);
        assert_eq!(err.kind(), ErrorKind::Lexical);
    }
}
