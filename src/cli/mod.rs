//! CLI support for graphcalc
//!
//! Provides programmatic access to the graphcalc command line operations so
//! they can be embedded in other tools.

mod check;
mod convert;
mod render;

pub use check::{CheckOptions, CheckResult, execute_check, scope_from_json};
pub use convert::{errors_to_json, json_to_value, value_to_json};
pub use render::{OutputFormat, RenderCommand, execute_render};

use std::io;

use crate::error::{CalcError, EvalError, ParseError};

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Lexical or syntax errors, in source order
    Parse(Vec<ParseError>),
    /// Evaluation error
    Eval(EvalError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// No expression provided
    NoInput,
    /// Scope JSON was not an object
    InvalidScope(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Parse(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}: {}", e.kind, e)?;
                }
                Ok(())
            }
            CliError::Eval(e) => write!(f, "{}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(f, "No expression provided. Pass one as an argument or pipe it to stdin."),
            CliError::InvalidScope(found) => {
                write!(f, "Scope must be a JSON object, got {}", found)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Parse(errors) => errors.first().map(|e| e as &(dyn std::error::Error + 'static)),
            CliError::Eval(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CalcError> for CliError {
    fn from(e: CalcError) -> Self {
        match e {
            CalcError::Parse(errors) => CliError::Parse(errors),
            CalcError::Eval(e) => CliError::Eval(e),
        }
    }
}

impl From<EvalError> for CliError {
    fn from(e: EvalError) -> Self {
        CliError::Eval(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
