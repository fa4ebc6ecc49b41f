//! Parse and evaluate expressions against a JSON scope

use super::{CliError, json_to_value, value_to_json};
use crate::{Config, Evaluator, NumberMode, Scope, Value};

/// Options for the eval and check commands
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Expressions evaluated in order against one scope
    pub expressions: Vec<String>,
    /// JSON object whose keys seed the scope
    pub scope: Option<String>,
    pub number: NumberMode,
    /// Override for both the parse nesting and the call depth limits
    pub max_depth: Option<usize>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// One result per expression plus the scope as it was left
    Success {
        results: Vec<serde_json::Value>,
        scope: serde_json::Value,
    },
}

impl CheckOptions {
    fn config(&self) -> Config {
        let config = Config::default().with_number(self.number);
        match self.max_depth {
            Some(depth) => config.with_max_parse_depth(depth).with_max_call_depth(depth),
            None => config,
        }
    }
}

/// Seed a scope from a JSON object
pub fn scope_from_json(json: &str) -> Result<Scope, CliError> {
    match json_to_value(serde_json::from_str(json)?) {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(CliError::InvalidScope(other.type_name().to_string())),
    }
}

/// Execute a check operation.
///
/// Every expression is parsed before any of them runs; the parse errors of
/// all expressions are reported together.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    if options.expressions.is_empty() {
        return Err(CliError::NoInput);
    }
    let evaluator = Evaluator::with_config(options.config());

    let mut nodes = Vec::with_capacity(options.expressions.len());
    let mut errors = Vec::new();
    for expression in &options.expressions {
        match evaluator.parse(expression).into_result() {
            Ok(node) => nodes.push(node),
            Err(mut e) => errors.append(&mut e),
        }
    }
    if !errors.is_empty() {
        return Err(CliError::Parse(errors));
    }

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let mut scope = match &options.scope {
        Some(json) => scope_from_json(json)?,
        None => Scope::new(),
    };
    log::debug!(
        "evaluating {} expressions with {} scope entries",
        nodes.len(),
        scope.len()
    );

    let mut results = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let value = evaluator.evaluate_node(node, &mut scope)?;
        results.push(value_to_json(&value));
    }
    let scope = serde_json::Value::Object(
        scope
            .iter()
            .map(|(k, v)| (k.clone(), value_to_json(v)))
            .collect(),
    );
    Ok(CheckResult::Success { results, scope })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(expressions: &[&str]) -> CheckOptions {
        CheckOptions {
            expressions: expressions.iter().map(|e| e.to_string()).collect(),
            ..CheckOptions::default()
        }
    }

    #[test]
    fn test_evaluates_against_scope() {
        let opts = CheckOptions {
            scope: Some(r#"{"a": 5}"#.to_string()),
            ..options(&["b = 2a"])
        };
        let CheckResult::Success { results, scope } = execute_check(&opts).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(results, vec![json!(10.0)]);
        assert_eq!(scope, json!({"a": 5.0, "b": 10.0}));
    }

    #[test]
    fn test_expressions_share_scope() {
        let CheckResult::Success { results, .. } =
            execute_check(&options(&["f(x) = x^2", "f(3)"])).unwrap()
        else {
            panic!("expected success");
        };
        assert_eq!(results[1], json!(9.0));
    }

    #[test]
    fn test_syntax_only() {
        let opts = CheckOptions {
            syntax_only: true,
            ..options(&["undefined_thing + 1"])
        };
        assert!(matches!(execute_check(&opts).unwrap(), CheckResult::SyntaxValid));
        assert!(matches!(execute_check(&options(&["1 +"])), Err(CliError::Parse(_))));
    }

    #[test]
    fn test_parse_errors_from_every_expression() {
        match execute_check(&options(&["1 +", "2", "(3"])) {
            Err(CliError::Parse(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_requires_an_expression() {
        assert!(matches!(execute_check(&options(&[])), Err(CliError::NoInput)));
    }

    #[test]
    fn test_scope_must_be_object() {
        assert!(matches!(scope_from_json("[1, 2]"), Err(CliError::InvalidScope(_))));
    }
}
