//! Builtin functions and constants available to every expression.
//!
//! A [`Namespace`] is an immutable table built once with
//! [`NamespaceBuilder`] and shared by reference with the compiler. The
//! standard table holds every operator function, the math and matrix
//! functions, the conversion functions, the lazy builtins (`quote`, `defined`,
//! `eval`) and the numeric constants.

pub mod arithmetic;
pub mod collections;
pub mod logical;

use std::collections::HashMap;
use std::rc::Rc;

use crate::compiler::{self, Function, RawFunction};
use crate::typed::TypedFunction;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: HashMap<String, Value>,
}

impl Namespace {
    pub fn builder() -> NamespaceBuilder {
        NamespaceBuilder::default()
    }

    /// Every builtin this crate ships.
    pub fn standard() -> Namespace {
        let add = arithmetic::add();
        let multiply = arithmetic::multiply(add.clone());

        let mut builder = Namespace::builder()
            .function(arithmetic::subtract())
            .function(arithmetic::dot_multiply())
            .function(arithmetic::divide())
            .function(arithmetic::dot_divide())
            .function(arithmetic::modulo())
            .function(arithmetic::pow(multiply.clone()))
            .function(arithmetic::dot_pow())
            .function(arithmetic::unary_minus())
            .function(arithmetic::unary_plus())
            .function(arithmetic::factorial())
            .function(arithmetic::min())
            .function(arithmetic::max())
            .function(arithmetic::sum(add.clone()))
            .function(add)
            .function(multiply);

        for f in arithmetic::math_functions()
            .into_iter()
            .chain(logical::relational_functions())
            .chain(logical::logical_functions())
            .chain(logical::bitwise_functions())
            .chain(collections::collection_functions())
        {
            builder = builder.function(f);
        }
        for raw in compiler::raw_builtins() {
            builder = builder.raw(raw);
        }

        builder
            .constant("true", Value::Boolean(true))
            .constant("false", Value::Boolean(false))
            .constant("null", Value::Null)
            .constant("undefined", Value::Undefined)
            .constant("Infinity", Value::Number(f64::INFINITY))
            .constant("NaN", Value::Number(f64::NAN))
            .constant("pi", Value::Number(std::f64::consts::PI))
            .constant("e", Value::Number(std::f64::consts::E))
            .constant("tau", Value::Number(std::f64::consts::TAU))
            .constant("phi", Value::Number(1.618_033_988_749_895))
            .build()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn function(&self, name: &str) -> Option<&Rc<Function>> {
        match self.entries.get(name) {
            Some(Value::Function(f)) => Some(f),
            _ => None,
        }
    }

    /// Whether `name` is a builtin that receives unevaluated arguments.
    pub fn is_raw(&self, name: &str) -> bool {
        self.function(name).is_some_and(|f| f.is_raw())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct NamespaceBuilder {
    entries: HashMap<String, Value>,
}

impl NamespaceBuilder {
    #[must_use]
    pub fn function(mut self, f: TypedFunction) -> Self {
        self.entries
            .insert(f.name().to_string(), Value::Function(Rc::new(Function::Typed(f))));
        self
    }

    #[must_use]
    pub fn raw(mut self, f: RawFunction) -> Self {
        self.entries
            .insert(f.name.clone(), Value::Function(Rc::new(Function::Raw(f))));
        self
    }

    #[must_use]
    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.entries.insert(name.into(), value);
        self
    }

    pub fn build(self) -> Namespace {
        log::debug!("namespace built with {} entries", self.entries.len());
        Namespace {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_has_every_operator_function() {
        let ns = Namespace::standard();
        for op in crate::ast::OperatorFn::ALL {
            assert!(ns.function(op.name()).is_some(), "missing {}", op.name());
        }
    }

    #[test]
    fn test_raw_builtins_are_flagged() {
        let ns = Namespace::standard();
        assert!(ns.is_raw("quote"));
        assert!(!ns.is_raw("sqrt"));
    }

    #[test]
    fn test_constants() {
        let ns = Namespace::standard();
        assert_eq!(ns.get("pi"), Some(&Value::Number(std::f64::consts::PI)));
        assert_eq!(ns.get("null"), Some(&Value::Null));
    }
}
