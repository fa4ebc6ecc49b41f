//! Compile an expression tree into a chain of closures and run it.
//!
//! Compilation walks the tree once and resolves everything that does not
//! depend on the scope: constants are converted, operator functions are
//! looked up in the namespace and property names are checked. What is left
//! is a tree of [`Eval`] closures that read and write the [`Scope`] passed to
//! [`Compiled::evaluate`].
//!
//! Symbols resolve in this order: parameters of the enclosing user function,
//! the scope, the namespace, and finally the unit table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use rust_decimal::Decimal;

use crate::ast::tokens::RESERVED_KEYWORDS;
use crate::ast::{
    AccessorNode, AssignmentNode, ConstantNode, FunctionAssignmentNode, FunctionNode, IndexNode,
    Node, NodeRef, ObjectNode, OperatorNode, RangeNode, SymbolNode, ValueType,
};
use crate::config::{Config, NumberMode};
use crate::error::{CalcError, EvalError};
use crate::lexer::Lexer;
use crate::matrix::{DenseMatrix, Index, Matrix, Range};
use crate::namespace::Namespace;
use crate::parser::{Parsed, Parser};
use crate::render::{self, RenderOptions};
use crate::safety::{self, Method};
use crate::typed::{self, TypeTag, TypedFunction};
use crate::units::Unit;
use crate::value::Value;

/// Parameter bindings of the user function being evaluated.
pub type Args = HashMap<String, Value>;

type Eval = Rc<dyn Fn(&mut Runtime<'_>, &Args) -> Result<Value, EvalError>>;
type IndexEval = Rc<dyn Fn(&mut Runtime<'_>, &Args, &[usize]) -> Result<Index, EvalError>>;
type Setter = Rc<dyn Fn(&mut Runtime<'_>, &Args, Value) -> Result<(), EvalError>>;

pub type RawHandler = Rc<dyn Fn(&[NodeRef], &mut Runtime<'_>, &Args) -> Result<Value, EvalError>>;

fn eval<F>(f: F) -> Eval
where
    F: Fn(&mut Runtime<'_>, &Args) -> Result<Value, EvalError> + 'static,
{
    Rc::new(f)
}

fn index_eval<F>(f: F) -> IndexEval
where
    F: Fn(&mut Runtime<'_>, &Args, &[usize]) -> Result<Index, EvalError> + 'static,
{
    Rc::new(f)
}

fn setter<F>(f: F) -> Setter
where
    F: Fn(&mut Runtime<'_>, &Args, Value) -> Result<(), EvalError> + 'static,
{
    Rc::new(f)
}

/// Variables visible to an evaluation. Assignments and function definitions
/// write here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    variables: BTreeMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl FromIterator<(String, Value)> for Scope {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Scope {
            variables: iter.into_iter().collect(),
        }
    }
}

/// State of one running evaluation.
pub struct Runtime<'a> {
    scope: &'a mut Scope,
    evaluator: &'a Evaluator,
    depth: usize,
}

impl<'a> Runtime<'a> {
    pub fn scope(&mut self) -> &mut Scope {
        &mut *self.scope
    }

    pub fn evaluator(&self) -> &'a Evaluator {
        self.evaluator
    }

    /// Run `f` one call level deeper, failing once `max_call_depth` is hit.
    fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        let limit = self.evaluator.config.max_call_depth;
        if self.depth >= limit {
            return Err(EvalError::Limit(limit));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Anything callable from an expression.
#[derive(Debug)]
pub enum Function {
    /// Builtin with typed signatures
    Typed(TypedFunction),
    /// Builtin that receives its arguments unevaluated
    Raw(RawFunction),
    /// Defined in an expression, e.g. `f(x) = x^2`
    User(UserFunction),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Typed(f) => f.name(),
            Function::Raw(f) => &f.name,
            Function::User(f) => &f.name,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Function::Raw(_))
    }
}

pub struct RawFunction {
    pub name: String,
    handler: RawHandler,
}

impl RawFunction {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[NodeRef], &mut Runtime<'_>, &Args) -> Result<Value, EvalError> + 'static,
    {
        RawFunction {
            name: name.into(),
            handler: Rc::new(handler),
        }
    }
}

impl fmt::Debug for RawFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub struct UserFunction {
    pub name: String,
    pub params: Vec<String>,
    /// Declared parameter types, `None` for `any`
    types: Vec<Option<TypeTag>>,
    body: Eval,
    /// Parameter bindings in effect where the function was defined
    captured: Args,
}

impl UserFunction {
    pub fn call(&self, rt: &mut Runtime<'_>, values: Vec<Value>) -> Result<Value, EvalError> {
        if values.len() != self.params.len() {
            return Err(EvalError::Type(format!(
                "Wrong number of arguments in function {} ({} provided, {} expected)",
                self.name,
                values.len(),
                self.params.len()
            )));
        }
        for (i, (value, declared)) in values.iter().zip(&self.types).enumerate() {
            if let Some(tag) = declared
                && !tag.test(value)
            {
                return Err(EvalError::Type(format!(
                    "Unexpected type of argument in function {} (expected: {tag}, actual: {}, index: {i})",
                    self.name,
                    value.type_name()
                )));
            }
        }

        let mut args = self.captured.clone();
        args.extend(self.params.iter().cloned().zip(values));
        rt.descend(|rt| (self.body)(rt, &args))
    }
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Parses, compiles and evaluates expressions against one namespace.
#[derive(Debug, Clone)]
pub struct Evaluator {
    namespace: Rc<Namespace>,
    config: Config,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Evaluator::with_namespace(Namespace::standard(), config)
    }

    pub fn with_namespace(namespace: Namespace, config: Config) -> Self {
        Evaluator {
            namespace: Rc::new(namespace),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn parse(&self, input: &str) -> Parsed {
        Parser::new(Lexer::new(input))
            .with_max_depth(self.config.max_parse_depth)
            .parse()
    }

    pub fn compile(&self, node: &Node) -> Result<Compiled, EvalError> {
        Ok(Compiled {
            root: self.compile_node(node)?,
            evaluator: self.clone(),
        })
    }

    pub fn evaluate_node(&self, node: &Node, scope: &mut Scope) -> Result<Value, EvalError> {
        self.compile(node)?.evaluate(scope)
    }

    /// Parse and evaluate `input`. Parse errors are returned before anything
    /// runs.
    pub fn evaluate(&self, input: &str, scope: &mut Scope) -> Result<Value, CalcError> {
        let node = self.parse(input).into_result().map_err(CalcError::Parse)?;
        Ok(self.evaluate_node(&node, scope)?)
    }

    /// Evaluate several expressions in order against one scope.
    pub fn evaluate_all<S: AsRef<str>>(
        &self,
        inputs: &[S],
        scope: &mut Scope,
    ) -> Vec<Result<Value, CalcError>> {
        inputs
            .iter()
            .map(|input| self.evaluate(input.as_ref(), scope))
            .collect()
    }

    fn compile_node(&self, node: &Node) -> Result<Eval, EvalError> {
        log::trace!("compiling {}", node.identifier());
        match node {
            Node::Constant(c) => self.compile_constant(c),
            Node::Symbol(s) => self.compile_symbol(s),
            Node::Operator(op) => self.compile_operator(op),
            Node::Function(f) => self.compile_call(f),
            Node::Accessor(a) => self.compile_accessor(a),
            Node::Assignment(a) => self.compile_assignment(a),
            Node::FunctionAssignment(f) => self.compile_function_assignment(f),
            Node::Range(r) => self.compile_range(r, false),
            Node::Parenthesis(p) => self.compile_node(&p.content),
            Node::Object(o) => self.compile_object(o),
            Node::Array(a) => {
                let items = self.compile_all(&a.items)?;
                Ok(eval(move |rt, args| Ok(Value::Array(eval_all(&items, rt, args)?))))
            }
            Node::Block(b) => {
                let entries = b
                    .blocks
                    .iter()
                    .map(|entry| Ok((self.compile_node(&entry.node)?, entry.visible)))
                    .collect::<Result<Vec<_>, EvalError>>()?;
                Ok(eval(move |rt, args| {
                    let mut results = Vec::new();
                    for (entry, visible) in &entries {
                        let value = entry(rt, args)?;
                        if *visible {
                            results.push(value);
                        }
                    }
                    Ok(Value::ResultSet(results))
                }))
            }
            Node::Conditional(c) => {
                let condition = self.compile_node(&c.condition)?;
                let true_expr = self.compile_node(&c.true_expr)?;
                let false_expr = self.compile_node(&c.false_expr)?;
                Ok(eval(move |rt, args| {
                    if condition(rt, args)?.is_truthy()? {
                        true_expr(rt, args)
                    } else {
                        false_expr(rt, args)
                    }
                }))
            }
            Node::Index(index) => {
                let index = self.compile_index(index)?;
                Ok(eval(move |rt, args| Ok(Value::Index(index(rt, args, &[])?))))
            }
        }
    }

    fn compile_all(&self, nodes: &[NodeRef]) -> Result<Vec<Eval>, EvalError> {
        nodes.iter().map(|n| self.compile_node(n)).collect()
    }

    fn compile_constant(&self, node: &ConstantNode) -> Result<Eval, EvalError> {
        let value = match node.value_type() {
            ValueType::Number => self.number(node.value())?,
            ValueType::String => Value::String(node.value().to_string()),
            ValueType::Boolean => Value::Boolean(node.value() == "true"),
            ValueType::Null => Value::Null,
            ValueType::Undefined => Value::Undefined,
        };
        Ok(eval(move |_, _| Ok(value.clone())))
    }

    fn number(&self, text: &str) -> Result<Value, EvalError> {
        let invalid = || EvalError::Syntax(format!("Invalid numeric value \"{text}\""));
        match self.config.number {
            NumberMode::Number => text.parse::<f64>().map(Value::Number).map_err(|_| invalid()),
            NumberMode::BigNumber => text
                .parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(text))
                .map(Value::BigNumber)
                .map_err(|_| invalid()),
        }
    }

    fn compile_symbol(&self, node: &SymbolNode) -> Result<Eval, EvalError> {
        let name = node.name.clone();
        safety::check_property(&name)?;
        Ok(eval(move |rt, args| resolve(rt, args, &name)))
    }

    fn compile_operator(&self, node: &OperatorNode) -> Result<Eval, EvalError> {
        let name = node.func.name();
        let function = self
            .namespace
            .function(name)
            .cloned()
            .ok_or_else(|| EvalError::Reference(format!("Function {name} is not available")))?;
        let operands = self.compile_all(&node.args)?;
        Ok(eval(move |rt, args| {
            let values = eval_all(&operands, rt, args)?;
            call_function(rt, &function, values)
        }))
    }

    fn compile_call(&self, node: &FunctionNode) -> Result<Eval, EvalError> {
        let arg_nodes = node.args.clone();
        let arg_evals = self.compile_all(&node.args)?;

        match node.callee.as_ref() {
            Node::Symbol(symbol) => {
                let name = symbol.name.clone();
                safety::check_property(&name)?;
                if let Some(lazy) = self.namespace.function(&name).filter(|f| f.is_raw()).cloned() {
                    return Ok(eval(move |rt, args| call_with(rt, args, &lazy, &arg_nodes, &arg_evals)));
                }
                Ok(eval(move |rt, args| {
                    let callee = resolve(rt, args, &name)
                        .map_err(|_| EvalError::Reference(format!("Undefined function {name}")))?;
                    match callee {
                        Value::Function(f) => call_with(rt, args, &f, &arg_nodes, &arg_evals),
                        other => Err(EvalError::Type(format!(
                            "\"{name}\" is not a function (got {})",
                            other.type_name()
                        ))),
                    }
                }))
            }
            Node::Accessor(accessor) if accessor.index().is_object_property() => {
                let method = accessor.index().object_property().unwrap_or_default().to_string();
                let object = self.compile_node(accessor.object())?;
                Ok(eval(move |rt, args| {
                    let target = object(rt, args)?;
                    match safety::get_safe_method(&target, &method)? {
                        Method::Own(f) => call_with(rt, args, &f, &arg_nodes, &arg_evals),
                        Method::Native(native) => {
                            eval_all(&arg_evals, rt, args)?;
                            safety::call_native(native, &target)
                        }
                    }
                }))
            }
            _ => {
                let text = render::to_text(&node.callee, &RenderOptions::default());
                let callee = self.compile_node(&node.callee)?;
                Ok(eval(move |rt, args| match callee(rt, args)? {
                    Value::Function(f) => call_with(rt, args, &f, &arg_nodes, &arg_evals),
                    _ => Err(EvalError::Type(format!("Expression \"{text}\" is not a function"))),
                }))
            }
        }
    }

    fn compile_accessor(&self, node: &AccessorNode) -> Result<Eval, EvalError> {
        let object = self.compile_node(node.object())?;
        if let Some(prop) = node.index().object_property() {
            let prop = prop.to_string();
            safety::check_property(&prop)?;
            return Ok(eval(move |rt, args| {
                safety::get_safe_property(&object(rt, args)?, &prop)
            }));
        }
        let index = self.compile_index(node.index())?;
        Ok(eval(move |rt, args| {
            let target = object(rt, args)?;
            let index = index(rt, args, &target.size())?;
            access(&target, &index)
        }))
    }

    /// Dimensions that mention `end` are evaluated with `end` bound to the
    /// size of the container along that dimension.
    fn compile_index(&self, node: &IndexNode) -> Result<IndexEval, EvalError> {
        if let Some(prop) = node.object_property() {
            safety::check_property(prop)?;
        }
        let dimensions = node
            .dimensions
            .iter()
            .map(|dim| {
                let uses_end = dim.contains(&|n: &Node| n.is_symbol("end"));
                let compiled = match dim.as_ref() {
                    Node::Range(range) => self.compile_range(range, true)?,
                    other => self.compile_node(other)?,
                };
                Ok((compiled, uses_end))
            })
            .collect::<Result<Vec<_>, EvalError>>()?;

        Ok(index_eval(move |rt, args, size| {
            let mut values = Vec::with_capacity(dimensions.len());
            for (i, (dimension, uses_end)) in dimensions.iter().enumerate() {
                let value = if *uses_end {
                    let mut scoped = args.clone();
                    let end = size.get(i).copied().unwrap_or(1);
                    scoped.insert("end".to_string(), Value::Number(end as f64));
                    dimension(rt, &scoped)?
                } else {
                    dimension(rt, args)?
                };
                values.push(value);
            }
            Index::from_values(values)
        }))
    }

    /// Inside an index a range stays a [`Range`] value; anywhere else it is
    /// expanded to an array.
    fn compile_range(&self, node: &RangeNode, keep_range: bool) -> Result<Eval, EvalError> {
        let start = self.compile_node(&node.start)?;
        let end = self.compile_node(&node.end)?;
        let step = node.step.as_ref().map(|s| self.compile_node(s)).transpose()?;
        Ok(eval(move |rt, args| {
            let from = typed::to_f64(&start(rt, args)?)?;
            let to = typed::to_f64(&end(rt, args)?)?;
            let by = match &step {
                Some(step) => typed::to_f64(&step(rt, args)?)?,
                None => 1.0,
            };
            let range = Range::new(from, to, by)?;
            Ok(if keep_range {
                Value::Range(range)
            } else {
                range.to_array()
            })
        }))
    }

    fn compile_object(&self, node: &ObjectNode) -> Result<Eval, EvalError> {
        let properties = node
            .properties
            .iter()
            .map(|(key, value)| {
                safety::check_property(key)?;
                Ok((key.clone(), self.compile_node(value)?))
            })
            .collect::<Result<Vec<_>, EvalError>>()?;
        Ok(eval(move |rt, args| {
            let mut object = BTreeMap::new();
            for (key, value) in &properties {
                object.insert(key.clone(), value(rt, args)?);
            }
            Ok(Value::Object(object))
        }))
    }

    fn compile_assignment(&self, node: &AssignmentNode) -> Result<Eval, EvalError> {
        let Place { get, set } = self.compile_place(node.object())?;
        let value = self.compile_node(node.value())?;
        let name = node.name();

        let Some(index) = node.index() else {
            return Ok(eval(move |rt, args| {
                let v = value(rt, args)?;
                set(rt, args, v.clone())?;
                log::debug!("assigned {name}");
                Ok(v)
            }));
        };

        let index = self.compile_index(index)?;
        Ok(eval(move |rt, args| {
            let container = get(rt, args)?;
            let index = index(rt, args, &container.size())?;
            let v = value(rt, args)?;
            let updated = assign(container, &index, v.clone())?;
            set(rt, args, updated)?;
            log::debug!("assigned {name}{index}");
            Ok(v)
        }))
    }

    /// Reader and writer for an assignment target. Writing through an
    /// accessor rebuilds every container up to the root symbol.
    fn compile_place(&self, node: &Node) -> Result<Place, EvalError> {
        match node {
            Node::Symbol(symbol) => {
                let get = self.compile_symbol(symbol)?;
                let name = symbol.name.clone();
                Ok(Place {
                    get,
                    set: setter(move |rt, _, value| {
                        rt.scope.set(name.clone(), value);
                        Ok(())
                    }),
                })
            }
            Node::Accessor(accessor) => {
                let Place {
                    get: parent_get,
                    set: parent_set,
                } = self.compile_place(accessor.object())?;
                let get = self.compile_accessor(accessor)?;
                let index = self.compile_index(accessor.index())?;
                Ok(Place {
                    get,
                    set: setter(move |rt, args, value| {
                        let container = parent_get(rt, args)?;
                        let index = index(rt, args, &container.size())?;
                        let updated = assign(container, &index, value)?;
                        parent_set(rt, args, updated)
                    }),
                })
            }
            Node::Parenthesis(p) => self.compile_place(&p.content),
            other => Err(EvalError::Syntax(format!(
                "Invalid assignment target {}",
                other.type_name()
            ))),
        }
    }

    fn compile_function_assignment(&self, node: &FunctionAssignmentNode) -> Result<Eval, EvalError> {
        let name = node.name().to_string();
        safety::check_property(&name)?;
        let types = node
            .types
            .iter()
            .map(|t| match t.as_str() {
                "any" => Ok(None),
                other => other
                    .parse::<TypeTag>()
                    .map(Some)
                    .map_err(|_| EvalError::Type(format!("Unknown type \"{other}\""))),
            })
            .collect::<Result<Vec<_>, EvalError>>()?;
        let params = node.params.clone();
        let body = self.compile_node(&node.expr)?;

        Ok(eval(move |rt, args| {
            let function = UserFunction {
                name: name.clone(),
                params: params.clone(),
                types: types.clone(),
                body: Rc::clone(&body),
                captured: args.clone(),
            };
            let value = Value::Function(Rc::new(Function::User(function)));
            rt.scope.set(name.clone(), value.clone());
            log::debug!("defined function {name}({})", params.join(", "));
            Ok(value)
        }))
    }
}

struct Place {
    get: Eval,
    set: Setter,
}

/// A compiled expression ready to run against any scope.
#[derive(Clone)]
pub struct Compiled {
    root: Eval,
    evaluator: Evaluator,
}

impl Compiled {
    pub fn evaluate(&self, scope: &mut Scope) -> Result<Value, EvalError> {
        validate_scope(scope)?;
        let mut runtime = Runtime {
            scope,
            evaluator: &self.evaluator,
            depth: 0,
        };
        (self.root)(&mut runtime, &Args::new())
    }
}

impl fmt::Debug for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiled").finish_non_exhaustive()
    }
}

fn validate_scope(scope: &Scope) -> Result<(), EvalError> {
    match RESERVED_KEYWORDS.iter().find(|k| scope.contains(k)) {
        Some(keyword) => Err(EvalError::Reference(format!(
            "Scope contains an illegal symbol, \"{keyword}\" is a reserved keyword"
        ))),
        None => Ok(()),
    }
}

fn resolve(rt: &Runtime<'_>, args: &Args, name: &str) -> Result<Value, EvalError> {
    if let Some(value) = args.get(name) {
        return Ok(value.clone());
    }
    if let Some(value) = rt.scope.get(name) {
        return Ok(value.clone());
    }
    if let Some(value) = rt.evaluator.namespace.get(name) {
        return Ok(value.clone());
    }
    Unit::lookup(name)
        .map(Value::Unit)
        .ok_or_else(|| EvalError::undefined_symbol(name))
}

fn eval_all(evals: &[Eval], rt: &mut Runtime<'_>, args: &Args) -> Result<Vec<Value>, EvalError> {
    evals.iter().map(|e| e(rt, args)).collect()
}

/// Call `f` with already evaluated arguments.
pub fn call_function(rt: &mut Runtime<'_>, f: &Function, values: Vec<Value>) -> Result<Value, EvalError> {
    match f {
        Function::Typed(typed) => typed.call(&values),
        Function::User(user) => user.call(rt, values),
        Function::Raw(raw) => Err(EvalError::Type(format!(
            "Function {} cannot be applied to evaluated arguments",
            raw.name
        ))),
    }
}

fn call_with(
    rt: &mut Runtime<'_>,
    args: &Args,
    f: &Function,
    nodes: &[NodeRef],
    evals: &[Eval],
) -> Result<Value, EvalError> {
    match f {
        Function::Raw(raw) => (raw.handler)(nodes, rt, args),
        other => {
            let values = eval_all(evals, rt, args)?;
            call_function(rt, other, values)
        }
    }
}

fn access(target: &Value, index: &Index) -> Result<Value, EvalError> {
    if let Some(prop) = index.object_property() {
        return safety::get_safe_property(target, prop);
    }
    match target {
        Value::Array(_) => match DenseMatrix::from_value(target)?.subset(index)? {
            Value::Matrix(m) => Ok(m.to_array()),
            element => Ok(element),
        },
        Value::Matrix(m) => m.subset(index),
        Value::Range(r) => access(&r.to_array(), index),
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let positions = string_positions(index)?;
            let mut out = String::with_capacity(positions.len());
            for p in positions {
                out.push(
                    *chars
                        .get(p)
                        .ok_or_else(|| EvalError::index_out_of_range(p, chars.len()))?,
                );
            }
            Ok(Value::String(out))
        }
        other => Err(EvalError::Type(format!(
            "Cannot apply index to {}",
            other.type_name()
        ))),
    }
}

fn assign(container: Value, index: &Index, value: Value) -> Result<Value, EvalError> {
    if let Some(prop) = index.object_property() {
        return match container {
            Value::Object(mut object) => {
                safety::set_safe_property(&mut object, prop, value)?;
                Ok(Value::Object(object))
            }
            other => Err(EvalError::Type(format!(
                "Cannot set property \"{prop}\" on {}",
                other.type_name()
            ))),
        };
    }
    match container {
        Value::Array(items) => {
            let dense = DenseMatrix::from_value(&Value::Array(items))?;
            Ok(dense.subset_replace(index, &value, None)?.to_array())
        }
        Value::Matrix(m) => Ok(Value::Matrix(m.subset_replace(index, &value, None)?)),
        Value::String(s) => {
            let Value::String(replacement) = &value else {
                return Err(EvalError::Type(format!(
                    "String expected as replacement, got {}",
                    value.type_name()
                )));
            };
            let replacement: Vec<char> = replacement.chars().collect();
            let positions = string_positions(index)?;
            if replacement.len() != 1 && replacement.len() != positions.len() {
                return Err(EvalError::dimension_mismatch(
                    [replacement.len()],
                    [positions.len()],
                ));
            }
            let mut chars: Vec<char> = s.chars().collect();
            for (i, p) in positions.into_iter().enumerate() {
                if p >= chars.len() {
                    chars.resize(p + 1, ' ');
                }
                chars[p] = if replacement.len() == 1 {
                    replacement[0]
                } else {
                    replacement[i]
                };
            }
            Ok(Value::String(chars.into_iter().collect()))
        }
        other => Err(EvalError::Type(format!(
            "Cannot apply index to {}",
            other.type_name()
        ))),
    }
}

fn string_positions(index: &Index) -> Result<Vec<usize>, EvalError> {
    match index.dimensions() {
        [dimension] => dimension.positions(),
        dims => Err(EvalError::dimension_mismatch(dims.len(), 1)),
    }
}

fn single_argument<'n>(name: &str, nodes: &'n [NodeRef]) -> Result<&'n NodeRef, EvalError> {
    match nodes {
        [node] => Ok(node),
        _ => Err(EvalError::Type(format!(
            "Wrong number of arguments in function {name} ({} provided, 1 expected)",
            nodes.len()
        ))),
    }
}

/// Builtins that take their arguments as unevaluated nodes.
pub(crate) fn raw_builtins() -> Vec<RawFunction> {
    vec![
        RawFunction::new("quote", |nodes, _, _| {
            Ok(Value::Node(Rc::clone(single_argument("quote", nodes)?)))
        }),
        RawFunction::new("defined", |nodes, rt, args| {
            match single_argument("defined", nodes)?.as_ref() {
                Node::Symbol(symbol) => Ok(Value::Boolean(resolve(rt, args, &symbol.name).is_ok())),
                other => Err(EvalError::Type(format!(
                    "Symbol expected in function defined, got {}",
                    other.type_name()
                ))),
            }
        }),
        RawFunction::new("eval", |nodes, rt, args| {
            let evaluator = rt.evaluator;
            let node = single_argument("eval", nodes)?;
            let argument = evaluator.compile_node(node)?;
            match argument(rt, args)? {
                Value::Node(quoted) => {
                    let quoted = evaluator.compile_node(&quoted)?;
                    rt.descend(|rt| quoted(rt, args))
                }
                Value::String(text) => {
                    let parsed = evaluator.parse(&text);
                    if !parsed.is_ok() {
                        return Err(EvalError::Syntax(CalcError::Parse(parsed.errors).to_string()));
                    }
                    let compiled = evaluator.compile_node(&parsed.node)?;
                    rt.descend(|rt| compiled(rt, args))
                }
                other => Ok(other),
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Result<Value, CalcError> {
        Evaluator::new().evaluate(input, &mut Scope::new())
    }

    #[test]
    fn test_reserved_keyword_in_scope() {
        let mut scope = Scope::new();
        scope.set("end", Value::Number(1.0));
        let err = Evaluator::new().evaluate("1 + 1", &mut scope).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ReferenceError: Scope contains an illegal symbol, \"end\" is a reserved keyword"
        );
    }

    #[test]
    fn test_parameters_shadow_scope() {
        let mut scope = Scope::new();
        let evaluator = Evaluator::new();
        evaluator.evaluate("x = 100", &mut scope).unwrap();
        evaluator.evaluate("g(x) = x + 1", &mut scope).unwrap();
        assert_eq!(evaluator.evaluate("g(1)", &mut scope).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_closure_captures_parameters() {
        let mut scope = Scope::new();
        let evaluator = Evaluator::new();
        evaluator.evaluate("adder(n) = (h(x) = x + n)", &mut scope).unwrap();
        evaluator.evaluate("adder(10)", &mut scope).unwrap();
        assert_eq!(evaluator.evaluate("h(5)", &mut scope).unwrap(), Value::Number(15.0));
    }

    #[test]
    fn test_call_depth_limit() {
        let config = Config::default().with_max_call_depth(20);
        let evaluator = Evaluator::with_config(config);
        let mut scope = Scope::new();
        evaluator.evaluate("f(n) = f(n + 1)", &mut scope).unwrap();
        let err = evaluator.evaluate("f(0)", &mut scope).unwrap_err();
        assert_eq!(err, CalcError::Eval(EvalError::Limit(20)));
    }

    #[test]
    fn test_self_evaluating_string_hits_limit() {
        let err = run("s = \"eval(s)\"; eval(s)").unwrap_err();
        assert_eq!(err, CalcError::Eval(EvalError::Limit(Config::default().max_call_depth)));
    }

    #[test]
    fn test_eval_depth_is_shared_with_calls() {
        let config = Config::default().with_max_call_depth(8);
        let evaluator = Evaluator::with_config(config);
        let mut scope = Scope::new();
        evaluator.evaluate("q = quote(eval(q))", &mut scope).unwrap();
        let err = evaluator.evaluate("eval(q)", &mut scope).unwrap_err();
        assert_eq!(err, CalcError::Eval(EvalError::Limit(8)));
        assert_eq!(evaluator.evaluate("eval(\"1 + 1\")", &mut scope).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_string_index() {
        assert_eq!(run("\"hello\"[1:3]").unwrap(), Value::from("el"));
    }

    #[test]
    fn test_quote_and_eval() {
        let mut scope = Scope::new();
        let evaluator = Evaluator::new();
        evaluator.evaluate("q = quote(1 + 2)", &mut scope).unwrap();
        assert_eq!(evaluator.evaluate("eval(q)", &mut scope).unwrap(), Value::Number(3.0));
        assert_eq!(evaluator.evaluate("defined(q)", &mut scope).unwrap(), Value::Boolean(true));
        assert_eq!(evaluator.evaluate("defined(zz)", &mut scope).unwrap(), Value::Boolean(false));
    }
}
