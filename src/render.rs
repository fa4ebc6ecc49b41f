//! Text, HTML and LaTeX output for expression trees.
//!
//! All three formats share the same parenthesization rules
//! ([`calculate_necessary_parentheses`]) and the same custom handler lookup:
//! a handler registered for a node identifier (`OperatorNode:add`,
//! `FunctionNode:f`, `SymbolNode`, ...) wins, then a handler registered for
//! the bare name of a called function.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::ast::operators::{self, Associativity};
use crate::ast::{
    ArrayNode, ConditionalNode, ConstantNode, FunctionNode, IndexNode, Node, NodeRef,
    OperatorFn, OperatorNode, RangeNode, ValueType,
};
use crate::latex;
use crate::output::escape_string;
use crate::units::Unit;

/// Which parentheses appear in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParenthesisMode {
    /// Exactly the parentheses written in the source
    #[default]
    Keep,
    /// Only the parentheses the operator precedence requires
    Auto,
    /// Parentheses around every compound operand
    All,
}

impl FromStr for ParenthesisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(ParenthesisMode::Keep),
            "auto" => Ok(ParenthesisMode::Auto),
            "all" => Ok(ParenthesisMode::All),
            other => Err(format!("Unknown parenthesis mode: '{other}'")),
        }
    }
}

/// Whether implicit multiplication is printed with its operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImplicitMode {
    #[default]
    Hide,
    Show,
}

impl FromStr for ImplicitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hide" => Ok(ImplicitMode::Hide),
            "show" => Ok(ImplicitMode::Show),
            other => Err(format!("Unknown implicit mode: '{other}'")),
        }
    }
}

/// Custom output for a node. Returning `None` falls back to the default.
pub type RenderHandler = Rc<dyn Fn(&Node, &RenderOptions) -> Option<String>>;

#[derive(Clone, Default)]
pub struct RenderOptions {
    pub parenthesis: ParenthesisMode,
    pub implicit: ImplicitMode,
    handlers: HashMap<String, RenderHandler>,
}

impl RenderOptions {
    pub fn new() -> Self {
        RenderOptions::default()
    }

    #[must_use]
    pub fn with_parenthesis(mut self, parenthesis: ParenthesisMode) -> Self {
        self.parenthesis = parenthesis;
        self
    }

    #[must_use]
    pub fn with_implicit(mut self, implicit: ImplicitMode) -> Self {
        self.implicit = implicit;
        self
    }

    /// Register a handler under a node identifier or a function name.
    #[must_use]
    pub fn with_handler<F>(mut self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Node, &RenderOptions) -> Option<String> + 'static,
    {
        self.handlers.insert(key.into(), Rc::new(handler));
        self
    }

    fn custom(&self, node: &Node) -> Option<String> {
        if self.handlers.is_empty() {
            return None;
        }
        if let Some(handler) = self.handlers.get(&node.identifier())
            && let Some(out) = handler(node, self)
        {
            return Some(out);
        }
        match node {
            Node::Function(f) => self
                .handlers
                .get(&f.name())
                .and_then(|handler| handler(node, self)),
            _ => None,
        }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("parenthesis", &self.parenthesis)
            .field("implicit", &self.implicit)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Text,
    Html,
    Latex,
}

pub fn to_text(node: &Node, options: &RenderOptions) -> String {
    render(node, options, Format::Text)
}

pub fn to_html(node: &Node, options: &RenderOptions) -> String {
    render(node, options, Format::Html)
}

pub fn to_latex(node: &Node, options: &RenderOptions) -> String {
    render(node, options, Format::Latex)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_text(self, &RenderOptions::default()))
    }
}

fn render(node: &Node, options: &RenderOptions, format: Format) -> String {
    if let Some(out) = options.custom(node) {
        return out;
    }
    match format {
        Format::Text => text(node, options),
        Format::Html => html(node, options),
        Format::Latex => tex(node, options),
    }
}

fn effective(node: &Node, mode: ParenthesisMode) -> &Node {
    if mode == ParenthesisMode::Keep {
        node
    } else {
        node.get_content()
    }
}

fn latex_props(node: &Node, mode: ParenthesisMode) -> Option<&'static operators::OperatorProps> {
    operators::properties(effective(node, mode))
}

/// Which operands of `root` must be wrapped in parentheses. `true` at
/// position `i` means `args[i]` needs them.
pub fn calculate_necessary_parentheses(
    root: &Node,
    args: &[NodeRef],
    options: &RenderOptions,
    latex: bool,
) -> Vec<bool> {
    let mode = options.parenthesis;
    let precedence = operators::precedence(root, mode);
    let associativity = operators::associativity(root, mode);
    let identifier = root.identifier();
    let nary_chain = identifier == "OperatorNode:add" || identifier == "OperatorNode:multiply";

    if mode == ParenthesisMode::All || (args.len() > 2 && !nary_chain) {
        return args
            .iter()
            .map(|arg| {
                !matches!(
                    arg.get_content(),
                    Node::Array(_) | Node::Constant(_) | Node::Symbol(_) | Node::Parenthesis(_)
                )
            })
            .collect();
    }

    let mut result = match args {
        [] => Vec::new(),
        [operand] => {
            let operand_precedence = operators::precedence(operand, mode);
            let latex_exempt = latex
                && operand_precedence.is_some()
                && (latex_props(root, mode).is_some_and(|p| !p.latex_left_parens)
                    || latex_props(operand, mode).is_some_and(|p| !p.latex_parens));
            let needed = match (operand_precedence, precedence) {
                _ if latex_exempt => false,
                (Some(operand), Some(own)) => operand <= own,
                _ => false,
            };
            vec![needed]
        }
        [lhs, rhs] => {
            let lhs_precedence = operators::precedence(lhs, mode);
            let rhs_precedence = operators::precedence(rhs, mode);

            let mut lhs_parens = match (lhs_precedence, precedence) {
                (None, _) | (_, None) => false,
                (Some(l), Some(own)) if l == own => {
                    associativity == Some(Associativity::Right)
                        && !operators::is_associative_with(root, lhs, mode)
                }
                (Some(l), Some(own)) => l < own,
            };
            let mut rhs_parens = match (rhs_precedence, precedence) {
                (None, _) | (_, None) => false,
                (Some(r), Some(own)) if r == own => {
                    associativity == Some(Associativity::Left)
                        && !operators::is_associative_with(root, rhs, mode)
                }
                (Some(r), Some(own)) => r < own,
            };

            if latex {
                let root_props = latex_props(root, mode);
                if lhs_precedence.is_some()
                    && (root_props.is_some_and(|p| !p.latex_left_parens)
                        || latex_props(lhs, mode).is_some_and(|p| !p.latex_parens))
                {
                    lhs_parens = false;
                }
                if rhs_precedence.is_some()
                    && (root_props.is_some_and(|p| !p.latex_right_parens)
                        || latex_props(rhs, mode).is_some_and(|p| !p.latex_parens))
                {
                    rhs_parens = false;
                }
            }
            vec![lhs_parens, rhs_parens]
        }
        _ => args
            .iter()
            .map(|arg| match (operators::precedence(arg, mode), precedence) {
                (None, _) | (_, None) => false,
                (Some(a), Some(own)) if a == own => {
                    associativity == operators::associativity(arg, mode)
                        && !operators::is_associative_with(root, arg, mode)
                }
                (Some(a), Some(own)) => a < own,
            })
            .collect(),
    };

    // Under `auto`, a parenthesised factor of a hidden implicit product keeps
    // its parentheses so `2 (a + b)` does not print as `2 a + b`.
    if let Node::Operator(op) = root
        && args.len() >= 2
        && op.func == OperatorFn::Multiply
        && op.implicit
        && mode == ParenthesisMode::Auto
        && options.implicit == ImplicitMode::Hide
    {
        for (needed, arg) in result.iter_mut().zip(args) {
            *needed = *needed || matches!(arg.as_ref(), Node::Parenthesis(_));
        }
    }

    result
}

fn accessor_needs_parentheses(object: &Node) -> bool {
    !matches!(
        object,
        Node::Accessor(_)
            | Node::Array(_)
            | Node::Constant(_)
            | Node::Function(_)
            | Node::Object(_)
            | Node::Parenthesis(_)
            | Node::Symbol(_)
    )
}

/// Assignment values and function bodies binding no tighter than the
/// assignment itself.
fn value_needs_parentheses(node: &Node, value: &Node, mode: ParenthesisMode) -> bool {
    if mode == ParenthesisMode::All {
        return true;
    }
    match (operators::precedence(value, mode), operators::precedence(node, mode)) {
        (Some(v), Some(own)) => v <= own,
        _ => false,
    }
}

/// `[condition, true_expr, false_expr]`
fn conditional_parentheses(node: &Node, c: &ConditionalNode, mode: ParenthesisMode) -> [bool; 3] {
    if mode == ParenthesisMode::All {
        return [true; 3];
    }
    let own = operators::precedence(node, mode);
    let check = |child: &Node, inclusive: bool| match (operators::precedence(child, mode), own) {
        (Some(p), Some(own)) if inclusive => p <= own,
        (Some(p), Some(own)) => p < own,
        _ => false,
    };
    [
        matches!(c.condition.as_ref(), Node::Operator(_)) || check(&c.condition, true),
        check(&c.true_expr, true),
        check(&c.false_expr, false),
    ]
}

/// `[start, step, end]`
fn range_parentheses(node: &Node, r: &RangeNode, mode: ParenthesisMode) -> [bool; 3] {
    let own = operators::precedence(node, mode);
    let check = |child: &Node| {
        mode == ParenthesisMode::All
            || matches!((operators::precedence(child, mode), own), (Some(p), Some(own)) if p <= own)
    };
    [
        check(&r.start),
        r.step.as_ref().is_some_and(|s| check(s)),
        check(&r.end),
    ]
}

fn is_hidden_implicit(op: &OperatorNode, options: &RenderOptions) -> bool {
    op.implicit && op.func == OperatorFn::Multiply && options.implicit == ImplicitMode::Hide
}

fn is_named(op: &str) -> bool {
    op.chars().next().is_some_and(char::is_alphabetic)
}

// Text

fn text(node: &Node, o: &RenderOptions) -> String {
    let child = |n: &Node| render(n, o, Format::Text);
    let wrap = |s: String, needed: bool| if needed { format!("({s})") } else { s };

    match node {
        Node::Accessor(a) => {
            let object = wrap(child(a.object()), accessor_needs_parentheses(a.object()));
            format!("{object}{}", child(a.index_ref()))
        }
        Node::Array(a) => format!("[{}]", join(&a.items, ", ", child)),
        Node::Assignment(a) => {
            let index = a.index_ref().map(|i| child(i)).unwrap_or_default();
            let value = wrap(child(a.value()), value_needs_parentheses(node, a.value(), o.parenthesis));
            format!("{}{index} = {value}", child(a.object()))
        }
        Node::Block(b) => b
            .blocks
            .iter()
            .map(|entry| format!("{}{}", child(&entry.node), if entry.visible { "" } else { ";" }))
            .collect::<Vec<_>>()
            .join("\n"),
        Node::Conditional(c) => {
            let [pc, pt, pf] = conditional_parentheses(node, c, o.parenthesis);
            format!(
                "{} ? {} : {}",
                wrap(child(&c.condition), pc),
                wrap(child(&c.true_expr), pt),
                wrap(child(&c.false_expr), pf)
            )
        }
        Node::Constant(c) => match c.value_type() {
            ValueType::String => format!("\"{}\"", escape_string(c.value())),
            _ => c.value().to_string(),
        },
        Node::FunctionAssignment(f) => {
            let expr = wrap(child(&f.expr), value_needs_parentheses(node, &f.expr, o.parenthesis));
            format!("{}({}) = {expr}", f.name(), f.params.join(", "))
        }
        Node::Function(f) => {
            let callee = wrap(child(&f.callee), matches!(f.callee.as_ref(), Node::FunctionAssignment(_)));
            format!("{callee}({})", join(&f.args, ", ", child))
        }
        Node::Index(index) => match index_property(index) {
            Some(prop) => format!(".{prop}"),
            None => format!("[{}]", join(&index.dimensions, ", ", child)),
        },
        Node::Object(obj) => {
            let entries: Vec<String> = obj
                .properties
                .iter()
                .map(|(key, value)| format!("\"{}\": {}", escape_string(key), child(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Node::Operator(op) => {
            let parens = calculate_necessary_parentheses(node, &op.args, o, false);
            let operands: Vec<String> = op
                .args
                .iter()
                .zip(&parens)
                .map(|(arg, needed)| wrap(child(arg), *needed))
                .collect();
            match operands.as_slice() {
                [operand] if op.func.is_prefix() => {
                    let gap = if is_named(&op.op) { " " } else { "" };
                    format!("{}{gap}{operand}", op.op)
                }
                [operand] => format!("{operand}{}", op.op),
                [lhs, rhs] if is_hidden_implicit(op, o) => format!("{lhs} {rhs}"),
                [lhs, rhs] => format!("{lhs} {} {rhs}", op.op),
                many if matches!(op.func, OperatorFn::Add | OperatorFn::Multiply) => {
                    if is_hidden_implicit(op, o) {
                        many.join(" ")
                    } else {
                        many.join(format!(" {} ", op.op).as_str())
                    }
                }
                _ => format!("{}({})", op.func.name(), join(&op.args, ", ", child)),
            }
        }
        Node::Parenthesis(p) => match o.parenthesis {
            ParenthesisMode::Keep => format!("({})", child(&p.content)),
            _ => child(&p.content),
        },
        Node::Range(r) => {
            let [ps, pstep, pe] = range_parentheses(node, r, o.parenthesis);
            let mut out = wrap(child(&r.start), ps);
            if let Some(step) = &r.step {
                out.push(':');
                out.push_str(&wrap(child(step), pstep));
            }
            out.push(':');
            out.push_str(&wrap(child(&r.end), pe));
            out
        }
        Node::Symbol(s) => s.name.clone(),
    }
}

fn join(nodes: &[NodeRef], separator: &str, f: impl Fn(&Node) -> String) -> String {
    nodes.iter().map(|n| f(n)).collect::<Vec<_>>().join(separator)
}

fn index_property(index: &IndexNode) -> Option<&str> {
    if index.dot_notation() {
        index.object_property()
    } else {
        None
    }
}

// HTML

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn span(class: &str, content: &str) -> String {
    format!("<span class=\"{class}\">{content}</span>")
}

fn round(content: &str) -> String {
    let paren = "math-parenthesis math-round-parenthesis";
    format!("{}{content}{}", span(paren, "("), span(paren, ")"))
}

const SEPARATOR: &str = "<span class=\"math-separator\">,</span>";

fn html(node: &Node, o: &RenderOptions) -> String {
    let child = |n: &Node| render(n, o, Format::Html);
    let wrap = |s: String, needed: bool| if needed { round(&s) } else { s };

    match node {
        Node::Accessor(a) => {
            let object = wrap(child(a.object()), accessor_needs_parentheses(a.object()));
            format!("{object}{}", child(a.index_ref()))
        }
        Node::Array(a) => {
            let paren = "math-parenthesis math-square-parenthesis";
            format!("{}{}{}", span(paren, "["), join(&a.items, SEPARATOR, child), span(paren, "]"))
        }
        Node::Assignment(a) => {
            let index = a.index_ref().map(|i| child(i)).unwrap_or_default();
            let value = wrap(child(a.value()), value_needs_parentheses(node, a.value(), o.parenthesis));
            format!(
                "{}{index}{}{value}",
                child(a.object()),
                span("math-operator math-assignment-operator math-variable-assignment-operator math-binary-operator", "=")
            )
        }
        Node::Block(b) => b
            .blocks
            .iter()
            .map(|entry| {
                let end = if entry.visible { String::new() } else { span("math-separator", ";") };
                format!("{}{end}", child(&entry.node))
            })
            .collect::<Vec<_>>()
            .join(span("math-separator", "<br />").as_str()),
        Node::Conditional(c) => {
            let [pc, pt, pf] = conditional_parentheses(node, c, o.parenthesis);
            let op = "math-operator math-conditional-operator";
            format!(
                "{}{}{}{}{}",
                wrap(child(&c.condition), pc),
                span(op, "?"),
                wrap(child(&c.true_expr), pt),
                span(op, ":"),
                wrap(child(&c.false_expr), pf)
            )
        }
        Node::Constant(c) => constant_html(c),
        Node::FunctionAssignment(f) => {
            let params: Vec<String> = f
                .params
                .iter()
                .map(|p| span("math-symbol math-parameter", &escape_html(p)))
                .collect();
            let expr = wrap(child(&f.expr), value_needs_parentheses(node, &f.expr, o.parenthesis));
            format!(
                "{}{}{}",
                span("math-function", &escape_html(f.name())),
                round(&params.join(SEPARATOR)),
                span("math-operator math-assignment-operator math-variable-assignment-operator math-binary-operator", "=")
            ) + &expr
        }
        Node::Function(f) => function_html(f, o),
        Node::Index(index) => match index_property(index) {
            Some(prop) => format!(
                "{}{}",
                span("math-operator math-accessor-operator", "."),
                span("math-symbol math-property", &escape_html(prop))
            ),
            None => {
                let paren = "math-parenthesis math-square-parenthesis";
                format!(
                    "{}{}{}",
                    span(paren, "["),
                    join(&index.dimensions, SEPARATOR, child),
                    span(paren, "]")
                )
            }
        },
        Node::Object(obj) => {
            let entries: Vec<String> = obj
                .properties
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}{}{}",
                        span("math-symbol math-property", &escape_html(key)),
                        span(
                            "math-operator math-assignment-operator math-property-assignment-operator math-binary-operator",
                            ":"
                        ),
                        child(value)
                    )
                })
                .collect();
            let paren = "math-parenthesis math-curly-parenthesis";
            format!("{}{}{}", span(paren, "{"), entries.join(SEPARATOR), span(paren, "}"))
        }
        Node::Operator(op) => operator_html(node, op, o),
        Node::Parenthesis(p) => match o.parenthesis {
            ParenthesisMode::Keep => round(&child(&p.content)),
            _ => child(&p.content),
        },
        Node::Range(r) => {
            let [ps, pstep, pe] = range_parentheses(node, r, o.parenthesis);
            let colon = span("math-operator math-range-operator", ":");
            let mut out = wrap(child(&r.start), ps);
            if let Some(step) = &r.step {
                out.push_str(&colon);
                out.push_str(&wrap(child(step), pstep));
            }
            out.push_str(&colon);
            out.push_str(&wrap(child(&r.end), pe));
            out
        }
        Node::Symbol(s) => {
            let name = escape_html(&s.name);
            let class = match s.name.as_str() {
                "true" | "false" => "math-symbol math-boolean",
                "i" => "math-symbol math-imaginary-symbol",
                "Infinity" => "math-symbol math-infinity-symbol",
                "NaN" => "math-symbol math-nan-symbol",
                "null" => "math-symbol math-null-symbol",
                "uninitialized" => "math-symbol math-uninitialized-symbol",
                _ => "math-symbol",
            };
            span(class, &name)
        }
    }
}

fn constant_html(c: &ConstantNode) -> String {
    match c.value_type() {
        ValueType::Number => span("math-number", &escape_html(c.value())),
        ValueType::String => span(
            "math-string",
            &escape_html(&format!("\"{}\"", escape_string(c.value()))),
        ),
        ValueType::Boolean => span("math-boolean", c.value()),
        ValueType::Null => span("math-null-symbol", c.value()),
        ValueType::Undefined => span("math-undefined", c.value()),
    }
}

fn function_html(f: &FunctionNode, o: &RenderOptions) -> String {
    let callee = match f.callee.as_ref() {
        Node::Symbol(s) => span("math-function", &escape_html(&s.name)),
        other => render(other, o, Format::Html),
    };
    format!("{callee}{}", round(&join(&f.args, SEPARATOR, |n| render(n, o, Format::Html))))
}

fn operator_html(node: &Node, op: &OperatorNode, o: &RenderOptions) -> String {
    let parens = calculate_necessary_parentheses(node, &op.args, o, false);
    let operands: Vec<String> = op
        .args
        .iter()
        .zip(&parens)
        .map(|(arg, needed)| {
            let s = render(arg, o, Format::Html);
            if *needed { round(&s) } else { s }
        })
        .collect();
    let symbol = escape_html(&op.op);
    let explicit = span("math-operator math-binary-operator math-explicit-binary-operator", &symbol);
    let implicit = span("math-operator math-binary-operator math-implicit-binary-operator", "");

    match operands.as_slice() {
        [operand] if op.func.is_prefix() => format!(
            "{}{operand}",
            span("math-operator math-unary-operator math-lefthand-unary-operator", &symbol)
        ),
        [operand] => format!(
            "{operand}{}",
            span("math-operator math-unary-operator math-righthand-unary-operator", &symbol)
        ),
        [lhs, rhs] if is_hidden_implicit(op, o) => format!("{lhs}{implicit}{rhs}"),
        [lhs, rhs] => format!("{lhs}{explicit}{rhs}"),
        many if matches!(op.func, OperatorFn::Add | OperatorFn::Multiply) => {
            if is_hidden_implicit(op, o) {
                many.join(implicit.as_str())
            } else {
                many.join(explicit.as_str())
            }
        }
        many => format!(
            "{}{}",
            span("math-function", op.func.name()),
            round(&many.join(SEPARATOR))
        ),
    }
}

// LaTeX

fn tex(node: &Node, o: &RenderOptions) -> String {
    let child = |n: &Node| render(n, o, Format::Latex);
    let wrap = |s: String, needed: bool| if needed { format!(r"\left({s}\right)") } else { s };

    match node {
        Node::Accessor(a) => {
            let object = wrap(child(a.object()), accessor_needs_parentheses(a.object()));
            format!("{object}{}", child(a.index_ref()))
        }
        Node::Array(a) => array_tex(a, o),
        Node::Assignment(a) => {
            let index = a.index_ref().map(|i| child(i)).unwrap_or_default();
            let value = wrap(child(a.value()), value_needs_parentheses(node, a.value(), o.parenthesis));
            format!("{}{index}:={value}", child(a.object()))
        }
        Node::Block(b) => b
            .blocks
            .iter()
            .map(|entry| format!("{}{}", child(&entry.node), if entry.visible { "" } else { ";" }))
            .collect::<Vec<_>>()
            .join("\\;\\;\n"),
        Node::Conditional(c) => format!(
            r"\begin{{cases}} {{{}}}, &\quad{{\text{{if }}\;{}}}\\{{{}}}, &\quad{{\text{{otherwise}}}}\end{{cases}}",
            child(&c.true_expr),
            child(&c.condition),
            child(&c.false_expr)
        ),
        Node::Constant(c) => match c.value_type() {
            ValueType::String => format!(r"\mathtt{{{}}}", format_args!("\"{}\"", escape_string(c.value()))),
            ValueType::Number => {
                let value = c.value();
                match value.to_ascii_lowercase().find('e') {
                    Some(i) => format!(r"{}\cdot10^{{{}}}", &value[..i], &value[i + 1..]),
                    None => value.to_string(),
                }
            }
            _ => c.value().to_string(),
        },
        Node::FunctionAssignment(f) => {
            let params: Vec<String> = f.params.iter().map(|p| latex::to_symbol(p, false)).collect();
            let expr = wrap(child(&f.expr), value_needs_parentheses(node, &f.expr, o.parenthesis));
            format!(r"\mathrm{{{}}}\left({}\right):={expr}", f.name(), params.join(","))
        }
        Node::Function(f) => function_tex(f, o),
        Node::Index(index) => match index_property(index) {
            Some(prop) => format!(".{prop}"),
            None => format!("_{{{}}}", join(&index.dimensions, ",", child)),
        },
        Node::Object(obj) => {
            let entries: Vec<String> = obj
                .properties
                .iter()
                .map(|(key, value)| format!(r"\mathbf{{{key}:}} & {}\\", child(value)))
                .collect();
            format!(
                r"\left\{{\begin{{array}}{{ll}}{}\end{{array}}\right\}}",
                entries.join("\n")
            )
        }
        Node::Operator(op) => operator_tex(node, op, o),
        Node::Parenthesis(p) => match o.parenthesis {
            ParenthesisMode::Keep => format!(r"\left({}\right)", child(&p.content)),
            _ => child(&p.content),
        },
        Node::Range(r) => {
            let [ps, pstep, pe] = range_parentheses(node, r, o.parenthesis);
            let mut out = wrap(child(&r.start), ps);
            if let Some(step) = &r.step {
                out.push(':');
                out.push_str(&wrap(child(step), pstep));
            }
            out.push(':');
            out.push_str(&wrap(child(&r.end), pe));
            out
        }
        Node::Symbol(s) => latex::to_symbol(&s.name, Unit::is_unit(&s.name)),
    }
}

fn array_tex(a: &ArrayNode, o: &RenderOptions) -> String {
    let rows: Vec<String> = a
        .items
        .iter()
        .map(|item| match item.as_ref() {
            Node::Array(row) => join(&row.items, "&", |n| render(n, o, Format::Latex)),
            other => render(other, o, Format::Latex),
        })
        .collect();
    format!(r"\begin{{bmatrix}}{}\end{{bmatrix}}", rows.join(r"\\"))
}

fn function_tex(f: &FunctionNode, o: &RenderOptions) -> String {
    let args: Vec<String> = f.args.iter().map(|a| render(a, o, Format::Latex)).collect();
    let Node::Symbol(symbol) = f.callee.as_ref() else {
        return format!(
            r"\left({}\right)\left({}\right)",
            render(&f.callee, o, Format::Latex),
            args.join(",")
        );
    };
    let name = symbol.name.as_str();
    let template = latex::function_template(name, args.len()).unwrap_or(latex::DEFAULT_TEMPLATE);
    latex::expand_template(template, name, &args)
        .or_else(|_| latex::expand_template(latex::DEFAULT_TEMPLATE, name, &args))
        .unwrap_or_else(|_| format!(r"\mathrm{{{name}}}\left({}\right)", args.join(",")))
}

/// Control words such as `\cdot` need a space before a letter operand.
fn spaced(glyph: &str) -> String {
    if glyph.starts_with('\\') && glyph.ends_with(|c: char| c.is_ascii_alphabetic()) {
        format!("{glyph} ")
    } else {
        glyph.to_string()
    }
}

fn operator_tex(node: &Node, op: &OperatorNode, o: &RenderOptions) -> String {
    let parens = calculate_necessary_parentheses(node, &op.args, o, true);
    let glyph = spaced(latex::operator(op.func));
    let operands: Vec<String> = op
        .args
        .iter()
        .zip(&parens)
        .map(|(arg, needed)| {
            let s = render(arg, o, Format::Latex);
            if *needed { format!(r"\left({s}\right)") } else { s }
        })
        .collect();

    match operands.as_slice() {
        [operand] if op.func.is_prefix() => format!("{glyph}{operand}"),
        [operand] => format!("{operand}{glyph}"),
        [lhs, rhs] => match op.func {
            OperatorFn::Divide => format!(r"\frac{{{lhs}}}{{{rhs}}}"),
            OperatorFn::Pow => {
                let base = effective(&op.args[0], o.parenthesis);
                let lhs = if matches!(base, Node::Conditional(_))
                    || matches!(base, Node::Operator(inner) if inner.func == OperatorFn::Divide)
                {
                    format!(r"\left({{{lhs}}}\right)")
                } else {
                    format!("{{{lhs}}}")
                };
                format!("{lhs}{glyph}{{{rhs}}}")
            }
            OperatorFn::Multiply if is_hidden_implicit(op, o) => format!("{lhs}~{rhs}"),
            _ => format!("{lhs}{glyph}{rhs}"),
        },
        many if is_hidden_implicit(op, o) => many.join("~"),
        many if op.func == OperatorFn::Add || op.func == OperatorFn::Multiply => many.join(glyph.as_str()),
        _ => format!(
            r"\mathrm{{{}}}\left({}\right)",
            op.func.name(),
            join(&op.args, ",", |n| render(n, o, Format::Latex))
        ),
    }
}
