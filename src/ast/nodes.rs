use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::operators::OperatorFn;
use crate::ast::tokens::is_reserved_keyword;
use crate::error::NodeError;

/// Shared reference to a child node. Cloning a node clones these references,
/// so a clone shares its children with the original.
pub type NodeRef = Rc<Node>;

/// Expression tree node.
///
/// Nodes are never mutated after construction; [`Node::map_children`] and
/// [`Node::transform`] build new trees.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Property or index access.
    ///
    /// ```text
    /// a.b   a[1, 2]   f(x)[0]
    /// ```
    Accessor(AccessorNode),

    /// Array or matrix literal.
    ///
    /// ```text
    /// [1, 2, 3]   [1, 2; 3, 4]
    /// ```
    Array(ArrayNode),

    /// Variable, indexed or property assignment.
    ///
    /// ```text
    /// a = 2   a[1] = 2   a.b = 2
    /// ```
    Assignment(AssignmentNode),

    /// Several statements separated by newlines or semicolons.
    Block(BlockNode),

    /// Ternary `condition ? a : b`.
    Conditional(ConditionalNode),

    /// Literal value kept in its textual form.
    Constant(ConstantNode),

    /// Function definition.
    ///
    /// ```text
    /// f(x, y) = x^2 + y
    /// ```
    FunctionAssignment(FunctionAssignmentNode),

    /// Function call.
    Function(FunctionNode),

    /// Dimensions of an accessor.
    Index(IndexNode),

    /// Object literal.
    ///
    /// ```text
    /// {a: 1, "b": 2}
    /// ```
    Object(ObjectNode),

    /// Unary or binary operator application.
    Operator(OperatorNode),

    /// Parentheses written in the source.
    Parenthesis(ParenthesisNode),

    /// `start:end` or `start:step:end`.
    Range(RangeNode),

    /// Variable or function name.
    Symbol(SymbolNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccessorNode {
    object: NodeRef,
    index: NodeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    pub items: Vec<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentNode {
    object: NodeRef,
    index: Option<NodeRef>,
    value: NodeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntry {
    pub node: NodeRef,
    /// Whether the result appears in the result set
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub blocks: Vec<BlockEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalNode {
    pub condition: NodeRef,
    pub true_expr: NodeRef,
    pub false_expr: NodeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Number,
    String,
    Boolean,
    Null,
    Undefined,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Null => "null",
            ValueType::Undefined => "undefined",
        }
    }
}

impl std::str::FromStr for ValueType {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(ValueType::Number),
            "string" => Ok(ValueType::String),
            "boolean" => Ok(ValueType::Boolean),
            "null" => Ok(ValueType::Null),
            "undefined" => Ok(ValueType::Undefined),
            other => Err(NodeError::UnsupportedValueType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantNode {
    value: String,
    value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionAssignmentNode {
    name: String,
    pub params: Vec<String>,
    /// Declared parameter types; `any` unless given
    pub types: Vec<String>,
    pub expr: NodeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub callee: NodeRef,
    pub args: Vec<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexNode {
    pub dimensions: Vec<NodeRef>,
    dot_notation: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    /// Properties in source order
    pub properties: Vec<(String, NodeRef)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    /// Operator as written, e.g. `%` or `mod`
    pub op: String,
    pub func: OperatorFn,
    pub args: Vec<NodeRef>,
    /// Multiplication inferred from adjacency
    pub implicit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesisNode {
    pub content: NodeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeNode {
    pub start: NodeRef,
    pub end: NodeRef,
    pub step: Option<NodeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolNode {
    pub name: String,
}

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?((\d+\.?\d*)|(\d*\.?\d+))([eE][+-]?\d+)?$")
        .expect("numeric literal pattern compiles")
});

impl ConstantNode {
    /// Build a constant from its textual value and a type name.
    pub fn new(value: impl Into<String>, value_type: &str) -> Result<Self, NodeError> {
        let value_type: ValueType = value_type.parse()?;
        let value = value.into();
        match value_type {
            ValueType::Number => ConstantNode::number(&value),
            _ => Ok(ConstantNode { value, value_type }),
        }
    }

    /// Numeric constant. The text must be a plain decimal literal; redundant
    /// leading zeros are dropped.
    pub fn number(text: &str) -> Result<Self, NodeError> {
        if !NUMERIC_LITERAL.is_match(text) {
            return Err(NodeError::InvalidNumber(text.to_string()));
        }
        let trimmed = text.trim_start_matches('0');
        let value = if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            trimmed.to_string()
        } else if text.starts_with('0') {
            format!("0{trimmed}")
        } else {
            text.to_string()
        };
        Ok(ConstantNode {
            value,
            value_type: ValueType::Number,
        })
    }

    pub fn string(text: impl Into<String>) -> Self {
        ConstantNode {
            value: text.into(),
            value_type: ValueType::String,
        }
    }

    pub fn boolean(value: bool) -> Self {
        ConstantNode {
            value: value.to_string(),
            value_type: ValueType::Boolean,
        }
    }

    pub fn null() -> Self {
        ConstantNode {
            value: "null".into(),
            value_type: ValueType::Null,
        }
    }

    pub fn undefined() -> Self {
        ConstantNode {
            value: "undefined".into(),
            value_type: ValueType::Undefined,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

impl AccessorNode {
    pub fn new(object: NodeRef, index: NodeRef) -> Result<Self, NodeError> {
        if !matches!(*index, Node::Index(_)) {
            return Err(NodeError::IndexExpected("index".into()));
        }
        Ok(AccessorNode { object, index })
    }

    pub fn with_index(object: NodeRef, index: IndexNode) -> Self {
        AccessorNode {
            object,
            index: Rc::new(Node::Index(index)),
        }
    }

    pub fn object(&self) -> &NodeRef {
        &self.object
    }

    pub fn index_ref(&self) -> &NodeRef {
        &self.index
    }

    pub fn index(&self) -> &IndexNode {
        match &*self.index {
            Node::Index(index) => index,
            _ => unreachable!("accessor index is checked on construction"),
        }
    }

    /// Property name for `a.b`, otherwise the name of the object.
    pub fn name(&self) -> String {
        let index = self.index();
        if index.is_object_property() {
            index.object_property().unwrap_or_default().to_string()
        } else {
            self.object.name().unwrap_or_default()
        }
    }
}

impl AssignmentNode {
    pub fn new(object: NodeRef, index: Option<NodeRef>, value: NodeRef) -> Result<Self, NodeError> {
        match &*object {
            Node::Symbol(s) if is_reserved_keyword(&s.name) => {
                return Err(NodeError::ReservedKeyword(s.name.clone()));
            }
            Node::Symbol(_) | Node::Accessor(_) => {}
            _ => return Err(NodeError::InvalidAssignmentTarget),
        }
        if let Some(index) = &index
            && !matches!(**index, Node::Index(_))
        {
            return Err(NodeError::IndexExpected("index".into()));
        }
        Ok(AssignmentNode {
            object,
            index,
            value,
        })
    }

    pub fn object(&self) -> &NodeRef {
        &self.object
    }

    pub fn index_ref(&self) -> Option<&NodeRef> {
        self.index.as_ref()
    }

    pub fn index(&self) -> Option<&IndexNode> {
        self.index.as_deref().map(|node| match node {
            Node::Index(index) => index,
            _ => unreachable!("assignment index is checked on construction"),
        })
    }

    pub fn value(&self) -> &NodeRef {
        &self.value
    }

    pub fn name(&self) -> String {
        match self.index() {
            Some(index) if index.is_object_property() => {
                index.object_property().unwrap_or_default().to_string()
            }
            Some(_) => String::new(),
            None => self.object.name().unwrap_or_default(),
        }
    }
}

impl FunctionAssignmentNode {
    pub fn new(name: impl Into<String>, params: Vec<String>, expr: NodeRef) -> Result<Self, NodeError> {
        let types = vec!["any".to_string(); params.len()];
        FunctionAssignmentNode::with_types(name, params, types, expr)
    }

    pub fn with_types(
        name: impl Into<String>,
        params: Vec<String>,
        types: Vec<String>,
        expr: NodeRef,
    ) -> Result<Self, NodeError> {
        let name = name.into();
        if is_reserved_keyword(&name) {
            return Err(NodeError::ReservedKeyword(name));
        }
        Ok(FunctionAssignmentNode {
            name,
            params,
            types,
            expr,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FunctionNode {
    pub fn new(callee: NodeRef, args: Vec<NodeRef>) -> Self {
        FunctionNode { callee, args }
    }

    /// Name of the called function, empty if it has none.
    pub fn name(&self) -> String {
        self.callee.name().unwrap_or_default()
    }
}

impl IndexNode {
    pub fn new(dimensions: Vec<NodeRef>) -> Self {
        IndexNode {
            dimensions,
            dot_notation: false,
        }
    }

    /// `a.prop` style index; the single dimension must be a string constant.
    pub fn dot(dimensions: Vec<NodeRef>) -> Result<Self, NodeError> {
        let index = IndexNode {
            dimensions,
            dot_notation: true,
        };
        if !index.is_object_property() {
            return Err(NodeError::InvalidDotNotation);
        }
        Ok(index)
    }

    pub fn dot_notation(&self) -> bool {
        self.dot_notation
    }

    pub fn is_object_property(&self) -> bool {
        self.object_property().is_some()
    }

    pub fn object_property(&self) -> Option<&str> {
        match self.dimensions.as_slice() {
            [dim] => match &**dim {
                Node::Constant(c) if c.value_type == ValueType::String => Some(c.value()),
                _ => None,
            },
            _ => None,
        }
    }

    /// True when a dimension refers to `end`, so the container size must be
    /// known before the dimensions can be evaluated.
    pub fn needs_size(&self) -> bool {
        self.dimensions.iter().any(|dim| dim.references_end())
    }
}

impl ObjectNode {
    pub fn new(properties: Vec<(String, NodeRef)>) -> Self {
        let mut deduped: Vec<(String, NodeRef)> = Vec::with_capacity(properties.len());
        for (key, value) in properties {
            match deduped.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => deduped.push((key, value)),
            }
        }
        ObjectNode {
            properties: deduped,
        }
    }
}

impl OperatorNode {
    pub fn new(op: impl Into<String>, func: OperatorFn, args: Vec<NodeRef>) -> Self {
        OperatorNode {
            op: op.into(),
            func,
            args,
            implicit: false,
        }
    }

    pub fn implicit_multiply(lhs: NodeRef, rhs: NodeRef) -> Self {
        OperatorNode {
            op: "*".into(),
            func: OperatorFn::Multiply,
            args: vec![lhs, rhs],
            implicit: true,
        }
    }

    pub fn is_unary(&self) -> bool {
        self.args.len() == 1
    }

    pub fn is_binary(&self) -> bool {
        self.args.len() == 2
    }
}

impl RangeNode {
    pub fn new(start: NodeRef, end: NodeRef, step: Option<NodeRef>) -> Self {
        RangeNode { start, end, step }
    }

    pub fn needs_end(&self) -> bool {
        self.start.references_end()
            || self.end.references_end()
            || self.step.as_ref().is_some_and(|s| s.references_end())
    }
}

impl Node {
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Accessor(_) => "AccessorNode",
            Node::Array(_) => "ArrayNode",
            Node::Assignment(_) => "AssignmentNode",
            Node::Block(_) => "BlockNode",
            Node::Conditional(_) => "ConditionalNode",
            Node::Constant(_) => "ConstantNode",
            Node::FunctionAssignment(_) => "FunctionAssignmentNode",
            Node::Function(_) => "FunctionNode",
            Node::Index(_) => "IndexNode",
            Node::Object(_) => "ObjectNode",
            Node::Operator(_) => "OperatorNode",
            Node::Parenthesis(_) => "ParenthesisNode",
            Node::Range(_) => "RangeNode",
            Node::Symbol(_) => "SymbolNode",
        }
    }

    /// Identifier used for precedence and custom renderer lookup, e.g.
    /// `OperatorNode:add` or `FunctionNode:sqrt`.
    pub fn identifier(&self) -> String {
        match self {
            Node::Operator(op) => format!("OperatorNode:{}", op.func.name()),
            Node::Function(f) => format!("FunctionNode:{}", f.name()),
            other => other.type_name().to_string(),
        }
    }

    /// Derived name of symbols, calls, accessors and assignments.
    pub fn name(&self) -> Option<String> {
        match self {
            Node::Symbol(s) => Some(s.name.clone()),
            Node::Function(f) => Some(f.name()),
            Node::Accessor(a) => Some(a.name()),
            Node::Assignment(a) => Some(a.name()),
            Node::FunctionAssignment(f) => Some(f.name.clone()),
            _ => None,
        }
    }

    /// The node inside any number of parentheses.
    pub fn get_content(&self) -> &Node {
        match self {
            Node::Parenthesis(p) => p.content.get_content(),
            other => other,
        }
    }

    pub fn is_symbol(&self, name: &str) -> bool {
        matches!(self, Node::Symbol(s) if s.name == name)
    }

    fn references_end(&self) -> bool {
        self.contains(&|node| node.is_symbol("end"))
    }

    /// Visit each direct child with its path relative to this node.
    pub fn for_each_child(&self, f: &mut dyn FnMut(&NodeRef, &str)) {
        match self {
            Node::Accessor(a) => {
                f(&a.object, "object");
                f(&a.index, "index");
            }
            Node::Array(a) => {
                for (i, item) in a.items.iter().enumerate() {
                    f(item, &format!("items[{i}]"));
                }
            }
            Node::Assignment(a) => {
                f(&a.object, "object");
                if let Some(index) = &a.index {
                    f(index, "index");
                }
                f(&a.value, "value");
            }
            Node::Block(b) => {
                for (i, entry) in b.blocks.iter().enumerate() {
                    f(&entry.node, &format!("blocks[{i}].node"));
                }
            }
            Node::Conditional(c) => {
                f(&c.condition, "condition");
                f(&c.true_expr, "trueExpr");
                f(&c.false_expr, "falseExpr");
            }
            Node::Constant(_) | Node::Symbol(_) => {}
            Node::FunctionAssignment(fa) => f(&fa.expr, "expr"),
            Node::Function(call) => {
                f(&call.callee, "fn");
                for (i, arg) in call.args.iter().enumerate() {
                    f(arg, &format!("args[{i}]"));
                }
            }
            Node::Index(index) => {
                for (i, dim) in index.dimensions.iter().enumerate() {
                    f(dim, &format!("dimensions[{i}]"));
                }
            }
            Node::Object(o) => {
                for (key, value) in &o.properties {
                    f(value, &format!("properties[{key:?}]"));
                }
            }
            Node::Operator(op) => {
                for (i, arg) in op.args.iter().enumerate() {
                    f(arg, &format!("args[{i}]"));
                }
            }
            Node::Parenthesis(p) => f(&p.content, "content"),
            Node::Range(r) => {
                f(&r.start, "start");
                f(&r.end, "end");
                if let Some(step) = &r.step {
                    f(step, "step");
                }
            }
        }
    }

    /// Build a new node of the same kind whose direct children are the
    /// results of `f`.
    pub fn map_children(
        &self,
        f: &mut dyn FnMut(&NodeRef, &str) -> NodeRef,
    ) -> Result<Node, NodeError> {
        let node = match self {
            Node::Accessor(a) => Node::Accessor(AccessorNode::new(
                f(&a.object, "object"),
                f(&a.index, "index"),
            )?),
            Node::Array(a) => Node::Array(ArrayNode {
                items: map_list(&a.items, "items", f),
            }),
            Node::Assignment(a) => {
                let object = f(&a.object, "object");
                let index = a.index.as_ref().map(|index| f(index, "index"));
                let value = f(&a.value, "value");
                Node::Assignment(AssignmentNode::new(object, index, value)?)
            }
            Node::Block(b) => Node::Block(BlockNode {
                blocks: b
                    .blocks
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| BlockEntry {
                        node: f(&entry.node, &format!("blocks[{i}].node")),
                        visible: entry.visible,
                    })
                    .collect(),
            }),
            Node::Conditional(c) => Node::Conditional(ConditionalNode {
                condition: f(&c.condition, "condition"),
                true_expr: f(&c.true_expr, "trueExpr"),
                false_expr: f(&c.false_expr, "falseExpr"),
            }),
            Node::Constant(_) | Node::Symbol(_) => self.clone(),
            Node::FunctionAssignment(fa) => Node::FunctionAssignment(FunctionAssignmentNode {
                expr: f(&fa.expr, "expr"),
                ..fa.clone()
            }),
            Node::Function(call) => Node::Function(FunctionNode {
                callee: f(&call.callee, "fn"),
                args: map_list(&call.args, "args", f),
            }),
            Node::Index(index) => Node::Index(IndexNode {
                dimensions: map_list(&index.dimensions, "dimensions", f),
                dot_notation: index.dot_notation,
            }),
            Node::Object(o) => Node::Object(ObjectNode {
                properties: o
                    .properties
                    .iter()
                    .map(|(key, value)| (key.clone(), f(value, &format!("properties[{key:?}]"))))
                    .collect(),
            }),
            Node::Operator(op) => Node::Operator(OperatorNode {
                args: map_list(&op.args, "args", f),
                ..op.clone()
            }),
            Node::Parenthesis(p) => Node::Parenthesis(ParenthesisNode {
                content: f(&p.content, "content"),
            }),
            Node::Range(r) => Node::Range(RangeNode {
                start: f(&r.start, "start"),
                end: f(&r.end, "end"),
                step: r.step.as_ref().map(|step| f(step, "step")),
            }),
        };
        if let Node::Index(index) = &node
            && index.dot_notation
            && !index.is_object_property()
        {
            return Err(NodeError::InvalidDotNotation);
        }
        Ok(node)
    }

    /// Depth-first, pre-order walk over this node and all descendants.
    pub fn traverse(&self, f: &mut dyn FnMut(&Node)) {
        f(self);
        self.for_each_child(&mut |child, _| child.traverse(f));
    }

    pub fn contains(&self, predicate: &dyn Fn(&Node) -> bool) -> bool {
        let mut found = false;
        self.traverse(&mut |node| found = found || predicate(node));
        found
    }

    /// Collect every node in the tree that matches `predicate`.
    pub fn filter(&self, predicate: &dyn Fn(&Node) -> bool) -> Vec<Node> {
        let mut matches = Vec::new();
        self.traverse(&mut |node| {
            if predicate(node) {
                matches.push(node.clone());
            }
        });
        matches
    }

    /// Rebuild the tree bottom-up-on-demand: `f` may replace a node, in which
    /// case its children are not visited; otherwise the children are
    /// transformed recursively.
    pub fn transform(&self, f: &mut dyn FnMut(&Node) -> Option<Node>) -> Result<Node, NodeError> {
        if let Some(replacement) = f(self) {
            return Ok(replacement);
        }
        let mut failure = None;
        let mapped = self.map_children(&mut |child, _| match child.transform(f) {
            Ok(node) => Rc::new(node),
            Err(e) => {
                failure.get_or_insert(e);
                Rc::clone(child)
            }
        })?;
        match failure {
            Some(e) => Err(e),
            None => Ok(mapped),
        }
    }

    /// Copy of the whole tree that shares no children with this one.
    pub fn deep_clone(&self) -> Node {
        self.map_children(&mut |child, _| Rc::new(child.deep_clone()))
            .unwrap_or_else(|_| self.clone())
    }
}

fn map_list(
    items: &[NodeRef],
    label: &str,
    f: &mut dyn FnMut(&NodeRef, &str) -> NodeRef,
) -> Vec<NodeRef> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| f(item, &format!("{label}[{i}]")))
        .collect()
}

impl From<SymbolNode> for Node {
    fn from(node: SymbolNode) -> Self {
        Node::Symbol(node)
    }
}

impl From<ConstantNode> for Node {
    fn from(node: ConstantNode) -> Self {
        Node::Constant(node)
    }
}

impl From<OperatorNode> for Node {
    fn from(node: OperatorNode) -> Self {
        Node::Operator(node)
    }
}

/// Shorthand for building trees in code and tests.
pub fn symbol(name: &str) -> NodeRef {
    Rc::new(Node::Symbol(SymbolNode {
        name: name.to_string(),
    }))
}

pub fn number(text: &str) -> Result<NodeRef, NodeError> {
    Ok(Rc::new(Node::Constant(ConstantNode::number(text)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_rejects_invalid_numbers() {
        assert!(ConstantNode::number("1.2.3").is_err());
        assert!(ConstantNode::number("abc").is_err());
        assert!(ConstantNode::number("1e").is_err());
        assert!(ConstantNode::number(".5").is_ok());
    }

    #[test]
    fn test_constant_strips_leading_zeros() {
        assert_eq!(ConstantNode::number("007").unwrap().value(), "7");
        assert_eq!(ConstantNode::number("00.5").unwrap().value(), "0.5");
        assert_eq!(ConstantNode::number("0").unwrap().value(), "0");
        assert_eq!(ConstantNode::number("0.5").unwrap().value(), "0.5");
    }

    #[test]
    fn test_constant_value_type_is_closed() {
        assert!(ConstantNode::new("x", "date").is_err());
        assert_eq!(
            ConstantNode::new("x", "string").unwrap().value_type(),
            ValueType::String
        );
    }

    #[test]
    fn test_dot_notation_requires_string_constant() {
        assert!(IndexNode::dot(vec![symbol("a")]).is_err());
        let prop = Rc::new(Node::Constant(ConstantNode::string("a")));
        assert!(IndexNode::dot(vec![prop]).is_ok());
    }

    #[test]
    fn test_cannot_assign_end() {
        let result = AssignmentNode::new(symbol("end"), None, number("1").unwrap());
        assert!(matches!(result, Err(NodeError::ReservedKeyword(_))));
    }

    #[test]
    fn test_clone_is_shallow() {
        let node = Node::Operator(OperatorNode::new(
            "+",
            OperatorFn::Add,
            vec![symbol("a"), symbol("b")],
        ));
        let copy = node.clone();
        match (&node, &copy) {
            (Node::Operator(a), Node::Operator(b)) => {
                assert!(Rc::ptr_eq(&a.args[0], &b.args[0]));
            }
            _ => unreachable!(),
        }
        let deep = node.deep_clone();
        match (&node, &deep) {
            (Node::Operator(a), Node::Operator(b)) => {
                assert!(!Rc::ptr_eq(&a.args[0], &b.args[0]));
                assert_eq!(a.args[0], b.args[0]);
            }
            _ => unreachable!(),
        }
    }
}
