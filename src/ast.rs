//! # graphcalc - Abstract Syntax Tree
//!
//! This module defines the expression tree produced by the
//! [`Parser`](crate::parser::Parser) and consumed by the compiler and the
//! renderers.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens and the delimiter tables used by the lexer
//! - **[nodes]** - The closed set of node kinds and their structural operations
//! - **[operators]** - Operator functions, precedence levels and associativity
//!
//! ## Quick Start
//!
//! ```text
//! f(x) = x^2 + 2x
//! f(3)
//! ```
//!
//! The first line parses to a `FunctionAssignment` whose body is
//! `Operator(add, [Operator(pow, ..), Operator(multiply, implicit)])`; the
//! second line is a `Function` call on the symbol `f`.
//!
//! ## Core Concepts
//!
//! ### Immutable trees
//!
//! Children are held through [`NodeRef`] (`Rc<Node>`). Cloning a node is a
//! shallow copy that shares its children, and transforms always build new
//! nodes instead of editing old ones.
//!
//! ### Identifiers
//!
//! Every node has an identifier: the node kind, plus the function name for
//! operator and function nodes (`OperatorNode:add`, `FunctionNode:sqrt`).
//! Precedence lookup and custom renderers are keyed on it.
//!
//! ### Implicit multiplication
//!
//! Adjacency such as `2x`, `2 (a + b)` or `x y` parses to a multiply operator
//! flagged `implicit`, which renderers may print without a glyph.
//!
//! ## Examples
//!
//! ### Matrices and ranges
//!
//! ```text
//! A = [1, 2; 3, 4]
//! A[0:end, 1]
//! ```
//!
//! ### Objects and properties
//!
//! ```text
//! p = {x: 1, "y": 2}
//! p.x + p["y"]
//! ```
pub mod nodes;
pub mod operators;
pub mod tokens;

pub use nodes::{
    AccessorNode, ArrayNode, AssignmentNode, BlockEntry, BlockNode, ConditionalNode,
    ConstantNode, FunctionAssignmentNode, FunctionNode, IndexNode, Node, NodeRef, ObjectNode,
    OperatorNode, ParenthesisNode, RangeNode, SymbolNode, ValueType,
};
pub use operators::{Associativity, OperatorFn};
pub use tokens::{Token, TokenKind};
