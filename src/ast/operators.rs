use crate::ast::nodes::Node;
use crate::render::ParenthesisMode;

/// Namespace function an operator node calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFn {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    DotMultiply,
    Divide,
    DotDivide,
    Mod,
    Pow,
    DotPow,

    // Prefix
    UnaryMinus,
    UnaryPlus,
    BitNot,
    Not,

    // Postfix
    Factorial,
    Transpose,

    // Relational
    Equal,
    Unequal,
    Smaller,
    Larger,
    SmallerEq,
    LargerEq,

    // Bitwise and logical
    BitAnd,
    BitXor,
    BitOr,
    And,
    Xor,
    Or,

    // Shifts
    LeftShift,
    RightArithShift,
    RightLogShift,

    // Conversion
    To,
}

impl OperatorFn {
    pub const ALL: &'static [OperatorFn] = &[
        OperatorFn::Add,
        OperatorFn::Subtract,
        OperatorFn::Multiply,
        OperatorFn::DotMultiply,
        OperatorFn::Divide,
        OperatorFn::DotDivide,
        OperatorFn::Mod,
        OperatorFn::Pow,
        OperatorFn::DotPow,
        OperatorFn::UnaryMinus,
        OperatorFn::UnaryPlus,
        OperatorFn::BitNot,
        OperatorFn::Not,
        OperatorFn::Factorial,
        OperatorFn::Transpose,
        OperatorFn::Equal,
        OperatorFn::Unequal,
        OperatorFn::Smaller,
        OperatorFn::Larger,
        OperatorFn::SmallerEq,
        OperatorFn::LargerEq,
        OperatorFn::BitAnd,
        OperatorFn::BitXor,
        OperatorFn::BitOr,
        OperatorFn::And,
        OperatorFn::Xor,
        OperatorFn::Or,
        OperatorFn::LeftShift,
        OperatorFn::RightArithShift,
        OperatorFn::RightLogShift,
        OperatorFn::To,
    ];

    /// Name of the builtin the operator dispatches to.
    pub fn name(self) -> &'static str {
        match self {
            OperatorFn::Add => "add",
            OperatorFn::Subtract => "subtract",
            OperatorFn::Multiply => "multiply",
            OperatorFn::DotMultiply => "dotMultiply",
            OperatorFn::Divide => "divide",
            OperatorFn::DotDivide => "dotDivide",
            OperatorFn::Mod => "mod",
            OperatorFn::Pow => "pow",
            OperatorFn::DotPow => "dotPow",
            OperatorFn::UnaryMinus => "unaryMinus",
            OperatorFn::UnaryPlus => "unaryPlus",
            OperatorFn::BitNot => "bitNot",
            OperatorFn::Not => "not",
            OperatorFn::Factorial => "factorial",
            OperatorFn::Transpose => "transpose",
            OperatorFn::Equal => "equal",
            OperatorFn::Unequal => "unequal",
            OperatorFn::Smaller => "smaller",
            OperatorFn::Larger => "larger",
            OperatorFn::SmallerEq => "smallerEq",
            OperatorFn::LargerEq => "largerEq",
            OperatorFn::BitAnd => "bitAnd",
            OperatorFn::BitXor => "bitXor",
            OperatorFn::BitOr => "bitOr",
            OperatorFn::And => "and",
            OperatorFn::Xor => "xor",
            OperatorFn::Or => "or",
            OperatorFn::LeftShift => "leftShift",
            OperatorFn::RightArithShift => "rightArithShift",
            OperatorFn::RightLogShift => "rightLogShift",
            OperatorFn::To => "to",
        }
    }

    pub fn from_name(name: &str) -> Option<OperatorFn> {
        OperatorFn::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Canonical source text of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            OperatorFn::Add | OperatorFn::UnaryPlus => "+",
            OperatorFn::Subtract | OperatorFn::UnaryMinus => "-",
            OperatorFn::Multiply => "*",
            OperatorFn::DotMultiply => ".*",
            OperatorFn::Divide => "/",
            OperatorFn::DotDivide => "./",
            OperatorFn::Mod => "mod",
            OperatorFn::Pow => "^",
            OperatorFn::DotPow => ".^",
            OperatorFn::BitNot => "~",
            OperatorFn::Not => "not",
            OperatorFn::Factorial => "!",
            OperatorFn::Transpose => "'",
            OperatorFn::Equal => "==",
            OperatorFn::Unequal => "!=",
            OperatorFn::Smaller => "<",
            OperatorFn::Larger => ">",
            OperatorFn::SmallerEq => "<=",
            OperatorFn::LargerEq => ">=",
            OperatorFn::BitAnd => "&",
            OperatorFn::BitXor => "^|",
            OperatorFn::BitOr => "|",
            OperatorFn::And => "and",
            OperatorFn::Xor => "xor",
            OperatorFn::Or => "or",
            OperatorFn::LeftShift => "<<",
            OperatorFn::RightArithShift => ">>",
            OperatorFn::RightLogShift => ">>>",
            OperatorFn::To => "to",
        }
    }

    pub fn is_prefix(self) -> bool {
        matches!(
            self,
            OperatorFn::UnaryMinus | OperatorFn::UnaryPlus | OperatorFn::BitNot | OperatorFn::Not
        )
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, OperatorFn::Factorial | OperatorFn::Transpose)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// Rendering properties of one node identifier inside a precedence level.
#[derive(Debug, Clone, Copy)]
pub struct OperatorProps {
    pub identifier: &'static str,
    pub associativity: Option<Associativity>,
    pub associative_with: &'static [&'static str],
    /// LaTeX output needs parentheses around this node at all
    pub latex_parens: bool,
    pub latex_left_parens: bool,
    pub latex_right_parens: bool,
}

const fn props(identifier: &'static str, associativity: Option<Associativity>) -> OperatorProps {
    OperatorProps {
        identifier,
        associativity,
        associative_with: &[],
        latex_parens: true,
        latex_left_parens: true,
        latex_right_parens: true,
    }
}

const LEFT: Option<Associativity> = Some(Associativity::Left);
const RIGHT: Option<Associativity> = Some(Associativity::Right);

/// Precedence levels, lowest binding first.
pub static PRECEDENCE: &[&[OperatorProps]] = &[
    &[props("AssignmentNode", None), props("FunctionAssignmentNode", None)],
    &[OperatorProps {
        latex_parens: false,
        latex_left_parens: false,
        latex_right_parens: false,
        ..props("ConditionalNode", None)
    }],
    &[props("OperatorNode:or", LEFT)],
    &[props("OperatorNode:xor", LEFT)],
    &[props("OperatorNode:and", LEFT)],
    &[props("OperatorNode:bitOr", LEFT)],
    &[props("OperatorNode:bitXor", LEFT)],
    &[props("OperatorNode:bitAnd", LEFT)],
    &[
        props("OperatorNode:equal", LEFT),
        props("OperatorNode:unequal", LEFT),
        props("OperatorNode:smaller", LEFT),
        props("OperatorNode:larger", LEFT),
        props("OperatorNode:smallerEq", LEFT),
        props("OperatorNode:largerEq", LEFT),
    ],
    &[
        props("OperatorNode:leftShift", LEFT),
        props("OperatorNode:rightArithShift", LEFT),
        props("OperatorNode:rightLogShift", LEFT),
    ],
    &[props("OperatorNode:to", LEFT)],
    &[props("RangeNode", None)],
    &[
        OperatorProps {
            associative_with: &["OperatorNode:add", "OperatorNode:subtract"],
            ..props("OperatorNode:add", LEFT)
        },
        props("OperatorNode:subtract", LEFT),
    ],
    &[
        OperatorProps {
            associative_with: &["OperatorNode:multiply", "OperatorNode:divide"],
            ..props("OperatorNode:multiply", LEFT)
        },
        OperatorProps {
            latex_parens: false,
            latex_left_parens: false,
            latex_right_parens: false,
            ..props("OperatorNode:divide", LEFT)
        },
        props("OperatorNode:dotMultiply", LEFT),
        props("OperatorNode:dotDivide", LEFT),
        props("OperatorNode:mod", LEFT),
    ],
    &[
        props("OperatorNode:unaryPlus", RIGHT),
        props("OperatorNode:unaryMinus", RIGHT),
        props("OperatorNode:bitNot", RIGHT),
        props("OperatorNode:not", RIGHT),
    ],
    &[
        OperatorProps {
            latex_right_parens: false,
            ..props("OperatorNode:pow", RIGHT)
        },
        props("OperatorNode:dotPow", RIGHT),
    ],
    &[props("OperatorNode:factorial", LEFT)],
    &[props("OperatorNode:transpose", LEFT)],
];

fn lookup(identifier: &str) -> Option<(usize, &'static OperatorProps)> {
    PRECEDENCE.iter().enumerate().find_map(|(level, group)| {
        group
            .iter()
            .find(|p| p.identifier == identifier)
            .map(|p| (level, p))
    })
}

fn effective(node: &Node, mode: ParenthesisMode) -> &Node {
    if mode == ParenthesisMode::Keep {
        node
    } else {
        node.get_content()
    }
}

/// Precedence level of a node, `None` for nodes that never need parentheses.
///
/// Outside `keep` mode parentheses nodes are looked through.
pub fn precedence(node: &Node, mode: ParenthesisMode) -> Option<usize> {
    lookup(&effective(node, mode).identifier()).map(|(level, _)| level)
}

pub fn associativity(node: &Node, mode: ParenthesisMode) -> Option<Associativity> {
    lookup(&effective(node, mode).identifier()).and_then(|(_, p)| p.associativity)
}

/// True if `(a op b) op c == a op (b op c)` holds between the two nodes.
pub fn is_associative_with(a: &Node, b: &Node, mode: ParenthesisMode) -> bool {
    let a = effective(a, mode).identifier();
    let b = effective(b, mode).identifier();
    lookup(&a).is_some_and(|(_, p)| p.associative_with.iter().any(|with| *with == b))
}

pub fn properties(node: &Node) -> Option<&'static OperatorProps> {
    lookup(&node.identifier()).map(|(_, p)| p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operator_has_a_precedence_level() {
        for op in OperatorFn::ALL {
            let id = format!("OperatorNode:{}", op.name());
            assert!(lookup(&id).is_some(), "{id} missing");
        }
    }

    #[test]
    fn test_from_name_round_trips() {
        for op in OperatorFn::ALL {
            assert_eq!(OperatorFn::from_name(op.name()), Some(*op));
        }
    }

    #[test]
    fn test_levels() {
        assert_eq!(lookup("OperatorNode:add").map(|l| l.0), Some(12));
        assert_eq!(lookup("OperatorNode:pow").map(|l| l.0), Some(15));
        assert_eq!(lookup("RangeNode").map(|l| l.0), Some(11));
        assert!(lookup("SymbolNode").is_none());
    }
}
