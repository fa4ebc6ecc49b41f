use std::rc::Rc;

use crate::{
    ast::{
        AccessorNode, ArrayNode, AssignmentNode, BlockEntry, BlockNode, ConditionalNode,
        ConstantNode, FunctionAssignmentNode, FunctionNode, IndexNode, Node, NodeRef, ObjectNode,
        OperatorFn, OperatorNode, ParenthesisNode, RangeNode, SymbolNode, Token, TokenKind,
        tokens::is_named_delimiter,
    },
    error::{ErrorKind, ParseError},
    lexer::Lexer,
};

/// Outcome of parsing one expression: the tree (complete or best effort) and
/// every lexical or syntax error encountered on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub node: Node,
    pub errors: Vec<ParseError>,
}

impl Parsed {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The tree if parsing was clean, otherwise the recorded errors.
    pub fn into_result(self) -> Result<Node, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.node)
        } else {
            Err(self.errors)
        }
    }
}

// Each nesting level costs a couple dozen parser frames; 64 levels stay well
// inside a 2 MB thread stack in debug builds.
const DEFAULT_MAX_DEPTH: usize = 64;

/// Recursive-descent parser. Each `parse_*` method handles one precedence
/// level and delegates its operands to the next tighter level.
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    /// Nesting level at which the innermost open `?` was seen
    conditional_level: Option<usize>,
    errors: Vec<ParseError>,
    depth: usize,
    max_depth: usize,
    depth_exceeded: bool,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
            conditional_level: None,
            errors: Vec::new(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            depth_exceeded: false,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Advance past an operator. An operator never ends a statement, so any
    /// newlines after it are skipped.
    fn advance_skip_newline(&mut self) {
        self.advance();
        while self.check("\n") {
            self.advance();
        }
    }

    fn check(&self, text: &str) -> bool {
        self.current_token.is(text)
    }

    fn offset(&self) -> usize {
        self.current_token.offset
    }

    fn error(&mut self, err: ParseError) {
        // Past the depth limit the rest of the input is skipped, so anything
        // else reported would only be fallout from the skip.
        if self.depth_exceeded && err.kind != ErrorKind::Limit {
            return;
        }
        log::debug!("parse error: {err}");
        self.errors.push(err);
    }

    fn syntax_error(&mut self, message: impl Into<String>) {
        let err = ParseError::syntax(message, self.offset());
        self.error(err);
    }

    fn placeholder() -> NodeRef {
        Rc::new(Node::Constant(ConstantNode::undefined()))
    }

    fn open_params(&mut self) {
        self.lexer.enter_params();
    }

    fn close_params(&mut self) {
        self.lexer.exit_params();
    }

    /// Parse the whole input.
    pub fn parse(&mut self) -> Parsed {
        let node = self.parse_block();

        if !self.current_token.is_end() {
            let token = self.current_token.clone();
            match token.kind {
                TokenKind::Delimiter => self.syntax_error(format!("Unexpected operator {}", token.text)),
                TokenKind::Unknown => {}
                _ => self.syntax_error(format!("Unexpected part \"{}\"", token.text)),
            }
        }

        let mut errors = self.lexer.take_errors();
        errors.append(&mut self.errors);
        errors.sort_by_key(|e| e.offset);

        Parsed {
            node: Rc::try_unwrap(node).unwrap_or_else(|shared| (*shared).clone()),
            errors,
        }
    }

    fn is_statement_end(&self) -> bool {
        self.current_token.is_end() || self.check("\n") || self.check(";")
    }

    fn parse_block(&mut self) -> NodeRef {
        let mut blocks: Vec<BlockEntry> = Vec::new();
        let mut node = None;

        if !self.is_statement_end() {
            node = Some(self.parse_assignment());
        }

        while self.check("\n") || self.check(";") {
            if blocks.is_empty()
                && let Some(first) = node.take()
            {
                blocks.push(BlockEntry {
                    node: first,
                    visible: !self.check(";"),
                });
            }
            self.advance();
            if !self.is_statement_end() {
                let statement = self.parse_assignment();
                blocks.push(BlockEntry {
                    node: statement,
                    visible: !self.check(";"),
                });
            }
        }

        if blocks.is_empty() {
            node.unwrap_or_else(Self::placeholder)
        } else {
            Rc::new(Node::Block(BlockNode { blocks }))
        }
    }

    fn depth_guard(&mut self) -> NodeRef {
        if !self.depth_exceeded {
            self.depth_exceeded = true;
            let err = ParseError::limit("Maximum nesting depth exceeded", self.offset());
            self.error(err);
        }
        self.lexer.skip_to_end();
        self.current_token = Token::end(self.lexer.position());
        Self::placeholder()
    }

    fn parse_assignment(&mut self) -> NodeRef {
        if self.depth >= self.max_depth {
            return self.depth_guard();
        }
        self.depth += 1;
        let node = self.parse_assignment_level();
        self.depth -= 1;
        node
    }

    /// `a = 2`, `a[1] = 2`, `a.b = 2` and `f(x, y) = x + y`.
    fn parse_assignment_level(&mut self) -> NodeRef {
        let node = self.parse_conditional();

        if !self.check("=") {
            return node;
        }
        let offset = self.offset();

        let built = match &*node {
            Node::Symbol(_) => {
                self.advance_skip_newline();
                let value = self.parse_assignment();
                Some(AssignmentNode::new(Rc::clone(&node), None, value).map(Node::Assignment))
            }
            Node::Accessor(accessor) => {
                self.advance_skip_newline();
                let value = self.parse_assignment();
                Some(
                    AssignmentNode::new(
                        Rc::clone(accessor.object()),
                        Some(Rc::clone(accessor.index_ref())),
                        value,
                    )
                    .map(Node::Assignment),
                )
            }
            Node::Function(call) if matches!(*call.callee, Node::Symbol(_)) => {
                let params: Option<Vec<String>> = call
                    .args
                    .iter()
                    .map(|arg| match &**arg {
                        Node::Symbol(s) => Some(s.name.clone()),
                        _ => None,
                    })
                    .collect();
                match params {
                    Some(params) => {
                        self.advance_skip_newline();
                        let expr = self.parse_assignment();
                        Some(
                            FunctionAssignmentNode::new(call.name(), params, expr)
                                .map(Node::FunctionAssignment),
                        )
                    }
                    None => None,
                }
            }
            _ => None,
        };

        match built {
            Some(Ok(assignment)) => Rc::new(assignment),
            Some(Err(e)) => {
                self.error(ParseError::syntax(e.to_string(), offset));
                node
            }
            None => {
                self.error(ParseError::syntax(
                    "Invalid left hand side of assignment operator \"=\"",
                    offset,
                ));
                self.advance_skip_newline();
                let _ = self.parse_assignment();
                node
            }
        }
    }

    /// `condition ? true_expr : false_expr`
    fn parse_conditional(&mut self) -> NodeRef {
        let mut node = self.parse_logical_or();

        while self.check("?") {
            let previous = self.conditional_level;
            self.conditional_level = Some(self.lexer.nesting_level());
            self.advance_skip_newline();

            let condition = node;
            let true_expr = self.parse_assignment();

            let false_expr = if self.check(":") {
                self.conditional_level = None;
                self.advance_skip_newline();
                self.parse_assignment()
            } else {
                self.syntax_error("False part of conditional expression expected");
                Self::placeholder()
            };

            node = Rc::new(Node::Conditional(ConditionalNode {
                condition,
                true_expr,
                false_expr,
            }));
            self.conditional_level = previous;
        }

        node
    }

    /// Left-associative loop over one binary precedence level.
    fn parse_binary(
        &mut self,
        operators: &[(&str, OperatorFn)],
        operand: fn(&mut Self) -> NodeRef,
    ) -> NodeRef {
        let mut node = operand(self);

        while let Some(&(op, func)) = operators.iter().find(|(op, _)| self.check(op)) {
            self.advance_skip_newline();
            let rhs = operand(self);
            node = Rc::new(Node::Operator(OperatorNode::new(op, func, vec![node, rhs])));
        }

        node
    }

    fn parse_logical_or(&mut self) -> NodeRef {
        self.parse_binary(&[("or", OperatorFn::Or)], Self::parse_logical_xor)
    }

    fn parse_logical_xor(&mut self) -> NodeRef {
        self.parse_binary(&[("xor", OperatorFn::Xor)], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> NodeRef {
        self.parse_binary(&[("and", OperatorFn::And)], Self::parse_bitwise_or)
    }

    fn parse_bitwise_or(&mut self) -> NodeRef {
        self.parse_binary(&[("|", OperatorFn::BitOr)], Self::parse_bitwise_xor)
    }

    fn parse_bitwise_xor(&mut self) -> NodeRef {
        self.parse_binary(&[("^|", OperatorFn::BitXor)], Self::parse_bitwise_and)
    }

    fn parse_bitwise_and(&mut self) -> NodeRef {
        self.parse_binary(&[("&", OperatorFn::BitAnd)], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> NodeRef {
        self.parse_binary(
            &[
                ("==", OperatorFn::Equal),
                ("!=", OperatorFn::Unequal),
                ("<", OperatorFn::Smaller),
                (">", OperatorFn::Larger),
                ("<=", OperatorFn::SmallerEq),
                (">=", OperatorFn::LargerEq),
            ],
            Self::parse_shift,
        )
    }

    fn parse_shift(&mut self) -> NodeRef {
        self.parse_binary(
            &[
                ("<<", OperatorFn::LeftShift),
                (">>", OperatorFn::RightArithShift),
                (">>>", OperatorFn::RightLogShift),
            ],
            Self::parse_conversion,
        )
    }

    fn parse_conversion(&mut self) -> NodeRef {
        self.parse_binary(&[("to", OperatorFn::To)], Self::parse_range)
    }

    /// `start:end` or `start:step:end`. A missing start is the constant `1`,
    /// a missing end is the symbol `end`.
    fn parse_range(&mut self) -> NodeRef {
        let node = if self.check(":") {
            let one = ConstantNode::number("1").unwrap_or_else(|_| ConstantNode::undefined());
            Rc::new(Node::Constant(one))
        } else {
            self.parse_add_subtract()
        };

        if !self.check(":") || self.conditional_level == Some(self.lexer.nesting_level()) {
            return node;
        }

        let mut params = vec![node];
        while self.check(":") && params.len() < 3 {
            self.advance_skip_newline();
            if self.current_token.is_any(&[")", "]", ",", ""]) {
                params.push(Rc::new(Node::Symbol(SymbolNode { name: "end".into() })));
            } else {
                params.push(self.parse_add_subtract());
            }
        }

        let mut params = params.into_iter();
        let (start, second, third) = (params.next(), params.next(), params.next());
        match (start, second, third) {
            (Some(start), Some(step), Some(end)) => {
                Rc::new(Node::Range(RangeNode::new(start, end, Some(step))))
            }
            (Some(start), Some(end), None) => Rc::new(Node::Range(RangeNode::new(start, end, None))),
            (Some(start), _, _) => start,
            _ => Self::placeholder(),
        }
    }

    fn parse_add_subtract(&mut self) -> NodeRef {
        self.parse_binary(
            &[("+", OperatorFn::Add), ("-", OperatorFn::Subtract)],
            Self::parse_multiply_divide,
        )
    }

    /// Explicit `* .* / ./ % mod` and implicit multiplication.
    fn parse_multiply_divide(&mut self) -> NodeRef {
        const OPERATORS: &[(&str, OperatorFn)] = &[
            ("*", OperatorFn::Multiply),
            (".*", OperatorFn::DotMultiply),
            ("/", OperatorFn::Divide),
            ("./", OperatorFn::DotDivide),
            ("%", OperatorFn::Mod),
            ("mod", OperatorFn::Mod),
        ];

        let mut node = self.parse_unary();
        let mut last = Rc::clone(&node);

        loop {
            if let Some(&(op, func)) = OPERATORS.iter().find(|(op, _)| self.check(op)) {
                self.advance_skip_newline();
                last = self.parse_unary();
                node = Rc::new(Node::Operator(OperatorNode::new(
                    op,
                    func,
                    vec![node, Rc::clone(&last)],
                )));
            } else if self.implicit_multiplication_follows(&node, &last) {
                last = self.parse_unary();
                node = Rc::new(Node::Operator(OperatorNode::implicit_multiply(
                    node,
                    Rc::clone(&last),
                )));
            } else {
                break;
            }
        }

        node
    }

    /// Whether the current token starts the right operand of an implicit
    /// multiplication with `node`.
    fn implicit_multiplication_follows(&self, node: &Node, last: &Node) -> bool {
        let token = &self.current_token;
        match token.kind {
            TokenKind::Symbol => true,
            TokenKind::Delimiter if token.text == "in" => matches!(node, Node::Constant(_)),
            TokenKind::Number => match last {
                Node::Constant(_) => false,
                Node::Operator(op) => op.func == OperatorFn::Factorial,
                _ => true,
            },
            TokenKind::Delimiter => token.text == "(",
            _ => false,
        }
    }

    /// Prefix `- + ~ not`.
    fn parse_unary(&mut self) -> NodeRef {
        const OPERATORS: &[(&str, OperatorFn)] = &[
            ("-", OperatorFn::UnaryMinus),
            ("+", OperatorFn::UnaryPlus),
            ("~", OperatorFn::BitNot),
            ("not", OperatorFn::Not),
        ];

        let Some(&(op, func)) = OPERATORS.iter().find(|(op, _)| self.check(op)) else {
            return self.parse_power();
        };

        if self.depth >= self.max_depth {
            return self.depth_guard();
        }
        self.depth += 1;
        self.advance_skip_newline();
        let operand = self.parse_unary();
        self.depth -= 1;

        Rc::new(Node::Operator(OperatorNode::new(op, func, vec![operand])))
    }

    /// `^ .^`, right-associative through [`Parser::parse_unary`].
    fn parse_power(&mut self) -> NodeRef {
        let node = self.parse_left_hand_operators();

        let func = if self.check("^") {
            OperatorFn::Pow
        } else if self.check(".^") {
            OperatorFn::DotPow
        } else {
            return node;
        };

        if self.depth >= self.max_depth {
            return self.depth_guard();
        }
        let op = self.current_token.text.clone();
        self.depth += 1;
        self.advance_skip_newline();
        let exponent = self.parse_unary();
        self.depth -= 1;

        Rc::new(Node::Operator(OperatorNode::new(op, func, vec![node, exponent])))
    }

    /// Postfix `!` and `'`, each followed by further accessors.
    fn parse_left_hand_operators(&mut self) -> NodeRef {
        let mut node = self.parse_symbol();

        loop {
            let func = if self.check("!") {
                OperatorFn::Factorial
            } else if self.check("'") {
                OperatorFn::Transpose
            } else {
                break;
            };
            let op = self.current_token.text.clone();
            self.advance_skip_newline();
            node = Rc::new(Node::Operator(OperatorNode::new(op, func, vec![node])));
            node = self.parse_accessors(node);
        }

        node
    }

    /// Symbols, including named delimiters used in value position.
    fn parse_symbol(&mut self) -> NodeRef {
        let token = &self.current_token;
        let is_symbol = token.kind == TokenKind::Symbol
            || (token.kind == TokenKind::Delimiter && is_named_delimiter(&token.text));
        if !is_symbol {
            return self.parse_string();
        }

        let name = token.text.clone();
        self.advance();
        let node = Rc::new(Node::Symbol(SymbolNode { name }));
        self.parse_accessors(node)
    }

    fn parse_string(&mut self) -> NodeRef {
        if !self.check("\"") {
            return self.parse_matrix();
        }

        let literal = self.lexer.read_string_literal();
        self.advance();
        let node = Rc::new(Node::Constant(ConstantNode::string(literal.text)));
        self.parse_accessors(node)
    }

    /// Comma separated items inside `[ ]`, up to a `;` or the closing bracket.
    fn parse_row(&mut self) -> ArrayNode {
        let mut items = vec![self.parse_assignment()];
        while self.check(",") {
            self.advance();
            items.push(self.parse_assignment());
        }
        ArrayNode { items }
    }

    fn expect_close(&mut self, close: &str) {
        if self.check(close) {
            self.close_params();
            self.advance();
        } else {
            self.syntax_error(format!("Parenthesis {close} expected"));
            self.close_params();
        }
    }

    /// `[1, 2, 3]` or `[1, 2; 3, 4]`.
    fn parse_matrix(&mut self) -> NodeRef {
        if !self.check("[") {
            return self.parse_object();
        }

        self.open_params();
        self.advance();

        let array = if self.check("]") {
            self.close_params();
            self.advance();
            ArrayNode { items: Vec::new() }
        } else {
            let first = self.parse_row();
            if self.check(";") {
                let mut rows = vec![first];
                while self.check(";") {
                    self.advance();
                    rows.push(self.parse_row());
                }
                self.expect_close("]");

                let columns = rows[0].items.len();
                for (r, row) in rows.iter().enumerate().skip(1) {
                    if row.items.len() != columns {
                        let err = ParseError::syntax(
                            format!("Column dimensions mismatch (row {r} doesn't have {columns} columns)"),
                            self.offset(),
                        );
                        self.error(err);
                    }
                }

                ArrayNode {
                    items: rows.into_iter().map(|row| Rc::new(Node::Array(row))).collect(),
                }
            } else {
                self.expect_close("]");
                first
            }
        };

        let node = Rc::new(Node::Array(array));
        self.parse_accessors(node)
    }

    /// `{key: value, "other key": value}`.
    fn parse_object(&mut self) -> NodeRef {
        if !self.check("{") {
            return self.parse_number();
        }

        self.open_params();
        let mut properties = Vec::new();

        loop {
            self.advance();
            if self.check("}") {
                break;
            }

            let key = if self.check("\"") {
                let literal = self.lexer.read_string_literal();
                self.advance();
                literal.text
            } else if self.current_token.kind == TokenKind::Symbol
                || (self.current_token.kind == TokenKind::Delimiter
                    && is_named_delimiter(&self.current_token.text))
            {
                let key = self.current_token.text.clone();
                self.advance();
                key
            } else {
                self.syntax_error("Symbol or string expected as object key");
                break;
            };

            if !self.check(":") {
                self.syntax_error("Colon : expected after object key");
                break;
            }
            self.advance();
            properties.push((key, self.parse_assignment()));

            if !self.check(",") {
                break;
            }
        }

        self.expect_close("}");
        let node = Rc::new(Node::Object(ObjectNode::new(properties)));
        self.parse_accessors(node)
    }

    fn parse_number(&mut self) -> NodeRef {
        if self.current_token.kind != TokenKind::Number {
            return self.parse_parentheses();
        }

        let node = match ConstantNode::number(&self.current_token.text) {
            Ok(constant) => Rc::new(Node::Constant(constant)),
            Err(e) => {
                self.syntax_error(e.to_string());
                Self::placeholder()
            }
        };
        self.advance();
        node
    }

    fn parse_parentheses(&mut self) -> NodeRef {
        if !self.check("(") {
            return self.parse_end();
        }

        self.open_params();
        self.advance();
        let content = self.parse_assignment();
        self.expect_close(")");

        let node = Rc::new(Node::Parenthesis(ParenthesisNode { content }));
        self.parse_accessors(node)
    }

    fn parse_end(&mut self) -> NodeRef {
        if self.current_token.is_end() {
            self.syntax_error("Unexpected end of expression");
        } else if self.check("'") {
            self.syntax_error("Value expected. Note: strings must be enclosed by double quotes");
        } else {
            self.syntax_error("Value expected");
        }
        Self::placeholder()
    }

    /// Comma separated arguments up to `close`.
    fn parse_arguments(&mut self, close: &str) -> Vec<NodeRef> {
        let mut args = Vec::new();
        if !self.check(close) {
            args.push(self.parse_assignment());
            while self.check(",") {
                self.advance();
                args.push(self.parse_assignment());
            }
        }
        args
    }

    /// Calls `f(a)`, indices `a[1, 2]` and properties `a.b`, in any order.
    fn parse_accessors(&mut self, mut node: NodeRef) -> NodeRef {
        loop {
            if self.check("(") {
                if !matches!(*node, Node::Symbol(_) | Node::Accessor(_) | Node::Function(_)) {
                    return node;
                }
                self.open_params();
                self.advance();
                let args = self.parse_arguments(")");
                self.expect_close(")");
                node = Rc::new(Node::Function(FunctionNode::new(node, args)));
            } else if self.check("[") {
                self.open_params();
                self.advance();
                let dimensions = self.parse_arguments("]");
                self.expect_close("]");
                node = Rc::new(Node::Accessor(AccessorNode::with_index(
                    node,
                    IndexNode::new(dimensions),
                )));
            } else if self.check(".") {
                self.advance();
                if self.current_token.kind != TokenKind::Symbol {
                    self.syntax_error("Property name expected after dot");
                    return node;
                }
                let property = Rc::new(Node::Constant(ConstantNode::string(
                    self.current_token.text.clone(),
                )));
                self.advance();
                match IndexNode::dot(vec![property]) {
                    Ok(index) => {
                        node = Rc::new(Node::Accessor(AccessorNode::with_index(node, index)));
                    }
                    Err(e) => {
                        self.syntax_error(e.to_string());
                        return node;
                    }
                }
            } else {
                return node;
            }
        }
    }
}

/// Parse a single expression.
pub fn parse(input: &str) -> Parsed {
    Parser::new(Lexer::new(input)).parse()
}

/// Parse each input independently; an error in one entry does not affect the
/// others.
pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Vec<Parsed> {
    inputs.iter().map(|input| parse(input.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_undefined_constant() {
        let parsed = parse("");
        assert!(parsed.is_ok());
        assert!(matches!(parsed.node, Node::Constant(ref c) if c.value() == "undefined"));
    }

    #[test]
    fn test_recovers_after_missing_operand() {
        let parsed = parse("2 + * 3");
        assert_eq!(parsed.errors.len(), 1);
        assert!(matches!(parsed.node, Node::Operator(_)));
    }

    #[test]
    fn test_depth_limit_is_reported_once() {
        let input = "(".repeat(50) + "1" + &")".repeat(50);
        let parsed = Parser::new(Lexer::new(&input)).with_max_depth(10).parse();
        let limits = parsed
            .errors
            .iter()
            .filter(|e| e.kind == ErrorKind::Limit)
            .count();
        assert_eq!(limits, 1);
    }

    #[test]
    fn test_depth_limit_suppresses_unclosed_brackets() {
        let input = "(".repeat(300) + "1" + &")".repeat(300);
        let parsed = parse(&input);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].kind, ErrorKind::Limit);
        assert_eq!(parsed.errors[0].message, "Maximum nesting depth exceeded");
    }

    #[test]
    fn test_nesting_below_default_limit() {
        let input = "[".repeat(40) + "1" + &"]".repeat(40);
        assert!(parse(&input).is_ok());
    }
}
