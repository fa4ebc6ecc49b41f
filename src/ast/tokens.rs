/// Classification of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Operators, brackets, separators and named keywords such as `mod`.
    ///
    /// The end of input is a delimiter with empty text.
    Delimiter,
    /// Numeric literal text, e.g. `2`, `.5`, `1.2e-3`
    Number,
    /// Identifier, e.g. `x`, `sin`, `α`, `$total`
    Symbol,
    /// Decoded contents of a double-quoted string literal
    String,
    /// Rest of the input after an unclassifiable character
    Unknown,
}

/// Lexical token produced by the [`Lexer`](crate::lexer::Lexer).
///
/// # Examples
///
/// ```text
/// 2 x + sin(y)
/// ```
///
/// tokenizes as `Number("2")`, `Symbol("x")`, `Delimiter("+")`,
/// `Symbol("sin")`, `Delimiter("(")`, `Symbol("y")`, `Delimiter(")")` and the
/// empty end delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Character offset of the first character of the token
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            offset,
        }
    }

    pub fn end(offset: usize) -> Self {
        Token::new(TokenKind::Delimiter, "", offset)
    }

    /// True for the empty delimiter that marks the end of input.
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::Delimiter && self.text.is_empty()
    }

    /// True if this is the delimiter `text`.
    pub fn is(&self, text: &str) -> bool {
        self.kind == TokenKind::Delimiter && self.text == text
    }

    /// True if this is one of the given delimiters.
    pub fn is_any(&self, texts: &[&str]) -> bool {
        self.kind == TokenKind::Delimiter && texts.contains(&self.text.as_str())
    }
}

/// Delimiters recognised by the lexer, longest first.
pub const DELIMITERS_3: &[&str] = &[">>>"];

pub const DELIMITERS_2: &[&str] = &[
    ".*", "./", ".^", "^|", "==", "!=", "<=", ">=", "<<", ">>",
];

pub const DELIMITERS_1: &[char] = &[
    ',', '(', ')', '[', ']', '{', '}', '"', ';', '+', '-', '*', '/', '%', '^', '~', '!', '&',
    '|', '\'', '=', ':', '?', '<', '>',
];

/// Words that lex as delimiters instead of symbols.
pub const NAMED_DELIMITERS: &[&str] = &["mod", "to", "in", "and", "xor", "or", "not"];

/// Symbols that may not be assigned or supplied in a scope.
pub const RESERVED_KEYWORDS: &[&str] = &["end"];

pub fn is_named_delimiter(word: &str) -> bool {
    NAMED_DELIMITERS.contains(&word)
}

pub fn is_reserved_keyword(word: &str) -> bool {
    RESERVED_KEYWORDS.contains(&word)
}
