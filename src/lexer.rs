use crate::{
    ast::tokens::{DELIMITERS_1, DELIMITERS_2, DELIMITERS_3, Token, TokenKind, is_named_delimiter},
    error::ParseError,
};

/// Character cursor over an expression.
///
/// The lexer tracks a nesting level: newlines are statement separators at
/// level 0 and plain whitespace inside parentheses, brackets and calls. Lexical
/// problems are recorded and the cursor keeps advancing; collect them with
/// [`Lexer::take_errors`].
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    nesting_level: usize,
    errors: Vec<ParseError>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            nesting_level: 0,
            errors: Vec::new(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Current character offset.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    /// Enter a parenthesised parameter list or index.
    pub fn enter_params(&mut self) {
        self.nesting_level += 1;
    }

    pub fn exit_params(&mut self) {
        self.nesting_level = self.nesting_level.saturating_sub(1);
    }

    /// Drop whatever input is left; the next token is the end delimiter.
    pub fn skip_to_end(&mut self) {
        self.position = self.input.len();
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    fn error(&mut self, err: ParseError) {
        log::debug!("lexer: {err}");
        self.errors.push(err);
    }

    fn is_whitespace(&self, ch: char) -> bool {
        ch == ' ' || ch == '\t' || ch == '\r' || (ch == '\n' && self.nesting_level > 0)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if self.is_whitespace(ch) => self.advance(),
                Some('@') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_char(i) == Some(c))
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_alpha(ch) || ch.is_ascii_digit() {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn is_decimal_mark(&self) -> bool {
        self.current_char() == Some('.')
            && !matches!(self.peek_char(1), Some('/') | Some('*') | Some('^'))
    }

    fn read_digits(&mut self, number: &mut String) {
        while let Some(ch) = self.current_char().filter(char::is_ascii_digit) {
            number.push(ch);
            self.advance();
        }
    }

    fn read_number(&mut self) -> String {
        let mut number = String::new();
        self.read_digits(&mut number);

        if self.is_decimal_mark() {
            number.push('.');
            self.advance();
            self.read_digits(&mut number);
        }

        if let Some(e @ ('e' | 'E')) = self.current_char() {
            match self.peek_char(1) {
                Some(next) if next.is_ascii_digit() || next == '-' || next == '+' => {
                    number.push(e);
                    self.advance();
                    if let Some(sign @ ('+' | '-')) = self.current_char() {
                        number.push(sign);
                        self.advance();
                    }
                    if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                        self.digit_expected();
                    }
                    self.read_digits(&mut number);
                    if self.is_decimal_mark() {
                        self.digit_expected();
                        self.advance();
                    }
                }
                Some('.') => {
                    self.advance();
                    self.digit_expected();
                    self.advance();
                }
                _ => {}
            }
        }

        number
    }

    fn digit_expected(&mut self) {
        let got = self.current_char().map(String::from).unwrap_or_default();
        let err = ParseError::lexical(format!("Digit expected, got \"{got}\""), self.position);
        self.error(err);
    }

    /// Read the body of a string literal. The cursor must sit just after the
    /// opening quote; the closing quote is consumed.
    pub fn read_string_literal(&mut self) -> Token {
        let start = self.position.saturating_sub(1);
        let mut result = String::new();

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Token::new(TokenKind::String, result, start);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('b') => result.push('\u{8}'),
                        Some('f') => result.push('\u{c}'),
                        Some('u') => {
                            let hex: String = (1..=4).filter_map(|i| self.peek_char(i)).collect();
                            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                                Some(c) if hex.len() == 4 => {
                                    result.push(c);
                                    self.position += 4;
                                }
                                _ => {
                                    result.push('\\');
                                    result.push('u');
                                }
                            }
                        }
                        Some(other) => result.push(other),
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        let err = ParseError::lexical("End of string \" expected", self.position);
        self.error(err);
        Token::new(TokenKind::String, result, start)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let start = self.position;

        let Some(ch) = self.current_char() else {
            return Token::end(start);
        };

        if ch == '\n' {
            self.advance();
            return Token::new(TokenKind::Delimiter, "\n", start);
        }

        for delim in DELIMITERS_3.iter().chain(DELIMITERS_2) {
            if self.starts_with(delim) {
                self.position += delim.chars().count();
                return Token::new(TokenKind::Delimiter, *delim, start);
            }
        }

        if DELIMITERS_1.contains(&ch) {
            self.advance();
            return Token::new(TokenKind::Delimiter, ch.to_string(), start);
        }

        if ch.is_ascii_digit() || ch == '.' {
            if ch == '.' && !self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                return Token::new(TokenKind::Delimiter, ".", start);
            }
            let number = self.read_number();
            return Token::new(TokenKind::Number, number, start);
        }

        if is_alpha(ch) {
            let word = self.read_identifier();
            let kind = if is_named_delimiter(&word) {
                TokenKind::Delimiter
            } else {
                TokenKind::Symbol
            };
            return Token::new(kind, word, start);
        }

        let rest: String = self.input[self.position..].iter().collect();
        self.skip_to_end();
        let err = ParseError::lexical(format!("Syntax error in part \"{rest}\""), start);
        self.error(err);
        Token::new(TokenKind::Unknown, rest, start)
    }
}

/// Holes in the Mathematical Alphanumeric Symbols block.
const MATH_ALPHANUMERIC_HOLES: &[u32] = &[
    0x1D455, 0x1D49D, 0x1D4A0, 0x1D4A1, 0x1D4A3, 0x1D4A4, 0x1D4A7, 0x1D4A8, 0x1D4AD, 0x1D4BA,
    0x1D4BC, 0x1D4C4, 0x1D506, 0x1D50B, 0x1D50C, 0x1D515, 0x1D51D, 0x1D53A, 0x1D53F, 0x1D545,
    0x1D547, 0x1D548, 0x1D549, 0x1D551, 0x1D6A6, 0x1D6A7, 0x1D7CC, 0x1D7CD,
];

/// Characters that may start an identifier.
pub fn is_alpha(ch: char) -> bool {
    let code = ch as u32;
    ch.is_ascii_alphabetic()
        || ch == '_'
        || ch == '$'
        || (0x00C0..=0x02AF).contains(&code)
        || (0x0370..=0x03FF).contains(&code)
        || (0x2100..=0x214F).contains(&code)
        || ((0x1D400..=0x1D7FF).contains(&code) && !MATH_ALPHANUMERIC_HOLES.contains(&code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.is_end() {
                break;
            }
            out.push((token.kind, token.text));
        }
        out
    }

    #[test]
    fn test_longest_delimiter_wins() {
        let toks = tokens("a >>> b >= c ^| d");
        let texts: Vec<&str> = toks.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, vec!["a", ">>>", "b", ">=", "c", "^|", "d"]);
    }

    #[test]
    fn test_named_delimiter_reclassified() {
        let toks = tokens("a mod b");
        assert_eq!(toks[1], (TokenKind::Delimiter, "mod".to_string()));
        let toks = tokens("modulo");
        assert_eq!(toks[0], (TokenKind::Symbol, "modulo".to_string()));
    }

    #[test]
    fn test_newline_inside_params_is_whitespace() {
        let mut lexer = Lexer::new("\n");
        assert!(lexer.next_token().is("\n"));

        let mut lexer = Lexer::new("\n1");
        lexer.enter_params();
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Number);
    }

    #[test]
    fn test_dot_operators_after_number() {
        let toks = tokens("2.*3");
        assert_eq!(toks[0], (TokenKind::Number, "2".to_string()));
        assert_eq!(toks[1], (TokenKind::Delimiter, ".*".to_string()));
    }

    #[test]
    fn test_greek_and_math_alphanumerics() {
        assert!(is_alpha('α'));
        assert!(is_alpha('\u{1D400}'));
        assert!(!is_alpha('\u{1D455}'));
        assert!(!is_alpha('#'));
    }
}
