//! Filter expression lexer
//!
//! Turns a filter string into tokens: identifiers (optionally `table.column`
//! qualified), numbers, quoted strings, comparison operators, `AND`/`OR`
//! keywords (case-insensitive) and parentheses. Any other character is a
//! `MalformedFilter` error.

use super::errors::{QueryError, QueryResult};
use super::predicate::ComparisonOp;

/// Filter token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or bare word; may contain one `.` qualifier
    Ident(String),
    /// Numeric text, sign included
    Number(String),
    /// Quoted string with quotes removed and escapes resolved
    Str(String),
    /// Comparison operator
    Op(ComparisonOp),
    /// `AND` keyword
    And,
    /// `OR` keyword
    Or,
    /// `(`
    LParen,
    /// `)`
    RParen,
}

impl Token {
    /// Short description for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("'{}'", s),
            Token::Number(n) => format!("number {}", n),
            Token::Str(_) => "string literal".to_string(),
            Token::Op(op) => format!("operator '{}'", op.symbol()),
            Token::And => "AND".to_string(),
            Token::Or => "OR".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

/// A token with the byte offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

/// Filter lexer over a borrowed input
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for `input`
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Tokenize the whole input
    pub fn tokenize(mut self) -> QueryResult<Vec<Spanned>> {
        let mut tokens = Vec::new();
        while let Some(spanned) = self.next_token()? {
            tokens.push(spanned);
        }
        Ok(tokens)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek(0)?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn next_token(&mut self) -> QueryResult<Option<Spanned>> {
        self.skip_whitespace();
        let start = self.pos;

        let ch = match self.peek(0) {
            Some(ch) => ch,
            None => return Ok(None),
        };

        let token = match ch {
            '(' => {
                self.bump();
                Token::LParen
            }
            ')' => {
                self.bump();
                Token::RParen
            }
            '=' => {
                self.bump();
                Token::Op(ComparisonOp::Eq)
            }
            '!' => {
                self.bump();
                if self.peek(0) == Some('=') {
                    self.bump();
                    Token::Op(ComparisonOp::NotEq)
                } else {
                    return Err(QueryError::malformed_filter(format!(
                        "expected '=' after '!' at position {}",
                        start
                    )));
                }
            }
            '<' => {
                self.bump();
                match self.peek(0) {
                    Some('=') => {
                        self.bump();
                        Token::Op(ComparisonOp::LtEq)
                    }
                    Some('>') => {
                        self.bump();
                        Token::Op(ComparisonOp::NotEq)
                    }
                    _ => Token::Op(ComparisonOp::Lt),
                }
            }
            '>' => {
                self.bump();
                if self.peek(0) == Some('=') {
                    self.bump();
                    Token::Op(ComparisonOp::GtEq)
                } else {
                    Token::Op(ComparisonOp::Gt)
                }
            }
            '\'' | '"' => Token::Str(self.scan_string(ch)?),
            '-' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => {
                Token::Number(self.scan_number()?)
            }
            c if c.is_ascii_digit() => Token::Number(self.scan_number()?),
            c if is_ident_start(c) => self.scan_word()?,
            other => {
                return Err(QueryError::malformed_filter(format!(
                    "unexpected character '{}' at position {}",
                    other, start
                )))
            }
        };

        Ok(Some(Spanned { token, pos: start }))
    }

    /// Scan a quoted string; a doubled quote inside is an escaped quote.
    fn scan_string(&mut self, quote: char) -> QueryResult<String> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();

        loop {
            match self.bump() {
                Some(c) if c == quote => {
                    if self.peek(0) == Some(quote) {
                        self.bump();
                        value.push(quote);
                    } else {
                        return Ok(value);
                    }
                }
                Some(c) => value.push(c),
                None => {
                    return Err(QueryError::malformed_filter(format!(
                        "unterminated string starting at position {}",
                        start
                    )))
                }
            }
        }
    }

    fn scan_number(&mut self) -> QueryResult<String> {
        let start = self.pos;
        if self.peek(0) == Some('-') {
            self.bump();
        }
        let mut seen_dot = false;
        while let Some(c) = self.peek(0) {
            if c.is_ascii_digit() {
                self.bump();
            } else if c == '.' && !seen_dot && self.peek(1).is_some_and(|d| d.is_ascii_digit()) {
                seen_dot = true;
                self.bump();
            } else {
                break;
            }
        }

        if self.peek(0).is_some_and(is_ident_continue) {
            return Err(QueryError::malformed_filter(format!(
                "malformed number at position {}",
                start
            )));
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn scan_word(&mut self) -> QueryResult<Token> {
        let start = self.pos;
        self.consume_ident();

        if self.peek(0) == Some('.') {
            if self.peek(1).is_some_and(is_ident_start) {
                self.bump();
                self.consume_ident();
            } else {
                return Err(QueryError::malformed_filter(format!(
                    "malformed qualified name at position {}",
                    start
                )));
            }
        }

        let word = &self.input[start..self.pos];
        let token = if word.eq_ignore_ascii_case("and") {
            Token::And
        } else if word.eq_ignore_ascii_case("or") {
            Token::Or
        } else {
            Token::Ident(word.to_string())
        };
        Ok(token)
    }

    fn consume_ident(&mut self) {
        while self.peek(0).is_some_and(is_ident_continue) {
            self.bump();
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
