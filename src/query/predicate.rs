//! Predicate tree and filter parser
//!
//! Grammar (AND binds tighter than OR, both left-associative):
//!
//! ```text
//! expr       := and_expr ( OR and_expr )*
//! and_expr   := factor ( AND factor )*
//! factor     := '(' expr ')' | comparison
//! comparison := column operator literal
//! ```
//!
//! Columns resolve through the request's [`ColumnScope`] and every literal is
//! typed from its column before it becomes a bound parameter.

use crate::catalog::ColumnType;

use super::errors::{QueryError, QueryResult, Stage};
use super::lexer::{Lexer, Spanned, Token};
use super::scope::{ColumnRef, ColumnScope};

/// Deepest parenthesis nesting accepted
pub const MAX_GROUP_DEPTH: usize = 32;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOp {
    /// SQL operator text
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
        }
    }
}

/// Typed literal
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

/// Boolean predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    Comparison {
        column: ColumnRef,
        op: ComparisonOp,
        literal: Literal,
    },
    And(Box<PredicateNode>, Box<PredicateNode>),
    Or(Box<PredicateNode>, Box<PredicateNode>),
}

impl PredicateNode {
    /// Create a comparison leaf
    pub fn comparison(column: ColumnRef, op: ComparisonOp, literal: Literal) -> Self {
        PredicateNode::Comparison {
            column,
            op,
            literal,
        }
    }

    /// `self AND other`
    pub fn and(self, other: PredicateNode) -> Self {
        PredicateNode::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: PredicateNode) -> Self {
        PredicateNode::Or(Box::new(self), Box::new(other))
    }

    /// Literals in left-to-right order
    pub fn literals(&self) -> Vec<&Literal> {
        let mut out = Vec::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals<'a>(&'a self, out: &mut Vec<&'a Literal>) {
        match self {
            PredicateNode::Comparison { literal, .. } => out.push(literal),
            PredicateNode::And(l, r) | PredicateNode::Or(l, r) => {
                l.collect_literals(out);
                r.collect_literals(out);
            }
        }
    }

    /// Number of comparison leaves
    pub fn comparison_count(&self) -> usize {
        match self {
            PredicateNode::Comparison { .. } => 1,
            PredicateNode::And(l, r) | PredicateNode::Or(l, r) => {
                l.comparison_count() + r.comparison_count()
            }
        }
    }
}

/// Parse a filter expression against the columns in scope
pub fn parse(filter: &str, scope: &ColumnScope<'_>) -> QueryResult<PredicateNode> {
    let tokens = Lexer::new(filter).tokenize()?;
    if tokens.is_empty() {
        return Err(QueryError::malformed_filter("filter is empty"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        scope,
    };
    let tree = parser.parse_expr()?;

    if let Some(extra) = parser.peek() {
        return Err(QueryError::malformed_filter(format!(
            "unexpected {} at position {}",
            extra.token.describe(),
            extra.pos
        )));
    }
    Ok(tree)
}

struct Parser<'s, 'c> {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    scope: &'s ColumnScope<'c>,
}

impl Parser<'_, '_> {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek().map(|s| &s.token) == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_expr(&mut self) -> QueryResult<PredicateNode> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = left.or(right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> QueryResult<PredicateNode> {
        let mut left = self.parse_factor()?;
        while self.eat(&Token::And) {
            let right = self.parse_factor()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> QueryResult<PredicateNode> {
        if self.eat(&Token::LParen) {
            self.depth += 1;
            if self.depth > MAX_GROUP_DEPTH {
                return Err(QueryError::malformed_filter(format!(
                    "groups nested deeper than {}",
                    MAX_GROUP_DEPTH
                )));
            }
            let inner = self.parse_expr()?;
            if !self.eat(&Token::RParen) {
                return Err(self.expected("')'"));
            }
            self.depth -= 1;
            return Ok(inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> QueryResult<PredicateNode> {
        let column_name = match self.next() {
            Some(Spanned {
                token: Token::Ident(name),
                ..
            }) => name,
            Some(other) => {
                return Err(QueryError::malformed_filter(format!(
                    "expected column name at position {}, found {}",
                    other.pos,
                    other.token.describe()
                )))
            }
            None => return Err(QueryError::malformed_filter("expected column name at end of filter")),
        };

        let op = match self.next() {
            Some(Spanned {
                token: Token::Op(op),
                ..
            }) => op,
            Some(other) => {
                return Err(QueryError::malformed_filter(format!(
                    "expected comparison operator after '{}', found {}",
                    column_name,
                    other.token.describe()
                )))
            }
            None => {
                return Err(QueryError::malformed_filter(format!(
                    "expected comparison operator after '{}'",
                    column_name
                )))
            }
        };

        let raw = match self.next() {
            Some(Spanned {
                token: Token::Number(n),
                ..
            }) => RawLiteral::Number(n),
            Some(Spanned {
                token: Token::Str(s),
                ..
            }) => RawLiteral::Quoted(s),
            Some(Spanned {
                token: Token::Ident(w),
                ..
            }) => RawLiteral::Word(w),
            Some(other) => {
                return Err(QueryError::malformed_filter(format!(
                    "expected literal after '{}', found {}",
                    column_name,
                    other.token.describe()
                )))
            }
            None => {
                return Err(QueryError::malformed_filter(format!(
                    "expected literal after '{} {}'",
                    column_name,
                    op.symbol()
                )))
            }
        };

        let column = self.scope.resolve(&column_name, Stage::Parse)?;
        let literal = type_literal(&column, raw)?;
        Ok(PredicateNode::comparison(column, op, literal))
    }

    fn expected(&self, what: &str) -> QueryError {
        match self.peek() {
            Some(found) => QueryError::malformed_filter(format!(
                "expected {} at position {}, found {}",
                what,
                found.pos,
                found.token.describe()
            )),
            None => QueryError::malformed_filter(format!("expected {} at end of filter", what)),
        }
    }
}

enum RawLiteral {
    Number(String),
    Quoted(String),
    Word(String),
}

impl RawLiteral {
    fn text(&self) -> &str {
        match self {
            RawLiteral::Number(s) | RawLiteral::Quoted(s) | RawLiteral::Word(s) => s,
        }
    }

    fn into_text(self) -> String {
        match self {
            RawLiteral::Number(s) | RawLiteral::Quoted(s) | RawLiteral::Word(s) => s,
        }
    }
}

/// Type a literal from the column it is compared against
fn type_literal(column: &ColumnRef, raw: RawLiteral) -> QueryResult<Literal> {
    match column.column_type {
        ColumnType::Integer | ColumnType::Float => {
            let text = raw.text().trim();
            if column.column_type == ColumnType::Integer {
                if let Ok(i) = text.parse::<i64>() {
                    return Ok(Literal::Integer(i));
                }
            }
            match text.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Literal::Float(f)),
                _ => Err(QueryError::malformed_filter(format!(
                    "column '{}' is numeric; '{}' is not a number",
                    column.column, text
                ))),
            }
        }
        ColumnType::Boolean => match raw.text().to_ascii_lowercase().as_str() {
            "true" | "t" => Ok(Literal::Boolean(true)),
            "false" | "f" => Ok(Literal::Boolean(false)),
            other => Err(QueryError::malformed_filter(format!(
                "column '{}' is boolean; '{}' is not true or false",
                column.column, other
            ))),
        },
        _ => Ok(Literal::Text(raw.into_text())),
    }
}
