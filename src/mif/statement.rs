//! Statements: token sequences with structural lookups.

use super::token::{Token, TokenKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// A run of whitespace between top-level statements (or the absence sentinel).
    Empty,
    Comment,
    Macro,
    Markup,
}

static EMPTY_STATEMENT: Statement = Statement::EMPTY;

/// A parsed statement.
///
/// Lookups never fail: asking for something that is not there gives the
/// empty string or the [`Statement::empty`] sentinel, so lookups can be chained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    kind: StatementKind,
    tokens: Vec<Token>,
}

impl Statement {
    /// Sentinel returned by lookups that find nothing.
    pub const EMPTY: Statement = Statement {
        kind: StatementKind::Empty,
        tokens: Vec::new(),
    };

    pub fn empty() -> &'static Statement {
        &EMPTY_STATEMENT
    }

    pub fn new(kind: StatementKind, tokens: Vec<Token>) -> Self {
        Self { kind, tokens }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.kind == StatementKind::Empty
    }

    /// Name of a markup statement or macro keyword; `""` when there is none.
    pub fn identity(&self) -> &str {
        self.first_token_of(TokenKind::Identity)
    }

    /// Text of the first direct token of `kind`; `""` when there is none.
    pub fn first_token_of(&self, kind: TokenKind) -> &str {
        self.tokens
            .iter()
            .find(|token| token.kind() == kind)
            .and_then(Token::text)
            .unwrap_or_default()
    }

    /// The statement's value: its first direct literal (`""` when absent).
    pub fn first_literal(&self) -> &str {
        self.first_token_of(TokenKind::Literal)
    }

    /// Direct child statements.
    pub fn children(&self) -> impl Iterator<Item = &Statement> {
        self.tokens.iter().filter_map(Token::as_statement)
    }

    /// Direct child statements named `identity`.
    pub fn statements_with<'a>(&'a self, identity: &str) -> impl Iterator<Item = &'a Statement> {
        self.children().filter(move |child| child.identity() == identity)
    }

    /// First direct child named `identity`, or the empty sentinel.
    pub fn first_statement_with(&self, identity: &str) -> &Statement {
        self.children()
            .find(|child| child.identity() == identity)
            .unwrap_or(&EMPTY_STATEMENT)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            fmt::Display::fmt(token, f)?;
        }
        Ok(())
    }
}
