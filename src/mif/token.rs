//! Lexical tokens of a statement.

use super::statement::Statement;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Start,
    End,
    Identity,
    Literal,
    Statement,
}

/// One token; the concatenated text of all tokens is the original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Whitespace(String),
    /// Opening delimiter: `<`, `#`, `` ` ``, `(` or a facet name line.
    Start(String),
    /// Closing delimiter: `>`, `'`, `)`, a comment's line end or `=EndInset`.
    End(String),
    /// Statement name such as `Para`, or a macro keyword.
    Identity(String),
    /// Value text, stored exactly as written (escapes are not decoded).
    Literal(String),
    Statement(Statement),
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Whitespace(_) => TokenKind::Whitespace,
            Token::Start(_) => TokenKind::Start,
            Token::End(_) => TokenKind::End,
            Token::Identity(_) => TokenKind::Identity,
            Token::Literal(_) => TokenKind::Literal,
            Token::Statement(_) => TokenKind::Statement,
        }
    }

    /// Text of a leaf token; `None` for nested statements.
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Whitespace(text)
            | Token::Start(text)
            | Token::End(text)
            | Token::Identity(text)
            | Token::Literal(text) => Some(text),
            Token::Statement(_) => None,
        }
    }

    pub fn as_statement(&self) -> Option<&Statement> {
        match self {
            Token::Statement(statement) => Some(statement),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Statement(statement) => fmt::Display::fmt(statement, f),
            leaf => f.write_str(leaf.text().unwrap_or_default()),
        }
    }
}
