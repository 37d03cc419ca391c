//! Structured reader turning a character stream into [`Statement`]s.
//!
//! Every character of the input ends up in exactly one token, so printing the
//! statements back reproduces the input. Whitespace between top-level
//! statements is returned as [`StatementKind::Empty`] statements.

use super::statement::{Statement, StatementKind};
use super::token::Token;
use crate::error::{Error, Result};
use crate::io::CharReader;

const COMMENT_START: char = '#';
const MARKUP_START: char = '<';
const MARKUP_END: char = '>';
const STRING_START: char = '`';
const STRING_END: char = '\'';
const MACRO_START: char = '(';
const MACRO_END: char = ')';
const FACET_START: char = '=';
const FACET_END: &str = "=EndInset";
const IMPORT_OBJECT: &str = "ImportObject";
const MACROS: [&str; 2] = ["define", "include"];

pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_line_break(c: char) -> bool {
    c == '\r' || c == '\n'
}

/// Iterator over the top-level statements of a document.
pub struct Statements {
    reader: CharReader,
    failed: bool,
}

impl Statements {
    pub fn new(reader: CharReader) -> Self {
        Self {
            reader,
            failed: false,
        }
    }

    fn next_statement(&mut self) -> Result<Option<Statement>> {
        let mut whitespace = String::new();
        loop {
            match self.reader.read_char()? {
                None if whitespace.is_empty() => return Ok(None),
                None => break,
                Some(c) if is_whitespace(c) => whitespace.push(c),
                Some(c) if whitespace.is_empty() => return self.statement_from(c).map(Some),
                Some(c) => {
                    self.reader.unread(c);
                    break;
                }
            }
        }
        Ok(Some(Statement::new(
            StatementKind::Empty,
            vec![Token::Whitespace(whitespace)],
        )))
    }

    fn statement_from(&mut self, first: char) -> Result<Statement> {
        match first {
            COMMENT_START => self.comment(),
            MARKUP_START => self.markup(),
            'd' | 'i' => {
                let mut word = String::from(first);
                let next = self.read_while(&mut word, |c| !is_whitespace(c), "macro")?;
                self.macro_statement(word, next)
            }
            other => Err(Error::UnsupportedStatement(other)),
        }
    }

    fn require(&mut self, context: &'static str) -> Result<char> {
        self.reader.read_char()?.ok_or(Error::UnexpectedEof(context))
    }

    /// Appends characters to `buf` while `accept` holds; returns the first rejected one.
    fn read_while(
        &mut self,
        buf: &mut String,
        accept: impl Fn(char) -> bool,
        context: &'static str,
    ) -> Result<char> {
        loop {
            let c = self.require(context)?;
            if !accept(c) {
                return Ok(c);
            }
            buf.push(c);
        }
    }

    /// A comment runs to the end of its line; a comment at the very end of
    /// the input has an empty end token.
    fn comment(&mut self) -> Result<Statement> {
        let mut text = String::new();
        let mut end = String::new();
        while let Some(c) = self.reader.read_char()? {
            if is_line_break(c) {
                end.push(c);
                break;
            }
            text.push(c);
        }
        Ok(Statement::new(
            StatementKind::Comment,
            vec![
                Token::Start(COMMENT_START.to_string()),
                Token::Literal(text),
                Token::End(end),
            ],
        ))
    }

    fn macro_statement(&mut self, keyword: String, next: char) -> Result<Statement> {
        let mut tokens = vec![Token::Identity(keyword)];
        let mut whitespace = String::from(next);
        let open = self.read_while(&mut whitespace, is_whitespace, "macro")?;
        tokens.push(Token::Whitespace(whitespace));
        tokens.push(Token::Start(open.to_string()));
        let mut body = String::new();
        let close = self.read_while(&mut body, |c| c != MACRO_END, "macro")?;
        tokens.push(Token::Literal(body));
        tokens.push(Token::End(close.to_string()));
        Ok(Statement::new(StatementKind::Macro, tokens))
    }

    fn string_literal(&mut self, tokens: &mut Vec<Token>) -> Result<()> {
        let mut text = String::new();
        let end = self.read_while(&mut text, |c| c != STRING_END, "string literal")?;
        tokens.push(Token::Start(STRING_START.to_string()));
        tokens.push(Token::Literal(text));
        tokens.push(Token::End(end.to_string()));
        Ok(())
    }

    /// Reads facet lines of an `ImportObject` up to and including `=EndInset`.
    fn facets(&mut self, name: String, next: char, tokens: &mut Vec<Token>) -> Result<()> {
        tokens.push(Token::Start(name));
        let mut next = next;
        loop {
            let mut breaks = String::from(next);
            let first = self.read_while(&mut breaks, is_line_break, "import object facet")?;
            tokens.push(Token::Whitespace(breaks));
            let mut line = String::from(first);
            next = self.read_while(&mut line, |c| !is_line_break(c), "import object facet")?;
            if line == FACET_END {
                tokens.push(Token::End(line));
                self.reader.unread(next);
                return Ok(());
            }
            if line.starts_with(FACET_START) {
                tokens.push(Token::Start(line));
            } else {
                tokens.push(Token::Literal(line));
            }
        }
    }

    fn markup(&mut self) -> Result<Statement> {
        let mut tokens = vec![Token::Start(MARKUP_START.to_string())];
        let mut has_identity = false;
        let mut import_object = false;
        loop {
            let mut whitespace = String::new();
            let c = self.read_while(&mut whitespace, is_whitespace, "markup statement")?;
            if !whitespace.is_empty() {
                tokens.push(Token::Whitespace(whitespace));
            }
            match c {
                MARKUP_END => {
                    tokens.push(Token::End(MARKUP_END.to_string()));
                    break;
                }
                COMMENT_START | MARKUP_START => {
                    tokens.push(Token::Statement(self.statement_from(c)?));
                    continue;
                }
                STRING_START => {
                    self.string_literal(&mut tokens)?;
                    continue;
                }
                _ => {}
            }

            let mut word = String::from(c);
            let next = self.read_while(
                &mut word,
                |c| !is_whitespace(c) && c != MARKUP_END,
                "markup statement",
            )?;
            if MACROS.contains(&word.as_str()) && next != MARKUP_END {
                tokens.push(Token::Statement(self.macro_statement(word, next)?));
                continue;
            }
            if import_object && word.starts_with(FACET_START) {
                self.facets(word, next, &mut tokens)?;
                continue;
            }
            self.reader.unread(next);
            if has_identity {
                tokens.push(Token::Literal(word));
            } else {
                import_object = word == IMPORT_OBJECT;
                has_identity = true;
                tokens.push(Token::Identity(word));
            }
        }
        Ok(Statement::new(StatementKind::Markup, tokens))
    }
}

impl Iterator for Statements {
    type Item = Result<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.next_statement().transpose();
        if matches!(result, Some(Err(_))) {
            self.failed = true;
        }
        result
    }
}
