//! Character-level primitives for the extraction pass.
//!
//! Every method appends the characters it consumes to an `out` buffer, so
//! callers decide whether input goes to the skeleton, into a scratch buffer,
//! or nowhere.

use super::lexer::is_whitespace;
use super::literals::hex_escape;
use crate::error::{Error, Result};
use crate::io::CharReader;

pub(crate) const IMPORT_OBJECT: &str = "ImportObject";

pub struct Scanner {
    reader: CharReader,
}

impl Scanner {
    pub fn new(reader: CharReader) -> Self {
        Self { reader }
    }

    pub fn read(&mut self) -> Result<Option<char>> {
        Ok(self.reader.read_char()?)
    }

    pub fn unread(&mut self, c: char) {
        self.reader.unread(c);
    }

    pub fn require(&mut self, context: &'static str) -> Result<char> {
        self.read()?.ok_or(Error::UnexpectedEof(context))
    }

    fn require_in_string(&mut self) -> Result<char> {
        self.read()?.ok_or(Error::UnterminatedString)
    }

    /// Reads the rest of a comment, up to and including its line break.
    pub fn read_comment(&mut self, out: &mut String) -> Result<()> {
        while let Some(c) = self.read()? {
            out.push(c);
            if c == '\r' || c == '\n' {
                break;
            }
        }
        Ok(())
    }

    /// Reads a run of whitespace following `first`.
    pub fn read_whitespace(&mut self, first: char, out: &mut String) -> Result<()> {
        out.push(first);
        while let Some(c) = self.read()? {
            if !is_whitespace(c) {
                self.unread(c);
                break;
            }
            out.push(c);
        }
        Ok(())
    }

    /// Reads a statement name after `<`, with the whitespace that ends it.
    ///
    /// A name closed directly by `>` leaves the `>` unread.
    pub fn read_tag(&mut self, out: &mut String) -> Result<String> {
        let mut c = self.require("statement name")?;
        while is_whitespace(c) {
            out.push(c);
            c = self.require("statement name")?;
        }
        let mut name = String::new();
        loop {
            if c == '>' {
                out.push_str(&name);
                self.unread(c);
                return Ok(name);
            }
            if is_whitespace(c) {
                out.push_str(&name);
                out.push(c);
                return Ok(name);
            }
            name.push(c);
            c = self.require("statement name")?;
        }
    }

    /// Reads a string body after its opening backtick, through the closing quote.
    pub fn skip_string_body(&mut self, out: &mut String) -> Result<()> {
        loop {
            let c = self.require_in_string()?;
            out.push(c);
            if c == '\'' {
                return Ok(());
            }
        }
    }

    /// Reads to the `>` closing the current statement, over any nesting.
    pub fn skip_over_content(&mut self, out: &mut String) -> Result<()> {
        let mut depth = 1usize;
        loop {
            let c = self.require("statement content")?;
            out.push(c);
            match c {
                '`' => self.skip_string_body(out)?,
                '\\' => out.push(self.require("escape")?),
                '<' => {
                    depth += 1;
                    if self.read_tag(out)? == IMPORT_OBJECT {
                        self.skip_over_import_object(out)?;
                        depth -= 1;
                    }
                }
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Reads an `ImportObject` body through its closing `>`.
    ///
    /// Facet data lines (starting with `&`) may contain any character and are
    /// skipped whole.
    pub fn skip_over_import_object(&mut self, out: &mut String) -> Result<()> {
        #[derive(Clone, Copy)]
        enum State {
            Normal,
            InString,
            LineStart,
            FacetLine,
        }

        let mut depth = 1usize;
        let mut state = State::Normal;
        loop {
            let c = self.require("import object")?;
            out.push(c);
            state = match (state, c) {
                (State::InString, '\'') => State::Normal,
                (State::InString, _) => State::InString,
                (State::FacetLine, '\r' | '\n') => State::LineStart,
                (State::FacetLine, _) => State::FacetLine,
                (State::LineStart, '&') => State::FacetLine,
                (_, '\r' | '\n') => State::LineStart,
                (_, '`') => State::InString,
                (_, '<') => {
                    depth += 1;
                    State::Normal
                }
                (_, '>') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                    State::Normal
                }
                _ => State::Normal,
            };
        }
    }

    /// Reads up to the next `<` (returns true) or `>` (returns false).
    pub fn read_until_open_or_close(&mut self, out: &mut String) -> Result<bool> {
        loop {
            let c = self.require("statement content")?;
            out.push(c);
            match c {
                '`' => self.skip_string_body(out)?,
                '\\' => out.push(self.require("escape")?),
                '<' => return Ok(true),
                '>' => return Ok(false),
                _ => {}
            }
        }
    }

    /// Decodes the string value of the current statement (`` <String `...'> ``)
    /// and reads through the statement's closing `>`.
    pub fn read_string(&mut self, out: &mut String) -> Result<String> {
        let mut text = String::new();
        loop {
            let c = self.require("string statement")?;
            out.push(c);
            match c {
                '>' => return Ok(text),
                '`' => self.read_string_body(&mut text, out)?,
                _ => {}
            }
        }
    }

    fn read_string_body(&mut self, text: &mut String, out: &mut String) -> Result<()> {
        loop {
            let c = self.require_in_string()?;
            out.push(c);
            match c {
                '\'' => return Ok(()),
                '\\' => self.read_escape(text, out)?,
                _ => text.push(c),
            }
        }
    }

    fn read_escape(&mut self, text: &mut String, out: &mut String) -> Result<()> {
        let c = self.require_in_string()?;
        out.push(c);
        match c {
            '\\' | '>' => text.push(c),
            't' => text.push('\t'),
            'n' => text.push('\n'),
            'Q' => text.push('`'),
            'q' => text.push('\''),
            'u' => {
                if let Some(value) = self.read_hex(4, out)? {
                    match char::from_u32(value) {
                        Some(decoded) => text.push(decoded),
                        None => tracing::warn!("invalid code point \\u{value:04x}"),
                    }
                }
            }
            'x' => {
                let value = self.read_hex(2, out)?;
                match self.require_in_string()? {
                    ' ' => out.push(' '),
                    other => {
                        tracing::warn!("missing space after \\x escape");
                        self.unread(other);
                    }
                }
                if let Some(byte) = value {
                    text.push_str(&hex_escape(byte as u8));
                }
            }
            other => {
                tracing::warn!("unknown escape \\{other}");
                text.push(other);
            }
        }
        Ok(())
    }

    fn read_hex(&mut self, digits: usize, out: &mut String) -> Result<Option<u32>> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            let c = self.require_in_string()?;
            out.push(c);
            hex.push(c);
        }
        match u32::from_str_radix(&hex, 16) {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                tracing::warn!("invalid hexadecimal escape {hex:?}");
                Ok(None)
            }
        }
    }

    /// Reads the value of a single-valued statement (`<TblID 3>`, `<PgfTag `Body'>`)
    /// and the rest of the statement. Values are returned as written.
    pub fn read_statement_value(&mut self, out: &mut String) -> Result<String> {
        let mut c = self.require("statement value")?;
        while is_whitespace(c) {
            out.push(c);
            c = self.require("statement value")?;
        }
        let mut value = String::new();
        match c {
            '>' => {
                out.push(c);
                return Ok(value);
            }
            '<' => {
                self.unread(c);
            }
            '`' => {
                out.push(c);
                loop {
                    let c = self.require_in_string()?;
                    out.push(c);
                    if c == '\'' {
                        break;
                    }
                    value.push(c);
                }
            }
            first => {
                let mut c = first;
                while !is_whitespace(c) && c != '>' {
                    out.push(c);
                    value.push(c);
                    c = self.require("statement value")?;
                }
                out.push(c);
                if c == '>' {
                    return Ok(value);
                }
            }
        }
        self.skip_over_content(out)?;
        Ok(value)
    }

    /// Reads within the current statement until a direct child named in
    /// `names` starts (returns its name, positioned after it) or the statement
    /// closes (returns `None`, closing `>` consumed).
    pub fn find_child(&mut self, names: &[&str], out: &mut String) -> Result<Option<String>> {
        loop {
            let c = self.require("statement content")?;
            out.push(c);
            match c {
                '#' => self.read_comment(out)?,
                '`' => self.skip_string_body(out)?,
                '<' => {
                    let name = self.read_tag(out)?;
                    if names.contains(&name.as_str()) {
                        return Ok(Some(name));
                    }
                    if name == IMPORT_OBJECT {
                        self.skip_over_import_object(out)?;
                    } else {
                        self.skip_over_content(out)?;
                    }
                }
                '>' => return Ok(None),
                _ => {}
            }
        }
    }
}
