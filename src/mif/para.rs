//! Paragraph assembly.
//!
//! A paragraph body is first read into [`ParaUnit`]s, each carrying the exact
//! characters it was read from. [`assemble`] then turns the span between the
//! first and the last piece of text into one [`TextFragment`]:
//!
//! - units before the first text and after the last stay in the skeleton;
//! - strings that follow each other with only whitespace (or a line break
//!   between `ParaLine`s) in between are merged;
//! - other statements between texts become one placeholder code that closes
//!   the current string, carries the statements, and reopens the next string;
//! - inside a cross-reference, consecutive strings are separated by a hard
//!   return instead of being merged.

use crate::resource::{make_ref_marker, Code, TextFragment};

/// Which string statement a text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    String,
    NumberFormat,
}

const STRING_OPEN: &str = "<String `";
const STRING_CLOSE: &str = "'>";

/// One atomic piece of a paragraph body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParaUnit {
    /// Whitespace or a comment.
    Trivia(String),
    /// Any statement kept as-is; `tag` is its lowercased name.
    Statement { tag: String, raw: String },
    LineOpen(String),
    LineClose(String),
    Text {
        literal: Literal,
        text: String,
        raw: String,
        /// Length of `raw` up to and including the opening backtick.
        head: usize,
        /// Offset in `raw` of the closing quote.
        tail: usize,
        /// Read between `XRef` and `XRefEnd`.
        xref: bool,
    },
    /// A `<Char ...>` with its text; empty for characters dropped from text.
    Char { text: &'static str, raw: String },
    /// Reference codes to referent units produced from this position.
    Reference { code_type: &'static str, ids: Vec<String> },
    /// The `>` closing the paragraph.
    End(String),
}

impl ParaUnit {
    pub fn text(literal: Literal, text: String, raw: String) -> Self {
        let (head, tail) = match (raw.find('`'), raw.rfind('\'')) {
            (Some(open), Some(close)) if close > open => (open + 1, close),
            _ => (raw.len(), raw.len()),
        };
        ParaUnit::Text {
            literal,
            text,
            raw,
            head,
            tail,
            xref: false,
        }
    }

    /// Marks a text as read inside a cross-reference.
    pub fn in_xref(mut self, inside: bool) -> Self {
        if let ParaUnit::Text { xref, .. } = &mut self {
            *xref = inside;
        }
        self
    }

    /// The characters this unit was read from.
    pub fn raw(&self) -> &str {
        match self {
            ParaUnit::Trivia(raw)
            | ParaUnit::LineOpen(raw)
            | ParaUnit::LineClose(raw)
            | ParaUnit::End(raw)
            | ParaUnit::Statement { raw, .. }
            | ParaUnit::Text { raw, .. }
            | ParaUnit::Char { raw, .. } => raw,
            ParaUnit::Reference { .. } => "",
        }
    }

    fn is_anchor(&self) -> bool {
        match self {
            ParaUnit::Text { text, .. } => !text.is_empty(),
            ParaUnit::Char { text, .. } => !text.is_empty(),
            ParaUnit::Reference { ids, .. } => !ids.is_empty(),
            _ => false,
        }
    }
}

/// Native text between two pieces of paragraph text.
#[derive(Debug, Default)]
struct Run {
    data: String,
    types: Vec<String>,
    significant: bool,
}

impl Run {
    fn trivia(&mut self, raw: &str) {
        self.data.push_str(raw);
    }

    fn statement(&mut self, tag: &str, raw: &str) {
        self.data.push_str(raw);
        self.significant = true;
        if !tag.is_empty() && !self.types.iter().any(|t| t == tag) {
            self.types.push(tag.to_string());
        }
    }

    fn take(&mut self) -> (String, String) {
        let code_type = if self.types.is_empty() {
            "code".to_string()
        } else {
            self.types.join(";")
        };
        let data = std::mem::take(&mut self.data);
        *self = Run::default();
        (code_type, data)
    }
}

/// A string literal left open in the output.
struct Open {
    literal: Literal,
    close: String,
}

/// A paragraph split into skeleton before, extracted content, skeleton after.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub head: String,
    pub fragment: TextFragment,
    pub tail: String,
}

/// The paragraph's original characters.
pub fn verbatim(units: &[ParaUnit]) -> String {
    units.iter().map(ParaUnit::raw).collect()
}

/// Builds the extracted content of a paragraph; `None` if it has no text
/// and no reference.
pub fn assemble(units: &[ParaUnit]) -> Option<Assembly> {
    let first = units.iter().position(ParaUnit::is_anchor)?;
    let last = units.iter().rposition(ParaUnit::is_anchor)?;

    let mut head: String = units[..first].iter().map(ParaUnit::raw).collect();
    let mut fragment = TextFragment::new();
    let mut open: Option<Open> = None;
    let mut run = Run::default();
    let mut deferred = String::new();
    let mut skip_line_open = false;
    let mut after_text = false;
    let mut crossed_line = false;

    for index in first..=last {
        match &units[index] {
            ParaUnit::Trivia(raw) => run.trivia(raw),
            ParaUnit::Statement { tag, raw } => run.statement(tag, raw),
            ParaUnit::LineClose(raw) => {
                crossed_line = true;
                if next_is_line_open(&units[index + 1..=last]) {
                    skip_line_open = true;
                } else {
                    run.statement("paraline", raw);
                }
            }
            ParaUnit::LineOpen(raw) => {
                crossed_line = true;
                if !std::mem::take(&mut skip_line_open) {
                    run.statement("paraline", raw);
                }
            }
            ParaUnit::End(raw) => run.statement("", raw),
            ParaUnit::Char { text, .. } if text.is_empty() => {}
            ParaUnit::Char { text, .. } => {
                let joins = open.as_ref().is_some_and(|o| o.literal == Literal::String);
                if joins && !run.significant {
                    deferred.push_str(&run.take().1);
                } else {
                    let (code_type, mut data) = close_and_take(&mut open, &mut run);
                    data.push_str(STRING_OPEN);
                    push_code(&mut fragment, &mut head, index == first, code_type, data, false);
                    open = Some(Open {
                        literal: Literal::String,
                        close: STRING_CLOSE.to_string(),
                    });
                }
                fragment.append_text(text);
                after_text = false;
                crossed_line = false;
            }
            ParaUnit::Text {
                literal,
                text,
                raw,
                head: opener,
                tail,
                xref,
            } => {
                if text.is_empty() {
                    run.statement("string", raw);
                    continue;
                }
                let hard_return = *xref && after_text && (crossed_line || !run.significant);
                let joins = open.as_ref().is_some_and(|o| o.literal == *literal);
                if joins && !run.significant {
                    deferred.push_str(&run.take().1);
                } else {
                    let (code_type, mut data) = close_and_take(&mut open, &mut run);
                    data.push_str(&raw[..*opener]);
                    push_code(&mut fragment, &mut head, index == first, code_type, data, false);
                }
                open = Some(Open {
                    literal: *literal,
                    close: raw[*tail..].to_string(),
                });
                if hard_return {
                    fragment.append_text("\n");
                }
                fragment.append_text(text);
                after_text = true;
                crossed_line = false;
            }
            ParaUnit::Reference { code_type, ids } => {
                for id in ids {
                    let (_, mut data) = close_and_take(&mut open, &mut run);
                    data.push_str(&make_ref_marker(id));
                    push_code(&mut fragment, &mut head, false, code_type.to_string(), data, true);
                }
            }
        }
    }

    let mut tail = String::new();
    if let Some(open) = open {
        tail.push_str(&open.close);
    }
    tail.push_str(&deferred);
    tail.extend(units[last + 1..].iter().map(ParaUnit::raw));
    Some(Assembly {
        head,
        fragment,
        tail,
    })
}

fn next_is_line_open(rest: &[ParaUnit]) -> bool {
    rest.iter()
        .find(|unit| !matches!(unit, ParaUnit::Trivia(_)))
        .is_some_and(|unit| matches!(unit, ParaUnit::LineOpen(_)))
}

/// Closes the open string (if any) and takes the pending run.
fn close_and_take(open: &mut Option<Open>, run: &mut Run) -> (String, String) {
    let (code_type, data) = run.take();
    match open.take() {
        Some(open) => (code_type, open.close + &data),
        None => (code_type, data),
    }
}

/// Appends native data as a code, merging with a code the fragment ends
/// with. Data before the first text goes to the skeleton instead.
fn push_code(
    fragment: &mut TextFragment,
    head: &mut String,
    leading: bool,
    code_type: String,
    data: String,
    reference: bool,
) {
    if leading {
        head.push_str(&data);
        return;
    }
    if let Some(last) = fragment.last_code_mut() {
        last.data.push_str(&data);
        last.reference |= reference;
        return;
    }
    let code = if reference {
        Code::reference(code_type, data)
    } else {
        Code::placeholder(code_type, data)
    };
    fragment.append_code(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> ParaUnit {
        ParaUnit::text(Literal::String, value.to_string(), format!("<String `{value}'>"))
    }

    fn trivia(value: &str) -> ParaUnit {
        ParaUnit::Trivia(value.to_string())
    }

    fn statement(tag: &str, raw: &str) -> ParaUnit {
        ParaUnit::Statement {
            tag: tag.to_string(),
            raw: raw.to_string(),
        }
    }

    fn rebuild(a: &Assembly) -> String {
        let mut out = a.head.clone();
        for part in a.fragment.parts() {
            match part {
                crate::resource::Part::Text(t) => out.push_str(t),
                crate::resource::Part::Code(c) => out.push_str(&c.data),
            }
        }
        out.push_str(&a.tail);
        out
    }

    #[test]
    fn test_single_string() {
        let units = vec![
            statement("unique", "<Unique 1>"),
            trivia(" "),
            ParaUnit::LineOpen("<ParaLine ".into()),
            text("Hello"),
            trivia(" "),
            ParaUnit::LineClose(">".into()),
            ParaUnit::End(">".into()),
        ];
        let a = assemble(&units).unwrap();
        assert_eq!(a.head, "<Unique 1> <ParaLine <String `");
        assert_eq!(a.fragment.to_generic(), "Hello");
        assert_eq!(a.tail, "'> >>");
        assert_eq!(rebuild(&a), verbatim(&units));
    }

    #[test]
    fn test_statement_between_strings_becomes_code() {
        let units = vec![
            text("Hello"),
            trivia(" "),
            statement("font", "<Font <FTag `B'>>"),
            trivia(" "),
            text("World"),
            ParaUnit::End(">".into()),
        ];
        let a = assemble(&units).unwrap();
        assert_eq!(a.fragment.to_generic(), "Hello<1/>World");
        let code = a.fragment.codes().next().unwrap();
        assert_eq!(code.code_type, "font");
        assert_eq!(code.data, "'> <Font <FTag `B'>> <String `");
        assert_eq!(rebuild(&a), verbatim(&units));
    }

    #[test]
    fn test_lines_are_joined() {
        let units = vec![
            ParaUnit::LineOpen("<ParaLine ".into()),
            text("Hello "),
            ParaUnit::LineClose(">".into()),
            trivia("\n "),
            ParaUnit::LineOpen("<ParaLine ".into()),
            text("World"),
            ParaUnit::LineClose(">".into()),
            ParaUnit::End(">".into()),
        ];
        let a = assemble(&units).unwrap();
        assert_eq!(a.fragment.to_generic(), "Hello World");
        assert_eq!(a.head, "<ParaLine <String `");
        assert_eq!(a.tail, "'>\n >>");
    }

    #[test]
    fn test_lines_in_xref_keep_a_hard_return() {
        let units = vec![
            ParaUnit::LineOpen("<ParaLine ".into()),
            text("Refer to").in_xref(true),
            ParaUnit::LineClose(">".into()),
            trivia(" "),
            ParaUnit::LineOpen("<ParaLine ".into()),
            text("Para 2.").in_xref(true),
            trivia(" "),
            statement("xrefend", "<XRefEnd >"),
            ParaUnit::LineClose(">".into()),
            ParaUnit::End(">".into()),
        ];
        let a = assemble(&units).unwrap();
        assert_eq!(a.fragment.text(), "Refer to\nPara 2.");
        assert_eq!(a.fragment.codes().count(), 0);
        assert_eq!(a.tail, "'>  <XRefEnd >>>");
    }

    #[test]
    fn test_chars_join_strings() {
        let units = vec![
            text("a"),
            ParaUnit::Char {
                text: "\t",
                raw: "<Char Tab>".into(),
            },
            ParaUnit::Char {
                text: "",
                raw: "<Char SoftHyphen>".into(),
            },
            text("b"),
            ParaUnit::End(">".into()),
        ];
        let a = assemble(&units).unwrap();
        assert_eq!(a.fragment.to_generic(), "a\tb");
        assert_eq!(a.fragment.codes().count(), 0);
    }

    #[test]
    fn test_leading_char_opens_string() {
        let units = vec![
            ParaUnit::Char {
                text: "\u{2022}",
                raw: "<Char Bullet>".into(),
            },
            ParaUnit::End(">".into()),
        ];
        let a = assemble(&units).unwrap();
        assert_eq!(a.head, "<String `");
        assert_eq!(a.tail, "'>>");
    }

    #[test]
    fn test_reference_codes() {
        let units = vec![
            text("Index me"),
            trivia(" "),
            ParaUnit::Reference {
                code_type: "index",
                ids: vec!["tu1".into()],
            },
            trivia(" "),
            text("done"),
            ParaUnit::End(">".into()),
        ];
        let a = assemble(&units).unwrap();
        assert_eq!(a.fragment.to_generic(), "Index me<1/>done");
        let code = a.fragment.codes().next().unwrap();
        assert!(code.reference);
        assert_eq!(code.code_type, "index");
        assert_eq!(code.data, "'> [#$tu1] <String `");
    }

    #[test]
    fn test_no_text_gives_none() {
        let units = vec![
            statement("pgftag", "<PgfTag `Body'>"),
            ParaUnit::text(Literal::String, String::new(), "<String `'>".into()),
            ParaUnit::End(">".into()),
        ];
        assert!(assemble(&units).is_none());
        assert_eq!(verbatim(&units), "<PgfTag `Body'><String `'>>");
    }
}
