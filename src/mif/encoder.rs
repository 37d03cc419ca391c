//! Escaping text for MIF string literals.

use crate::resource::{Part, TextFragment};

/// Escapes one character for use inside a `` `...' `` string literal.
pub fn escape_mif_char(c: char, out: &mut String) {
    match c {
        '\\' => out.push_str("\\\\"),
        '>' => out.push_str("\\>"),
        '\t' => out.push_str("\\t"),
        '\n' => out.push_str("\\n"),
        '`' => out.push_str("\\Q"),
        '\'' => out.push_str("\\q"),
        _ => out.push(c),
    }
}

/// Escapes text for use inside a MIF string literal.
///
/// # Examples
///
/// ```
/// use mifkit::mif::escape_mif;
///
/// assert_eq!(escape_mif("a > b"), "a \\> b");
/// assert_eq!(escape_mif("it's `x`"), "it\\qs \\Qx\\Q");
/// ```
pub fn escape_mif(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        escape_mif_char(c, &mut out);
    }
    out
}

/// Writes a fragment as string-literal content: text escaped, code data as is.
pub fn encode_fragment(fragment: &TextFragment) -> String {
    let mut out = String::new();
    for part in fragment.parts() {
        match part {
            Part::Text(text) => {
                for c in text.chars() {
                    escape_mif_char(c, &mut out);
                }
            }
            Part::Code(code) => out.push_str(&code.data),
        }
    }
    out
}
