//! Character literals and hexadecimal escapes.
//!
//! `<Char Name>` statements and `\xHH ` escapes inside strings both stand for
//! single characters. Escapes with no text equivalent (end of flow, end of
//! paragraph, unknown codes) are kept verbatim between [`ILC_START`] and
//! [`ILC_END`] so they can later become inline `ctrl` codes.

use crate::resource::{Code, Part};
use std::borrow::Cow;

/// Code type of inline-control spans.
pub const CONTROL_CODE_TYPE: &str = "ctrl";

/// Opens a span of native escape text embedded in decoded text.
pub const ILC_START: char = '\u{E00E}';
/// Closes a span opened by [`ILC_START`].
pub const ILC_END: char = '\u{E00F}';

/// Returns the text for a `<Char ...>` name.
///
/// Known names without a text form (`SoftHyphen`) map to `""`, and so do
/// unknown names, which are logged. Use [`is_known_char`] to tell them apart.
pub fn char_literal(name: &str) -> &'static str {
    known_char(name).unwrap_or_else(|| {
        tracing::warn!("unknown character name {name:?}");
        ""
    })
}

pub fn is_known_char(name: &str) -> bool {
    known_char(name).is_some()
}

fn known_char(name: &str) -> Option<&'static str> {
    let text = match name {
        "Tab" => "\t",
        "HardSpace" => "\u{00A0}",
        "SoftHyphen" => "",
        "DiscHyphen" => "\u{00AD}",
        "NoHyphen" => "\u{200D}",
        "Cent" => "\u{00A2}",
        "Pound" => "\u{00A3}",
        "Yen" => "\u{00A5}",
        "EnDash" => "\u{2013}",
        "EmDash" => "\u{2014}",
        "Dagger" => "\u{2020}",
        "DoubleDagger" => "\u{2021}",
        "Bullet" => "\u{2022}",
        "HardReturn" => "\n",
        "NumberSpace" => "\u{2007}",
        "ThinSpace" => "\u{2009}",
        "EnSpace" => "\u{2002}",
        "EmSpace" => "\u{2003}",
        "HardHyphen" => "\u{2011}",
        _ => return None,
    };
    Some(text)
}

/// Decodes the byte of a `\xHH ` escape.
pub fn hex_escape(byte: u8) -> Cow<'static, str> {
    let text = match byte {
        0x04 => "\u{00AD}",
        0x05 => "\u{200D}",
        0x08 => "\t",
        0x09 => "\n",
        0x10 => "\u{2007}",
        0x11 => "\u{00A0}",
        0x12 => "\u{2009}",
        0x13 => "\u{2002}",
        0x14 => "\u{2003}",
        0x15 => "\u{2011}",
        _ => {
            tracing::debug!("keeping \\x{byte:02x} as inline control");
            return Cow::Owned(format!("{ILC_START}\\x{byte:02x} {ILC_END}"));
        }
    };
    Cow::Borrowed(text)
}

/// Turns every bracketed inline-control span of `text` into a `ctrl` code
/// carrying the escape as written. A bracket without its partner is dropped.
pub fn split_inline_controls(text: String) -> Vec<Part> {
    if !text.contains(ILC_START) && !text.contains(ILC_END) {
        return vec![Part::Text(text)];
    }
    let mut parts = Vec::new();
    let mut rest = text.as_str();
    while let Some(start) = rest.find(ILC_START) {
        let after = &rest[start + ILC_START.len_utf8()..];
        let Some(end) = after.find(ILC_END) else {
            break;
        };
        push_text(&mut parts, &rest[..start]);
        parts.push(Part::Code(Code::placeholder(CONTROL_CODE_TYPE, &after[..end])));
        rest = &after[end + ILC_END.len_utf8()..];
    }
    if rest.contains(ILC_START) || rest.contains(ILC_END) {
        tracing::warn!("unmatched inline control bracket");
        let cleaned: String = rest.chars().filter(|&c| c != ILC_START && c != ILC_END).collect();
        push_text(&mut parts, &cleaned);
    } else {
        push_text(&mut parts, rest);
    }
    parts
}

fn push_text(parts: &mut Vec<Part>, text: &str) {
    if !text.is_empty() {
        parts.push(Part::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_literals() {
        assert_eq!(char_literal("Tab"), "\t");
        assert_eq!(char_literal("EmDash"), "\u{2014}");
        assert_eq!(char_literal("HardReturn"), "\n");
        assert_eq!(char_literal("SoftHyphen"), "");
        assert_eq!(char_literal("Gremlin"), "");
        assert!(is_known_char("SoftHyphen"));
        assert!(!is_known_char("Gremlin"));
    }

    #[test]
    fn test_hex_escape_table() {
        assert_eq!(hex_escape(0x14), "\u{2003}");
        assert_eq!(hex_escape(0x05), "\u{200D}");
        assert_eq!(hex_escape(0x09), "\n");
    }

    #[test]
    fn test_hex_escape_inline_control() {
        assert_eq!(hex_escape(0x0b), "\u{E00E}\\x0b \u{E00F}");
    }

    #[test]
    fn test_split_inline_controls() {
        let text = format!("a{}b", hex_escape(0x0b));
        let parts = split_inline_controls(text);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], Part::Text("a".into()));
        assert_eq!(parts[1], Part::Code(Code::placeholder("ctrl", "\\x0b ")));
        assert_eq!(parts[2], Part::Text("b".into()));
    }

    #[test]
    fn test_split_without_controls_is_identity() {
        assert_eq!(split_inline_controls("plain".into()), [Part::Text("plain".into())]);
    }

    #[test]
    fn test_unmatched_bracket_is_dropped() {
        let parts = split_inline_controls(format!("x{ILC_START}y"));
        assert_eq!(parts, [Part::Text("xy".into())]);
    }
}
