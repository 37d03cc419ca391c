//! Text with inline codes.

use serde::Serialize;

/// Prefix of a reference marker placed in code data.
pub const REF_MARKER_START: &str = "[#$";
/// Suffix of a reference marker placed in code data.
pub const REF_MARKER_END: char = ']';

/// Builds the marker that stands for the text unit `id` inside code data.
pub fn make_ref_marker(id: &str) -> String {
    format!("{REF_MARKER_START}{id}{REF_MARKER_END}")
}

/// How a code relates to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagType {
    Opening,
    Closing,
    Placeholder,
}

/// An inline code: native markup carried verbatim inside extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Code {
    pub tag_type: TagType,
    /// Short classification such as `font`, `ctrl` or `x-inline`.
    pub code_type: String,
    /// Native data, written back unchanged.
    pub data: String,
    /// True when `data` holds reference markers to referent units.
    pub reference: bool,
}

impl Code {
    pub fn placeholder(code_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            tag_type: TagType::Placeholder,
            code_type: code_type.into(),
            data: data.into(),
            reference: false,
        }
    }

    pub fn reference(code_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            reference: true,
            ..Self::placeholder(code_type, data)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Part {
    Text(String),
    Code(Code),
}

/// Ordered sequence of text runs and codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextFragment {
    parts: Vec<Part>,
}

impl TextFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Part::Text(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(Part::Text(text.to_owned()));
        }
    }

    pub fn append_code(&mut self, code: Code) {
        self.parts.push(Part::Code(code));
    }

    /// The code at the very end of the fragment, if the fragment ends with one.
    pub fn last_code_mut(&mut self) -> Option<&mut Code> {
        match self.parts.last_mut() {
            Some(Part::Code(code)) => Some(code),
            _ => None,
        }
    }

    pub fn codes(&self) -> impl Iterator<Item = &Code> {
        self.parts.iter().filter_map(|part| match part {
            Part::Code(code) => Some(code),
            Part::Text(_) => None,
        })
    }

    /// Plain text without codes.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::Code(_) => None,
            })
            .collect()
    }

    /// True if any text outside codes is not whitespace.
    pub fn has_text(&self) -> bool {
        self.parts.iter().any(|part| match part {
            Part::Text(text) => text.chars().any(|c| !c.is_whitespace()),
            Part::Code(_) => false,
        })
    }

    pub fn has_reference(&self) -> bool {
        self.codes().any(|code| code.reference)
    }

    /// Rewrites every text run through `f`, which returns the parts replacing it.
    pub fn map_text<F>(self, mut f: F) -> Self
    where
        F: FnMut(String) -> Vec<Part>,
    {
        let mut out = Self::new();
        for part in self.parts {
            match part {
                Part::Text(text) => {
                    for replacement in f(text) {
                        match replacement {
                            Part::Text(text) => out.append_text(&text),
                            Part::Code(code) => out.append_code(code),
                        }
                    }
                }
                Part::Code(code) => out.append_code(code),
            }
        }
        out
    }

    /// Splits at each `separator` found in text runs; codes never split.
    /// `n` separators always give `n + 1` fragments.
    pub fn split_at_char(self, separator: char) -> Vec<Self> {
        let mut pieces = vec![Self::new()];
        for part in self.parts {
            match part {
                Part::Text(text) => {
                    let mut segments = text.split(separator);
                    if let Some(first) = segments.next()
                        && let Some(current) = pieces.last_mut()
                    {
                        current.append_text(first);
                    }
                    for segment in segments {
                        let mut next = Self::new();
                        next.append_text(segment);
                        pieces.push(next);
                    }
                }
                Part::Code(code) => {
                    if let Some(current) = pieces.last_mut() {
                        current.append_code(code);
                    }
                }
            }
        }
        pieces
    }

    /// Text with each code shown as `<N/>`, numbered from 1.
    pub fn to_generic(&self) -> String {
        let mut out = String::new();
        let mut index = 0;
        for part in &self.parts {
            match part {
                Part::Text(text) => out.push_str(text),
                Part::Code(code) => {
                    index += 1;
                    match code.tag_type {
                        TagType::Opening => out.push_str(&format!("<{index}>")),
                        TagType::Closing => out.push_str(&format!("</{index}>")),
                        TagType::Placeholder => out.push_str(&format!("<{index}/>")),
                    }
                }
            }
        }
        out
    }
}

impl From<&str> for TextFragment {
    fn from(text: &str) -> Self {
        let mut fragment = Self::new();
        fragment.append_text(text);
        fragment
    }
}
