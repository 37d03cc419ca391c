//! Non-translatable remainder of a document.

use serde::Serialize;
use std::fmt;

/// Rendering of a content placeholder in [`Skeleton`]'s `Display` output.
pub const SELF_PLACEHOLDER: &str = "[#$$self$]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkeletonPart {
    /// Native text written back unchanged.
    Text(String),
    /// Where the owning text unit's content goes.
    Content,
}

/// Literal native text interleaved with content placeholders.
///
/// Concatenating the skeletons of every event, with each placeholder replaced
/// by its unit's content, rebuilds the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Skeleton {
    parts: Vec<SkeletonPart>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parts(&self) -> &[SkeletonPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(SkeletonPart::Text(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(SkeletonPart::Text(text.to_owned()));
        }
    }

    pub fn add_content_placeholder(&mut self) {
        self.parts.push(SkeletonPart::Content);
    }

    /// Renders with `content` substituted for every placeholder.
    pub fn render(&self, content: &str) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                SkeletonPart::Text(text) => out.push_str(text),
                SkeletonPart::Content => out.push_str(content),
            }
        }
        out
    }
}

impl From<String> for Skeleton {
    fn from(text: String) -> Self {
        let mut skeleton = Self::new();
        if !text.is_empty() {
            skeleton.parts.push(SkeletonPart::Text(text));
        }
        skeleton
    }
}

impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                SkeletonPart::Text(text) => f.write_str(text)?,
                SkeletonPart::Content => f.write_str(SELF_PLACEHOLDER)?,
            }
        }
        Ok(())
    }
}
