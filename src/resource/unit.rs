use super::fragment::TextFragment;
use super::skeleton::Skeleton;
use serde::Serialize;

/// One extractable piece of text with its surrounding native markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextUnit {
    pub id: String,
    /// Optional resource name (the variable or format name for formats).
    pub name: String,
    /// Unit type such as `TextLine`, `VariableFormat` or `x-index`; empty for paragraphs.
    pub unit_type: String,
    pub source: TextFragment,
    /// Referents are written where a reference code points at them, not in place.
    pub referent: bool,
    pub preserve_whitespace: bool,
    pub mime_type: &'static str,
    pub skeleton: Skeleton,
}
