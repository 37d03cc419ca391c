use super::skeleton::Skeleton;
use super::unit::TextUnit;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartDocument {
    pub id: String,
    pub name: Option<String>,
    pub encoding: &'static str,
    pub line_break: String,
    pub mime_type: &'static str,
    pub filter_id: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartGroup {
    pub id: String,
    pub parent_id: String,
    pub group_type: String,
    pub name: String,
}

/// Closes a group or the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ending {
    pub id: String,
    pub skeleton: Skeleton,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPart {
    pub id: String,
    pub skeleton: Skeleton,
}

/// Output of the filter, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    StartDocument(StartDocument),
    StartGroup(StartGroup),
    EndGroup(Ending),
    DocumentPart(DocumentPart),
    TextUnit(Box<TextUnit>),
    EndDocument(Ending),
    Canceled,
}

impl Event {
    pub fn as_text_unit(&self) -> Option<&TextUnit> {
        match self {
            Event::TextUnit(tu) => Some(tu),
            _ => None,
        }
    }

    /// The literal native text this event contributes, if any.
    pub fn skeleton(&self) -> Option<&Skeleton> {
        match self {
            Event::DocumentPart(part) => Some(&part.skeleton),
            Event::EndGroup(end) | Event::EndDocument(end) => Some(&end.skeleton),
            Event::TextUnit(tu) => Some(&tu.skeleton),
            Event::StartDocument(_) | Event::StartGroup(_) | Event::Canceled => None,
        }
    }
}
