//! Generic document model produced by the filter.

mod event;
mod fragment;
mod skeleton;
mod unit;

pub use event::{DocumentPart, Ending, Event, StartDocument, StartGroup};
pub use fragment::{
    make_ref_marker, Code, Part, TagType, TextFragment, REF_MARKER_END, REF_MARKER_START,
};
pub use skeleton::{Skeleton, SkeletonPart, SELF_PLACEHOLDER};
pub use unit::TextUnit;
