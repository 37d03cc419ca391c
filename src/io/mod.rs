//! Input abstractions: random-access byte sources and incremental decoding.

mod adapter;
mod byte_source;
mod chars;
mod document;

pub use adapter::ByteSourceCursor;
pub use byte_source::{ByteSource, FileSource, MemorySource};
pub use chars::CharReader;
pub use document::RawDocument;
