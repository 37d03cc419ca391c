//! Maker Interchange Format (FrameMaker) extraction.
//!
//! - [`lexer`] turns a document into [`Statement`] trees for analysis.
//! - [`extracts`] decides what is reachable from the extracted pages.
//! - [`filter`] re-reads the document and produces events.

pub mod cursor;
pub mod encoder;
pub mod extracts;
pub mod filter;
pub mod font_tags;
pub mod lexer;
pub mod literals;
pub mod para;
pub mod scanner;
pub mod state;
pub mod statement;
pub mod token;
pub mod version;

pub use encoder::{encode_fragment, escape_mif};
pub use extracts::{Extracts, PageFilter};
pub use filter::{MifFilter, FILTER_ID, MIME_TYPE};
pub use font_tags::FontTags;
pub use lexer::Statements;
pub use statement::{Statement, StatementKind};
pub use token::{Token, TokenKind};
pub use version::Version;
