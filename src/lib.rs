//! # mifkit
//!
//! Text extraction and merging for Adobe FrameMaker MIF documents.
//!
//! ## Features
//!
//! - Extracts paragraphs, text lines, variables, cross-reference formats,
//!   numbering formats and markers as translatable text units
//! - Only extracts content reachable from the selected page types
//! - Keeps everything else as skeleton, so the document can be rebuilt
//!   byte for byte around edited text
//! - Detects inline codes (font changes, autonumber building blocks) with
//!   configurable regex rules
//!
//! ## Quick Start
//!
//! ```
//! use mifkit::{writer, MifFilter, Parameters, RawDocument};
//!
//! let mif = "<MIFFile 2019>\n<TextFlow <Para <ParaLine <String `Hello'>>>>\n";
//! let mut filter = MifFilter::new(Parameters::default());
//! let events = filter.extract(RawDocument::from_text(mif)).unwrap();
//!
//! for unit in events.iter().filter_map(|e| e.as_text_unit()) {
//!     println!("{}: {}", unit.id, unit.source.to_generic());
//! }
//! assert_eq!(writer::write_events(&events), mif);
//! ```

pub mod codefinder;
pub mod error;
pub mod io;
pub mod mif;
pub mod params;
pub mod resource;
pub mod util;
pub mod writer;

pub use error::{Error, Result};
pub use io::RawDocument;
pub use mif::MifFilter;
pub use params::Parameters;
pub use resource::{Event, TextUnit};
