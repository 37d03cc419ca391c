//! Rebuilding a document from its events.
//!
//! Skeletons are concatenated in event order. Each text unit is written at
//! its content placeholder, and reference markers inside code data are
//! replaced by the referent unit they point at. Referent units are never
//! written at their own position.

use std::collections::HashMap;

use crate::mif::encoder::escape_mif_char;
use crate::resource::{
    Event, Part, SkeletonPart, TextFragment, TextUnit, REF_MARKER_END, REF_MARKER_START,
};

/// Referents nested deeper than this are left as markers.
const MAX_REFERENCE_DEPTH: usize = 16;

/// Writes the document described by `events`.
pub fn write_events(events: &[Event]) -> String {
    let writer = Writer::new(events);
    let mut out = String::new();
    for event in events {
        match event {
            Event::TextUnit(unit) if unit.referent => {}
            Event::TextUnit(unit) => writer.write_unit(unit, &mut out, 0),
            other => {
                if let Some(skeleton) = other.skeleton() {
                    out.push_str(&skeleton.render(""));
                }
            }
        }
    }
    out
}

struct Writer<'a> {
    referents: HashMap<&'a str, &'a TextUnit>,
}

impl<'a> Writer<'a> {
    fn new(events: &'a [Event]) -> Self {
        let referents = events
            .iter()
            .filter_map(Event::as_text_unit)
            .filter(|unit| unit.referent)
            .map(|unit| (unit.id.as_str(), unit))
            .collect();
        Self { referents }
    }

    fn write_unit(&self, unit: &TextUnit, out: &mut String, depth: usize) {
        for part in unit.skeleton.parts() {
            match part {
                SkeletonPart::Text(text) => out.push_str(text),
                SkeletonPart::Content => self.write_content(&unit.source, out, depth),
            }
        }
    }

    fn write_content(&self, fragment: &TextFragment, out: &mut String, depth: usize) {
        for part in fragment.parts() {
            match part {
                Part::Text(text) => {
                    for c in text.chars() {
                        escape_mif_char(c, out);
                    }
                }
                Part::Code(code) if code.reference => self.expand_references(&code.data, out, depth),
                Part::Code(code) => out.push_str(&code.data),
            }
        }
    }

    fn expand_references(&self, data: &str, out: &mut String, depth: usize) {
        let finder = memchr::memmem::Finder::new(REF_MARKER_START);
        let mut rest = data;
        while let Some(start) = finder.find(rest.as_bytes()) {
            let after = &rest[start + REF_MARKER_START.len()..];
            let Some(end) = after.find(REF_MARKER_END) else {
                break;
            };
            out.push_str(&rest[..start]);
            let id = &after[..end];
            let marker_len = start + REF_MARKER_START.len() + end + REF_MARKER_END.len_utf8();
            match self.referents.get(id) {
                Some(unit) if depth < MAX_REFERENCE_DEPTH => self.write_unit(unit, out, depth + 1),
                _ => {
                    tracing::warn!("unresolved reference to {id:?}");
                    out.push_str(&rest[start..marker_len]);
                }
            }
            rest = &rest[marker_len..];
        }
        out.push_str(rest);
    }
}
