//! Nesting-aware reading on top of the [`Scanner`].
//!
//! The cursor owns the parse state and the queue of pending events, so that
//! group boundaries met while searching for a statement are reported in
//! document order.

use std::collections::VecDeque;

use super::scanner::{Scanner, IMPORT_OBJECT};
use super::state::{GroupKind, IdGenerator, ParseState};
use crate::error::Result;
use crate::io::CharReader;
use crate::resource::{DocumentPart, Ending, Event, Skeleton, StartGroup};

pub struct Cursor {
    pub scanner: Scanner,
    pub state: ParseState,
    events: VecDeque<Event>,
    ids: IdGenerator,
    document_id: String,
}

impl Cursor {
    pub fn new(reader: CharReader, document_id: impl Into<String>) -> Self {
        Self {
            scanner: Scanner::new(reader),
            state: ParseState::default(),
            events: VecDeque::new(),
            ids: IdGenerator::default(),
            document_id: document_id.into(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn pop_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn next_unit_id(&mut self) -> String {
        self.ids.next_unit()
    }

    /// Emits `out` as a document part and clears it; nothing if empty.
    pub fn flush_part(&mut self, out: &mut String) {
        if out.is_empty() {
            return;
        }
        let id = self.ids.next_part();
        let skeleton = Skeleton::from(std::mem::take(out));
        self.events
            .push_back(Event::DocumentPart(DocumentPart { id, skeleton }));
    }

    /// Reads the name of a statement whose `<` was just consumed.
    pub fn open_statement(&mut self, out: &mut String) -> Result<String> {
        self.state.block_level += 1;
        self.scanner.read_tag(out)
    }

    /// Accounts for a `>` that was just consumed, ending the group opened
    /// by this statement if there is one.
    pub fn close_statement(&mut self, out: &mut String) {
        if let Some(group) = self.state.groups.close_at(self.state.block_level)
            && let Some(id) = group.id
        {
            self.flush_part(out);
            self.end_group(id);
        }
        self.state.block_level -= 1;
    }

    /// Consumes the rest of the current statement.
    pub fn skip_statement(&mut self, out: &mut String) -> Result<()> {
        self.scanner.skip_over_content(out)?;
        self.state.block_level -= 1;
        Ok(())
    }

    /// Reads the value of the current single-valued statement and closes it.
    pub fn read_value(&mut self, out: &mut String) -> Result<String> {
        let value = self.scanner.read_statement_value(out)?;
        self.state.block_level -= 1;
        Ok(value)
    }

    /// Starts a group tied to the current statement; it ends when the
    /// statement closes.
    pub fn start_group(&mut self, kind: GroupKind, out: &mut String) {
        let id = kind.group_type().map(|group_type| {
            self.flush_part(out);
            self.open_group(group_type, "")
        });
        self.state.groups.push(kind, self.state.block_level, id);
    }

    /// Emits a start-group event under the innermost open group.
    pub fn open_group(&mut self, group_type: &str, name: &str) -> String {
        let id = self.ids.next_group();
        let parent_id = self
            .state
            .groups
            .parent_id()
            .unwrap_or(&self.document_id)
            .to_string();
        self.events.push_back(Event::StartGroup(StartGroup {
            id: id.clone(),
            parent_id,
            group_type: group_type.to_string(),
            name: name.to_string(),
        }));
        id
    }

    pub fn end_group(&mut self, id: String) {
        self.events.push_back(Event::EndGroup(Ending {
            id,
            skeleton: Skeleton::new(),
        }));
    }

    /// Reads forward until a statement named in `names` opens, at any depth,
    /// and returns its name with the cursor placed after it.
    ///
    /// Returns `None` once a `>` brings the nesting level below `stop_level`.
    /// Rows, cells and footnotes met on the way open their groups. With
    /// `skip_notes`, matches inside a `Notes` block are ignored.
    pub fn read_until(
        &mut self,
        names: &[&str],
        out: &mut String,
        stop_level: i32,
        skip_notes: bool,
    ) -> Result<Option<String>> {
        loop {
            let c = self.scanner.require("statement content")?;
            out.push(c);
            match c {
                '#' => self.scanner.read_comment(out)?,
                '`' => self.scanner.skip_string_body(out)?,
                '\\' => out.push(self.scanner.require("escape")?),
                '<' => {
                    if let Some(name) = self.descend(names, out, skip_notes)? {
                        return Ok(Some(name));
                    }
                }
                '>' => {
                    self.close_statement(out);
                    if self.state.block_level < stop_level {
                        return Ok(None);
                    }
                }
                _ => {}
            }
        }
    }

    /// Opens the statement after a `<`, following its leading children down
    /// until a match, a group boundary, or the statement closing.
    fn descend(
        &mut self,
        names: &[&str],
        out: &mut String,
        skip_notes: bool,
    ) -> Result<Option<String>> {
        loop {
            let name = self.open_statement(out)?;
            if names.contains(&name.as_str()) && !(skip_notes && self.state.groups.in_notes()) {
                return Ok(Some(name));
            }
            match name.as_str() {
                "Row" => {
                    self.start_group(GroupKind::Row, out);
                    return Ok(None);
                }
                "Cell" => {
                    self.start_group(GroupKind::Cell, out);
                    return Ok(None);
                }
                "Notes" => {
                    self.start_group(GroupKind::Notes, out);
                    return Ok(None);
                }
                "FNote" | "Note" if self.state.groups.in_notes() => {
                    self.start_group(GroupKind::Footnote, out);
                    return Ok(None);
                }
                IMPORT_OBJECT => {
                    self.scanner.skip_over_import_object(out)?;
                    self.state.block_level -= 1;
                    return Ok(None);
                }
                _ => {}
            }
            if !self.scanner.read_until_open_or_close(out)? {
                self.close_statement(out);
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(text: &str) -> Cursor {
        Cursor::new(CharReader::from_text(text), "doc")
    }

    fn drain(cursor: &mut Cursor) -> Vec<Event> {
        std::iter::from_fn(|| cursor.pop_event()).collect()
    }

    #[test]
    fn test_read_until_finds_nested_statement() {
        let mut c = cursor("<TextFlow <TFTag `A'> <Para <PgfTag `Body'>>>");
        let mut out = String::new();
        assert_eq!(c.scanner.read().unwrap(), Some('<'));
        out.push('<');
        assert_eq!(c.open_statement(&mut out).unwrap(), "TextFlow");
        let found = c.read_until(&["Para"], &mut out, 1, false).unwrap();
        assert_eq!(found.as_deref(), Some("Para"));
        assert_eq!(c.state.block_level, 2);
        assert_eq!(out, "<TextFlow <TFTag `A'> <Para ");
    }

    #[test]
    fn test_read_until_stops_at_level() {
        let mut c = cursor(" <TFTag `A'>> tail");
        c.state.block_level = 1;
        let mut out = String::new();
        assert_eq!(c.read_until(&["Para"], &mut out, 1, false).unwrap(), None);
        assert_eq!(out, " <TFTag `A'>>");
        assert_eq!(c.state.block_level, 0);
    }

    #[test]
    fn test_rows_and_cells_open_groups() {
        let mut c = cursor(" <Row <Cell <CellContent <Para >>>>>");
        c.state.block_level = 1;
        c.state.groups.push(GroupKind::Table, 1, Some("g0".into()));
        let mut out = String::new();
        assert_eq!(c.read_until(&["Para"], &mut out, 1, false).unwrap().as_deref(), Some("Para"));
        let starts: Vec<StartGroup> = drain(&mut c)
            .into_iter()
            .filter_map(|e| match e {
                Event::StartGroup(start) => Some(start),
                _ => None,
            })
            .collect();
        let [row, cell] = starts.as_slice() else {
            panic!("expected row and cell groups, got {starts:?}");
        };
        assert_eq!(row.group_type, "row");
        assert_eq!(row.parent_id, "g0");
        assert_eq!(cell.group_type, "cell");
        assert_eq!(cell.parent_id, row.id);

        out.clear();
        assert_eq!(c.read_until(&["Para"], &mut out, 1, false).unwrap(), None);
        let events = drain(&mut c);
        let ends: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::EndGroup(end) => Some(end.id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ends, [cell.id.as_str(), row.id.as_str(), "g0"]);
    }

    #[test]
    fn test_notes_are_skipped_when_asked() {
        let mut c = cursor(" <Notes <FNote <TblID 9>>> <TblID 1>>");
        c.state.block_level = 1;
        let mut out = String::new();
        assert_eq!(c.read_until(&["TblID"], &mut out, 1, true).unwrap().as_deref(), Some("TblID"));
        assert_eq!(c.read_value(&mut out).unwrap(), "1");
        let footnotes = drain(&mut c)
            .into_iter()
            .filter(|e| matches!(e, Event::StartGroup(g) if g.group_type == "fn"))
            .count();
        assert_eq!(footnotes, 1);
    }

    #[test]
    fn test_unterminated_input_fails() {
        let mut c = cursor(" <Para ");
        c.state.block_level = 1;
        assert!(c.read_until(&["String"], &mut String::new(), 1, false).is_err());
    }
}
