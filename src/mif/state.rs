//! Mutable bookkeeping of the extraction pass.

use std::collections::VecDeque;

/// Kinds of open structures the extraction pass tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Table,
    Row,
    Cell,
    /// A `Notes` block; produces no group event itself.
    Notes,
    Footnote,
}

impl GroupKind {
    /// Group type reported in events; `None` for silent groups.
    pub fn group_type(self) -> Option<&'static str> {
        match self {
            GroupKind::Table => Some("table"),
            GroupKind::Row => Some("row"),
            GroupKind::Cell => Some("cell"),
            GroupKind::Footnote => Some("fn"),
            GroupKind::Notes => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenGroup {
    pub kind: GroupKind,
    /// Nesting level of the statement that opened the group.
    pub level: i32,
    pub id: Option<String>,
}

/// Open groups, innermost last. A group closes when the statement that
/// opened it closes.
#[derive(Debug, Default)]
pub struct GroupStack {
    open: Vec<OpenGroup>,
}

impl GroupStack {
    pub fn push(&mut self, kind: GroupKind, level: i32, id: Option<String>) {
        self.open.push(OpenGroup { kind, level, id });
    }

    /// Pops the innermost group if it was opened at `level`.
    pub fn close_at(&mut self, level: i32) -> Option<OpenGroup> {
        if self.open.last().is_some_and(|group| group.level == level) {
            self.open.pop()
        } else {
            None
        }
    }

    /// Id of the innermost group that has one.
    pub fn parent_id(&self) -> Option<&str> {
        self.open.iter().rev().find_map(|group| group.id.as_deref())
    }

    pub fn in_notes(&self) -> bool {
        self.open.iter().any(|group| group.kind == GroupKind::Notes)
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

/// What kind of block is being extracted paragraph by paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    TextFlow,
    Table,
}

/// Nesting and position state of the extraction pass.
#[derive(Debug, Default)]
pub struct ParseState {
    /// Depth of open `<` statements.
    pub block_level: i32,
    /// Level of the open `PgfCatalog`, if inside one.
    pub pgf_catalog_level: Option<i32>,
    /// Block to resume on the next read, with the level it stops at.
    pub in_block: Option<(BlockKind, i32)>,
    /// 1-based ordinal of the last `TextFlow` seen.
    pub text_flow_number: usize,
    /// Between an `XRef` and its `XRefEnd`.
    pub in_xref: bool,
    pub groups: GroupStack,
}

/// Ids of referent units produced while scanning a paragraph, waiting for
/// the paragraph's text assembly to reference them.
#[derive(Debug, Default)]
pub struct ReferentQueue {
    ids: VecDeque<String>,
}

impl ReferentQueue {
    pub fn push(&mut self, id: String) {
        self.ids.push_back(id);
    }

    pub fn drain(&mut self) -> Vec<String> {
        self.ids.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Sequential ids for units, parts and groups.
#[derive(Debug, Default)]
pub struct IdGenerator {
    units: usize,
    parts: usize,
    groups: usize,
}

impl IdGenerator {
    pub fn next_unit(&mut self) -> String {
        self.units += 1;
        format!("tu{}", self.units)
    }

    pub fn next_part(&mut self) -> String {
        self.parts += 1;
        format!("dp{}", self.parts)
    }

    pub fn next_group(&mut self) -> String {
        self.groups += 1;
        format!("g{}", self.groups)
    }
}
