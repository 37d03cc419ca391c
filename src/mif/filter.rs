//! The MIF extraction filter.
//!
//! [`MifFilter`] runs in two passes over a [`RawDocument`]. The first pass
//! tokenizes the whole document into statements and works out which text
//! flows, tables and frames are reachable from the pages being extracted
//! (see [`Extracts`]). The second pass re-reads the document character by
//! character, copying everything it does not extract into skeleton and
//! producing one [`Event`] at a time.
//!
//! ```
//! use mifkit::{MifFilter, Parameters, RawDocument};
//!
//! let mif = "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `Hello'>>>>\n";
//! let mut filter = MifFilter::new(Parameters::default());
//! let events = filter.extract(RawDocument::from_text(mif)).unwrap();
//! let units: Vec<_> = events.iter().filter_map(|e| e.as_text_unit()).collect();
//! assert_eq!(units.len(), 1);
//! assert_eq!(units[0].source.text(), "Hello");
//! ```

use super::cursor::Cursor;
use super::encoder::{encode_fragment, escape_mif};
use super::extracts::Extracts;
use super::lexer::{is_whitespace, Statements};
use super::literals::{char_literal, is_known_char, split_inline_controls};
use super::para::{self, Literal, ParaUnit};
use super::scanner::IMPORT_OBJECT;
use super::state::{BlockKind, GroupKind, ReferentQueue};
use crate::codefinder::InlineCodeFinder;
use crate::error::{Error, Result};
use crate::io::RawDocument;
use crate::params::Parameters;
use crate::resource::{Ending, Event, Skeleton, StartDocument, TextFragment, TextUnit};

/// MIME type reported for MIF documents and units.
pub const MIME_TYPE: &str = "application/vnd.mif";
/// Identifier of this filter in start-document events.
pub const FILTER_ID: &str = "mif";

const DEFAULT_DOCUMENT_ID: &str = "doc";

/// Top-level statements copied to skeleton without looking inside.
const SKIPPED_STATEMENTS: &[&str] = &[
    "ColorCatalog",
    "ConditionCatalog",
    "BoolCondCatalog",
    "CombinedFontCatalog",
    "ElementDefCatalog",
    "FmtChangeListCatalog",
    "DefAttrValuesCatalog",
    "AttrCondExprCatalog",
    "FontCatalog",
    "RulingCatalog",
    "TblCatalog",
    "KumihanCatalog",
    "Views",
    "MarkerTypeCatalog",
    "Document",
    "BookComponent",
    "InitialAutoNums",
    "Dictionary",
];

/// Pulls [`Event`]s out of a MIF document.
///
/// Call [`open`](Self::open), then [`next_event`](Self::next_event) (or
/// iterate) until it returns `None`. A fatal error ends the stream.
#[derive(Default)]
pub struct MifFilter {
    params: Parameters,
    run: Option<Extraction>,
    opened: bool,
    canceled: bool,
}

impl MifFilter {
    pub fn new(params: Parameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Analyzes `document` and prepares extraction.
    ///
    /// Lexical errors and version problems are reported here, before any
    /// event is produced.
    pub fn open(&mut self, document: RawDocument) -> Result<()> {
        self.close();
        let statements = Statements::new(document.open_reader()?);
        let extracts = Extracts::analyze(&self.params, statements)?;

        let mut finder = InlineCodeFinder::new();
        if self.params.use_code_finder {
            finder.add_rules(self.params.code_finder_rules.iter().cloned());
            finder.add_rules(extracts.inline_code_finder_rules());
            finder.compile()?;
        }

        let reader = document.open_reader()?;
        let encoding = reader.encoding().name();
        let id = document.id().unwrap_or(DEFAULT_DOCUMENT_ID);
        let mut cursor = Cursor::new(reader, id);
        cursor.push_event(Event::StartDocument(StartDocument {
            id: id.to_string(),
            name: document.name().map(str::to_string),
            encoding,
            line_break: extracts.line_break().to_string(),
            mime_type: MIME_TYPE,
            filter_id: FILTER_ID,
        }));

        self.run = Some(Extraction {
            params: self.params.clone(),
            extracts,
            finder,
            cursor,
            skel: String::new(),
            referents: ReferentQueue::default(),
            done: false,
        });
        self.opened = true;
        Ok(())
    }

    /// Produces the next event; `None` once the document has ended.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        let Some(run) = self.run.as_mut() else {
            return if self.opened {
                Ok(None)
            } else {
                Err(Error::NotOpen)
            };
        };
        if self.canceled {
            self.run = None;
            self.canceled = false;
            return Ok(Some(Event::Canceled));
        }
        match run.next_event() {
            Ok(Some(event)) => Ok(Some(event)),
            Ok(None) => {
                self.run = None;
                Ok(None)
            }
            Err(err) => {
                self.run = None;
                Err(err)
            }
        }
    }

    /// Makes the next request return [`Event::Canceled`] and end the stream.
    pub fn cancel(&mut self) {
        if self.run.is_some() {
            self.canceled = true;
        }
    }

    pub fn close(&mut self) {
        self.run = None;
        self.opened = false;
        self.canceled = false;
    }

    /// Opens `document` and collects every event.
    pub fn extract(&mut self, document: RawDocument) -> Result<Vec<Event>> {
        self.open(document)?;
        let events = self.by_ref().collect::<Result<Vec<_>>>();
        self.close();
        events
    }
}

impl Iterator for MifFilter {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.run.is_none() {
            return None;
        }
        self.next_event().transpose()
    }
}

/// Name and type given to the units built from one piece of content.
#[derive(Clone, Copy)]
struct UnitInfo<'a> {
    name: &'a str,
    unit_type: &'a str,
}

impl<'a> UnitInfo<'a> {
    const PARAGRAPH: Self = Self::typed("");

    const fn typed(unit_type: &'a str) -> Self {
        Self { name: "", unit_type }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ParaMode {
    /// A `Para` in a text flow or table cell.
    Body,
    /// A `Pgf` entry of the paragraph catalog.
    Catalog,
}

#[derive(Clone, Copy)]
enum Container {
    Line,
    Format,
}

/// Where the paragraph scanner is inside the current paragraph.
struct ParaScan {
    mode: ParaMode,
    containers: Vec<Container>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FormatKind {
    Variable,
    Reference,
}

impl FormatKind {
    fn entry(self) -> &'static str {
        match self {
            FormatKind::Variable => "VariableFormat",
            FormatKind::Reference => "XRefFormat",
        }
    }

    fn name_tag(self) -> &'static str {
        match self {
            FormatKind::Variable => "VariableName",
            FormatKind::Reference => "XRefName",
        }
    }

    fn definition_tag(self) -> &'static str {
        match self {
            FormatKind::Variable => "VariableDef",
            FormatKind::Reference => "XRefDef",
        }
    }

    fn group_name(self) -> &'static str {
        match self {
            FormatKind::Variable => "Variables",
            FormatKind::Reference => "XRefs",
        }
    }
}

/// State of one open document.
struct Extraction {
    params: Parameters,
    extracts: Extracts,
    finder: InlineCodeFinder,
    cursor: Cursor,
    skel: String,
    referents: ReferentQueue,
    done: bool,
}

impl Extraction {
    fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            if let Some(event) = self.cursor.pop_event() {
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }
            self.read()?;
        }
    }

    /// Advances through the document until at least one event is queued.
    fn read(&mut self) -> Result<()> {
        if let Some((kind, stop_level)) = self.cursor.state.in_block {
            return self.process_block(kind, stop_level);
        }

        while let Some(c) = self.cursor.scanner.read()? {
            self.skel.push(c);
            match c {
                '#' => self.cursor.scanner.read_comment(&mut self.skel)?,
                '<' => {
                    let tag = self.cursor.open_statement(&mut self.skel)?;
                    let level = self.cursor.state.block_level;
                    match tag.as_str() {
                        name if SKIPPED_STATEMENTS.contains(&name) => {
                            self.cursor.skip_statement(&mut self.skel)?
                        }
                        "PgfCatalog" => {
                            self.cursor.state.pgf_catalog_level = Some(level);
                            continue;
                        }
                        "Tbls" => continue,
                        "Pgf" if self.cursor.state.pgf_catalog_level == Some(level - 1) => {
                            self.process_catalog_format()?
                        }
                        "TextFlow" => self.start_text_flow(level)?,
                        "Tbl" => self.start_table(level)?,
                        "VariableFormats" if self.params.extract_variables => {
                            self.process_formats(FormatKind::Variable, level)?
                        }
                        "XRefFormats" if self.params.extract_reference_formats => {
                            self.process_formats(FormatKind::Reference, level)?
                        }
                        "Page" => self.process_page(level)?,
                        "AFrames" => self.process_frames_and_text_lines(level)?,
                        _ => self.cursor.skip_statement(&mut self.skel)?,
                    }
                    self.cursor.flush_part(&mut self.skel);
                    return Ok(());
                }
                '>' => {
                    self.cursor.close_statement(&mut self.skel);
                    let level = self.cursor.state.block_level;
                    if self.cursor.state.pgf_catalog_level.is_some_and(|l| l > level) {
                        self.cursor.state.pgf_catalog_level = None;
                    }
                    self.cursor.flush_part(&mut self.skel);
                    return Ok(());
                }
                _ => {}
            }
        }

        let skeleton = Skeleton::from(std::mem::take(&mut self.skel));
        let id = self.cursor.document_id().to_string();
        self.cursor.push_event(Event::EndDocument(Ending { id, skeleton }));
        self.done = true;
        Ok(())
    }

    /// Extracts the next paragraph of the block, or leaves the block.
    fn process_block(&mut self, kind: BlockKind, stop_level: i32) -> Result<()> {
        let found = self
            .cursor
            .read_until(&["Para"], &mut self.skel, stop_level, false)?;
        if found.is_some() {
            self.process_para(ParaMode::Body, UnitInfo::PARAGRAPH)?;
            self.cursor.state.in_block = Some((kind, stop_level));
        } else {
            self.cursor.state.in_block = None;
        }
        self.cursor.flush_part(&mut self.skel);
        Ok(())
    }

    fn start_text_flow(&mut self, level: i32) -> Result<()> {
        self.cursor.state.text_flow_number += 1;
        let ordinal = self.cursor.state.text_flow_number.to_string();
        if !self.extracts.text_flow_extractable(&ordinal) {
            tracing::debug!("skipping text flow {ordinal}");
            return self.cursor.skip_statement(&mut self.skel);
        }
        self.process_block(BlockKind::TextFlow, level)
    }

    fn start_table(&mut self, level: i32) -> Result<()> {
        if self
            .cursor
            .read_until(&["TblID"], &mut self.skel, level, true)?
            .is_none()
        {
            return Err(Error::MissingStatement("TblID in Tbl"));
        }
        let id = self.cursor.read_value(&mut self.skel)?;
        if !self.extracts.table_extractable(&id) {
            tracing::debug!("skipping table {id}");
            return self.cursor.skip_statement(&mut self.skel);
        }
        self.cursor.start_group(GroupKind::Table, &mut self.skel);
        self.process_block(BlockKind::Table, level)
    }

    fn process_catalog_format(&mut self) -> Result<()> {
        let level = self.cursor.state.block_level;
        if self
            .cursor
            .read_until(&["PgfTag"], &mut self.skel, level, true)?
            .is_none()
        {
            return Err(Error::MissingStatement("PgfTag in Pgf"));
        }
        let tag = self.cursor.read_value(&mut self.skel)?;
        if !self.extracts.paragraph_format_tag_extractable(&tag) {
            return self.cursor.skip_statement(&mut self.skel);
        }
        let info = UnitInfo {
            name: &tag,
            unit_type: "PgfNumFormat",
        };
        self.process_para(ParaMode::Catalog, info)
    }

    fn process_page(&mut self, level: i32) -> Result<()> {
        if self
            .cursor
            .read_until(&["PageType"], &mut self.skel, level, true)?
            .is_none()
        {
            return Err(Error::MissingStatement("PageType in Page"));
        }
        let page_type = self.cursor.read_value(&mut self.skel)?;
        if page_type.is_empty() {
            return Err(Error::MissingStatement("PageType value in Page"));
        }
        if !self.extracts.page_type_extractable(&page_type) {
            return self.cursor.skip_statement(&mut self.skel);
        }
        self.process_frames_and_text_lines(level)
    }

    /// Extracts the text lines of the statement open at `stop_level` and of
    /// the extractable frames inside it.
    fn process_frames_and_text_lines(&mut self, stop_level: i32) -> Result<()> {
        loop {
            let found = self.cursor.read_until(
                &["Frame", "TextLine"],
                &mut self.skel,
                stop_level,
                true,
            )?;
            let Some(tag) = found else {
                return Ok(());
            };
            let level = self.cursor.state.block_level;
            if tag == "TextLine" {
                self.process_text_line(level)?;
                continue;
            }
            if self
                .cursor
                .read_until(&["Unique"], &mut self.skel, level, true)?
                .is_none()
            {
                return Err(Error::MissingStatement("Unique in Frame"));
            }
            let unique = self.cursor.read_value(&mut self.skel)?;
            if unique.is_empty() {
                return Err(Error::MissingStatement("Unique value in Frame"));
            }
            if self.extracts.frame_extractable(&unique) {
                self.process_frames_and_text_lines(level)?;
            } else {
                self.cursor.skip_statement(&mut self.skel)?;
            }
        }
    }

    fn process_text_line(&mut self, level: i32) -> Result<()> {
        while self
            .cursor
            .read_until(&["String"], &mut self.skel, level, true)?
            .is_some()
        {
            let units = self.extract_string_statement(UnitInfo::typed("TextLine"))?;
            self.push_units(units);
        }
        Ok(())
    }

    /// One unit per variable or cross-reference format definition, inside
    /// a group started with the first unit. An entry without a name ends
    /// the extraction; the remaining entries stay in the skeleton.
    fn process_formats(&mut self, kind: FormatKind, stop_level: i32) -> Result<()> {
        let mut group = None;
        while self
            .cursor
            .read_until(&[kind.entry()], &mut self.skel, stop_level, true)?
            .is_some()
        {
            let entry_level = self.cursor.state.block_level;
            if self
                .cursor
                .read_until(&[kind.name_tag()], &mut self.skel, entry_level, true)?
                .is_none()
            {
                tracing::warn!("{} without {}", kind.entry(), kind.name_tag());
                break;
            }
            let name = self.cursor.scanner.read_string(&mut self.skel)?;
            self.cursor.state.block_level -= 1;

            if kind == FormatKind::Reference
                && !self.extracts.reference_format_tag_extractable(&name)
            {
                self.cursor.skip_statement(&mut self.skel)?;
                continue;
            }
            if self
                .cursor
                .read_until(&[kind.definition_tag()], &mut self.skel, entry_level, true)?
                .is_none()
            {
                continue;
            }
            let info = UnitInfo {
                name: &name,
                unit_type: kind.entry(),
            };
            let units = self.extract_string_statement(info)?;
            if !units.is_empty() && group.is_none() {
                group = Some(self.cursor.open_group(kind.group_name(), kind.group_name()));
            }
            self.push_units(units);
        }
        if let Some(id) = group {
            self.cursor.end_group(id);
        }
        Ok(())
    }

    /// Extracts the string value of the statement whose name was just read.
    /// The statement's remaining characters end up in the skeleton.
    fn extract_string_statement(&mut self, info: UnitInfo<'_>) -> Result<Vec<TextUnit>> {
        let mut raw = String::new();
        let text = self.cursor.scanner.read_string(&mut raw)?;
        self.cursor.state.block_level -= 1;

        let fragment = TextFragment::from(text.as_str());
        let span = raw.find('`').zip(raw.rfind('\''));
        let Some((open, close)) = span.filter(|(open, close)| open < close) else {
            self.skel.push_str(&raw);
            return Ok(Vec::new());
        };
        if !self.has_content(&fragment) {
            self.skel.push_str(&raw);
            return Ok(Vec::new());
        }
        let mut out = std::mem::take(&mut self.skel);
        out.push_str(&raw[..=open]);
        let units = self.build_units(fragment, info, &mut out);
        out.push_str(&raw[close..]);
        self.skel = out;
        Ok(units)
    }

    /// Reads a paragraph body up to its closing `>` and emits its units.
    fn process_para(&mut self, mode: ParaMode, info: UnitInfo<'_>) -> Result<()> {
        let mut scan = ParaScan {
            mode,
            containers: Vec::new(),
        };
        let mut units = Vec::new();
        loop {
            let mut unit = self.next_para_unit(&mut scan)?;
            if let ParaUnit::Reference { ids, .. } = &mut unit {
                *ids = self.referents.drain();
            }
            let end = matches!(unit, ParaUnit::End(_));
            units.push(unit);
            if end {
                break;
            }
        }
        self.cursor.state.block_level -= 1;

        match para::assemble(&units) {
            Some(assembly) if self.has_content(&assembly.fragment) => {
                let mut out = std::mem::take(&mut self.skel);
                out.push_str(&assembly.head);
                let built = self.build_units(assembly.fragment, info, &mut out);
                out.push_str(&assembly.tail);
                self.skel = out;
                self.push_units(built);
            }
            _ => self.skel.push_str(&para::verbatim(&units)),
        }
        Ok(())
    }

    fn next_para_unit(&mut self, scan: &mut ParaScan) -> Result<ParaUnit> {
        let c = self.cursor.scanner.require("paragraph")?;
        let unit = match c {
            '<' => return self.para_statement(scan),
            '>' => match scan.containers.pop() {
                None => ParaUnit::End(c.to_string()),
                Some(Container::Line) => ParaUnit::LineClose(c.to_string()),
                Some(Container::Format) => ParaUnit::Statement {
                    tag: String::new(),
                    raw: c.to_string(),
                },
            },
            '#' => {
                let mut raw = c.to_string();
                self.cursor.scanner.read_comment(&mut raw)?;
                ParaUnit::Trivia(raw)
            }
            c if is_whitespace(c) => {
                let mut raw = String::new();
                self.cursor.scanner.read_whitespace(c, &mut raw)?;
                ParaUnit::Trivia(raw)
            }
            c => ParaUnit::Trivia(c.to_string()),
        };
        Ok(unit)
    }

    fn para_statement(&mut self, scan: &mut ParaScan) -> Result<ParaUnit> {
        let mut raw = String::from('<');
        let tag = self.cursor.scanner.read_tag(&mut raw)?;
        let unit = match tag.as_str() {
            "ParaLine" => {
                scan.containers.push(Container::Line);
                ParaUnit::LineOpen(raw)
            }
            "Pgf" if scan.mode == ParaMode::Body => {
                scan.containers.push(Container::Format);
                ParaUnit::Statement {
                    tag: "pgf".to_string(),
                    raw,
                }
            }
            "String" => {
                let text = self.cursor.scanner.read_string(&mut raw)?;
                ParaUnit::text(Literal::String, text, raw).in_xref(self.cursor.state.in_xref)
            }
            "PgfNumFormat" => self.numbering_unit(raw, scan.mode)?,
            "Char" => {
                let name = self.cursor.scanner.read_statement_value(&mut raw)?;
                if is_known_char(&name) {
                    ParaUnit::Char {
                        text: char_literal(&name),
                        raw,
                    }
                } else {
                    tracing::warn!("unknown character name {name:?}, keeping it as code");
                    ParaUnit::Statement {
                        tag: "char".to_string(),
                        raw,
                    }
                }
            }
            "Marker" => self.marker_unit(raw)?,
            IMPORT_OBJECT => {
                self.cursor.scanner.skip_over_import_object(&mut raw)?;
                ParaUnit::Statement {
                    tag: "importobject".to_string(),
                    raw,
                }
            }
            _ => {
                match tag.as_str() {
                    "XRef" => self.cursor.state.in_xref = true,
                    "XRefEnd" => self.cursor.state.in_xref = false,
                    _ => {}
                }
                self.cursor.scanner.skip_over_content(&mut raw)?;
                ParaUnit::Statement {
                    tag: tag.to_lowercase(),
                    raw,
                }
            }
        };
        Ok(unit)
    }

    /// A numbering format: text of the paragraph in the catalog or when
    /// extracted inline, a referent otherwise.
    fn numbering_unit(&mut self, mut raw: String, mode: ParaMode) -> Result<ParaUnit> {
        let text = self.cursor.scanner.read_string(&mut raw)?;
        if mode == ParaMode::Catalog || self.params.extract_pgf_num_formats_inline {
            return Ok(ParaUnit::text(Literal::NumberFormat, text, raw));
        }
        let span = raw.find('`').zip(raw.rfind('\''));
        Ok(self.referent_unit(raw, span, &text, "x-referent", "ref", "pgfnumformat"))
    }

    /// A marker: a referent when its type is extracted, kept as a code
    /// otherwise.
    fn marker_unit(&mut self, mut raw: String) -> Result<ParaUnit> {
        let mut type_name: Option<String> = None;
        let mut text: Option<(String, usize)> = None;
        while let Some(child) = self
            .cursor
            .scanner
            .find_child(&["MType", "MTypeName", "MText"], &mut raw)?
        {
            match child.as_str() {
                "MTypeName" => type_name = Some(self.cursor.scanner.read_string(&mut raw)?),
                "MType" => {
                    let number = self.cursor.scanner.read_statement_value(&mut raw)?;
                    if type_name.is_none() {
                        type_name = marker_type_name(&number).map(str::to_string);
                    }
                }
                _ => {
                    let start = raw.len();
                    text = Some((self.cursor.scanner.read_string(&mut raw)?, start));
                }
            }
        }

        let unit_type = match type_name.as_deref() {
            Some("Index") if self.params.extract_index_markers => Some(("x-index", "index")),
            Some("Hypertext") if self.params.extract_links => Some(("link", "link")),
            Some(_) => None,
            None => {
                tracing::warn!("marker without a type");
                None
            }
        };
        let (Some((unit_type, code_type)), Some((text, start))) = (unit_type, text) else {
            return Ok(ParaUnit::Statement {
                tag: "marker".to_string(),
                raw,
            });
        };
        let span = raw[start..]
            .find('`')
            .map(|open| start + open)
            .zip(raw[start..].find('\'').map(|close| start + close));
        Ok(self.referent_unit(raw, span, &text, unit_type, code_type, "marker"))
    }

    /// Emits `text`, found between the backtick and quote at `span` in
    /// `raw`, as referent units and returns the reference to them. Without
    /// real text the statement is kept as a code of type `tag`.
    fn referent_unit(
        &mut self,
        raw: String,
        span: Option<(usize, usize)>,
        text: &str,
        unit_type: &str,
        code_type: &'static str,
        tag: &str,
    ) -> ParaUnit {
        let fragment = TextFragment::from(text);
        let span = span.filter(|(open, close)| open < close);
        let Some((open, close)) = span.filter(|_| self.has_content(&fragment)) else {
            return ParaUnit::Statement {
                tag: tag.to_string(),
                raw,
            };
        };
        let mut out = raw[..=open].to_string();
        let mut units = self.build_units(fragment, UnitInfo::typed(unit_type), &mut out);
        if let Some(last) = units.last_mut() {
            out.push_str(&raw[close..]);
            last.skeleton.append(&out);
        }
        for unit in &mut units {
            unit.referent = true;
            self.referents.push(unit.id.clone());
        }
        self.push_units(units);
        ParaUnit::Reference {
            code_type,
            ids: Vec::new(),
        }
    }

    /// True if the fragment still has text once inline codes are found.
    fn has_content(&self, fragment: &TextFragment) -> bool {
        let checked = self.check_inline_codes(fragment.clone());
        checked.has_text() || checked.has_reference()
    }

    fn check_inline_codes(&self, fragment: TextFragment) -> TextFragment {
        let fragment = fragment.map_text(split_inline_controls);
        self.finder.process(fragment, escape_mif)
    }

    /// Turns content into text units. `out` holds the native text before
    /// the content; it becomes the first unit's skeleton, and afterwards
    /// holds whatever follows the last unit.
    fn build_units(
        &mut self,
        fragment: TextFragment,
        info: UnitInfo<'_>,
        out: &mut String,
    ) -> Vec<TextUnit> {
        let segments = if self.params.extract_hard_returns_as_text {
            vec![fragment]
        } else {
            fragment.split_at_char('\n')
        };
        let mut units = Vec::new();
        for (index, segment) in segments.into_iter().enumerate() {
            if index > 0 {
                out.push_str("\\n");
            }
            let segment = self.check_inline_codes(segment);
            if !segment.has_text() && !segment.has_reference() {
                out.push_str(&encode_fragment(&segment));
                continue;
            }
            let mut skeleton = Skeleton::from(std::mem::take(out));
            skeleton.add_content_placeholder();
            units.push(TextUnit {
                id: self.cursor.next_unit_id(),
                name: info.name.to_string(),
                unit_type: info.unit_type.to_string(),
                source: segment,
                referent: false,
                preserve_whitespace: true,
                mime_type: MIME_TYPE,
                skeleton,
            });
        }
        units
    }

    fn push_units(&mut self, units: Vec<TextUnit>) {
        for unit in units {
            self.cursor.push_event(Event::TextUnit(Box::new(unit)));
        }
    }
}

/// Built-in marker type names by `MType` number.
fn marker_type_name(number: &str) -> Option<&'static str> {
    match number {
        "2" => Some("Index"),
        "8" => Some("Hypertext"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Part;

    fn extract_with(params: Parameters, mif: &str) -> Vec<Event> {
        MifFilter::new(params)
            .extract(RawDocument::from_text(mif))
            .unwrap()
    }

    fn extract(mif: &str) -> Vec<Event> {
        extract_with(Parameters::default(), mif)
    }

    fn units(events: &[Event]) -> Vec<&TextUnit> {
        events.iter().filter_map(Event::as_text_unit).collect()
    }

    fn skeleton_text(events: &[Event]) -> String {
        events
            .iter()
            .filter_map(Event::skeleton)
            .map(|skel| skel.to_string())
            .collect()
    }

    #[test]
    fn test_paragraph_becomes_one_unit() {
        let events = extract(
            "<MIFFile 9.00>\n<TextFlow <Para <PgfTag `Body'>\n <ParaLine <String `Hello '>>\n <ParaLine <String `world'>>\n>>\n",
        );
        let units = units(&events);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source.to_generic(), "Hello world");
        assert_eq!(units[0].unit_type, "");
        assert!(units[0].preserve_whitespace);
        assert_eq!(units[0].mime_type, MIME_TYPE);
    }

    #[test]
    fn test_event_order() {
        let events = extract("<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `Hi'>>>>\n");
        assert!(matches!(events.first(), Some(Event::StartDocument(_))));
        assert!(matches!(events.last(), Some(Event::EndDocument(_))));
        let Some(Event::StartDocument(start)) = events.first() else {
            unreachable!();
        };
        assert_eq!(start.mime_type, MIME_TYPE);
        assert_eq!(start.encoding, "UTF-8");
        assert_eq!(start.line_break, "\n");
    }

    #[test]
    fn test_font_change_becomes_code() {
        let events = extract(
            "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `Hello '> <Font <FTag `Bold'>> <String `world'>>>>\n",
        );
        let units = units(&events);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source.to_generic(), "Hello <1/>world");
        let code = units[0].source.codes().next().unwrap();
        assert_eq!(code.code_type, "font");
        assert_eq!(code.data, "'> <Font <FTag `Bold'>> <String `");
    }

    #[test]
    fn test_paragraph_without_text_stays_in_skeleton() {
        let mif = "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `   '> <Char Tab>>>>\n";
        let events = extract(mif);
        assert!(units(&events).is_empty());
        assert_eq!(skeleton_text(&events), mif);
    }

    #[test]
    fn test_char_literals_join_text() {
        let events = extract(
            "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `a'> <Char EmDash> <String `b'>>>>\n",
        );
        assert_eq!(units(&events)[0].source.text(), "a\u{2014}b");
    }

    #[test]
    fn test_unknown_char_is_kept_as_code() {
        let events = extract(
            "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `a'> <Char Gremlin> <String `b'>>>>\n",
        );
        let units = units(&events);
        assert_eq!(units[0].source.to_generic(), "a<1/>b");
        assert_eq!(units[0].source.codes().next().unwrap().code_type, "char");
    }

    #[test]
    fn test_hard_returns_split_units() {
        let params = Parameters {
            extract_hard_returns_as_text: false,
            ..Parameters::default()
        };
        let events = extract_with(
            params,
            "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `one\\ntwo\\nthree'>>>>\n",
        );
        let texts: Vec<String> = units(&events).iter().map(|u| u.source.text()).collect();
        assert_eq!(texts, ["one", "two", "three"]);
    }

    #[test]
    fn test_hypertext_marker_is_referenced() {
        let params = Parameters {
            extract_links: true,
            ..Parameters::default()
        };
        let events = extract_with(
            params,
            "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `See '> <Marker <MTypeName `Hypertext'> <MText `gotolink x'> <Unique 7>> <String `here'>>>>\n",
        );
        let units = units(&events);
        assert_eq!(units.len(), 2);
        let link = units[0];
        assert!(link.referent);
        assert_eq!(link.unit_type, "link");
        assert_eq!(link.source.text(), "gotolink x");

        let para = units[1];
        let refs: Vec<_> = para.source.codes().filter(|c| c.reference).collect();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].data.contains(&format!("[#${}]", link.id)));
        assert_eq!(para.source.text(), "See here");
    }

    #[test]
    fn test_links_not_extracted_by_default() {
        let events = extract(
            "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `See '> <Marker <MTypeName `Hypertext'> <MText `x'>> <String `here'>>>>\n",
        );
        let units = units(&events);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source.codes().next().unwrap().code_type, "marker");
    }

    #[test]
    fn test_index_marker_by_number() {
        let events = extract(
            "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <Marker <MType 2> <MText `term'>> <String `Text'>>>>\n",
        );
        let units = units(&events);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit_type, "x-index");
        assert!(units[1].source.has_reference());
    }

    #[test]
    fn test_variables_are_grouped() {
        let events = extract(
            "<MIFFile 9.00>\n<VariableFormats\n <VariableFormat <VariableName `Title'> <VariableDef `Guide'>>\n <VariableFormat <VariableName `Date'> <VariableDef `<$daynum\\>'>>\n>\n",
        );
        let units = units(&events);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "Title");
        assert_eq!(units[0].unit_type, "VariableFormat");
        let groups: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::StartGroup(g) => Some(g.group_type.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(groups, ["Variables"]);
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::EndGroup(_))).count(),
            1
        );
    }

    #[test]
    fn test_table_groups() {
        let events = extract(
            "<MIFFile 9.00>\n<Tbls <Tbl <TblID 1> <TblBody <Row <Cell <CellContent <Para <ParaLine <String `A'>>>>>>>>>\n<TextFlow <Para <ParaLine <ATbl 1>>>>\n",
        );
        let groups: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::StartGroup(g) => Some(g.group_type.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(groups, ["table", "row", "cell"]);
        assert_eq!(units(&events)[0].source.text(), "A");
    }

    #[test]
    fn test_inline_control_becomes_code() {
        let events = extract("<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `a\\x0b b'>>>>\n");
        let unit = units(&events)[0];
        assert_eq!(unit.source.to_generic(), "a<1/>b");
        let code = unit.source.codes().next().unwrap();
        assert_eq!(code.code_type, "ctrl");
        assert_eq!(code.data, "\\x0b ");
    }

    #[test]
    fn test_code_finder_marks_building_blocks() {
        let events = extract(
            "<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `Chapter <$chapnum\\> starts'>>>>\n",
        );
        let unit = units(&events)[0];
        assert_eq!(unit.source.to_generic(), "Chapter <1/> starts");
        assert!(matches!(&unit.source.parts()[1], Part::Code(c) if c.data == "<$chapnum\\>"));
    }

    #[test]
    fn test_cancel() {
        let mut filter = MifFilter::new(Parameters::default());
        filter
            .open(RawDocument::from_text("<MIFFile 9.00>\n<TextFlow <Para <ParaLine <String `x'>>>>\n"))
            .unwrap();
        assert!(matches!(filter.next_event().unwrap(), Some(Event::StartDocument(_))));
        filter.cancel();
        assert!(matches!(filter.next_event().unwrap(), Some(Event::Canceled)));
        assert!(filter.next_event().unwrap().is_none());
    }

    #[test]
    fn test_not_open() {
        let mut filter = MifFilter::new(Parameters::default());
        assert!(matches!(filter.next_event(), Err(Error::NotOpen)));
    }

    #[test]
    fn test_table_without_id_fails() {
        let mut filter = MifFilter::new(Parameters::default());
        let result = filter.extract(RawDocument::from_text("<MIFFile 9.00>\n<Tbls <Tbl <TblTag `x'>>>\n"));
        assert!(matches!(result, Err(Error::MissingStatement(_))));
    }
}
