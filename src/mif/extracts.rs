//! Pre-pass analysis deciding what the extraction pass may touch.
//!
//! A MIF document keeps its text in `TextFlow`s, places flows on pages via
//! text rectangles, and anchors tables (`ATbl`) and frames (`AFrame`) inside
//! paragraphs. Starting from the text rectangles of the accepted pages, the
//! analyzer follows those references to a fixed point and records the
//! reachable flows, tables and frames, plus the paragraph and cross-reference
//! format tags actually used by reachable text.

use super::font_tags::FontTags;
use super::lexer::Statements;
use super::statement::{Statement, StatementKind};
use super::token::TokenKind;
use super::version::Version;
use crate::error::{Error, Result};
use crate::params::Parameters;
use std::collections::{HashMap, HashSet};

pub const MASTER_PAGE_TYPES: [&str; 3] = ["LeftMasterPage", "RightMasterPage", "OtherMasterPage"];
pub const REFERENCE_PAGE_TYPE: &str = "ReferencePage";
pub const BODY_PAGE_TYPE: &str = "BodyPage";
pub const HIDDEN_PAGE_TYPE: &str = "HiddenPage";

/// Which page types the caller wants extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFilter {
    pub body: bool,
    pub master: bool,
    pub reference: bool,
    pub hidden: bool,
}

impl PageFilter {
    pub fn accepts(&self, page_type: &str) -> bool {
        match page_type {
            BODY_PAGE_TYPE => self.body,
            REFERENCE_PAGE_TYPE => self.reference,
            HIDDEN_PAGE_TYPE => self.hidden,
            other if MASTER_PAGE_TYPES.contains(&other) => self.master,
            _ => false,
        }
    }
}

impl From<&Parameters> for PageFilter {
    fn from(params: &Parameters) -> Self {
        Self {
            body: params.extract_body_pages,
            master: params.extract_master_pages,
            reference: params.extract_reference_pages,
            hidden: params.extract_hidden_pages,
        }
    }
}

/// Result of the pre-pass.
#[derive(Debug, Clone)]
pub struct Extracts {
    pages: PageFilter,
    version: Option<Version>,
    line_break: Option<String>,
    font_tags: FontTags,
    frames: HashSet<String>,
    text_flows: HashSet<String>,
    tables: HashSet<String>,
    paragraph_format_tags: HashSet<String>,
    reference_format_tags: HashSet<String>,
}

/// Top-level statements the analysis needs, gathered in one pass.
#[derive(Default)]
struct Collected {
    pages: Vec<Statement>,
    pages_seen: bool,
    anchored_frames: Vec<Statement>,
    tables: Vec<Statement>,
    text_flows: Vec<Statement>,
}

impl Extracts {
    pub fn new(params: &Parameters) -> Self {
        Self {
            pages: PageFilter::from(params),
            version: None,
            line_break: None,
            font_tags: FontTags::new(),
            frames: HashSet::new(),
            text_flows: HashSet::new(),
            tables: HashSet::new(),
            paragraph_format_tags: HashSet::new(),
            reference_format_tags: HashSet::new(),
        }
    }

    /// Runs the analysis over the document's statements.
    ///
    /// Fails on lexical errors, a missing `MIFFile` statement, or a version
    /// older than 8.0.
    pub fn analyze(params: &Parameters, statements: Statements) -> Result<Self> {
        let mut extracts = Self::new(params);
        let mut collected = Collected::default();
        for statement in statements {
            extracts.collect(statement?, &mut collected)?;
        }
        if extracts.version.is_none() {
            return Err(Error::NotMif);
        }
        extracts.resolve(&collected);
        tracing::debug!(
            "reachable: {} text flows, {} tables, {} frames; {} numbering tags, {} reference tags",
            extracts.text_flows.len(),
            extracts.tables.len(),
            extracts.frames.len(),
            extracts.paragraph_format_tags.len(),
            extracts.reference_format_tags.len(),
        );
        Ok(extracts)
    }

    fn collect(&mut self, statement: Statement, collected: &mut Collected) -> Result<()> {
        if statement.kind() == StatementKind::Comment {
            if self.line_break.is_none() {
                self.line_break = Some(line_break_of(&statement));
            }
            return Ok(());
        }
        match statement.identity() {
            "MIFFile" => {
                let version = Version::parse(statement.first_literal())?;
                tracing::debug!("MIF version {}", version.as_str());
                self.version = Some(version);
            }
            "FontCatalog" => self.font_tags.from_catalog(&statement),
            "Page" => {
                collected.pages_seen = true;
                let page_type = statement.first_statement_with("PageType").first_literal();
                if self.pages.accepts(page_type) {
                    collected.pages.push(statement);
                }
            }
            "AFrames" => collected
                .anchored_frames
                .extend(statement.statements_with("Frame").cloned()),
            "Tbls" => collected
                .tables
                .extend(statement.statements_with("Tbl").cloned()),
            "TextFlow" => collected.text_flows.push(statement),
            _ => {}
        }
        Ok(())
    }

    fn resolve(&mut self, collected: &Collected) {
        let tables_by_id: HashMap<&str, &Statement> = collected
            .tables
            .iter()
            .map(|table| (table.first_statement_with("TblID").first_literal(), table))
            .collect();

        if !collected.pages_seen {
            // Without pages everything is extracted, and catalog numbering
            // and reference formats are not.
            self.text_flows = (1..=collected.text_flows.len()).map(|n| n.to_string()).collect();
            let mut pending: Vec<String> = tables_by_id.keys().map(|id| id.to_string()).collect();
            pending.extend(anchored_references(collected.text_flows.iter(), "ATbl"));
            self.close_tables(pending, &tables_by_id, &mut Vec::new());
            return;
        }
        self.resolve_from_pages(collected, &tables_by_id);

        let mut paragraphs: Vec<&Statement> = Vec::new();
        for (index, flow) in collected.text_flows.iter().enumerate() {
            if self.text_flows.contains(&(index + 1).to_string()) {
                paragraphs.extend(flow.statements_with("Para"));
            }
        }
        for (id, table) in &tables_by_id {
            if self.tables.contains(*id) {
                for content in table_contents(table) {
                    paragraphs.extend(content.statements_with("Para"));
                }
            }
        }
        self.collect_format_tags(&paragraphs);
    }

    fn resolve_from_pages(&mut self, collected: &Collected, tables_by_id: &HashMap<&str, &Statement>) {
        let frames_by_id: HashMap<&str, &Statement> = collected
            .anchored_frames
            .iter()
            .map(|frame| (frame.first_statement_with("ID").first_literal(), frame))
            .collect();

        let pages: Vec<&Statement> = collected.pages.iter().collect();
        self.add_frames(pages.iter().copied().flat_map(|page| page.statements_with("Frame")));

        let mut accepted_rects: HashSet<String> = HashSet::new();
        let mut frontier: Vec<String> = Vec::new();
        for rect in text_rect_ids(&pages) {
            if accepted_rects.insert(rect.clone()) {
                frontier.push(rect);
            }
        }
        let mut visited_frames: HashSet<String> = HashSet::new();

        // Each round accepts the flows placed in newly reached text rects,
        // then the tables and anchored frames they reference; the frames'
        // own text rects seed the next round.
        while !frontier.is_empty() {
            let rects: HashSet<String> = frontier.drain(..).collect();
            let mut table_refs = Vec::new();
            let mut frame_refs = Vec::new();
            for (index, flow) in collected.text_flows.iter().enumerate() {
                let ordinal = (index + 1).to_string();
                if self.text_flows.contains(&ordinal)
                    || !flow_text_rects(flow).any(|rect| rects.contains(rect))
                {
                    continue;
                }
                self.text_flows.insert(ordinal);
                table_refs.extend(anchored_references([flow], "ATbl"));
                frame_refs.extend(anchored_references([flow], "AFrame"));
            }
            self.close_tables(table_refs, tables_by_id, &mut frame_refs);

            for id in frame_refs {
                if !visited_frames.insert(id.clone()) {
                    continue;
                }
                let Some(frame) = frames_by_id.get(id.as_str()) else {
                    continue;
                };
                self.add_frames([*frame]);
                for rect in text_rect_ids(&[*frame]) {
                    if accepted_rects.insert(rect.clone()) {
                        frontier.push(rect);
                    }
                }
            }
        }
    }

    /// Accepts the pending table ids and everything their contents anchor.
    fn close_tables(
        &mut self,
        mut pending: Vec<String>,
        tables_by_id: &HashMap<&str, &Statement>,
        frame_refs: &mut Vec<String>,
    ) {
        while let Some(id) = pending.pop() {
            if id.is_empty() || !self.tables.insert(id.clone()) {
                continue;
            }
            if let Some(table) = tables_by_id.get(id.as_str()) {
                let contents = table_contents(table);
                pending.extend(anchored_references(contents.iter().copied(), "ATbl"));
                frame_refs.extend(anchored_references(contents.iter().copied(), "AFrame"));
            }
        }
    }

    /// Records the `Unique` of each frame and of every frame nested in it.
    fn add_frames<'a>(&mut self, frames: impl IntoIterator<Item = &'a Statement>) {
        for frame in frames {
            let unique = frame.first_statement_with("Unique").first_literal();
            if !unique.is_empty() {
                self.frames.insert(unique.to_string());
            }
            self.add_frames(frame.statements_with("Frame"));
        }
    }

    fn collect_format_tags(&mut self, paragraphs: &[&Statement]) {
        for para in paragraphs {
            let tag = para.first_statement_with("PgfTag");
            let numbered = !para.first_statement_with("PgfNumString").is_empty();
            let custom_format = !para
                .first_statement_with("Pgf")
                .first_statement_with("PgfNumFormat")
                .is_empty();
            if !tag.is_empty() && numbered && !custom_format {
                self.paragraph_format_tags.insert(tag.first_literal().to_string());
            }
            for line in para.statements_with("ParaLine") {
                for xref in line.statements_with("XRef") {
                    let name = xref.first_statement_with("XRefName").first_literal();
                    if !name.is_empty() {
                        self.reference_format_tags.insert(name.to_string());
                    }
                }
            }
        }
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Line break used by the document: the terminator of its first comment.
    pub fn line_break(&self) -> &str {
        self.line_break.as_deref().unwrap_or("\n")
    }

    pub fn font_tags(&self) -> &FontTags {
        &self.font_tags
    }

    pub fn inline_code_finder_rules(&self) -> Vec<String> {
        self.font_tags.inline_code_finder_rules()
    }

    pub fn page_type_extractable(&self, page_type: &str) -> bool {
        self.pages.accepts(page_type)
    }

    pub fn frame_extractable(&self, unique: &str) -> bool {
        self.frames.contains(unique)
    }

    /// `ordinal` is the 1-based position of the flow among all `TextFlow`s.
    pub fn text_flow_extractable(&self, ordinal: &str) -> bool {
        self.text_flows.contains(ordinal)
    }

    pub fn table_extractable(&self, id: &str) -> bool {
        self.tables.contains(id)
    }

    pub fn paragraph_format_tag_extractable(&self, tag: &str) -> bool {
        self.paragraph_format_tags.contains(tag)
    }

    pub fn reference_format_tag_extractable(&self, tag: &str) -> bool {
        self.reference_format_tags.contains(tag)
    }

    pub fn text_flows(&self) -> &HashSet<String> {
        &self.text_flows
    }

    pub fn tables(&self) -> &HashSet<String> {
        &self.tables
    }

    pub fn frames(&self) -> &HashSet<String> {
        &self.frames
    }
}

fn line_break_of(comment: &Statement) -> String {
    match comment.first_token_of(TokenKind::End) {
        "\r" => "\r\n".to_string(),
        _ => "\n".to_string(),
    }
}

/// Ids of the text rects on `holders`, including those inside nested frames.
fn text_rect_ids(holders: &[&Statement]) -> Vec<String> {
    let mut ids = Vec::new();
    for holder in holders {
        for rect in holder.statements_with("TextRect") {
            let id = rect.first_statement_with("ID").first_literal();
            if !id.is_empty() {
                ids.push(id.to_string());
            }
        }
        let nested: Vec<&Statement> = holder.statements_with("Frame").collect();
        ids.extend(text_rect_ids(&nested));
    }
    ids
}

/// Text rect ids the lines of a flow are laid out in.
fn flow_text_rects(flow: &Statement) -> impl Iterator<Item = &str> {
    flow.statements_with("Para")
        .flat_map(|para| para.statements_with("ParaLine"))
        .map(|line| line.first_statement_with("TextRectID").first_literal())
        .filter(|id| !id.is_empty())
}

/// Values of `Para > ParaLine > name` statements (`ATbl` or `AFrame`).
fn anchored_references<'a>(
    flows: impl IntoIterator<Item = &'a Statement>,
    name: &str,
) -> Vec<String> {
    let mut refs = Vec::new();
    for flow in flows {
        for para in flow.statements_with("Para") {
            for line in para.statements_with("ParaLine") {
                for anchor in line.statements_with(name) {
                    let id = anchor.first_literal();
                    if !id.is_empty() {
                        refs.push(id.to_string());
                    }
                }
            }
        }
    }
    refs
}

/// The text-flow-like parts of a table: title and the content of every cell.
fn table_contents(table: &Statement) -> Vec<&Statement> {
    let mut contents = Vec::new();
    for title in table.statements_with("TblTitle") {
        contents.extend(title.statements_with("TblTitleContent"));
    }
    for section in ["TblH", "TblBody"] {
        for part in table.statements_with(section) {
            for row in part.statements_with("Row") {
                for cell in row.statements_with("Cell") {
                    contents.extend(cell.statements_with("CellContent"));
                }
            }
        }
    }
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CharReader;

    fn analyze(text: &str) -> Result<Extracts> {
        Extracts::analyze(&Parameters::default(), Statements::new(CharReader::from_text(text)))
    }

    #[test]
    fn test_missing_miffile() {
        assert!(matches!(analyze("<TextFlow >"), Err(Error::NotMif)));
    }

    #[test]
    fn test_old_version() {
        assert!(matches!(analyze("<MIFFile 7.00>"), Err(Error::UnsupportedVersion(_))));
    }

    #[test]
    fn test_line_break_detection() {
        assert_eq!(analyze("<MIFFile 9.00> # x\r\n").unwrap().line_break(), "\r\n");
        assert_eq!(analyze("<MIFFile 9.00> # x\n").unwrap().line_break(), "\n");
        assert_eq!(analyze("<MIFFile 9.00>").unwrap().line_break(), "\n");
    }

    #[test]
    fn test_no_pages_extracts_all_flows_and_tables() {
        let extracts = analyze(
            "<MIFFile 9.00><Tbls <Tbl <TblID 1>> <Tbl <TblID 2>>>\
             <TextFlow <Para <ParaLine <String `a'>>>><TextFlow >",
        )
        .unwrap();
        assert!(extracts.text_flow_extractable("1"));
        assert!(extracts.text_flow_extractable("2"));
        assert!(extracts.table_extractable("1"));
        assert!(extracts.table_extractable("2"));
        assert!(extracts.frames().is_empty());
    }

    #[test]
    fn test_no_pages_collects_no_format_tags() {
        let extracts = analyze(
            "<MIFFile 9.00>\
             <TextFlow <Para <PgfTag `Step'> <PgfNumString `1.'>\
               <ParaLine <XRef <XRefName `Page'>> <String `a'>>>>",
        )
        .unwrap();
        assert!(extracts.text_flow_extractable("1"));
        assert!(!extracts.paragraph_format_tag_extractable("Step"));
        assert!(!extracts.reference_format_tag_extractable("Page"));
    }

    #[test]
    fn test_table_footer_anchors_are_not_followed() {
        let extracts = analyze(
            "<MIFFile 9.00>\
             <Tbls \
               <Tbl <TblID 1> <TblF <Row <Cell <CellContent <Para <ParaLine <ATbl 2>>>>>>>>\
               <Tbl <TblID 2>>\
             >\
             <Page <PageType BodyPage> <TextRect <ID 1>>>\
             <TextFlow <Para <ParaLine <TextRectID 1> <ATbl 1>>>>",
        )
        .unwrap();
        assert!(extracts.table_extractable("1"));
        assert!(!extracts.table_extractable("2"));
    }

    #[test]
    fn test_page_filter() {
        let filter = PageFilter {
            body: true,
            master: false,
            reference: true,
            hidden: false,
        };
        assert!(filter.accepts("BodyPage"));
        assert!(!filter.accepts("LeftMasterPage"));
        assert!(!filter.accepts("OtherMasterPage"));
        assert!(filter.accepts("ReferencePage"));
        assert!(!filter.accepts("HiddenPage"));
        assert!(!filter.accepts("Unknown"));
    }

    #[test]
    fn test_numbering_and_reference_tags() {
        let extracts = analyze(
            "<MIFFile 9.00>\
             <Page <PageType BodyPage> <TextRect <ID 1>>>\
             <TextFlow \
               <Para <PgfTag `Step'> <PgfNumString `1.'> <ParaLine <TextRectID 1> <String `a'>>>\
               <Para <PgfTag `Custom'> <PgfNumString `A.'> <Pgf <PgfNumFormat `<A>.'>>>\
               <Para <PgfTag `Plain'> <ParaLine <XRef <XRefName `Page'>> <String `see'>>>\
             >",
        )
        .unwrap();
        assert!(extracts.paragraph_format_tag_extractable("Step"));
        assert!(!extracts.paragraph_format_tag_extractable("Custom"));
        assert!(!extracts.paragraph_format_tag_extractable("Plain"));
        assert!(extracts.reference_format_tag_extractable("Page"));
    }
}
