//! Pre-pass analysis of what a document exposes for extraction.

use std::collections::HashSet;

use mifkit::mif::{Extracts, Statements};
use mifkit::{Parameters, RawDocument};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> String {
    format!("{}/{}", FIXTURES_DIR, name)
}

fn analyze(document: &RawDocument, params: &Parameters) -> Extracts {
    let reader = document.open_reader().expect("Failed to open reader");
    Extracts::analyze(params, Statements::new(reader)).expect("Failed to analyze")
}

fn analyze_fixture(name: &str, params: &Parameters) -> Extracts {
    let document = RawDocument::from_path(fixture_path(name)).expect("Failed to read fixture");
    analyze(&document, params)
}

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Documents with pages
// ============================================================================

#[test]
fn test_pages_fixture_reachability() {
    let extracts = analyze_fixture("pages.mif", &Parameters::default());
    assert_eq!(extracts.text_flows(), &set(&["1", "2"]));
    assert_eq!(extracts.tables(), &set(&["1"]));
    assert_eq!(extracts.frames(), &set(&["500"]));
    assert!(!extracts.text_flow_extractable("3"));
    assert!(!extracts.table_extractable("2"));
    assert!(!extracts.frame_extractable("600"));
}

#[test]
fn test_pages_fixture_format_tags() {
    let extracts = analyze_fixture("pages.mif", &Parameters::default());
    assert!(extracts.paragraph_format_tag_extractable("Heading"));
    assert!(!extracts.paragraph_format_tag_extractable("Body"));
    assert!(!extracts.reference_format_tag_extractable("See Heading"));
    assert_eq!(extracts.version().map(|v| v.as_str()), Some("2015"));
    assert_eq!(extracts.line_break(), "\n");
}

#[test]
fn test_hidden_pages_disabled() {
    let params = Parameters {
        extract_hidden_pages: false,
        ..Parameters::default()
    };
    let extracts = analyze_fixture("pages.mif", &params);
    assert_eq!(extracts.text_flows(), &set(&["1"]));
    assert!(!extracts.page_type_extractable("HiddenPage"));
    assert!(extracts.page_type_extractable("BodyPage"));
}

#[test]
fn test_body_pages_disabled() {
    let params = Parameters {
        extract_body_pages: false,
        ..Parameters::default()
    };
    let extracts = analyze_fixture("pages.mif", &params);
    assert_eq!(extracts.text_flows(), &set(&["2"]));
    assert!(extracts.tables().is_empty());
    assert!(extracts.frames().is_empty());
    assert!(!extracts.paragraph_format_tag_extractable("Heading"));
}

#[test]
fn test_analysis_is_repeatable() {
    let document = RawDocument::from_path(fixture_path("pages.mif")).unwrap();
    let params = Parameters::default();
    let first = analyze(&document, &params);
    let second = analyze(&document, &params);
    assert_eq!(first.text_flows(), second.text_flows());
    assert_eq!(first.tables(), second.tables());
    assert_eq!(first.frames(), second.frames());
}

#[test]
fn test_frame_cycle_terminates() {
    let text = "<MIFFile 2015>
<AFrames <Frame <ID 1> <Unique 11> <TextRect <ID 30>>>>
<Page <PageType BodyPage> <TextRect <ID 10>>>
<TextFlow <Para <ParaLine <TextRectID 10> <AFrame 1>>>>
<TextFlow <Para <ParaLine <TextRectID 30> <AFrame 1> <String `Loop'>>>>
";
    let extracts = analyze(&RawDocument::from_text(text), &Parameters::default());
    assert_eq!(extracts.text_flows(), &set(&["1", "2"]));
    assert_eq!(extracts.frames(), &set(&["11"]));
}

#[test]
fn test_nested_tables_are_followed() {
    let text = "<MIFFile 2015>
<Tbls
 <Tbl <TblID 7> <TblBody <Row <Cell <CellContent <Para <ParaLine <ATbl 8>>>>>>>>
 <Tbl <TblID 8> <TblBody <Row <Cell <CellContent <Para <ParaLine <String `x'>>>>>>>>
 <Tbl <TblID 9>>
>
<Page <PageType BodyPage> <TextRect <ID 10>>>
<TextFlow <Para <ParaLine <TextRectID 10> <ATbl 7>>>>
";
    let extracts = analyze(&RawDocument::from_text(text), &Parameters::default());
    assert_eq!(extracts.tables(), &set(&["7", "8"]));
}

// ============================================================================
// Documents without pages
// ============================================================================

#[test]
fn test_without_pages_everything_is_reachable() {
    let extracts = analyze_fixture("nopages.mif", &Parameters::default());
    assert_eq!(extracts.text_flows(), &set(&["1", "2"]));
    assert_eq!(extracts.tables(), &set(&["1", "2"]));
    assert!(extracts.frames().is_empty());
}

#[test]
fn test_without_pages_no_format_tags_are_extractable() {
    let text = "<MIFFile 2015>
<PgfCatalog <Pgf <PgfTag `Step'> <PgfNumFormat `Step <n+\\>'>>>
<TextFlow <Para <PgfTag `Step'> <PgfNumString `Step 1'>
 <ParaLine <XRef <XRefName `See Step'>> <String `Mix'>>>>
";
    let extracts = analyze(&RawDocument::from_text(text), &Parameters::default());
    assert_eq!(extracts.text_flows(), &set(&["1"]));
    assert!(!extracts.paragraph_format_tag_extractable("Step"));
    assert!(!extracts.reference_format_tag_extractable("See Step"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unsupported_version_fails() {
    let reader = RawDocument::from_text("<MIFFile 7.00>\n").open_reader().unwrap();
    let result = Extracts::analyze(&Parameters::default(), Statements::new(reader));
    assert!(matches!(result, Err(mifkit::Error::UnsupportedVersion(_))));
}
