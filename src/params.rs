//! Filter parameters.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Built-in inline code rules: autonumber building blocks, system variables,
/// default-font switches and bullets.
pub const DEFAULT_CODE_FINDER_RULES: &[&str] = &[
    r"^[A-Z]{1}:",
    "\u{2022}",
    r"\\t",
    r"<[naArR ]{1}[+]*>",
    r"<[naArR]{1}=[0-9]+>",
    r"<\$.*?>",
    "<Default \u{B6} Font>",
    r"<(zenkaku|kanji|full-width|chinese|Indic|Farsi|Hebrew|Abjad|Alif Ba Ta|Thai) [naA]{1}[+]*>",
    r"<(zenkaku|kanji|full-width|chinese|Indic|Farsi|Hebrew|Abjad|Alif Ba Ta|Thai) [naA]{1}=[0-9]+>",
    r"<(kanji kazu|daiji|hira iroha|kata iroha|hira gojuon|kata gojuon)[+]*>",
    r"<(kanji kazu|daiji|hira iroha|kata iroha|hira gojuon|kata gojuon)=[0-9]+>",
];

/// Options controlling what gets extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Parameters {
    pub extract_body_pages: bool,
    pub extract_master_pages: bool,
    pub extract_reference_pages: bool,
    pub extract_hidden_pages: bool,
    pub extract_variables: bool,
    pub extract_index_markers: bool,
    pub extract_links: bool,
    /// Keep per-paragraph numbering formats inside the paragraph text
    /// instead of extracting them as separate referent units.
    pub extract_pgf_num_formats_inline: bool,
    pub extract_reference_formats: bool,
    /// When false, each hard return ends a text unit.
    pub extract_hard_returns_as_text: bool,
    pub use_code_finder: bool,
    pub code_finder_rules: Vec<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            extract_body_pages: true,
            extract_master_pages: true,
            extract_reference_pages: true,
            extract_hidden_pages: true,
            extract_variables: true,
            extract_index_markers: true,
            extract_links: false,
            extract_pgf_num_formats_inline: false,
            extract_reference_formats: false,
            extract_hard_returns_as_text: true,
            use_code_finder: true,
            code_finder_rules: DEFAULT_CODE_FINDER_RULES
                .iter()
                .map(|rule| rule.to_string())
                .collect(),
        }
    }
}

impl Parameters {
    /// Parses parameters from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let params = Parameters::default();
        assert!(params.extract_body_pages && params.extract_hidden_pages);
        assert!(params.extract_variables && params.extract_index_markers);
        assert!(!params.extract_links);
        assert!(!params.extract_reference_formats);
        assert!(params.extract_hard_returns_as_text);
        assert_eq!(params.code_finder_rules.len(), DEFAULT_CODE_FINDER_RULES.len());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params = Parameters::from_json(r#"{"extractLinks": true, "extractMasterPages": false}"#).unwrap();
        assert!(params.extract_links);
        assert!(!params.extract_master_pages);
        assert!(params.extract_body_pages);
        assert!(params.use_code_finder);
    }

    #[test]
    fn test_json_round_trip() {
        let mut params = Parameters::default();
        params.code_finder_rules = vec!["<x>".to_string()];
        let json = params.to_json().unwrap();
        assert_eq!(Parameters::from_json(&json).unwrap(), params);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"useCodeFinder": false}}"#).unwrap();
        let params = Parameters::load(file.path()).unwrap();
        assert!(!params.use_code_finder);
    }

    #[test]
    fn test_invalid_json() {
        assert!(Parameters::from_json("{not json").is_err());
    }
}
