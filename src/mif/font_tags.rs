//! Character format names from the `FontCatalog`.
//!
//! Autonumber formats refer to character formats as `<Emphasis>`; those
//! references are inline codes, not text.

use super::statement::Statement;
use std::collections::BTreeSet;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FontTags {
    tags: BTreeSet<String>,
}

impl FontTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the registry with the `FTag` of every `Font` in `catalog`.
    pub fn from_catalog(&mut self, catalog: &Statement) {
        self.tags = catalog
            .statements_with("Font")
            .map(|font| font.first_statement_with("FTag").first_literal())
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect();
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// One rule per tag matching `<Tag>` literally.
    pub fn inline_code_finder_rules(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|tag| format!("<{}>", regex_lite::escape(tag)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CharReader;
    use crate::mif::lexer::Statements;

    fn catalog(text: &str) -> Statement {
        Statements::new(CharReader::from_text(text))
            .next()
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_rules_from_catalog() {
        let mut tags = FontTags::new();
        tags.from_catalog(&catalog(
            "<FontCatalog <Font <FTag `Emphasis'> <FWeight `Bold'>> <Font <FTag `C++ (code)'>> <Font <FTag `'>>>",
        ));
        assert_eq!(tags.len(), 2);
        assert_eq!(
            tags.inline_code_finder_rules(),
            ["<C\\+\\+ \\(code\\)>", "<Emphasis>"]
        );
    }

    #[test]
    fn test_catalog_replaces_previous_tags() {
        let mut tags = FontTags::new();
        tags.from_catalog(&catalog("<FontCatalog <Font <FTag `A'>>>"));
        tags.from_catalog(&catalog("<FontCatalog >"));
        assert!(tags.is_empty());
    }
}
