//! Regex-driven detection of inline codes inside extracted text.

use crate::error::Result;
use crate::resource::{Code, Part, TextFragment};
use regex_lite::Regex;

/// Code type given to spans found by the finder.
pub const FINDER_CODE_TYPE: &str = "x-inline";

/// Ordered list of regex rules; every match in a text run becomes a
/// placeholder code.
#[derive(Debug, Default)]
pub struct InlineCodeFinder {
    rules: Vec<String>,
    compiled: Option<Regex>,
}

impl InlineCodeFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: impl Into<String>) {
        self.rules.push(rule.into());
        self.compiled = None;
    }

    pub fn add_rules<I, S>(&mut self, rules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for rule in rules {
            self.add_rule(rule);
        }
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Compiles the rules into a single alternation (earlier rules win).
    pub fn compile(&mut self) -> Result<()> {
        self.compiled = if self.rules.is_empty() {
            None
        } else {
            let pattern = self
                .rules
                .iter()
                .map(|rule| format!("(?:{rule})"))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&pattern)?)
        };
        tracing::debug!("compiled {} inline code rules", self.rules.len());
        Ok(())
    }

    /// Turns matches into codes; `encode` maps matched text to code data.
    pub fn process(&self, fragment: TextFragment, encode: impl Fn(&str) -> String) -> TextFragment {
        let Some(regex) = &self.compiled else {
            return fragment;
        };
        fragment.map_text(|text| {
            let mut parts = Vec::new();
            let mut last = 0;
            for found in regex.find_iter(&text) {
                if found.is_empty() {
                    continue;
                }
                if found.start() > last {
                    parts.push(Part::Text(text[last..found.start()].to_string()));
                }
                parts.push(Part::Code(Code::placeholder(
                    FINDER_CODE_TYPE,
                    encode(found.as_str()),
                )));
                last = found.end();
            }
            if last < text.len() {
                parts.push(Part::Text(text[last..].to_string()));
            }
            parts
        })
    }
}
