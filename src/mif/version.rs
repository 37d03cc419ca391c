//! `MIFFile` version validation.

use crate::error::{Error, Result};
use regex_lite::Regex;
use std::sync::LazyLock;

/// Leading numeric part of a version value (`9.00`, `2019`, ...).
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d{0,2})").unwrap());

/// Oldest MIF version the filter reads.
pub const MINIMUM_VERSION: f64 = 8.0;

/// A supported MIF version.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    text: String,
    number: f64,
}

impl Version {
    /// Validates the value of a `MIFFile` statement.
    pub fn parse(value: &str) -> Result<Self> {
        let unsupported = || Error::UnsupportedVersion(value.to_string());
        if !VERSION_RE.is_match(value) {
            return Err(unsupported());
        }
        let number: f64 = value.parse().map_err(|_| unsupported())?;
        if number < MINIMUM_VERSION {
            return Err(unsupported());
        }
        Ok(Self {
            text: value.to_string(),
            number,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn number(&self) -> f64 {
        self.number
    }
}
