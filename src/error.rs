//! Error types for MIF extraction.

use thiserror::Error;

/// Errors that stop the extraction of a document.
///
/// Recoverable oddities (unknown character names, bad hex digits, ...) are
/// logged and substituted instead of being reported here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of stream while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Unsupported MIF version: {0}")]
    UnsupportedVersion(String),

    #[error("The provided document type is unsupported: no MIFFile statement found")]
    NotMif,

    #[error("Missing required statement: {0}")]
    MissingStatement(&'static str),

    #[error("Unsupported statement starting with {0:?}")]
    UnsupportedStatement(char),

    #[error("Invalid inline code rule: {0}")]
    Pattern(#[from] regex_lite::Error),

    #[error("Invalid parameters: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No document is open")]
    NotOpen,
}

pub type Result<T> = std::result::Result<T, Error>;
