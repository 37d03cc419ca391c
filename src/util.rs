//! Utility functions shared across the crate.

use encoding_rs::Encoding;

// ============================================================================
// Encoding Detection
// ============================================================================

/// Picks the encoding for a document from its first bytes.
///
/// A byte-order mark wins (UTF-8, UTF-16LE or UTF-16BE); otherwise the
/// `fallback` is used. Returns the encoding and the length of the BOM to skip.
///
/// # Examples
///
/// ```
/// use mifkit::util::sniff_encoding;
///
/// let (encoding, bom) = sniff_encoding(b"\xEF\xBB\xBF<MIFFile", encoding_rs::WINDOWS_1252);
/// assert_eq!(encoding, encoding_rs::UTF_8);
/// assert_eq!(bom, 3);
///
/// let (encoding, bom) = sniff_encoding(b"<MIFFile", encoding_rs::UTF_8);
/// assert_eq!(encoding, encoding_rs::UTF_8);
/// assert_eq!(bom, 0);
/// ```
pub fn sniff_encoding(head: &[u8], fallback: &'static Encoding) -> (&'static Encoding, usize) {
    Encoding::for_bom(head).unwrap_or((fallback, 0))
}

/// Resolves a WHATWG encoding label (`"utf-8"`, `"windows-1252"`, `"shift_jis"`, ...).
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}
