use super::byte_source::{ByteSource, FileSource, MemorySource};
use super::chars::CharReader;
use crate::util::encoding_for_label;
use encoding_rs::Encoding;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// A document handed to the filter: its bytes plus identification.
///
/// The bytes live behind a shared [`ByteSource`], so [`open_reader`](Self::open_reader)
/// can be called once per pass and always starts from the beginning.
#[derive(Clone)]
pub struct RawDocument {
    source: Arc<dyn ByteSource>,
    name: Option<String>,
    id: Option<String>,
    encoding: &'static Encoding,
}

impl RawDocument {
    pub fn new(source: Arc<dyn ByteSource>) -> Self {
        Self {
            source,
            name: None,
            id: None,
            encoding: encoding_rs::UTF_8,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let mut doc = Self::new(Arc::new(FileSource::open(path)?));
        doc.name = Some(path.display().to_string());
        Ok(doc)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Arc::new(MemorySource::new(bytes)))
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    /// Sets the encoding used when the document has no byte-order mark.
    /// Unknown labels are ignored with a warning.
    pub fn with_encoding(mut self, label: &str) -> Self {
        match encoding_for_label(label) {
            Some(encoding) => self.encoding = encoding,
            None => tracing::warn!("unknown encoding label {label:?}, keeping {}", self.encoding.name()),
        }
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn default_encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Opens a fresh character reader positioned at the start of the document.
    pub fn open_reader(&self) -> io::Result<CharReader> {
        CharReader::new(Arc::clone(&self.source), self.encoding)
    }
}

impl std::fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocument")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("len", &self.source.len())
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_can_be_opened_twice() {
        let doc = RawDocument::from_text("<MIFFile 9.00>");
        for _ in 0..2 {
            let mut reader = doc.open_reader().unwrap();
            assert_eq!(reader.read_char().unwrap(), Some('<'));
        }
    }

    #[test]
    fn test_with_encoding_label() {
        let doc = RawDocument::from_bytes(b"\xA3".to_vec()).with_encoding("windows-1252");
        assert_eq!(doc.default_encoding(), encoding_rs::WINDOWS_1252);
        let mut reader = doc.open_reader().unwrap();
        assert_eq!(reader.read_char().unwrap(), Some('\u{A3}'));

        let doc = RawDocument::from_text("x").with_encoding("no-such-encoding");
        assert_eq!(doc.default_encoding(), encoding_rs::UTF_8);
    }
}
