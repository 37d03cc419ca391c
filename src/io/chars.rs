use super::adapter::ByteSourceCursor;
use super::byte_source::{ByteSource, MemorySource};
use crate::util::sniff_encoding;
use encoding_rs::{CoderResult, Decoder, Encoding};
use std::io::{self, Read};
use std::sync::Arc;

const CHUNK_SIZE: usize = 16 * 1024;

/// Incremental character reader over a [`ByteSource`].
///
/// Bytes are decoded chunk by chunk with an `encoding_rs` decoder, so large
/// documents are never held in memory as text. One character of push-back is
/// available for scanners that need a single character of lookahead.
pub struct CharReader {
    cursor: ByteSourceCursor,
    decoder: Decoder,
    encoding: &'static Encoding,
    input: Vec<u8>,
    decoded: String,
    pos: usize,
    finished: bool,
    pushback: Option<char>,
}

impl CharReader {
    /// Opens a reader at the start of `source`.
    ///
    /// A byte-order mark selects the encoding and is skipped; otherwise
    /// `fallback` is used.
    pub fn new(source: Arc<dyn ByteSource>, fallback: &'static Encoding) -> io::Result<Self> {
        let mut head = [0u8; 3];
        let head_len = source.len().min(head.len() as u64) as usize;
        source.read_at_into(0, &mut head[..head_len])?;
        let (encoding, bom_len) = sniff_encoding(&head[..head_len], fallback);
        Ok(Self::with_encoding(source, encoding, bom_len))
    }

    /// Reader over an in-memory UTF-8 string.
    pub fn from_text(text: &str) -> Self {
        let (encoding, bom_len) = sniff_encoding(text.as_bytes(), encoding_rs::UTF_8);
        Self::with_encoding(Arc::new(MemorySource::from(text)), encoding, bom_len)
    }

    fn with_encoding(source: Arc<dyn ByteSource>, encoding: &'static Encoding, bom_len: usize) -> Self {
        Self {
            cursor: ByteSourceCursor::starting_at(source, bom_len as u64),
            decoder: encoding.new_decoder_without_bom_handling(),
            encoding,
            input: vec![0u8; CHUNK_SIZE],
            decoded: String::new(),
            pos: 0,
            finished: false,
            pushback: None,
        }
    }

    /// The encoding actually used for decoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Returns the next character, or `None` at end of input.
    pub fn read_char(&mut self) -> io::Result<Option<char>> {
        if let Some(c) = self.pushback.take() {
            return Ok(Some(c));
        }
        loop {
            if let Some(c) = self.decoded[self.pos..].chars().next() {
                self.pos += c.len_utf8();
                return Ok(Some(c));
            }
            if self.finished {
                return Ok(None);
            }
            self.fill()?;
        }
    }

    /// Pushes `c` back so the next [`read_char`](Self::read_char) returns it.
    pub fn unread(&mut self, c: char) {
        debug_assert!(self.pushback.is_none(), "only one character of push-back");
        self.pushback = Some(c);
    }

    fn fill(&mut self) -> io::Result<()> {
        self.decoded.clear();
        self.pos = 0;
        let read = self.cursor.read(&mut self.input)?;
        let last = read == 0;
        let mut pending = &self.input[..read];
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(pending.len())
                .unwrap_or(pending.len() * 3 + 16);
            self.decoded.reserve(needed);
            let (result, consumed, _) = self.decoder.decode_to_string(pending, &mut self.decoded, last);
            pending = &pending[consumed..];
            if let CoderResult::InputEmpty = result {
                break;
            }
        }
        self.finished = last;
        Ok(())
    }
}
