use super::byte_source::ByteSource;
use std::io::{self, Read};
use std::sync::Arc;

/// Sequential `Read` view over a shared [`ByteSource`].
///
/// Every pass over a document gets its own cursor starting at offset zero.
pub struct ByteSourceCursor {
    inner: Arc<dyn ByteSource>,
    position: u64,
}

impl ByteSourceCursor {
    pub fn new(inner: Arc<dyn ByteSource>) -> Self {
        Self { inner, position: 0 }
    }

    /// Starts reading at `offset` instead of the beginning (used to step over a BOM).
    pub fn starting_at(inner: Arc<dyn ByteSource>, offset: u64) -> Self {
        Self {
            inner,
            position: offset,
        }
    }
}

impl Read for ByteSourceCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let total_len = self.inner.len();
        if self.position >= total_len {
            return Ok(0);
        }
        let count = (total_len - self.position).min(buf.len() as u64) as usize;
        let read = self.inner.read_at_into(self.position, &mut buf[..count])?;
        self.position += read as u64;
        Ok(read)
    }
}
