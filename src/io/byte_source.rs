use std::fs::File;
use std::io;
#[cfg(not(unix))]
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// A random-access source of document bytes.
///
/// Reads never move a shared cursor, so the same source can be decoded from
/// the start as many times as needed (the filter reads every document twice).
pub trait ByteSource: Send + Sync {
    /// Returns the total length of the source.
    fn len(&self) -> u64;

    /// Returns true if the source is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills `buf` with the bytes starting at `offset`.
    /// Returns the number of bytes read (always `buf.len()` on success).
    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

// --- Implementation: Local File ---

pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }

    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

#[cfg(unix)]
impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)?;
        Ok(buf.len())
    }
}

#[cfg(not(unix))]
impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(buf.len())
    }
}

// --- Implementation: In-Memory ---

/// An in-memory source, used for snippets and tests.
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<&str> for MemorySource {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_at_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&start| start <= self.data.len())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "offset beyond end of data")
            })?;
        let bytes = self
            .data
            .get(start..start + buf.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "not enough data"))?;
        buf.copy_from_slice(bytes);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_source_read_at_into() {
        let source = MemorySource::from("<MIFFile 9.00>");
        let mut buf = [0u8; 4];
        assert_eq!(source.read_at_into(9, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"9.00");
    }

    #[test]
    fn test_memory_source_short_read_is_an_error() {
        let source = MemorySource::new(b"abc".to_vec());
        let mut buf = [0u8; 4];
        assert!(source.read_at_into(1, &mut buf).is_err());
        assert!(source.read_at_into(8, &mut buf[..0]).is_err());
    }

    #[test]
    fn test_file_source_reads_twice() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<MIFFile 2019>").unwrap();
        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.len(), 14);

        let mut first = [0u8; 7];
        let mut second = [0u8; 7];
        source.read_at_into(1, &mut first).unwrap();
        source.read_at_into(1, &mut second).unwrap();
        assert_eq!(&first, b"MIFFile");
        assert_eq!(first, second);
    }
}
