//! Body streams.
//!
//! # Responsibilities
//! - Abstract over in-memory, file-backed and one-shot reader bodies
//! - Report seekability so consumers know whether a rewind is allowed
//!
//! # Design Decisions
//! - Non-seekable streams are read once; `rewind` on them is an error
//! - `contents` reads from the current position to the end

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A message body.
pub trait Stream: fmt::Debug {
    fn is_seekable(&self) -> bool;

    fn is_readable(&self) -> bool;

    fn is_writable(&self) -> bool;

    /// Seek back to the start. Only valid on seekable streams.
    fn rewind(&mut self) -> io::Result<()>;

    /// Seek to the end, so the next write appends. Only valid on seekable streams.
    fn seek_end(&mut self) -> io::Result<()> {
        Err(unsupported("seekable"))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Total size in bytes, if known.
    fn size(&self) -> Option<u64>;

    /// Read everything remaining from the current position.
    fn contents(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = self.read(&mut buf)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("stream is not {what}"))
}

/// Seekable, writable in-memory stream.
#[derive(Debug, Default)]
pub struct MemoryStream {
    inner: Cursor<Vec<u8>>,
}

impl MemoryStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream holding `content`, positioned at the start.
    pub fn from_bytes(content: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: Cursor::new(content.into()),
        }
    }

    /// The whole buffer, regardless of position.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.get_ref()
    }
}

impl Stream for MemoryStream {
    fn is_seekable(&self) -> bool {
        true
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.inner.set_position(0);
        Ok(())
    }

    fn seek_end(&mut self) -> io::Result<()> {
        let end = self.inner.get_ref().len() as u64;
        self.inner.set_position(end);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write_all(data)?;
        Ok(data.len())
    }

    fn size(&self) -> Option<u64> {
        Some(self.inner.get_ref().len() as u64)
    }
}

/// Read-only stream over a file on disk.
#[derive(Debug)]
pub struct FileStream {
    file: File,
    size: Option<u64>,
}

impl FileStream {
    /// Open `path` for reading.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata().ok().map(|m| m.len());
        Ok(Self { file, size })
    }
}

impl Stream for FileStream {
    fn is_seekable(&self) -> bool {
        true
    }

    fn is_readable(&self) -> bool {
        true
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0)).map(|_| ())
    }

    fn seek_end(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::End(0)).map(|_| ())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
        Err(unsupported("writable"))
    }

    fn size(&self) -> Option<u64> {
        self.size
    }
}

/// One-shot stream over an arbitrary reader (pipes, stdin).
pub struct ReaderStream {
    reader: Box<dyn Read>,
    exhausted: bool,
}

impl ReaderStream {
    pub fn new(reader: impl Read + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            exhausted: false,
        }
    }
}

impl fmt::Debug for ReaderStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderStream")
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl Stream for ReaderStream {
    fn is_seekable(&self) -> bool {
        false
    }

    fn is_readable(&self) -> bool {
        !self.exhausted
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn rewind(&mut self) -> io::Result<()> {
        Err(unsupported("seekable"))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.exhausted {
            return Ok(0);
        }
        let n = self.reader.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.exhausted = true;
        }
        Ok(n)
    }

    fn write(&mut self, _data: &[u8]) -> io::Result<usize> {
        Err(unsupported("writable"))
    }

    fn size(&self) -> Option<u64> {
        None
    }
}
