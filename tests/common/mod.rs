//! Shared utilities for integration testing.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::Arc;

use cgi_bridge::http::{MemoryStream, Stream};
use cgi_bridge::{Bridge, HttpFactory};
use tempfile::NamedTempFile;

/// Bridge wired with the default factories.
pub fn bridge() -> Bridge {
    let factory = Arc::new(HttpFactory);
    Bridge::builder()
        .request_factory(factory.clone())
        .stream_factory(factory.clone())
        .uploaded_file_factory(factory)
        .build()
        .unwrap()
}

/// Temporary file standing in for an upload's temporary storage.
#[allow(dead_code)]
pub fn tmp_upload(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file
}

/// In-memory body that records every write call.
#[derive(Debug, Default)]
pub struct CountingStream {
    inner: MemoryStream,
    pub writes: Rc<RefCell<Vec<Vec<u8>>>>,
}

#[allow(dead_code)]
impl CountingStream {
    pub fn new() -> (Self, Rc<RefCell<Vec<Vec<u8>>>>) {
        let stream = Self::default();
        let writes = stream.writes.clone();
        (stream, writes)
    }
}

impl Stream for CountingStream {
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
        self.inner.rewind()
    }

    fn seek_end(&mut self) -> io::Result<()> {
        self.inner.seek_end()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.writes.borrow_mut().push(data.to_vec());
        self.inner.write(data)
    }

    fn size(&self) -> Option<u64> {
        self.inner.size()
    }
}
