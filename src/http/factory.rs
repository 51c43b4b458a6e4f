//! Object factories used to assemble requests.
//!
//! The bridge never constructs requests, streams or uploaded files on its
//! own; it goes through these traits so embedders can substitute their own
//! stream types. [`HttpFactory`] is the stock implementation of all three.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::Path;

use http::Method;
use url::Url;

use crate::http::request::Request;
use crate::http::stream::{FileStream, MemoryStream, ReaderStream, Stream};
use crate::http::upload::{UploadError, UploadedFile};

/// Creates the initial request shape.
pub trait RequestFactory {
    fn create_server_request(
        &self,
        method: Method,
        uri: Url,
        server_params: BTreeMap<String, String>,
    ) -> Request;
}

/// Creates body and file streams.
pub trait StreamFactory {
    fn create_stream(&self, content: Vec<u8>) -> Box<dyn Stream>;

    fn create_stream_from_file(&self, path: &Path) -> io::Result<Box<dyn Stream>>;

    fn create_stream_from_reader(&self, reader: Box<dyn Read>) -> Box<dyn Stream>;
}

/// Creates uploaded-file leaves.
pub trait UploadedFileFactory {
    fn create_uploaded_file(
        &self,
        stream: Option<Box<dyn Stream>>,
        size: u64,
        error: UploadError,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> UploadedFile;
}

/// Default factory backed by the crate's own stream types.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFactory;

impl RequestFactory for HttpFactory {
    fn create_server_request(
        &self,
        method: Method,
        uri: Url,
        server_params: BTreeMap<String, String>,
    ) -> Request {
        Request::new(method, uri, server_params)
    }
}

impl StreamFactory for HttpFactory {
    fn create_stream(&self, content: Vec<u8>) -> Box<dyn Stream> {
        Box::new(MemoryStream::from_bytes(content))
    }

    fn create_stream_from_file(&self, path: &Path) -> io::Result<Box<dyn Stream>> {
        Ok(Box::new(FileStream::open(path)?))
    }

    fn create_stream_from_reader(&self, reader: Box<dyn Read>) -> Box<dyn Stream> {
        Box::new(ReaderStream::new(reader))
    }
}

impl UploadedFileFactory for HttpFactory {
    fn create_uploaded_file(
        &self,
        stream: Option<Box<dyn Stream>>,
        size: u64,
        error: UploadError,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> UploadedFile {
        UploadedFile::new(stream, size, error, client_filename, client_media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_http_factory_streams() {
        let factory = HttpFactory;

        let mut memory = factory.create_stream(b"abc".to_vec());
        assert!(memory.is_seekable());
        assert_eq!(memory.contents().unwrap(), b"abc");

        let reader = factory.create_stream_from_reader(Box::new(Cursor::new(b"xyz".to_vec())));
        assert!(!reader.is_seekable());

        let missing = factory.create_stream_from_file(Path::new("/nonexistent/upload"));
        assert!(missing.is_err());
    }
}
