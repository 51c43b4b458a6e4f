//! Server request value.
//!
//! # Responsibilities
//! - Hold everything the handler may inspect about the incoming request
//! - Offer consuming `with_*` builders used while the request is assembled
//!
//! # Design Decisions
//! - No setters; once handed to the handler the request is only read
//! - The body is the single stream opened from the raw input

use std::collections::BTreeMap;
use std::fmt;

use http::Method;
use serde_json::Value;
use url::Url;

use crate::http::headers::Headers;
use crate::http::stream::{MemoryStream, Stream};
use crate::http::upload::UploadedFiles;

/// The nine request methods the bridge accepts.
pub const SUPPORTED_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

/// An incoming server request.
pub struct Request {
    method: Method,
    uri: Url,
    protocol_version: String,
    headers: Headers,
    body: Box<dyn Stream>,
    server_params: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    parsed_body: Option<Value>,
    uploaded_files: UploadedFiles,
}

impl Request {
    /// Create a request with an empty body and no parameters.
    pub fn new(method: Method, uri: Url, server_params: BTreeMap<String, String>) -> Self {
        Self {
            method,
            uri,
            protocol_version: "1.1".to_string(),
            headers: Headers::new(),
            body: Box::new(MemoryStream::new()),
            server_params,
            cookies: BTreeMap::new(),
            query: BTreeMap::new(),
            parsed_body: None,
            uploaded_files: UploadedFiles::default(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Values of one header, empty if absent.
    pub fn header(&self, name: &str) -> &[String] {
        self.headers.get(name)
    }

    pub fn header_line(&self, name: &str) -> String {
        self.headers.get_line(name)
    }

    /// Body stream. Reading advances it; see [`Stream::is_seekable`].
    pub fn body_mut(&mut self) -> &mut dyn Stream {
        self.body.as_mut()
    }

    pub fn server_params(&self) -> &BTreeMap<String, String> {
        &self.server_params
    }

    pub fn cookie_params(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    pub fn uploaded_files(&self) -> &UploadedFiles {
        &self.uploaded_files
    }

    pub fn uploaded_files_mut(&mut self) -> &mut UploadedFiles {
        &mut self.uploaded_files
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Add a value to `name`, keeping existing ones.
    pub fn with_added_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: Box<dyn Stream>) -> Self {
        self.body = body;
        self
    }

    pub fn with_cookie_params(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_query_params(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_parsed_body(mut self, parsed_body: Option<Value>) -> Self {
        self.parsed_body = parsed_body;
        self
    }

    pub fn with_uploaded_files(mut self, files: UploadedFiles) -> Self {
        self.uploaded_files = files;
        self
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri.as_str())
            .field("protocol_version", &self.protocol_version)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("query", &self.query)
            .field("parsed_body", &self.parsed_body)
            .finish_non_exhaustive()
    }
}
