//! Immutable snapshot of the ambient request state.
//!
//! # Responsibilities
//! - Capture server params, query/form/cookie maps, file descriptors and the
//!   raw input exactly once per invocation
//! - Decode the CGI process environment into that snapshot
//!
//! # Design Decisions
//! - Nothing downstream re-reads process state; the snapshot is threaded
//!   through by reference
//! - Multipart bodies are not decoded here; file descriptors come from the
//!   embedder through the builder

use std::collections::BTreeMap;
use std::io::{self, Read};

use url::form_urlencoded;

/// Well-known server-param keys.
pub mod keys {
    pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
    pub const HTTPS: &str = "HTTPS";
    pub const REQUEST_SCHEME: &str = "REQUEST_SCHEME";
    pub const SERVER_NAME: &str = "SERVER_NAME";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const REQUEST_URI: &str = "REQUEST_URI";
    pub const QUERY_STRING: &str = "QUERY_STRING";
    pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
    pub const CONTENT_TYPE: &str = "CONTENT_TYPE";

    /// Header suffixes, combined with the configured header prefix.
    pub const HOST: &str = "HOST";
    pub const X_FORWARDED_PROTO: &str = "X_FORWARDED_PROTO";
    pub const X_FORWARDED_PORT: &str = "X_FORWARDED_PORT";
    pub const COOKIE: &str = "COOKIE";
}

/// One sub-value of an uploaded-file descriptor.
///
/// Multi-file inputs carry parallel nested values, one entry per index or
/// nested field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileValue {
    Scalar(String),
    Nested(Vec<(String, FileValue)>),
}

impl FileValue {
    /// Index-keyed list of scalars (`"0"`, `"1"`, ...).
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FileValue::Nested(
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), FileValue::Scalar(v.into())))
                .collect(),
        )
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FileValue::Scalar(s) => Some(s),
            FileValue::Nested(_) => None,
        }
    }

    /// Child by key; `None` for scalars or missing keys.
    pub fn get(&self, key: &str) -> Option<&FileValue> {
        match self {
            FileValue::Scalar(_) => None,
            FileValue::Nested(children) => children.iter().find(|(k, _)| k == key).map(|(_, v)| v),
        }
    }
}

impl From<&str> for FileValue {
    fn from(value: &str) -> Self {
        FileValue::Scalar(value.to_string())
    }
}

impl From<String> for FileValue {
    fn from(value: String) -> Self {
        FileValue::Scalar(value)
    }
}

/// Ambient descriptor of one file form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Client-side file name.
    pub name: FileValue,
    /// Client-declared media type.
    pub media_type: FileValue,
    /// Temporary storage path.
    pub tmp_name: FileValue,
    /// Numeric upload status.
    pub error: FileValue,
    /// Size in bytes.
    pub size: FileValue,
}

impl FileDescriptor {
    /// Descriptor for a single uploaded file.
    pub fn single(name: &str, media_type: &str, tmp_name: &str, error: u8, size: u64) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            tmp_name: tmp_name.into(),
            error: FileValue::Scalar(error.to_string()),
            size: FileValue::Scalar(size.to_string()),
        }
    }
}

/// Snapshot of everything the ambient process supplies for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientEnvironment {
    server: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    form: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    files: Vec<(String, FileDescriptor)>,
    raw_input: Vec<u8>,
}

impl AmbientEnvironment {
    pub fn builder() -> AmbientEnvironmentBuilder {
        AmbientEnvironmentBuilder::default()
    }

    /// Snapshot the current process: environment variables plus stdin.
    pub fn from_process() -> io::Result<Self> {
        Self::from_cgi(std::env::vars(), io::stdin().lock())
    }

    /// Build a snapshot from CGI-style variables and the request body.
    ///
    /// The query string, cookie header and url-encoded form body are decoded
    /// into their maps; `input` is read to the end exactly once.
    pub fn from_cgi<I>(vars: I, mut input: impl Read) -> io::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let server: BTreeMap<String, String> = vars.into_iter().collect();

        let mut raw_input = Vec::new();
        input.read_to_end(&mut raw_input)?;

        let query = server
            .get(keys::QUERY_STRING)
            .map(|qs| decode_pairs(qs.as_bytes()))
            .unwrap_or_default();

        let cookies = server
            .get(&format!("HTTP_{}", keys::COOKIE))
            .map(|header| decode_cookies(header))
            .unwrap_or_default();

        let is_form = server
            .get(keys::CONTENT_TYPE)
            .map(|ct| ct.to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        let form = if is_form {
            decode_pairs(&raw_input)
        } else {
            BTreeMap::new()
        };

        tracing::trace!(
            vars = server.len(),
            input_bytes = raw_input.len(),
            "Captured CGI environment"
        );

        Ok(Self {
            server,
            query,
            form,
            cookies,
            files: Vec::new(),
            raw_input,
        })
    }

    pub fn server(&self) -> &BTreeMap<String, String> {
        &self.server
    }

    /// Server param by key.
    pub fn server_param(&self, key: &str) -> Option<&str> {
        self.server.get(key).map(String::as_str)
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn form(&self) -> &BTreeMap<String, String> {
        &self.form
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn files(&self) -> &[(String, FileDescriptor)] {
        &self.files
    }

    pub fn raw_input(&self) -> &[u8] {
        &self.raw_input
    }
}

fn decode_pairs(input: &[u8]) -> BTreeMap<String, String> {
    form_urlencoded::parse(input).into_owned().collect()
}

/// Pairs without `=` are dropped; a repeated name keeps its last value.
fn decode_cookies(header: &str) -> BTreeMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let pair = pair.trim();
            if !pair.contains('=') {
                return None;
            }
            form_urlencoded::parse(pair.as_bytes()).into_owned().next()
        })
        .collect()
}

/// Builder for [`AmbientEnvironment`].
#[derive(Debug, Default)]
pub struct AmbientEnvironmentBuilder {
    env: AmbientEnvironment,
}

impl AmbientEnvironmentBuilder {
    pub fn server(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.server.insert(key.into(), value.into());
        self
    }

    pub fn method(self, method: &str) -> Self {
        self.server(keys::REQUEST_METHOD, method)
    }

    pub fn request_uri(self, uri: &str) -> Self {
        self.server(keys::REQUEST_URI, uri)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.query.insert(key.into(), value.into());
        self
    }

    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.form.insert(key.into(), value.into());
        self
    }

    pub fn cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.cookies.insert(key.into(), value.into());
        self
    }

    pub fn file(mut self, field: impl Into<String>, descriptor: FileDescriptor) -> Self {
        self.env.files.push((field.into(), descriptor));
        self
    }

    pub fn raw_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.env.raw_input = input.into();
        self
    }

    pub fn build(self) -> AmbientEnvironment {
        self.env
    }
}
