//! Response value returned by handlers.
//!
//! # Design Decisions
//! - Status codes outside 100–599 are rejected at construction
//! - The body is write-then-read: the handler writes, the emitter reads

use std::fmt;

use http::StatusCode;

use crate::error::{BridgeError, BridgeResult};
use crate::http::headers::Headers;
use crate::http::stream::{MemoryStream, Stream};

/// A response produced by a handler.
pub struct Response {
    status: StatusCode,
    reason_phrase: Option<String>,
    protocol_version: String,
    headers: Headers,
    body: Box<dyn Stream>,
}

fn status_from_code(code: u16) -> BridgeResult<StatusCode> {
    if !(100..=599).contains(&code) {
        return Err(BridgeError::InvalidResponse(format!(
            "status code {code} is outside 100-599"
        )));
    }
    StatusCode::from_u16(code)
        .map_err(|e| BridgeError::InvalidResponse(format!("status code {code}: {e}")))
}

impl Response {
    /// Create a response with an empty in-memory body.
    pub fn new(status: u16) -> BridgeResult<Self> {
        Ok(Self {
            status: status_from_code(status)?,
            reason_phrase: None,
            protocol_version: "1.1".to_string(),
            headers: Headers::new(),
            body: Box::new(MemoryStream::new()),
        })
    }

    /// `200 OK` with an empty body.
    pub fn ok() -> Self {
        Self {
            status: StatusCode::OK,
            reason_phrase: None,
            protocol_version: "1.1".to_string(),
            headers: Headers::new(),
            body: Box::new(MemoryStream::new()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Custom reason phrase if set, else the canonical one (may be empty).
    pub fn reason_phrase(&self) -> &str {
        match &self.reason_phrase {
            Some(reason) => reason,
            None => self.status.canonical_reason().unwrap_or(""),
        }
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> &[String] {
        self.headers.get(name)
    }

    pub fn body(&self) -> &dyn Stream {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> &mut dyn Stream {
        self.body.as_mut()
    }

    pub fn with_status(mut self, status: u16, reason_phrase: Option<&str>) -> BridgeResult<Self> {
        self.status = status_from_code(status)?;
        self.reason_phrase = reason_phrase.map(str::to_string);
        Ok(self)
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_added_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    pub fn with_body(mut self, body: Box<dyn Stream>) -> Self {
        self.body = body;
        self
    }

    /// Replace the body with an in-memory stream holding `text`.
    pub fn with_text(self, text: impl Into<Vec<u8>>) -> Self {
        let mut body = MemoryStream::new();
        // In-memory writes cannot fail.
        let _ = body.write(&text.into());
        self.with_body(Box::new(body))
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
