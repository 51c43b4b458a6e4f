//! Outbound channels the emitter writes to.
//!
//! # Design Decisions
//! - A channel reports where output started so emission can refuse to run
//! - `CgiChannel` speaks the CGI response format (`Status:` line, headers,
//!   blank line, body)
//! - `RecordingChannel` keeps every call for embedders that deliver bytes
//!   themselves

use std::io::{self, Write};

use http::StatusCode;

/// Transport-facing sink for an emitted response.
pub trait OutboundChannel {
    /// Where output already began, if it has.
    fn output_started(&self) -> Option<String>;

    fn send_status(&mut self, status: StatusCode, reason_phrase: &str) -> io::Result<()>;

    /// Send one header line. `status` is set on the first header line only.
    fn send_header(&mut self, name: &str, value: &str, status: Option<StatusCode>)
        -> io::Result<()>;

    fn send_body(&mut self, body: &[u8]) -> io::Result<()>;
}

/// Writes a CGI response to any writer.
#[derive(Debug)]
pub struct CgiChannel<W: Write> {
    writer: W,
    started_at: Option<String>,
    head_closed: bool,
    bytes_written: usize,
}

impl<W: Write> CgiChannel<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            started_at: None,
            head_closed: false,
            bytes_written: 0,
        }
    }

    /// Wrap a writer that something else already wrote to at `location`.
    pub fn already_started(writer: W, location: impl Into<String>) -> Self {
        Self {
            started_at: Some(location.into()),
            ..Self::new(writer)
        }
    }

    /// Bytes handed to the writer so far, head included.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.started_at.is_none() {
            self.started_at = Some("CGI channel (response head)".to_string());
        }
        self.writer.write_all(bytes)?;
        self.bytes_written += bytes.len();
        Ok(())
    }

    fn close_head(&mut self) -> io::Result<()> {
        if !self.head_closed {
            self.head_closed = true;
            self.raw(b"\r\n")?;
        }
        Ok(())
    }
}

impl<W: Write> OutboundChannel for CgiChannel<W> {
    fn output_started(&self) -> Option<String> {
        self.started_at.clone()
    }

    fn send_status(&mut self, status: StatusCode, reason_phrase: &str) -> io::Result<()> {
        let line = if reason_phrase.is_empty() {
            format!("Status: {}\r\n", status.as_u16())
        } else {
            format!("Status: {} {}\r\n", status.as_u16(), reason_phrase)
        };
        self.raw(line.as_bytes())
    }

    fn send_header(
        &mut self,
        name: &str,
        value: &str,
        _status: Option<StatusCode>,
    ) -> io::Result<()> {
        // The status already went out on its own line.
        self.raw(format!("{name}: {value}\r\n").as_bytes())
    }

    fn send_body(&mut self, body: &[u8]) -> io::Result<()> {
        self.close_head()?;
        self.raw(body)?;
        self.writer.flush()
    }
}

/// One call received by a [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Status(u16, String),
    Header {
        name: String,
        value: String,
        status: Option<u16>,
    },
    Body(Vec<u8>),
}

/// Records emitted parts in order.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    events: Vec<Emitted>,
    started_at: Option<String>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn already_started(location: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            started_at: Some(location.into()),
        }
    }

    pub fn events(&self) -> &[Emitted] {
        &self.events
    }

    /// Concatenated body bytes.
    pub fn body(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Emitted::Body(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    fn record(&mut self, event: Emitted) {
        if self.started_at.is_none() {
            self.started_at = Some("recording channel".to_string());
        }
        self.events.push(event);
    }
}

impl OutboundChannel for RecordingChannel {
    fn output_started(&self) -> Option<String> {
        self.started_at.clone()
    }

    fn send_status(&mut self, status: StatusCode, reason_phrase: &str) -> io::Result<()> {
        self.record(Emitted::Status(status.as_u16(), reason_phrase.to_string()));
        Ok(())
    }

    fn send_header(
        &mut self,
        name: &str,
        value: &str,
        status: Option<StatusCode>,
    ) -> io::Result<()> {
        self.record(Emitted::Header {
            name: name.to_string(),
            value: value.to_string(),
            status: status.map(|s| s.as_u16()),
        });
        Ok(())
    }

    fn send_body(&mut self, body: &[u8]) -> io::Result<()> {
        self.record(Emitted::Body(body.to_vec()));
        Ok(())
    }
}
