//! Response emission.
//!
//! # Responsibilities
//! - Refuse to emit once output has started on the channel
//! - Write status, then headers, then body, always in that order
//!
//! # Design Decisions
//! - The status accompanies the first header line only
//! - Blank header values are not sent
//! - Only seekable bodies are rewound before the full read

pub mod channel;

pub use channel::{CgiChannel, Emitted, OutboundChannel, RecordingChannel};

use crate::error::{BridgeError, BridgeResult};
use crate::http::Response;

/// Writes responses to an [`OutboundChannel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEmitter;

impl ResponseEmitter {
    pub fn new() -> Self {
        Self
    }

    /// Emit `response` to `channel`.
    pub fn emit(
        &self,
        mut response: Response,
        channel: &mut dyn OutboundChannel,
    ) -> BridgeResult<()> {
        if let Some(location) = channel.output_started() {
            tracing::warn!(location = %location, "Output already started; response not emitted");
            return Err(BridgeError::Emission(format!(
                "output already started at {location}"
            )));
        }

        let status = response.status();
        channel
            .send_status(status, response.reason_phrase())
            .map_err(|e| emission_io("status line", e))?;

        let mut first = true;
        let mut header_lines = 0usize;
        for (name, values) in response.headers().iter() {
            for value in values {
                if value.trim().is_empty() {
                    continue;
                }
                let line_status = if first { Some(status) } else { None };
                channel
                    .send_header(name, value, line_status)
                    .map_err(|e| emission_io("header", e))?;
                first = false;
                header_lines += 1;
            }
        }

        let body = response.body_mut();
        if body.is_seekable() {
            body.rewind().map_err(|e| emission_io("body rewind", e))?;
        }
        let content = body.contents().map_err(|e| emission_io("body read", e))?;
        channel
            .send_body(&content)
            .map_err(|e| emission_io("body", e))?;

        tracing::debug!(
            status = status.as_u16(),
            header_lines,
            body_bytes = content.len(),
            "Response emitted"
        );
        Ok(())
    }
}

fn emission_io(stage: &str, err: std::io::Error) -> BridgeError {
    BridgeError::Emission(format!("failed to write {stage}: {err}"))
}
