//! Capture/merge orchestration for a single invocation.
//!
//! # Responsibilities
//! - Build the request from the ambient snapshot
//! - Run the handler inside a capture scope
//! - Validate the returned value and merge captured output into the body
//! - Hand the final response to the emitter
//!
//! # Design Decisions
//! - The capture scope is released on every path (finish, or drop on error/panic)
//! - Empty captured output leaves the body untouched
//! - Bridge errors returned by the handler are passed through as-is

use std::any::{type_name, Any};
use std::io;

use crate::ambient::AmbientEnvironment;
use crate::capture::CaptureScope;
use crate::container::Container;
use crate::emitter::{OutboundChannel, ResponseEmitter};
use crate::error::{BoxError, BridgeError, BridgeResult};
use crate::http::{Request, RequestBuilder, Response, Stream};

/// Runs one handler invocation end to end.
#[derive(Clone, Copy)]
pub struct Orchestrator<'a> {
    builder: &'a RequestBuilder,
    container: &'a Container,
    emitter: &'a ResponseEmitter,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        builder: &'a RequestBuilder,
        container: &'a Container,
        emitter: &'a ResponseEmitter,
    ) -> Self {
        Self {
            builder,
            container,
            emitter,
        }
    }

    /// Build, invoke, merge and emit.
    pub fn run<H, R, E>(
        &self,
        env: &AmbientEnvironment,
        channel: &mut dyn OutboundChannel,
        handler: H,
    ) -> BridgeResult<()>
    where
        H: FnOnce(Request, &Container) -> Result<R, E>,
        R: Any,
        E: Into<BoxError>,
    {
        let request = self.builder.build(env)?;
        let response = self.invoke(request, handler)?;
        self.emitter.emit(response, channel)
    }

    /// Invoke `handler` under capture and return the merged response.
    pub fn invoke<H, R, E>(&self, request: Request, handler: H) -> BridgeResult<Response>
    where
        H: FnOnce(Request, &Container) -> Result<R, E>,
        R: Any,
        E: Into<BoxError>,
    {
        let scope = CaptureScope::begin();

        let returned = match handler(request, self.container) {
            Ok(value) => value,
            Err(err) => {
                drop(scope);
                let err = pass_through(err.into());
                tracing::warn!(error = %err, "Handler failed; captured output discarded");
                return Err(err);
            }
        };

        let captured = scope.finish();
        let mut response = into_response(returned)?;

        if !captured.is_empty() {
            tracing::debug!(captured_bytes = captured.len(), "Merging captured output");
            append(response.body_mut(), captured.as_bytes()).map_err(|e| {
                BridgeError::InvalidResponse(format!(
                    "cannot append captured output to response body: {e}"
                ))
            })?;
        }

        Ok(response)
    }
}

/// Write `data` after the existing content, in a single write call.
fn append(body: &mut dyn Stream, data: &[u8]) -> io::Result<()> {
    if body.is_seekable() {
        body.seek_end()?;
    }
    body.write(data).map(|_| ())
}

fn pass_through(err: BoxError) -> BridgeError {
    match err.downcast::<BridgeError>() {
        Ok(bridge) => *bridge,
        Err(other) => BridgeError::Handler(other),
    }
}

fn into_response<R: Any>(value: R) -> BridgeResult<Response> {
    let boxed: Box<dyn Any> = Box::new(value);
    boxed.downcast::<Response>().map(|r| *r).map_err(|_| {
        BridgeError::InvalidResponse(format!(
            "handler returned {}, expected {}",
            type_name::<R>(),
            type_name::<Response>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture;
    use crate::config::RequestConfig;
    use crate::error::ErrorKind;
    use crate::http::{HttpFactory, Stream};
    use std::sync::Arc;

    fn parts() -> (RequestBuilder, Container, ResponseEmitter) {
        let factory = Arc::new(HttpFactory);
        let builder =
            RequestBuilder::new(factory.clone(), factory.clone(), factory, RequestConfig::default());
        (builder, Container::new(), ResponseEmitter::new())
    }

    fn request(builder: &RequestBuilder) -> Request {
        builder.build(&AmbientEnvironment::default()).unwrap()
    }

    #[test]
    fn test_captured_output_is_appended() {
        let (builder, container, emitter) = parts();
        let orchestrator = Orchestrator::new(&builder, &container, &emitter);

        let mut response = orchestrator
            .invoke(request(&builder), |_, _| {
                crate::echo!("abc");
                Ok::<_, BoxError>(Response::ok().with_text("body:"))
            })
            .unwrap();

        response.body_mut().rewind().unwrap();
        assert_eq!(response.body_mut().contents().unwrap(), b"body:abc");
    }

    #[test]
    fn test_captured_output_lands_after_prefilled_body() {
        let (builder, container, emitter) = parts();
        let orchestrator = Orchestrator::new(&builder, &container, &emitter);

        let mut response = orchestrator
            .invoke(request(&builder), |_, _| {
                crate::echo!("abc");
                let body = crate::http::MemoryStream::from_bytes("hello");
                Ok::<_, BoxError>(Response::ok().with_body(Box::new(body)))
            })
            .unwrap();

        response.body_mut().rewind().unwrap();
        assert_eq!(response.body_mut().contents().unwrap(), b"helloabc");
    }

    #[test]
    fn test_non_response_is_rejected() {
        let (builder, container, emitter) = parts();
        let orchestrator = Orchestrator::new(&builder, &container, &emitter);
        let depth = capture::depth();

        let err = orchestrator
            .invoke(request(&builder), |_, _| Ok::<_, BoxError>("not a response".to_string()))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert!(err.to_string().contains("String"));
        assert_eq!(capture::depth(), depth);
    }

    #[test]
    fn test_bridge_errors_pass_through() {
        let (builder, container, emitter) = parts();
        let orchestrator = Orchestrator::new(&builder, &container, &emitter);

        let err = orchestrator
            .invoke(request(&builder), |_, container: &Container| {
                container.get("missing")?;
                Ok::<_, BridgeError>(Response::ok())
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
