//! Orchestration entry point.
//!
//! # Data Flow
//! ```text
//! Bridge::builder() (factories + config)
//!     → build() → Bridge { RequestBuilder, Container, ResponseEmitter }
//!     → run(env, channel, handler)
//!         → orchestrator.rs (build → capture → handler → merge → emit)
//! ```
//!
//! # Design Decisions
//! - Missing factories are a configuration error; no defaults are substituted
//! - Each invocation runs in its own tracing span with a fresh invocation ID

pub mod orchestrator;

pub use orchestrator::Orchestrator;

use std::any::Any;
use std::io;
use std::sync::Arc;

use uuid::Uuid;

use crate::ambient::AmbientEnvironment;
use crate::config::BridgeConfig;
use crate::container::Container;
use crate::emitter::{CgiChannel, OutboundChannel, ResponseEmitter};
use crate::error::{BoxError, BridgeError, BridgeResult};
use crate::http::{Request, RequestBuilder, RequestFactory, StreamFactory, UploadedFileFactory};

/// Builder for [`Bridge`].
#[derive(Default)]
pub struct BridgeBuilder {
    request_factory: Option<Arc<dyn RequestFactory>>,
    stream_factory: Option<Arc<dyn StreamFactory>>,
    uploaded_file_factory: Option<Arc<dyn UploadedFileFactory>>,
    config: BridgeConfig,
}

impl BridgeBuilder {
    pub fn request_factory(mut self, factory: Arc<dyn RequestFactory>) -> Self {
        self.request_factory = Some(factory);
        self
    }

    pub fn stream_factory(mut self, factory: Arc<dyn StreamFactory>) -> Self {
        self.stream_factory = Some(factory);
        self
    }

    pub fn uploaded_file_factory(mut self, factory: Arc<dyn UploadedFileFactory>) -> Self {
        self.uploaded_file_factory = Some(factory);
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Assemble the bridge. Every factory must have been supplied.
    pub fn build(self) -> BridgeResult<Bridge> {
        let request_factory = self
            .request_factory
            .ok_or_else(|| missing("request factory"))?;
        let stream_factory = self.stream_factory.ok_or_else(|| missing("stream factory"))?;
        let uploaded_file_factory = self
            .uploaded_file_factory
            .ok_or_else(|| missing("uploaded-file factory"))?;

        let request_builder = RequestBuilder::new(
            request_factory,
            stream_factory,
            uploaded_file_factory,
            self.config.request.clone(),
        );

        Ok(Bridge {
            request_builder,
            container: Container::new(),
            emitter: ResponseEmitter::new(),
            config: self.config,
        })
    }
}

fn missing(what: &str) -> BridgeError {
    BridgeError::Configuration(format!("no {what} supplied"))
}

/// Translates ambient state into a request, runs a handler, emits the response.
pub struct Bridge {
    request_builder: RequestBuilder,
    container: Container,
    emitter: ResponseEmitter,
    config: BridgeConfig,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Mutable access for registering services.
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Run `handler` against `env` and emit its response to `channel`.
    ///
    /// Returns once emission has completed or an error has propagated.
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
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!("bridge", invocation_id = %invocation_id);
        let _enter = span.enter();

        let result = Orchestrator::new(&self.request_builder, &self.container, &self.emitter)
            .run(env, channel, handler);

        match &result {
            Ok(()) => tracing::debug!("Invocation complete"),
            Err(e) => tracing::warn!(kind = ?e.kind(), error = %e, "Invocation failed"),
        }
        result
    }

    /// Run as a CGI program: snapshot the process, write to stdout.
    pub fn run_cgi<H, R, E>(&self, handler: H) -> BridgeResult<()>
    where
        H: FnOnce(Request, &Container) -> Result<R, E>,
        R: Any,
        E: Into<BoxError>,
    {
        let env = AmbientEnvironment::from_process().map_err(|e| {
            BridgeError::InvalidRequest(format!("cannot read request input: {e}"))
        })?;
        let mut channel = CgiChannel::new(io::stdout().lock());
        self.run(&env, &mut channel, handler)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("container", &self.container)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
