//! CGI-style request/response bridge.
//!
//! Translates an ambient request snapshot (server params, query/form/cookie
//! maps, uploaded-file descriptors, raw input) into an immutable
//! [`Request`], runs a handler against it and a lazy service [`Container`],
//! merges any implicit output the handler produced into its [`Response`],
//! and emits that response to an outbound channel.
//!
//! # Architecture Overview
//!
//! ```text
//!   AmbientEnvironment ──▶ RequestBuilder ──▶ Request
//!                                               │
//!                         CaptureScope::begin   ▼
//!                         ┌──────────── handler(Request, &Container)
//!                         │  echo!(..)          │
//!                         ▼                     ▼
//!                  captured text ──merge──▶ Response ──▶ ResponseEmitter ──▶ channel
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cgi_bridge::{echo, Bridge, BridgeError, HttpFactory, Response};
//!
//! let factory = Arc::new(HttpFactory);
//! let bridge = Bridge::builder()
//!     .request_factory(factory.clone())
//!     .stream_factory(factory.clone())
//!     .uploaded_file_factory(factory)
//!     .build()?;
//!
//! bridge.run_cgi(|request, _container| {
//!     echo!("Hello from {}", request.uri().path());
//!     Ok::<_, BridgeError>(Response::ok().with_header("Content-Type", "text/plain"))
//! })?;
//! # Ok::<(), BridgeError>(())
//! ```

pub mod ambient;
pub mod bridge;
pub mod capture;
pub mod config;
pub mod container;
pub mod emitter;
pub mod error;
pub mod http;
pub mod observability;

pub use ambient::AmbientEnvironment;
pub use bridge::{Bridge, BridgeBuilder};
pub use config::BridgeConfig;
pub use container::{Container, Service};
pub use emitter::{CgiChannel, OutboundChannel, RecordingChannel, ResponseEmitter};
pub use error::{BoxError, BridgeError, BridgeResult, ErrorKind};
pub use http::{HttpFactory, Request, Response};
