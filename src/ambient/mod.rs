//! Ambient state subsystem.
//!
//! # Data Flow
//! ```text
//! process environment / embedder
//!     → environment.rs (single immutable snapshot)
//!     → reader.rs (method, scheme, host, port, protocol, target)
//!     → headers.rs (HTTP_* keys → Ada-Case header names)
//!     → request builder
//! ```

pub mod environment;
pub mod headers;
pub mod reader;

pub use environment::{AmbientEnvironment, AmbientEnvironmentBuilder, FileDescriptor, FileValue};
pub use headers::{canonical_name, normalize_headers};
pub use reader::AmbientReader;
