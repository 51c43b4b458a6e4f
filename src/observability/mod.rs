//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (request built, service resolved, response emitted)
//!     → one span per invocation carrying its invocation ID
//!
//! Consumers:
//!     → logging.rs subscriber (stderr), or the embedder's own subscriber
//! ```

pub mod logging;

pub use logging::init_logging;
