//! Implicit output capture.
//!
//! # Data Flow
//! ```text
//! orchestrator
//!     → scope.rs (CaptureScope::begin records depth, opens a level)
//!     → handler writes via echo!/write → buffer.rs (top level)
//!     → CaptureScope::finish (captured text) or drop (discard)
//! ```

pub mod buffer;
pub mod scope;

pub use buffer::{depth, write};
pub use scope::CaptureScope;
