//! Error definitions shared by every bridge subsystem.
//!
//! # Design Decisions
//! - One closed enum; callers match on [`ErrorKind`] instead of message text
//! - Nothing is retried; an invocation fails once with exactly one variant
//! - Handler errors pass through untouched inside `Handler`

use thiserror::Error;

/// Boxed error type used for handler and service-factory failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while bridging a request.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Unrecognized method, malformed URI or unusable ambient input.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Handler returned something other than a response, or a bad status code.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Container lookup for an unregistered id.
    #[error("Service \"{0}\" not found")]
    NotFound(String),

    /// A service factory failed during resolution.
    #[error("Error while resolving service \"{id}\": {source}")]
    Container {
        id: String,
        #[source]
        source: BoxError,
    },

    /// Emission attempted after output had already started.
    #[error("Unable to emit response: {0}")]
    Emission(String),

    /// Required collaborators were not supplied.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error raised by the caller's handler, propagated unchanged.
    #[error("{0}")]
    Handler(#[source] BoxError),
}

/// Fieldless discriminant of [`BridgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    InvalidResponse,
    NotFound,
    Container,
    Emission,
    Configuration,
    Handler,
}

impl BridgeError {
    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            BridgeError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            BridgeError::NotFound(_) => ErrorKind::NotFound,
            BridgeError::Container { .. } => ErrorKind::Container,
            BridgeError::Emission(_) => ErrorKind::Emission,
            BridgeError::Configuration(_) => ErrorKind::Configuration,
            BridgeError::Handler(_) => ErrorKind::Handler,
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
