//! HTTP message subsystem.
//!
//! # Data Flow
//! ```text
//! AmbientEnvironment
//!     → builder.rs (validate method/URI, open body, parse body, files)
//!         uses factory.rs (request, stream, uploaded-file factories)
//!     → request.rs (immutable Request handed to the handler)
//!
//! handler
//!     → response.rs (Response with headers.rs multimap and stream.rs body)
//!     → emitter
//! ```

pub mod builder;
pub mod factory;
pub mod headers;
pub mod request;
pub mod response;
pub mod stream;
pub mod upload;

pub use builder::{parse_method, RequestBuilder};
pub use factory::{HttpFactory, RequestFactory, StreamFactory, UploadedFileFactory};
pub use headers::Headers;
pub use request::{Request, SUPPORTED_METHODS};
pub use response::Response;
pub use stream::{FileStream, MemoryStream, ReaderStream, Stream};
pub use upload::{UploadError, UploadedFile, UploadedFiles};
