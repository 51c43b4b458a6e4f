//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or in-memory string
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → handed to Bridge::builder()
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_str, ConfigError};
pub use schema::BridgeConfig;
pub use schema::ObservabilityConfig;
pub use schema::RequestConfig;
