//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value shapes (host, protocol version, ambient key names)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Host;

use crate::config::schema::BridgeConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request.header_prefix must not be empty")]
    EmptyHeaderPrefix,

    #[error("request.default_host {0:?} is not a valid host")]
    InvalidDefaultHost(String),

    #[error("request.default_protocol_version {0:?} is not of the form MAJOR[.MINOR]")]
    InvalidProtocolVersion(String),

    #[error("request.special_headers entry {0:?} must be UPPER_SNAKE_CASE")]
    InvalidSpecialHeader(String),

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let request = &config.request;

    if request.header_prefix.is_empty() {
        errors.push(ValidationError::EmptyHeaderPrefix);
    }

    if request.default_host.trim().is_empty() || Host::parse(&request.default_host).is_err() {
        errors.push(ValidationError::InvalidDefaultHost(request.default_host.clone()));
    }

    if !is_protocol_version(&request.default_protocol_version) {
        errors.push(ValidationError::InvalidProtocolVersion(
            request.default_protocol_version.clone(),
        ));
    }

    for key in &request.special_headers {
        if !is_upper_snake(key) {
            errors.push(ValidationError::InvalidSpecialHeader(key.clone()));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_protocol_version(version: &str) -> bool {
    let mut parts = version.split('.');
    let major_ok = parts
        .next()
        .map(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);
    let minor_ok = match parts.next() {
        Some(p) => !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()),
        None => true,
    };
    major_ok && minor_ok && parts.next().is_none()
}

fn is_upper_snake(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('_')
        && key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
