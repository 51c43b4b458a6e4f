//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Ambient-to-request translation settings.
    pub request: RequestConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Settings used while translating the ambient environment into a request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RequestConfig {
    /// Host used when neither the host header nor the server name is present.
    pub default_host: String,

    /// Protocol version used when the protocol descriptor is absent.
    pub default_protocol_version: String,

    /// Prefix marking header-bearing ambient keys (e.g. `HTTP_USER_AGENT`).
    pub header_prefix: String,

    /// Non-prefixed ambient keys that still carry a header.
    pub special_headers: Vec<String>,

    /// Decode `application/json` bodies into the parsed body.
    pub parse_json_body: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_host: "localhost".to_string(),
            default_protocol_version: "1.1".to_string(),
            header_prefix: "HTTP_".to_string(),
            special_headers: vec!["CONTENT_TYPE".to_string(), "CONTENT_LENGTH".to_string()],
            parse_json_body: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
