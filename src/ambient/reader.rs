//! Typed getters over an ambient snapshot.
//!
//! # Responsibilities
//! - Resolve method, scheme, host, port, protocol version and request target
//!   with a fixed precedence and deterministic defaults
//!
//! # Design Decisions
//! - Reads only the snapshot; repeated calls always agree
//! - The port stays a string so malformed values surface as URI errors

use crate::ambient::environment::{keys, AmbientEnvironment};
use crate::ambient::headers::normalize_headers;
use crate::config::RequestConfig;
use crate::http::Headers;

/// Read-only view resolving request facts from an [`AmbientEnvironment`].
#[derive(Debug, Clone, Copy)]
pub struct AmbientReader<'a> {
    env: &'a AmbientEnvironment,
    config: &'a RequestConfig,
}

impl<'a> AmbientReader<'a> {
    pub fn new(env: &'a AmbientEnvironment, config: &'a RequestConfig) -> Self {
        Self { env, config }
    }

    fn param(&self, key: &str) -> Option<&'a str> {
        self.env.server_param(key)
    }

    fn header_param(&self, suffix: &str) -> Option<&'a str> {
        self.env
            .server_param(&format!("{}{}", self.config.header_prefix, suffix))
    }

    /// Uppercased method, `GET` when absent.
    pub fn method(&self) -> String {
        self.param(keys::REQUEST_METHOD)
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| "GET".to_string())
    }

    /// `https` or `http`.
    pub fn scheme(&self) -> &'static str {
        let https_flag = self
            .param(keys::HTTPS)
            .map(|v| !v.is_empty() && !v.eq_ignore_ascii_case("off"))
            .unwrap_or(false);
        if https_flag {
            return "https";
        }
        if self
            .header_param(keys::X_FORWARDED_PROTO)
            .map(|v| v.eq_ignore_ascii_case("https"))
            .unwrap_or(false)
        {
            return "https";
        }
        if self.param(keys::REQUEST_SCHEME) == Some("https") {
            return "https";
        }
        "http"
    }

    /// Host header, else server name, else the configured default.
    pub fn host(&self) -> String {
        self.header_param(keys::HOST)
            .filter(|h| !h.is_empty())
            .or_else(|| self.param(keys::SERVER_NAME).filter(|h| !h.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_host.clone())
    }

    /// Explicit port if it differs from the scheme default, else the
    /// forwarded port, else `None` (use the scheme default).
    pub fn port(&self) -> Option<String> {
        let default_port = if self.scheme() == "https" { 443 } else { 80 };

        if let Some(port) = self.param(keys::SERVER_PORT).filter(|p| !p.is_empty()) {
            if port.parse::<u16>().ok() != Some(default_port) {
                return Some(port.to_string());
            }
        }
        self.header_param(keys::X_FORWARDED_PORT)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }

    /// Protocol version without the `HTTP/` prefix.
    pub fn protocol_version(&self) -> String {
        match self.param(keys::SERVER_PROTOCOL).filter(|p| !p.is_empty()) {
            Some(protocol) => protocol
                .strip_prefix("HTTP/")
                .unwrap_or(protocol)
                .to_string(),
            None => self.config.default_protocol_version.clone(),
        }
    }

    /// Path plus query. The query string is appended only when the request
    /// target does not already carry one.
    pub fn request_target(&self) -> String {
        let target = self
            .param(keys::REQUEST_URI)
            .filter(|t| !t.is_empty())
            .unwrap_or("/");
        match self.param(keys::QUERY_STRING).filter(|q| !q.is_empty()) {
            Some(query) if !target.contains('?') => format!("{target}?{query}"),
            _ => target.to_string(),
        }
    }

    /// Full URI string `scheme://host[:port]path[?query]`.
    pub fn uri_string(&self) -> String {
        let host = self.host();
        let mut uri = format!("{}://{}", self.scheme(), host);
        if let Some(port) = self.port() {
            if !host_has_port(&host) {
                uri.push(':');
                uri.push_str(&port);
            }
        }
        let target = self.request_target();
        if !target.starts_with('/') {
            uri.push('/');
        }
        uri.push_str(&target);
        uri
    }

    /// Normalized headers from the header-bearing server params.
    pub fn headers(&self) -> Headers {
        normalize_headers(
            self.env.server(),
            &self.config.header_prefix,
            &self.config.special_headers,
        )
    }
}

/// True for `host:port` and `[v6]:port`, false for bare hosts and `[v6]`.
fn host_has_port(host: &str) -> bool {
    match host.rfind(']') {
        Some(end) => host[end..].contains(':'),
        None => host.contains(':'),
    }
}
