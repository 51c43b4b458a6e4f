//! Header normalization from ambient server params.
//!
//! # Responsibilities
//! - Select header-bearing keys (prefixed, or on the special allow-list)
//! - Convert `UPPER_SNAKE` keys to canonical `Ada-Case` names
//!
//! # Design Decisions
//! - Values are kept even when blank; only emission skips blank values
//! - Repeated logical headers accumulate in order

use std::collections::BTreeMap;

use crate::http::Headers;

/// Convert an ambient key such as `X_CUSTOM_HEADER` to `X-Custom-Header`.
pub fn canonical_name(key: &str) -> String {
    key.split('_')
        .map(|segment| {
            let lower = segment.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Header name carried by an ambient key, if any.
pub fn header_name(key: &str, prefix: &str, special: &[String]) -> Option<String> {
    if let Some(stripped) = key.strip_prefix(prefix) {
        if stripped.is_empty() {
            return None;
        }
        return Some(canonical_name(stripped));
    }
    if special.iter().any(|s| s == key) {
        return Some(canonical_name(key));
    }
    None
}

/// Collect every header-bearing server param into a [`Headers`] map.
pub fn normalize_headers(
    server: &BTreeMap<String, String>,
    prefix: &str,
    special: &[String],
) -> Headers {
    let mut headers = Headers::new();
    for (key, value) in server {
        if let Some(name) = header_name(key, prefix, special) {
            headers.append(name, value.clone());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn special() -> Vec<String> {
        vec!["CONTENT_TYPE".to_string(), "CONTENT_LENGTH".to_string()]
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("X_CUSTOM_HEADER"), "X-Custom-Header");
        assert_eq!(canonical_name("USER_AGENT"), "User-Agent");
        assert_eq!(canonical_name("accept"), "Accept");
        assert_eq!(canonical_name("WWW_AUTHENTICATE"), "Www-Authenticate");
    }

    #[test]
    fn test_prefixed_and_special_keys() {
        assert_eq!(
            header_name("HTTP_X_CUSTOM_HEADER", "HTTP_", &special()).as_deref(),
            Some("X-Custom-Header")
        );
        assert_eq!(
            header_name("CONTENT_LENGTH", "HTTP_", &special()).as_deref(),
            Some("Content-Length")
        );
        assert_eq!(header_name("SERVER_NAME", "HTTP_", &special()), None);
        assert_eq!(header_name("HTTP_", "HTTP_", &special()), None);
    }

    #[test]
    fn test_normalize_keeps_blank_and_repeated_values() {
        let server: BTreeMap<String, String> = [
            ("CONTENT_TYPE", "text/plain"),
            ("HTTP_CONTENT_TYPE", "text/html"),
            ("HTTP_X_EMPTY", "   "),
            ("REQUEST_METHOD", "GET"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let headers = normalize_headers(&server, "HTTP_", &special());

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Content-Type"), ["text/plain", "text/html"]);
        assert_eq!(headers.get("X-Empty"), ["   "]);
        assert!(!headers.contains("Request-Method"));
    }
}
