//! Request header construction.
//!
//! Every hop carries a realistic browser header set so that origins and CDNs
//! serve the same content a visitor would see. Headers supplied by the check
//! request replace the defaults of the same name.

use std::collections::HashMap;

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL,
    UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

use crate::error_handling::ProbeError;

/// Browser-like default request headers.
///
/// Accept-Encoding is left to reqwest, which only advertises the codecs it
/// can decode.
pub(crate) struct RequestHeaders;

impl RequestHeaders {
    fn defaults() -> [(HeaderName, &'static str); 8] {
        [
            (
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
            ),
            (ACCEPT_LANGUAGE, "en-US,en;q=0.9"),
            (HeaderName::from_static("sec-fetch-dest"), "document"),
            (HeaderName::from_static("sec-fetch-mode"), "navigate"),
            (HeaderName::from_static("sec-fetch-site"), "none"),
            (HeaderName::from_static("sec-fetch-user"), "?1"),
            (UPGRADE_INSECURE_REQUESTS, "1"),
            (CACHE_CONTROL, "max-age=0"),
        ]
    }

    /// Parses caller-supplied headers, rejecting names or values that can't be sent.
    pub(crate) fn parse_custom(custom: &HashMap<String, String>) -> Result<HeaderMap, ProbeError> {
        let mut map = HeaderMap::with_capacity(custom.len());
        for (name, value) in custom {
            let header_name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| {
                ProbeError::MalformedInput(format!("invalid header name {name:?}"))
            })?;
            let header_value = HeaderValue::from_str(value.trim()).map_err(|_| {
                ProbeError::MalformedInput(format!("invalid value for header {name:?}"))
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    /// Builds the full header set for a hop: defaults, then the rotating
    /// user agent, then custom headers on top.
    pub(crate) fn build(user_agent: &str, custom: &HeaderMap) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in Self::defaults() {
            map.insert(name, HeaderValue::from_static(value));
        }
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            map.insert(USER_AGENT, ua);
        }
        for (name, value) in custom {
            map.insert(name.clone(), value.clone());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_includes_browser_defaults() {
        let headers = RequestHeaders::build("TestAgent/1.0", &HeaderMap::new());
        assert_eq!(headers.get(USER_AGENT).unwrap(), "TestAgent/1.0");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert!(headers.get(ACCEPT).unwrap().to_str().unwrap().starts_with("text/html"));
    }

    #[test]
    fn test_custom_headers_override_defaults_and_user_agent() {
        let custom = RequestHeaders::parse_custom(&HashMap::from([
            ("User-Agent".to_string(), "MonitorBot/2".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("X-Api-Key".to_string(), "secret".to_string()),
        ]))
        .unwrap();
        let headers = RequestHeaders::build("TestAgent/1.0", &custom);
        assert_eq!(headers.get(USER_AGENT).unwrap(), "MonitorBot/2");
        assert_eq!(headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
        assert_eq!(headers.get_all(ACCEPT).iter().count(), 1);
    }

    #[test]
    fn test_parse_custom_rejects_invalid_name() {
        let result = RequestHeaders::parse_custom(&HashMap::from([(
            "bad header".to_string(),
            "x".to_string(),
        )]));
        assert!(matches!(result, Err(ProbeError::MalformedInput(_))));
    }

    #[test]
    fn test_parse_custom_rejects_newline_in_value() {
        let result = RequestHeaders::parse_custom(&HashMap::from([(
            "x-test".to_string(),
            "a\r\nInjected: yes".to_string(),
        )]));
        assert!(result.is_err());
    }
}
