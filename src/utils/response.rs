//! Lowercased views of response data for pattern matching.

use std::collections::HashMap;

use reqwest::header::HeaderMap;

/// Flattens a header map into lowercase `name → value`.
///
/// Repeated headers are joined with `", "`. Values that aren't valid UTF-8 are
/// decoded lossily. At most `MAX_HEADER_COUNT` headers are kept.
pub fn lowercase_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::new();
    if headers.len() > crate::config::MAX_HEADER_COUNT {
        log::warn!(
            "Response has {} headers (limit: {}), ignoring excess headers",
            headers.len(),
            crate::config::MAX_HEADER_COUNT
        );
    }
    for (name, value) in headers.iter().take(crate::config::MAX_HEADER_COUNT) {
        let value = String::from_utf8_lossy(value.as_bytes()).to_lowercase();
        map.entry(name.as_str().to_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}

pub fn lowercase_body(body: &str) -> String {
    body.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SERVER};

    #[test]
    fn test_lowercase_headers_joins_repeats() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("CloudFlare"));
        headers.append("x-cache", HeaderValue::from_static("HIT"));
        headers.append("x-cache", HeaderValue::from_static("MISS"));

        let map = lowercase_headers(&headers);
        assert_eq!(map.get("server").map(String::as_str), Some("cloudflare"));
        assert_eq!(map.get("x-cache").map(String::as_str), Some("hit, miss"));
    }
}
