//! Generic geo-blocking classification.
//!
//! Evidence must be explicit: a geo/region/legal phrase in the body or a
//! geo-block header. Status code and response time alone never count, so a
//! fast bare 403 is not reported here.

use super::types::{GeoBlock, GeoBlockSource, ResponseFacts, Verdict};
use crate::config::{BLOCK_REASON_HEADERS, GEO_BLOCK_HEADERS};

const GEO_BLOCK_KEYWORDS: &[&str] = &[
    "not available in your country",
    "not available in your region",
    "not available in your location",
    "not available in your area",
    "unavailable in your country",
    "unavailable in your region",
    "not accessible from your country",
    "not accessible in your region",
    "not available from your location",
    "access from your country",
    "access from your region",
    "your country is not supported",
    "your region is not supported",
    "service is not available in your",
    "content is not available in your",
    "this content is not available in",
    "blocked in your country",
    "blocked in your region",
    "restricted in your country",
    "restricted in your region",
    "geo-restricted",
    "geo restricted",
    "georestricted",
    "geo-blocked",
    "geoblocked",
    "geo-block",
    "geographic restriction",
    "geographical restriction",
    "geolocation restriction",
    "due to your location",
    "based on your location",
    "from your geographic location",
    "in your jurisdiction",
    "unavailable for legal reasons",
    "for legal reasons",
    "due to legal restrictions",
    "due to regulatory",
    "sanctions",
    "embargoed",
    "gdpr",
    "european economic area",
    "visitors from the eea",
    "visitors from europe",
];

/// Header values that mean "not blocked".
const NEGATIVE_HEADER_VALUES: &[&str] = &["0", "false", "no", "none", ""];

const REGION_WORDS: &[&str] = &["country", "region", "geo", "location", "jurisdiction"];

fn header_evidence(facts: &ResponseFacts) -> Option<String> {
    for name in GEO_BLOCK_HEADERS {
        if let Some(value) = facts.header(name) {
            if !NEGATIVE_HEADER_VALUES.contains(&value.trim()) {
                return Some(format!("{name}: {value}"));
            }
        }
    }
    for name in BLOCK_REASON_HEADERS {
        if let Some(value) = facts.header(name) {
            if REGION_WORDS.iter().any(|w| value.contains(w)) {
                return Some(format!("{name}: {value}"));
            }
        }
    }
    None
}

/// Generic geo-block classifier. Only evaluated for blocking status codes.
pub fn classify(facts: &ResponseFacts) -> Option<Verdict> {
    if !facts.is_blocking_status() {
        return None;
    }

    if let Some(keyword) = facts.body_contains_any(GEO_BLOCK_KEYWORDS) {
        return Some(Verdict::GeoBlocking(GeoBlock {
            source: GeoBlockSource::BodyKeyword,
            matched: keyword.to_string(),
            vendor: None,
            reason: format!(
                "HTTP {} with geo-restriction wording ({keyword:?})",
                facts.status
            ),
        }));
    }

    header_evidence(facts).map(|line| {
        Verdict::GeoBlocking(GeoBlock {
            source: GeoBlockSource::Header,
            reason: format!("HTTP {} with geo-block header ({line})", facts.status),
            matched: line,
            vendor: None,
        })
    })
}

/// Matches the geo-block keyword table against a transport error message.
///
/// Some regions block at the connection level; the resulting reset or TLS
/// alert occasionally carries the reason text.
pub fn classify_error_text(message: &str) -> Option<Verdict> {
    let lowered = message.to_lowercase();
    GEO_BLOCK_KEYWORDS
        .iter()
        .find(|k| lowered.contains(*k))
        .map(|keyword| {
            Verdict::GeoBlocking(GeoBlock {
                source: GeoBlockSource::ErrorText,
                matched: keyword.to_string(),
                vendor: None,
                reason: format!("Connection error mentions geo restriction ({keyword:?})"),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_fast_bare_403_is_not_geo_blocked() {
        let facts = ResponseFacts::new(403, HashMap::new(), "", 12);
        assert!(classify(&facts).is_none());
    }

    #[test]
    fn test_bare_451_is_not_geo_blocked() {
        let facts = ResponseFacts::new(451, HashMap::new(), "", 12);
        assert!(classify(&facts).is_none());
    }

    #[test]
    fn test_body_keyword() {
        let facts = ResponseFacts::new(
            403,
            HashMap::new(),
            "Sorry, this service is Not Available in Your Country.",
            300,
        );
        match classify(&facts) {
            Some(Verdict::GeoBlocking(block)) => {
                assert_eq!(block.source, GeoBlockSource::BodyKeyword);
                assert_eq!(block.matched, "not available in your country");
            }
            other => panic!("expected geo block, got {other:?}"),
        }
    }

    #[test]
    fn test_keyword_ignored_on_success() {
        let facts = ResponseFacts::new(200, HashMap::new(), "our gdpr policy", 50);
        assert!(classify(&facts).is_none());
    }

    #[test]
    fn test_geo_header() {
        let headers = HashMap::from([("x-geo-block".to_string(), "ru".to_string())]);
        let facts = ResponseFacts::new(403, headers, "", 50);
        match classify(&facts) {
            Some(Verdict::GeoBlocking(block)) => assert_eq!(block.source, GeoBlockSource::Header),
            other => panic!("expected geo header block, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_geo_header_ignored() {
        let headers = HashMap::from([("x-geo-block".to_string(), "false".to_string())]);
        let facts = ResponseFacts::new(403, headers, "", 50);
        assert!(classify(&facts).is_none());
    }

    #[test]
    fn test_block_reason_needs_region_word() {
        let auth = HashMap::from([("x-block-reason".to_string(), "bad token".to_string())]);
        assert!(classify(&ResponseFacts::new(403, auth, "", 50)).is_none());

        let geo = HashMap::from([("x-block-reason".to_string(), "country policy".to_string())]);
        assert!(classify(&ResponseFacts::new(403, geo, "", 50)).is_some());
    }

    #[test]
    fn test_error_text() {
        assert!(classify_error_text("connection reset: Not available in your region").is_some());
        assert!(classify_error_text("connection refused").is_none());
    }
}
