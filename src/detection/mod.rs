//! Response classification.
//!
//! This module provides side-effect-free classifiers over a response's status,
//! lowercased headers and body:
//! - CDN challenge and firewall-block detection
//! - WAF vendor fingerprints
//! - Rate limiting, with advisory backoff data
//! - Generic geo-blocking
//! - Locale redirects in a redirect chain
//! - Content validation of successful bodies
//!
//! [`classify_response`] runs them in priority order and merges the verdicts.

pub mod cdn;
pub mod content;
pub mod geo_block;
pub mod geo_redirect;
pub mod rate_limit;
mod types;
pub mod waf;

pub use content::{validate as validate_content, ContentValidation, KeywordMode, ValidationOutcome};
pub use types::{
    CdnBlock, CdnVendor, ChallengeKind, ChallengePage, DetectionMetadata, GeoBlock,
    GeoBlockSource, GeoRedirectHit, RateLimitHit, RateLimitInfo, RateLimitTrigger, ResponseFacts,
    Verdict, WafMatch,
};

use crate::fetch::Hop;

/// Runs every classifier over the final response and the redirect chain.
///
/// The primary slot takes the first match of CDN, then WAF, then generic
/// geo-block. Rate-limit and geo-redirect verdicts fill their own slots
/// regardless. Returns `None` when nothing was detected.
pub fn classify_response(facts: &ResponseFacts, hops: &[Hop]) -> Option<DetectionMetadata> {
    let primary = cdn::classify(facts)
        .or_else(|| waf::classify(facts))
        .or_else(|| geo_block::classify(facts));
    let rate_limit = rate_limit::classify(facts);
    let geo_redirect = geo_redirect::classify(hops);

    if let Some(verdict) = &primary {
        log::debug!("Primary verdict {}: {}", verdict.type_name(), verdict.reason());
    }
    DetectionMetadata::from_slots(primary, rate_limit, geo_redirect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_sucuri_block_is_waf_and_nothing_else_claims_primary() {
        let facts = ResponseFacts::new(
            403,
            HashMap::new(),
            "Access Denied - Sucuri Website Firewall",
            80,
        );
        let meta = classify_response(&facts, &[]).unwrap();
        match &meta.primary {
            Some(Verdict::Waf(m)) => assert_eq!(m.vendor, "sucuri"),
            other => panic!("expected sucuri primary, got {other:?}"),
        }
        assert!(meta.rate_limit.is_none());
        assert!(meta.geo_block().is_none());
    }

    #[test]
    fn test_rate_limit_is_side_slot_alongside_primary() {
        let headers = HashMap::from([("cf-ray".to_string(), "abc-fra".to_string())]);
        let facts = ResponseFacts::new(429, headers, "just a moment...", 80);
        let meta = classify_response(&facts, &[]).unwrap();
        assert!(matches!(meta.primary, Some(Verdict::Challenge(_))));
        assert!(matches!(meta.rate_limit, Some(Verdict::RateLimit(_))));
    }

    #[test]
    fn test_cdn_block_wins_over_geo_keyword() {
        let headers = HashMap::from([("cf-ray".to_string(), "abc".to_string())]);
        let facts = ResponseFacts::new(403, headers, "unavailable for legal reasons", 80);
        let meta = classify_response(&facts, &[]).unwrap();
        assert!(matches!(meta.primary, Some(Verdict::Cloudflare(_))));
    }

    #[test]
    fn test_plain_success_has_no_metadata() {
        let facts = ResponseFacts::new(200, HashMap::new(), "<html>hello</html>", 80);
        assert!(classify_response(&facts, &[]).is_none());
    }

    #[test]
    fn test_bare_fast_403_has_no_metadata() {
        let facts = ResponseFacts::new(403, HashMap::new(), "", 5);
        assert!(classify_response(&facts, &[]).is_none());
    }
}
