//! Verdict types shared by the classifiers.
//!
//! Every classifier returns `Option<Verdict>`: `None` when nothing was
//! detected. The variant is the classifier kind and carries that kind's
//! typed payload; on the wire it is flattened with a `type` discriminant.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Facts about one response, normalized for matching.
///
/// Header names and values, and the body, are lowercased.
#[derive(Debug, Clone, Default)]
pub struct ResponseFacts {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub elapsed_ms: u64,
}

impl ResponseFacts {
    pub fn new(status: u16, headers: HashMap<String, String>, body: &str, elapsed_ms: u64) -> Self {
        Self {
            status,
            headers,
            body: crate::utils::lowercase_body(body),
            elapsed_ms,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn header_contains(&self, name: &str, needle: &str) -> bool {
        self.header(name).is_some_and(|v| v.contains(needle))
    }

    pub fn body_contains_any<'a>(&self, needles: &[&'a str]) -> Option<&'a str> {
        needles.iter().copied().find(|n| self.body.contains(n))
    }

    pub fn is_blocking_status(&self) -> bool {
        crate::config::BLOCKING_STATUS_CODES.contains(&self.status)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// CDNs the challenge classifier recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CdnVendor {
    Cloudflare,
    Akamai,
    Cloudfront,
    Fastly,
}

impl CdnVendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CdnVendor::Cloudflare => "cloudflare",
            CdnVendor::Akamai => "akamai",
            CdnVendor::Cloudfront => "cloudfront",
            CdnVendor::Fastly => "fastly",
        }
    }
}

/// Kind of interstitial a CDN served instead of the origin's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    Captcha,
    JsChallenge,
    ManagedChallenge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePage {
    pub vendor: CdnVendor,
    pub challenge: ChallengeKind,
    pub marker: String,
    pub reason: String,
}

/// Cloudflare firewall-rule block (403 or a 10xx error page without challenge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnBlock {
    pub vendor: CdnVendor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ray_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WafMatch {
    pub vendor: String,
    pub signature: String,
    pub reason: String,
}

/// What triggered a rate-limit verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateLimitTrigger {
    #[serde(rename = "429_too_many_requests")]
    TooManyRequests,
    #[serde(rename = "body_pattern")]
    BodyPattern,
    #[serde(rename = "quota_exhausted")]
    QuotaExhausted,
    #[serde(rename = "retry_after_header")]
    RetryAfterHeader,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitHit {
    pub trigger: RateLimitTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    pub reason: String,
}

/// Where the geo-block evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoBlockSource {
    BodyKeyword,
    Header,
    CdnCountryBan,
    ErrorText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBlock {
    pub source: GeoBlockSource,
    pub matched: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<CdnVendor>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRedirectHit {
    pub hop_index: usize,
    pub location: String,
    pub locale: String,
    pub reason: String,
}

/// Classifier verdict, tagged by classifier kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Verdict {
    Cloudflare(CdnBlock),
    Waf(WafMatch),
    RateLimit(RateLimitHit),
    GeoBlocking(GeoBlock),
    Challenge(ChallengePage),
    GeoRedirect(GeoRedirectHit),
}

impl Verdict {
    pub fn reason(&self) -> &str {
        match self {
            Verdict::Cloudflare(v) => &v.reason,
            Verdict::Waf(v) => &v.reason,
            Verdict::RateLimit(v) => &v.reason,
            Verdict::GeoBlocking(v) => &v.reason,
            Verdict::Challenge(v) => &v.reason,
            Verdict::GeoRedirect(v) => &v.reason,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Verdict::Cloudflare(_) => "cloudflare",
            Verdict::Waf(_) => "waf",
            Verdict::RateLimit(_) => "rate_limit",
            Verdict::GeoBlocking(_) => "geo_blocking",
            Verdict::Challenge(_) => "challenge",
            Verdict::GeoRedirect(_) => "geo_redirect",
        }
    }
}

/// Merged classifier output for one check.
///
/// `primary` holds the first match among CDN, WAF and generic geo-block;
/// rate-limit and geo-redirect verdicts are independent side slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_redirect: Option<Verdict>,
}

impl DetectionMetadata {
    /// Builds the bundle, or `None` when no slot is filled.
    pub fn from_slots(
        primary: Option<Verdict>,
        rate_limit: Option<Verdict>,
        geo_redirect: Option<Verdict>,
    ) -> Option<Self> {
        if primary.is_none() && rate_limit.is_none() && geo_redirect.is_none() {
            return None;
        }
        Some(Self {
            primary,
            rate_limit,
            geo_redirect,
        })
    }

    /// The geo-block verdict, if the primary slot holds one.
    pub fn geo_block(&self) -> Option<&GeoBlock> {
        match &self.primary {
            Some(Verdict::GeoBlocking(block)) => Some(block),
            _ => None,
        }
    }

    pub fn challenge(&self) -> Option<&ChallengePage> {
        match &self.primary {
            Some(Verdict::Challenge(page)) => Some(page),
            _ => None,
        }
    }
}

/// Advisory rate-limit data for the caller's backoff policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    pub suggested_backoff_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_serializes_with_type_tag() {
        let verdict = Verdict::RateLimit(RateLimitHit {
            trigger: RateLimitTrigger::TooManyRequests,
            retry_after_secs: Some(30),
            reason: "HTTP 429".to_string(),
        });
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["type"], "rate_limit");
        assert_eq!(json["trigger"], "429_too_many_requests");
        assert_eq!(json["retryAfterSecs"], 30);
    }

    #[test]
    fn test_metadata_is_none_without_verdicts() {
        assert!(DetectionMetadata::from_slots(None, None, None).is_none());
    }

    #[test]
    fn test_response_facts_lowercases_body() {
        let facts = ResponseFacts::new(403, HashMap::new(), "Access DENIED", 10);
        assert_eq!(facts.body, "access denied");
        assert!(facts.is_blocking_status());
        assert!(!facts.is_success());
    }
}
