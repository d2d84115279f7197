//! CDN and challenge-page classification.
//!
//! Only fires when a known CDN is in front of the origin. A CDN response with
//! challenge markers is a challenge page; a bare CDN 403 is a firewall-rule
//! block, never a geo-block on its own.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{
    CdnBlock, CdnVendor, ChallengeKind, ChallengePage, GeoBlock, GeoBlockSource, ResponseFacts,
    Verdict, WafMatch,
};
use crate::config::{
    HEADER_CF_MITIGATED, HEADER_CF_RAY, HEADER_SERVER, HEADER_VIA, HEADER_X_AMZ_CF_ID,
    HEADER_X_FASTLY_REQUEST_ID, HEADER_X_SERVED_BY,
};

const CAPTCHA_MARKERS: &[&str] = &[
    "g-recaptcha",
    "h-captcha",
    "hcaptcha",
    "cf-turnstile",
    "recaptcha",
    "captcha",
];

const JS_CHALLENGE_MARKERS: &[&str] = &[
    "checking your browser",
    "checking if the site connection is secure",
    "jschl",
    "cf_chl_opt",
    "_cf_chl",
    "enable javascript and cookies to continue",
    "just a moment...",
    "ddos protection by",
];

const MANAGED_CHALLENGE_MARKERS: &[&str] = &[
    "managed challenge",
    "verify you are human",
    "verifying you are human",
    "please wait while we verify",
    "one more step",
    "please stand by, while we are checking",
];

/// Cloudflare 1009: the site owner banned the visitor's country.
const CLOUDFLARE_COUNTRY_BAN_MARKERS: &[&str] = &[
    "banned the country or region",
    "error 1009",
    "error code: 1009",
];

static CLOUDFLARE_ERROR_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"error(?: code)?:?\s*(10\d{2})\b").ok());

static RAY_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"ray id:?\s*(?:<[^>]*>\s*)*([0-9a-f]{16})").ok());

/// Identifies the CDN in front of the origin, headers first, then body tokens.
pub fn detect_vendor(facts: &ResponseFacts) -> Option<CdnVendor> {
    if facts.has_header(HEADER_CF_RAY)
        || facts.has_header(HEADER_CF_MITIGATED)
        || facts.header_contains(HEADER_SERVER, "cloudflare")
    {
        return Some(CdnVendor::Cloudflare);
    }
    if facts.header_contains(HEADER_SERVER, "akamaighost")
        || facts.headers.keys().any(|k| k.starts_with("x-akamai"))
    {
        return Some(CdnVendor::Akamai);
    }
    if facts.has_header(HEADER_X_AMZ_CF_ID)
        || facts.header_contains(HEADER_VIA, "cloudfront")
        || facts.header_contains(HEADER_SERVER, "cloudfront")
    {
        return Some(CdnVendor::Cloudfront);
    }
    if facts.has_header(HEADER_X_FASTLY_REQUEST_ID)
        || facts.header_contains(HEADER_SERVER, "fastly")
        || facts.header_contains(HEADER_X_SERVED_BY, "cache-")
    {
        return Some(CdnVendor::Fastly);
    }

    if facts.body.contains("cloudflare") || facts.body.contains("/cdn-cgi/") {
        Some(CdnVendor::Cloudflare)
    } else if facts.body.contains("akamai") {
        Some(CdnVendor::Akamai)
    } else if facts.body.contains("cloudfront") {
        Some(CdnVendor::Cloudfront)
    } else if facts.body.contains("fastly") {
        Some(CdnVendor::Fastly)
    } else {
        None
    }
}

/// Sub-classifies a challenge page: CAPTCHA, then JS, then managed.
fn challenge_kind(facts: &ResponseFacts) -> Option<(ChallengeKind, String)> {
    if let Some(m) = facts.body_contains_any(CAPTCHA_MARKERS) {
        return Some((ChallengeKind::Captcha, m.to_string()));
    }
    if let Some(m) = facts.body_contains_any(JS_CHALLENGE_MARKERS) {
        return Some((ChallengeKind::JsChallenge, m.to_string()));
    }
    if let Some(m) = facts.body_contains_any(MANAGED_CHALLENGE_MARKERS) {
        return Some((ChallengeKind::ManagedChallenge, m.to_string()));
    }
    if facts.header_contains(HEADER_CF_MITIGATED, "challenge") {
        return Some((
            ChallengeKind::ManagedChallenge,
            format!("{HEADER_CF_MITIGATED}: challenge"),
        ));
    }
    None
}

/// Whether the body looks like any known challenge interstitial.
///
/// Used for redirect responses without a `Location`, which carry no CDN
/// headers often enough that vendor detection can't gate this.
pub fn has_challenge_signature(facts: &ResponseFacts) -> bool {
    challenge_kind(facts).is_some()
}

fn ray_id(facts: &ResponseFacts) -> Option<String> {
    if let Some(ray) = facts.header(HEADER_CF_RAY) {
        // "8c2f1a2b3c4d5e6f-fra" → keep the id, drop the colo suffix
        return ray.split('-').next().map(str::to_string);
    }
    RAY_ID
        .as_ref()?
        .captures(&facts.body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn cloudflare_error_code(facts: &ResponseFacts) -> Option<u16> {
    CLOUDFLARE_ERROR_CODE
        .as_ref()?
        .captures(&facts.body)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// CDN/challenge classifier.
pub fn classify(facts: &ResponseFacts) -> Option<Verdict> {
    let vendor = detect_vendor(facts)?;

    // A 2xx from a CDN-fronted site is the origin's content, even if it embeds
    // a captcha widget; only a mitigation header marks it as an interstitial.
    let gated = !facts.is_success() || facts.has_header(HEADER_CF_MITIGATED);
    if gated {
        if let Some((challenge, marker)) = challenge_kind(facts) {
            return Some(Verdict::Challenge(ChallengePage {
                vendor,
                challenge,
                reason: format!(
                    "{} {} challenge page (marker: {marker})",
                    vendor.as_str(),
                    challenge_label(challenge)
                ),
                marker,
            }));
        }
    }

    if vendor == CdnVendor::Cloudflare && !facts.is_success() {
        if let Some(marker) = facts.body_contains_any(CLOUDFLARE_COUNTRY_BAN_MARKERS) {
            return Some(Verdict::GeoBlocking(GeoBlock {
                source: GeoBlockSource::CdnCountryBan,
                matched: marker.to_string(),
                vendor: Some(vendor),
                reason: "Cloudflare error 1009: the site owner has banned the visitor's country or region".to_string(),
            }));
        }
        if let Some(code) = cloudflare_error_code(facts) {
            return Some(Verdict::Cloudflare(CdnBlock {
                vendor,
                ray_id: ray_id(facts),
                error_code: Some(code),
                reason: format!("Cloudflare error {code}: request blocked by a firewall rule"),
            }));
        }
    }

    if facts.status == 403 {
        return Some(match vendor {
            CdnVendor::Cloudflare => Verdict::Cloudflare(CdnBlock {
                vendor,
                ray_id: ray_id(facts),
                error_code: None,
                reason: "Cloudflare returned 403 without a challenge: firewall rule block".to_string(),
            }),
            other => Verdict::Waf(WafMatch {
                vendor: other.as_str().to_string(),
                signature: "cdn 403".to_string(),
                reason: format!(
                    "{} returned 403 without a challenge: firewall rule block",
                    other.as_str()
                ),
            }),
        });
    }

    None
}

fn challenge_label(kind: ChallengeKind) -> &'static str {
    match kind {
        ChallengeKind::Captcha => "CAPTCHA",
        ChallengeKind::JsChallenge => "JavaScript",
        ChallengeKind::ManagedChallenge => "managed",
    }
}
