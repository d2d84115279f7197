//! Rate-limit classification and backoff advice.
//!
//! The verdict fires on HTTP 429 unconditionally, otherwise on rate-limit
//! phrasing in the body, an exhausted quota header, or `Retry-After`.
//! [`rate_limit_info`] turns whatever quota headers are present into advisory
//! backoff data for the caller; nothing here retries.

use chrono::{DateTime, Utc};

use super::types::{RateLimitHit, RateLimitInfo, RateLimitTrigger, ResponseFacts, Verdict};
use crate::config::{
    DEFAULT_RATE_LIMIT_BACKOFF_MS, HEADER_RETRY_AFTER, HTTP_STATUS_TOO_MANY_REQUESTS,
    MAX_RATE_LIMIT_BACKOFF_MS, RATE_LIMIT_LIMIT_HEADERS, RATE_LIMIT_REMAINING_HEADERS,
    RATE_LIMIT_RESET_HEADERS,
};

const RATE_LIMIT_PHRASES: &[&str] = &[
    "rate limit exceeded",
    "rate limit reached",
    "rate limited",
    "too many requests",
    "request limit exceeded",
    "api rate limit",
    "quota exceeded",
    "exceeded your quota",
    "throttled",
    "slow down",
];

/// Reset values above this are epoch seconds; below, delta seconds.
const EPOCH_THRESHOLD: u64 = 1_000_000_000;

fn first_header<'a>(facts: &'a ResponseFacts, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| facts.header(name))
}

fn header_number(facts: &ResponseFacts, names: &[&str]) -> Option<u64> {
    // "100, 100;w=60" style values: take the first number
    first_header(facts, names)
        .and_then(|v| v.split([',', ';']).next())
        .and_then(|v| v.trim().parse().ok())
}

/// Parses `Retry-After` as delta-seconds or an HTTP-date.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<u64> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some(u64::try_from((at - now).num_seconds()).unwrap_or(0))
}

fn retry_after_secs(facts: &ResponseFacts, now: DateTime<Utc>) -> Option<u64> {
    facts
        .header(HEADER_RETRY_AFTER)
        .and_then(|v| parse_retry_after(v, now))
}

fn reset_at(facts: &ResponseFacts, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = header_number(facts, RATE_LIMIT_RESET_HEADERS)?;
    if raw >= EPOCH_THRESHOLD {
        DateTime::from_timestamp(i64::try_from(raw).ok()?, 0)
    } else {
        Some(now + chrono::Duration::seconds(i64::try_from(raw).ok()?))
    }
}

/// Rate-limit classifier.
pub fn classify(facts: &ResponseFacts) -> Option<Verdict> {
    classify_at(facts, Utc::now())
}

pub(crate) fn classify_at(facts: &ResponseFacts, now: DateTime<Utc>) -> Option<Verdict> {
    let retry_after = retry_after_secs(facts, now);

    let (trigger, reason) = if facts.status == HTTP_STATUS_TOO_MANY_REQUESTS {
        (
            RateLimitTrigger::TooManyRequests,
            "HTTP 429 Too Many Requests".to_string(),
        )
    } else if let Some(phrase) = facts.body_contains_any(RATE_LIMIT_PHRASES) {
        (
            RateLimitTrigger::BodyPattern,
            format!("Response body indicates rate limiting ({phrase:?})"),
        )
    } else if header_number(facts, RATE_LIMIT_REMAINING_HEADERS) == Some(0) {
        (
            RateLimitTrigger::QuotaExhausted,
            "Rate-limit quota exhausted (remaining: 0)".to_string(),
        )
    } else if facts.has_header(HEADER_RETRY_AFTER) {
        (
            RateLimitTrigger::RetryAfterHeader,
            "Retry-After header present".to_string(),
        )
    } else {
        return None;
    };

    Some(Verdict::RateLimit(RateLimitHit {
        trigger,
        retry_after_secs: retry_after,
        reason,
    }))
}

/// Builds advisory rate-limit data.
///
/// Present when the verdict fired or any quota header was returned. The
/// suggested backoff prefers `Retry-After`, then the reset delta, then a
/// one-minute default, capped at one hour.
pub fn rate_limit_info(
    facts: &ResponseFacts,
    detected: bool,
    now: DateTime<Utc>,
) -> Option<RateLimitInfo> {
    let limit = header_number(facts, RATE_LIMIT_LIMIT_HEADERS);
    let remaining = header_number(facts, RATE_LIMIT_REMAINING_HEADERS);
    let reset_at = reset_at(facts, now);
    let retry_after_secs = retry_after_secs(facts, now);

    let has_headers = limit.is_some() || remaining.is_some() || reset_at.is_some();
    if !detected && !has_headers {
        return None;
    }

    let suggested = if let Some(secs) = retry_after_secs {
        secs.saturating_mul(1000)
    } else if let Some(at) = reset_at {
        u64::try_from((at - now).num_milliseconds()).unwrap_or(0)
    } else {
        DEFAULT_RATE_LIMIT_BACKOFF_MS
    };

    Some(RateLimitInfo {
        detected,
        limit,
        remaining,
        reset_at,
        retry_after_secs,
        suggested_backoff_ms: suggested.min(MAX_RATE_LIMIT_BACKOFF_MS),
    })
}
