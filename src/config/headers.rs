//! HTTP header name constants.
//!
//! Header names are lowercase because classifiers operate on a lowercased
//! header map.

// CDN identification
/// Cloudflare request ID
pub const HEADER_CF_RAY: &str = "cf-ray";
/// Cloudflare mitigation marker (`challenge` on managed challenges)
pub const HEADER_CF_MITIGATED: &str = "cf-mitigated";
/// CloudFront request ID
pub const HEADER_X_AMZ_CF_ID: &str = "x-amz-cf-id";
/// Fastly request ID
pub const HEADER_X_FASTLY_REQUEST_ID: &str = "x-fastly-request-id";
/// X-Served-By header (Fastly cache node identification)
pub const HEADER_X_SERVED_BY: &str = "x-served-by";
/// Server header
pub const HEADER_SERVER: &str = "server";
/// Via header (proxy chain information)
pub const HEADER_VIA: &str = "via";

// Rate limiting
/// Retry-After header (delta-seconds or HTTP-date)
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Header names carrying the request quota, in lookup order.
pub const RATE_LIMIT_LIMIT_HEADERS: &[&str] =
    &["x-ratelimit-limit", "x-rate-limit-limit", "ratelimit-limit"];

/// Header names carrying the remaining quota, in lookup order.
pub const RATE_LIMIT_REMAINING_HEADERS: &[&str] = &[
    "x-ratelimit-remaining",
    "x-rate-limit-remaining",
    "ratelimit-remaining",
];

/// Header names carrying the quota reset time, in lookup order.
pub const RATE_LIMIT_RESET_HEADERS: &[&str] =
    &["x-ratelimit-reset", "x-rate-limit-reset", "ratelimit-reset"];

// Geo-blocking
/// Custom headers some origins and edge rules use to flag a geo block.
pub const GEO_BLOCK_HEADERS: &[&str] = &[
    "x-geo-block",
    "x-geo-blocked",
    "x-geoblock",
    "x-country-blocked",
    "x-geoip-blocked",
    "x-blocked-country",
    "x-restricted-region",
];

/// Generic block-reason headers; these count as a geo block only when the
/// value mentions a country or region.
pub const BLOCK_REASON_HEADERS: &[&str] = &["x-block-reason", "x-deny-reason"];
