//! Configuration constants.
//!
//! This module defines the operational defaults used throughout the probe,
//! including timeouts, size limits, and classifier status sets.

use std::time::Duration;

// Network operation timeouts
/// Default per-request timeout in seconds when a check does not specify one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Upper bound accepted for a per-request timeout
pub const MAX_TIMEOUT_SECS: u64 = 300;
/// DNS resolution hard timeout in milliseconds
/// Applied on top of the resolver's own timeout so a stuck upstream can't stall a check
pub const DNS_TIMEOUT_MS: u64 = 5000;
/// Overall cap on a single check, across DNS and every redirect hop
pub const CHECK_TIMEOUT_SECS: u64 = 90;
/// Cap on the connect-timing connection (TCP connect plus TLS handshake), in seconds
pub const CONNECTION_TIMING_TIMEOUT_SECS: u64 = 5;

// Caching
/// DNS cache entry lifetime in seconds
pub const DNS_CACHE_TTL_SECS: u64 = 60;
/// Idle lifetime of a per-monitor cookie jar in seconds
pub const COOKIE_TTL_SECS: u64 = 3600;
/// Interval between background sweeps of the DNS cache and cookie store
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

// Redirect handling
/// Maximum number of redirect hops to follow
/// Prevents infinite redirect loops and excessive request chains
pub const MAX_REDIRECT_HOPS: usize = 10;
/// Largest value accepted for `--max-redirects`
pub const MAX_REDIRECT_HOPS_LIMIT: usize = 50;
/// Status codes treated as redirects
pub const REDIRECT_STATUS_CODES: [u16; 5] = [301, 302, 303, 307, 308];

// Response and body size limits
/// Maximum response body size in bytes (2MB)
/// Bytes past this limit are dropped before classification
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;
/// Maximum error message length in characters
/// Longer messages are truncated before they are attached to a result
pub const MAX_ERROR_MESSAGE_LENGTH: usize = 2000;
/// Maximum number of response headers kept for classification
pub const MAX_HEADER_COUNT: usize = 200;

// Classification
/// Status codes for which WAF and generic geo-block classifiers are evaluated
pub const BLOCKING_STATUS_CODES: [u16; 8] = [403, 451, 406, 402, 410, 418, 429, 503];

// Rate limiting
/// Backoff suggested to the caller when a rate limit fires without timing hints
pub const DEFAULT_RATE_LIMIT_BACKOFF_MS: u64 = 60_000;
/// Upper bound on any suggested backoff
pub const MAX_RATE_LIMIT_BACKOFF_MS: u64 = 3_600_000;

// HTTP status codes (for clarity and consistency)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

// Server defaults
/// Default listen address for the check server
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
/// Region tag used when none is configured
pub const DEFAULT_REGION: &str = "unknown";
