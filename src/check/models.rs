//! Check request and result types.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;
use url::Url;

use crate::config::{Config, MAX_TIMEOUT_SECS};
use crate::detection::{
    CdnVendor, ChallengeKind, ContentValidation, DetectionMetadata, RateLimitInfo,
    ValidationOutcome,
};
use crate::dns::DnsResult;
use crate::error_handling::ProbeError;
use crate::fetch::{Hop, RequestHeaders};
use crate::utils::TimingBreakdown;

/// Kind of check to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    Http,
    Tcp,
}

/// A check as received from the caller, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, rename = "type")]
    pub check_type: Option<CheckType>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub monitor_id: Option<String>,
    #[serde(default)]
    pub expected_status: Option<u16>,
    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub ignore_ssl_errors: bool,
    #[serde(default, alias = "degradedThreshold")]
    pub degraded_threshold_ms: Option<u64>,
    #[serde(default, alias = "cookiesEnabled")]
    pub enable_cookies: bool,
    #[serde(default)]
    pub treat_redirect_as_up: bool,
    #[serde(default)]
    pub content_validation: Option<ContentValidation>,
}

/// Where a validated check points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckTarget {
    Http(Url),
    Tcp { host: String, port: u16 },
}

impl std::fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckTarget::Http(url) => write!(f, "{url}"),
            CheckTarget::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

/// A check that passed validation; immutable once dispatched.
#[derive(Debug, Clone)]
pub struct ValidatedCheck {
    pub target: CheckTarget,
    pub method: Method,
    pub monitor_id: Option<String>,
    pub expected_status: u16,
    pub timeout: Duration,
    pub headers: HeaderMap,
    pub ignore_ssl_errors: bool,
    pub degraded_threshold_ms: Option<u64>,
    pub cookies_enabled: bool,
    pub treat_redirect_as_up: bool,
    pub content_validation: Option<ContentValidation>,
}

fn malformed(msg: impl Into<String>) -> ProbeError {
    ProbeError::MalformedInput(msg.into())
}

impl CheckRequest {
    /// Validates the request against `config`, before any network attempt.
    pub fn validate(&self, config: &Config) -> Result<ValidatedCheck, ProbeError> {
        let target = self.target()?;

        let method = match self.method.as_deref().map(str::trim) {
            None | Some("") => Method::GET,
            Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| malformed(format!("invalid method {m:?}")))?,
        };

        let expected_status = self.expected_status.unwrap_or(200);
        if !(100..=599).contains(&expected_status) {
            return Err(malformed(format!("invalid expectedStatus {expected_status}")));
        }

        let timeout_secs = self.timeout.unwrap_or(config.default_timeout_secs);
        if timeout_secs == 0 || timeout_secs > MAX_TIMEOUT_SECS {
            return Err(malformed(format!(
                "timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {timeout_secs}"
            )));
        }

        let monitor_id = self
            .monitor_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if self.enable_cookies && monitor_id.is_none() {
            return Err(malformed("enableCookies requires a monitorId"));
        }

        Ok(ValidatedCheck {
            target,
            method,
            monitor_id,
            expected_status,
            timeout: Duration::from_secs(timeout_secs),
            headers: RequestHeaders::parse_custom(&self.headers)?,
            ignore_ssl_errors: self.ignore_ssl_errors,
            degraded_threshold_ms: self.degraded_threshold_ms,
            cookies_enabled: self.enable_cookies,
            treat_redirect_as_up: self.treat_redirect_as_up,
            content_validation: self.content_validation.clone(),
        })
    }

    fn target(&self) -> Result<CheckTarget, ProbeError> {
        let wants_tcp = self.check_type == Some(CheckType::Tcp);
        let url = self.url.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let host = self.host.as_deref().map(str::trim).filter(|s| !s.is_empty());

        match (url, host) {
            (Some(raw), _) if !wants_tcp => {
                let url = Url::parse(raw).map_err(|e| malformed(format!("invalid url {raw:?}: {e}")))?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(malformed(format!("unsupported url scheme {:?}", url.scheme())));
                }
                if url.host_str().is_none_or(str::is_empty) {
                    return Err(malformed(format!("url {raw:?} has no host")));
                }
                Ok(CheckTarget::Http(url))
            }
            (_, Some(host)) => {
                let port = self
                    .port
                    .filter(|p| *p != 0)
                    .ok_or_else(|| malformed("tcp check requires a non-zero port"))?;
                Ok(CheckTarget::Tcp {
                    host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
                    port,
                })
            }
            (Some(_), None) => Err(malformed("tcp check requires host and port")),
            (None, None) => Err(malformed("either url or host and port is required")),
        }
    }
}

/// Outcome of a check. Exactly one is assigned per check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Up,
    Down,
    Degraded,
    DnsFailure,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Up => "up",
            CheckStatus::Down => "down",
            CheckStatus::Degraded => "degraded",
            CheckStatus::DnsFailure => "dns_failure",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redirect chain as reported in a result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSummary {
    pub count: usize,
    pub chain: Vec<Hop>,
    pub final_url: String,
    pub is_loop: bool,
    pub loop_url: Option<String>,
    pub max_redirects_exceeded: bool,
    pub no_location_header: bool,
    pub total_ms: u64,
}

/// Why a gated response was still counted as reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeInfo {
    pub reason: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<CdnVendor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<ChallengeKind>,
}

/// The single externally observed artifact of a check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub status: CheckStatus,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub error: Option<String>,
    pub target: String,
    pub monitor_id: Option<String>,
    pub region: String,
    pub checked_at: DateTime<Utc>,
    pub is_geo_blocked: bool,
    pub geo_block_reason: Option<String>,
    pub detection_metadata: Option<DetectionMetadata>,
    pub challenge_info: Option<ChallengeInfo>,
    pub redirects: Option<RedirectSummary>,
    pub timing: TimingBreakdown,
    pub rate_limit: Option<RateLimitInfo>,
    pub dns: Option<DnsResult>,
    pub content_validation: Option<ValidationOutcome>,
    /// The final body was longer than the read limit and only a prefix was kept
    pub body_truncated: bool,
}

impl CheckResult {
    /// A result with only status and error filled in; the orchestrator
    /// populates the rest as phases complete.
    pub fn new(status: CheckStatus, target: String, region: &str) -> Self {
        Self {
            status,
            status_code: None,
            response_time_ms: 0,
            error: None,
            target,
            monitor_id: None,
            region: region.to_string(),
            checked_at: Utc::now(),
            is_geo_blocked: false,
            geo_block_reason: None,
            detection_metadata: None,
            challenge_info: None,
            redirects: None,
            timing: TimingBreakdown::default(),
            rate_limit: None,
            dns: None,
            content_validation: None,
            body_truncated: false,
        }
    }

    /// Fills the geo-block indicators from the detection bundle.
    pub fn apply_detection(&mut self, metadata: Option<DetectionMetadata>) {
        if let Some(block) = metadata.as_ref().and_then(|m| m.geo_block()) {
            self.is_geo_blocked = true;
            self.geo_block_reason = Some(block.reason.clone());
        }
        self.detection_metadata = metadata;
    }
}
