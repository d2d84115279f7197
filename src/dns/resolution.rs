//! Hostname resolution with caching, timeout and hijack checks.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::cache::DnsCache;
use super::hijack::detect_hijack;
use super::lookup::HostLookup;
use crate::error_handling::{sanitize_and_truncate_error_message, ProbeError, TimeoutPhase};
use crate::utils::duration_to_ms;

/// Outcome of resolving one hostname.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DnsResult {
    pub success: bool,
    pub hostname: String,
    pub ips: Vec<IpAddr>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub hijack_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hijack_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timed_out: bool,
}

impl DnsResult {
    fn resolved(hostname: &str, ips: Vec<IpAddr>, latency_ms: u64, cache_hit: bool) -> Self {
        Self {
            success: true,
            hostname: hostname.to_string(),
            ips,
            latency_ms,
            cache_hit,
            hijack_detected: false,
            hijack_reason: None,
            error: None,
            timed_out: false,
        }
    }

    fn failed(hostname: &str, error: String, latency_ms: u64, timed_out: bool) -> Self {
        Self {
            success: false,
            hostname: hostname.to_string(),
            ips: Vec::new(),
            latency_ms,
            cache_hit: false,
            hijack_detected: false,
            hijack_reason: None,
            error: Some(error),
            timed_out,
        }
    }

    /// The error a check should terminate with, if this resolution can't be used.
    pub fn failure(&self) -> Option<ProbeError> {
        if self.hijack_detected {
            return Some(ProbeError::DnsHijackSuspected(
                self.hijack_reason.clone().unwrap_or_default(),
            ));
        }
        if !self.success {
            return Some(ProbeError::DnsFailure(self.error.clone().unwrap_or_default()));
        }
        None
    }
}

/// Resolves hostnames to addresses.
///
/// IPv4 is tried first, IPv6 is the fallback; when both fail the IPv4 error is
/// reported. Every lookup races a hard timer independent of the backend's own
/// timeouts. Answers flagged as hijacked are never cached.
pub struct DnsResolver {
    lookup: Arc<dyn HostLookup>,
    cache: DnsCache,
}

impl DnsResolver {
    pub fn new(lookup: Arc<dyn HostLookup>, cache_ttl: Duration) -> Self {
        Self {
            lookup,
            cache: DnsCache::new(cache_ttl),
        }
    }

    pub fn cache(&self) -> &DnsCache {
        &self.cache
    }

    /// Resolves `hostname`, never returning an error: failures are reported
    /// through `success: false`.
    pub async fn resolve(&self, hostname: &str, timeout: Duration) -> DnsResult {
        let host = normalize_hostname(hostname);

        if let Ok(ip) = host.parse::<IpAddr>() {
            return DnsResult::resolved(&host, vec![ip], 0, false);
        }

        if let Some(ips) = self.cache.get(&host) {
            log::debug!("DNS cache hit for {host}");
            let mut result = DnsResult::resolved(&host, ips, 0, true);
            if let Some(reason) = detect_hijack(&host, &result.ips) {
                self.cache.remove(&host);
                flag_hijack(&mut result, reason);
            }
            return result;
        }

        let start = Instant::now();
        let outcome = tokio::time::timeout(timeout, self.lookup_with_fallback(&host)).await;
        let latency_ms = duration_to_ms(start.elapsed());

        match outcome {
            Ok(Ok(ips)) => {
                let mut result = DnsResult::resolved(&host, ips, latency_ms, false);
                match detect_hijack(&host, &result.ips) {
                    Some(reason) => flag_hijack(&mut result, reason),
                    None => self.cache.insert(&host, result.ips.clone()),
                }
                result
            }
            Ok(Err(e)) => {
                log::debug!("DNS resolution failed for {host}: {e:#}");
                DnsResult::failed(
                    &host,
                    sanitize_and_truncate_error_message(&format!("{e:#}")),
                    latency_ms,
                    false,
                )
            }
            Err(_) => {
                let err = ProbeError::Timeout {
                    phase: TimeoutPhase::Dns,
                    limit_ms: duration_to_ms(timeout),
                };
                log::debug!("{err} for {host}");
                DnsResult::failed(&host, err.to_string(), latency_ms, true)
            }
        }
    }

    async fn lookup_with_fallback(&self, host: &str) -> anyhow::Result<Vec<IpAddr>> {
        match self.lookup.lookup_ipv4(host).await {
            Ok(ips) => Ok(ips),
            Err(v4_err) => match self.lookup.lookup_ipv6(host).await {
                Ok(ips) => {
                    log::debug!("No IPv4 answer for {host}, using IPv6 ({v4_err})");
                    Ok(ips)
                }
                Err(v6_err) => {
                    log::trace!("IPv6 fallback for {host} also failed: {v6_err}");
                    Err(v4_err)
                }
            },
        }
    }
}

fn flag_hijack(result: &mut DnsResult, reason: String) {
    log::warn!("Possible DNS hijack: {reason}");
    result.hijack_detected = true;
    result.hijack_reason = Some(reason);
}

fn normalize_hostname(hostname: &str) -> String {
    hostname
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase()
}
