//! HTTP check path: DNS, connection timing, redirect chain, classification.

use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use url::Url;

use super::models::{ChallengeInfo, CheckResult, CheckStatus, RedirectSummary, ValidatedCheck};
use super::prober::Prober;
use super::status::{decide, StatusInputs};
use crate::config::CONNECTION_TIMING_TIMEOUT_SECS;
use crate::detection::rate_limit::rate_limit_info;
use crate::detection::{
    cdn, classify_response, geo_block, validate_content, DetectionMetadata, ResponseFacts,
};
use crate::dns::DnsResult;
use crate::fetch::{
    follow_redirects, probe_connection, CookieSession, HopRequest, RedirectChain, RequestHeaders,
};
use crate::utils::TimingCollector;

pub(super) async fn run_http(prober: &Prober, check: &ValidatedCheck, url: &Url) -> CheckResult {
    let config = &prober.config;
    let mut timing = TimingCollector::start();
    let mut result = CheckResult::new(CheckStatus::Down, url.to_string(), &config.region);

    // Validation guarantees a host
    let host = url.host_str().unwrap_or_default();

    log::debug!("DNS_RESOLVING {host}");
    let dns = prober.resolver.resolve(host, config.dns_timeout()).await;
    timing.record_dns(dns.latency_ms);
    if let Some(err) = dns.failure() {
        log::debug!("DNS_FAILED {host}: {err}");
        result.status = CheckStatus::DnsFailure;
        result.error = Some(err.to_string());
        return finish(result, dns, &timing);
    }

    log::debug!("REQUESTING {} {url}", check.method);
    let headers = RequestHeaders::build(prober.user_agents.next_agent(), &check.headers);
    let cookies = match (&check.monitor_id, check.cookies_enabled) {
        (Some(monitor_id), true) => Some(CookieSession {
            store: &prober.cookies,
            monitor_id,
        }),
        _ => None,
    };
    let hop_request = HopRequest {
        method: check.method.clone(),
        headers: &headers,
        per_hop_timeout: check.timeout,
        max_hops: config.max_redirects,
        cookies,
    };
    let client = if check.ignore_ssl_errors {
        &prober.insecure_client
    } else {
        &prober.client
    };

    let chain = match follow_redirects(client, url.clone(), &hop_request).await {
        Ok(chain) => chain,
        Err(err) => {
            let message = err.to_string();
            log::debug!("Request to {url} failed: {message}");
            result.error = Some(message);
            // Some geo-blocks only show up as a refused or reset connection
            let hint = result
                .error
                .as_deref()
                .and_then(geo_block::classify_error_text);
            result.apply_detection(DetectionMetadata::from_slots(hint, None, None));
            return finish(result, dns, &timing);
        }
    };

    log::debug!(
        "CLASSIFYING {} (final status {}, {} hops)",
        chain.final_url,
        chain.final_status(),
        chain.hops.len()
    );
    // The timing connection shares the per-request budget with the chain
    let timing_budget = check
        .timeout
        .saturating_sub(Duration::from_millis(chain.total_ms))
        .min(Duration::from_secs(CONNECTION_TIMING_TIMEOUT_SECS));
    classify(prober, check, chain, &mut result, &mut timing);
    timing.stop();

    time_connection(&dns, url, timing_budget, &mut timing).await;
    finish(result, dns, &timing)
}

/// Records TCP connect and TLS handshake times from a second connection to
/// the first resolved address, opened once the check has its answer and
/// outside the measured total. A failure here does not fail the check.
async fn time_connection(dns: &DnsResult, url: &Url, limit: Duration, timing: &mut TimingCollector) {
    let Some(ip) = dns.ips.first().copied() else {
        return;
    };
    let Some(port) = url.port_or_known_default() else {
        return;
    };
    if limit.is_zero() {
        return;
    }
    let tls_server_name = (url.scheme() == "https").then(|| dns.hostname.as_str());

    match probe_connection(ip, port, tls_server_name, limit).await {
        Ok(connect) => {
            timing.record_tcp_connect(connect.tcp_connect);
            if let Some(handshake) = connect.tls_handshake {
                timing.record_tls_handshake(handshake);
            }
        }
        Err(e) => log::debug!("Timing connection to {ip}:{port} failed: {e}"),
    }
}

fn classify(
    prober: &Prober,
    check: &ValidatedCheck,
    chain: RedirectChain,
    result: &mut CheckResult,
    timing: &mut TimingCollector,
) {
    let final_response = &chain.final_response;
    let final_status = final_response.status;
    timing.record_ttfb(final_response.ttfb);
    if let Some(download) = final_response.download {
        timing.record_download(download);
    }

    let elapsed_ms = timing.elapsed_ms();
    let facts = ResponseFacts::new(
        final_status,
        final_response.headers.clone(),
        final_response.body.as_deref().unwrap_or_default(),
        elapsed_ms,
    );
    let detection = classify_response(&facts, &chain.hops);
    let rate_limited = detection.as_ref().is_some_and(|d| d.rate_limit.is_some());
    result.rate_limit = rate_limit_info(&facts, rate_limited, Utc::now());

    let challenge_page = detection.as_ref().and_then(DetectionMetadata::challenge);
    let decision = decide(&StatusInputs {
        final_status,
        expected_status: check.expected_status,
        treat_redirect_as_up: check.treat_redirect_as_up,
        no_location_header: chain.no_location_header,
        challenge_signature: chain.no_location_header && cdn::has_challenge_signature(&facts),
        cdn_challenge: challenge_page,
        loop_url: chain.loop_url.as_deref(),
        max_redirects_exceeded: chain.max_redirects_exceeded,
        max_redirects: prober.config.max_redirects,
        elapsed_ms,
        degraded_threshold_ms: check.degraded_threshold_ms,
    });

    if let Some(reason) = decision.challenge_reason {
        log::debug!("{} reachable behind interstitial: {reason}", chain.final_url);
        result.challenge_info = Some(ChallengeInfo {
            reason,
            status_code: final_status,
            vendor: challenge_page.map(|page| page.vendor),
            challenge: challenge_page.map(|page| page.challenge),
        });
    }

    if let (Some(validation), Some(body)) =
        (&check.content_validation, final_response.body.as_deref())
    {
        if check.method != Method::HEAD && (200..300).contains(&final_status) {
            let outcome = validate_content(validation, body, final_response.body_truncated);
            if !outcome.passed {
                log::debug!(
                    "Content validation ({}) failed for {}: {}",
                    outcome.validation_type,
                    chain.final_url,
                    outcome.failures.join("; ")
                );
            }
            result.content_validation = Some(outcome);
        }
    }

    result.status = decision.status;
    result.error = decision.message;
    result.status_code = Some(final_status);
    result.body_truncated = final_response.body_truncated;
    result.apply_detection(detection);
    result.redirects = Some(RedirectSummary {
        count: chain.redirect_count(),
        final_url: chain.final_url.to_string(),
        is_loop: chain.loop_detected,
        loop_url: chain.loop_url,
        max_redirects_exceeded: chain.max_redirects_exceeded,
        no_location_header: chain.no_location_header,
        total_ms: chain.total_ms,
        chain: chain.hops,
    });
}

fn finish(mut result: CheckResult, dns: DnsResult, timing: &TimingCollector) -> CheckResult {
    result.timing = timing.finish();
    result.response_time_ms = result.timing.total_ms;
    result.dns = Some(dns);
    log::debug!("DONE {} -> {}", result.target, result.status);
    result
}
