//! HTTP redirect chain following.
//!
//! The client used here must have redirects disabled; each hop is requested
//! explicitly so the chain, per-hop timing and `Location` values can be
//! recorded and classified.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, COOKIE, LOCATION, SET_COOKIE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use url::Url;

use crate::config::{MAX_RESPONSE_BODY_SIZE, REDIRECT_STATUS_CODES};
use crate::cookies::CookieStore;
use crate::error_handling::{probe_error_from_reqwest, FailureKind, ProbeError, TimeoutPhase};
use crate::fetch::body::read_capped;
use crate::utils::{duration_to_ms, lowercase_headers};

/// Cookie jar binding for one monitor.
#[derive(Clone, Copy)]
pub struct CookieSession<'a> {
    pub store: &'a CookieStore,
    pub monitor_id: &'a str,
}

/// Per-chain request options.
pub struct HopRequest<'a> {
    pub method: Method,
    pub headers: &'a HeaderMap,
    pub per_hop_timeout: Duration,
    pub max_hops: usize,
    pub cookies: Option<CookieSession<'a>>,
}

/// One request/response step of a redirect chain.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hop {
    pub url: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip)]
    pub headers: HashMap<String, String>,
    pub latency_ms: u64,
}

/// The last response observed in a chain.
#[derive(Debug, Clone)]
pub struct FinalResponse {
    pub status: u16,
    /// Lowercased header map
    pub headers: HashMap<String, String>,
    /// Only read for terminal (non-redirect or no-`Location`) responses
    pub body: Option<String>,
    pub body_truncated: bool,
    pub ttfb: Duration,
    pub download: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RedirectChain {
    pub hops: Vec<Hop>,
    pub final_url: Url,
    pub final_response: FinalResponse,
    pub loop_detected: bool,
    pub loop_url: Option<String>,
    pub max_redirects_exceeded: bool,
    pub no_location_header: bool,
    pub total_ms: u64,
}

impl RedirectChain {
    pub fn final_status(&self) -> u16 {
        self.final_response.status
    }

    pub fn redirect_count(&self) -> usize {
        self.hops.len().saturating_sub(1)
    }
}

/// Method to use for the hop after a redirect with `status`.
///
/// 303 turns anything but HEAD into GET; 301 and 302 do the same for
/// non-idempotent methods, as browsers do. 307 and 308 keep the method.
pub fn method_after_redirect(status: u16, method: &Method) -> Method {
    match status {
        303 if *method != Method::HEAD => Method::GET,
        301 | 302 if *method != Method::GET && *method != Method::HEAD => Method::GET,
        _ => method.clone(),
    }
}

pub fn is_redirect_status(status: u16) -> bool {
    REDIRECT_STATUS_CODES.contains(&status)
}

/// What a single hop produced.
struct HopOutcome {
    status: u16,
    headers: HashMap<String, String>,
    location: Option<String>,
    body: Option<String>,
    body_truncated: bool,
    ttfb: Duration,
    download: Option<Duration>,
}

/// Follows redirects from `start`, at most `request.max_hops` requests.
///
/// Loops, exhausted hop budgets and redirects without `Location` end the
/// chain with a flag set rather than an error. Transport failures and hop
/// timeouts are returned as errors.
pub async fn follow_redirects(
    client: &reqwest::Client,
    start: Url,
    request: &HopRequest<'_>,
) -> Result<RedirectChain, ProbeError> {
    let max_hops = request.max_hops.max(1);
    let mut hops: Vec<Hop> = Vec::with_capacity(max_hops.min(16));
    let mut visited: HashSet<String> = HashSet::from([start.to_string()]);
    let mut current = start;
    let mut method = request.method.clone();
    let mut total = Duration::ZERO;

    let mut loop_url = None;
    let mut max_redirects_exceeded = false;
    let mut no_location_header = false;
    let mut last: Option<HopOutcome> = None;

    for hop_index in 0..max_hops {
        let hop_start = Instant::now();
        let outcome = tokio::time::timeout(
            request.per_hop_timeout,
            perform_hop(client, &current, &method, request),
        )
        .await
        .map_err(|_| ProbeError::Timeout {
            phase: TimeoutPhase::Request,
            limit_ms: duration_to_ms(request.per_hop_timeout),
        })??;
        let latency = hop_start.elapsed();
        total += latency;

        log::debug!(
            "Hop {} {} {} -> {}",
            hop_index + 1,
            method,
            current,
            outcome.status
        );

        hops.push(Hop {
            url: current.to_string(),
            status: outcome.status,
            location: outcome.location.clone(),
            headers: outcome.headers.clone(),
            latency_ms: duration_to_ms(latency),
        });

        if !is_redirect_status(outcome.status) {
            last = Some(outcome);
            break;
        }

        let Some(location) = outcome.location.clone() else {
            log::warn!(
                "Redirect status {} for {} but no Location header",
                outcome.status,
                current
            );
            no_location_header = true;
            last = Some(outcome);
            break;
        };

        // Url::join covers absolute, relative and protocol-relative forms
        let next = current.join(&location).map_err(|e| ProbeError::Network {
            kind: FailureKind::Redirect,
            message: format!("invalid Location {location:?} from {current}: {e}"),
        })?;

        if !visited.insert(next.to_string()) {
            log::warn!("Redirect loop detected at {next}");
            loop_url = Some(next.to_string());
            last = Some(outcome);
            break;
        }

        method = method_after_redirect(outcome.status, &method);
        last = Some(outcome);

        if hop_index + 1 == max_hops {
            log::warn!("Exceeded {max_hops} redirect hops starting from {}", hops[0].url);
            max_redirects_exceeded = true;
            break;
        }
        current = next;
    }

    // The loop runs at least once, so `last` is always set
    let last = last.ok_or_else(|| ProbeError::Network {
        kind: FailureKind::Other,
        message: "redirect chain produced no response".to_string(),
    })?;

    Ok(RedirectChain {
        hops,
        final_url: current,
        final_response: FinalResponse {
            status: last.status,
            headers: last.headers,
            body: last.body,
            body_truncated: last.body_truncated,
            ttfb: last.ttfb,
            download: last.download,
        },
        loop_detected: loop_url.is_some(),
        loop_url,
        max_redirects_exceeded,
        no_location_header,
        total_ms: duration_to_ms(total),
    })
}

async fn perform_hop(
    client: &reqwest::Client,
    url: &Url,
    method: &Method,
    request: &HopRequest<'_>,
) -> Result<HopOutcome, ProbeError> {
    let mut builder = client
        .request(method.clone(), url.clone())
        .headers(request.headers.clone())
        .timeout(request.per_hop_timeout);

    if let Some(session) = request.cookies {
        if let Some(cookie) = session.store.cookie_header(session.monitor_id, url) {
            builder = builder.header(COOKIE, cookie);
        }
    }

    let sent = Instant::now();
    let response = builder
        .send()
        .await
        .map_err(|e| probe_error_from_reqwest(&e))?;
    let ttfb = sent.elapsed();

    let status = response.status().as_u16();
    let headers = lowercase_headers(response.headers());
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    if let Some(session) = request.cookies {
        session.store.store(
            session.monitor_id,
            url,
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
    }

    let terminal = !is_redirect_status(status) || location.is_none();
    if !terminal || *method == Method::HEAD || response.status() == StatusCode::NO_CONTENT {
        // Intermediate redirect bodies are dropped unread
        return Ok(HopOutcome {
            status,
            headers,
            location,
            body: None,
            body_truncated: false,
            ttfb,
            download: None,
        });
    }

    let download_start = Instant::now();
    let body = read_capped(response, MAX_RESPONSE_BODY_SIZE)
        .await
        .map_err(|e| probe_error_from_reqwest(&e))?;

    Ok(HopOutcome {
        status,
        headers,
        location,
        body: Some(body.text),
        body_truncated: body.truncated,
        ttfb,
        download: Some(download_start.elapsed()),
    })
}
