//! HTTP client initialization.
//!
//! This module provides the clients used for checks. Redirects are disabled so
//! every hop can be tracked manually, and lookups go through the probe's own
//! resolver.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, MAX_TIMEOUT_SECS};
use crate::dns::{DnsResolver, ProbeDnsResolve};

/// Initializes an HTTP client for redirect-tracked checks.
///
/// Creates a `reqwest::Client` configured with:
/// - Redirect following disabled (hops are followed manually)
/// - DNS through `resolver`, sharing its cache and hijack checks
/// - No idle connection reuse, so each check pays and measures its own connect
/// - Certificate validation disabled when `accept_invalid_certs` is set
///
/// The client-level timeout is only a backstop; each hop sets its own.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_redirect_client(
    config: &Config,
    resolver: Arc<DnsResolver>,
    accept_invalid_certs: bool,
) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(MAX_TIMEOUT_SECS))
        .dns_resolver(Arc::new(ProbeDnsResolve::new(
            resolver,
            config.dns_timeout(),
        )))
        .pool_max_idle_per_host(0)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
}
