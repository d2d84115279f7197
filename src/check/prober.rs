//! Check orchestration.
//!
//! [`Prober`] owns every component a check needs (resolver, clients, cookie
//! store, user-agent pool, statistics) and drives a check from validation to
//! its final [`CheckResult`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;

use super::models::{CheckRequest, CheckResult, CheckStatus, CheckTarget, ValidatedCheck};
use super::{http, tcp};
use crate::config::Config;
use crate::cookies::CookieStore;
use crate::dns::{DnsResolver, HostLookup};
use crate::error_handling::{
    CheckStats, InitializationError, ProbeError, TimeoutPhase,
};
use crate::fetch::UserAgentPool;
use crate::initialization::init_redirect_client;
use crate::utils::duration_to_ms;

/// Runs checks.
///
/// One instance is shared (behind an `Arc`) by every concurrent check; the
/// DNS cache and cookie store are the only state mutated across checks.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use region_probe::initialization::init_resolver;
/// use region_probe::{CheckRequest, Config, Prober};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let prober = Prober::new(Arc::clone(&config), init_resolver(&config))?;
/// let request = CheckRequest {
///     url: Some("https://example.com".to_string()),
///     ..Default::default()
/// };
/// let result = prober.run_check(request).await?;
/// println!("{}", result.status);
/// # Ok(())
/// # }
/// ```
pub struct Prober {
    pub(super) config: Arc<Config>,
    pub(super) resolver: Arc<DnsResolver>,
    pub(super) cookies: CookieStore,
    pub(super) client: reqwest::Client,
    pub(super) insecure_client: reqwest::Client,
    pub(super) user_agents: UserAgentPool,
    stats: CheckStats,
    started_at: Instant,
}

impl Prober {
    /// Builds a prober resolving through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if an HTTP client can't be built.
    pub fn new(config: Arc<Config>, lookup: Arc<dyn HostLookup>) -> Result<Self, InitializationError> {
        let resolver = Arc::new(DnsResolver::new(lookup, config.dns_cache_ttl()));
        let client = init_redirect_client(&config, Arc::clone(&resolver), false)?;
        let insecure_client = init_redirect_client(&config, Arc::clone(&resolver), true)?;

        Ok(Self {
            cookies: CookieStore::new(config.cookie_ttl()),
            config,
            resolver,
            client,
            insecure_client,
            user_agents: UserAgentPool::default(),
            stats: CheckStats::new(),
            started_at: Instant::now(),
        })
    }

    /// Replaces the default user-agent rotation.
    pub fn with_user_agents(mut self, user_agents: UserAgentPool) -> Self {
        self.user_agents = user_agents;
        self
    }

    /// Process configuration shared by every check.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Per-status check counters since start.
    pub fn stats(&self) -> &CheckStats {
        &self.stats
    }

    /// Time since this prober was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Drops expired DNS cache entries and idle cookie jars.
    ///
    /// Returns how many of each were removed.
    pub fn sweep_caches(&self) -> (usize, usize) {
        (self.resolver.cache().purge_expired(), self.cookies.sweep())
    }

    /// Runs one check.
    ///
    /// # Errors
    ///
    /// Only `ProbeError::MalformedInput` is returned, before any network
    /// attempt. Every other failure, including a panic inside the check or
    /// the overall check timeout, is reported as a `down` result.
    pub async fn run_check(&self, request: CheckRequest) -> Result<CheckResult, ProbeError> {
        let check = match request.validate(&self.config) {
            Ok(check) => check,
            Err(e) => {
                self.stats.record_rejected();
                log::debug!("Rejected check request: {e}");
                return Err(e);
            }
        };

        let target = check.target.to_string();
        log::debug!("PENDING {target}");

        let started = Instant::now();
        let limit = self.config.check_timeout();
        let outcome =
            tokio::time::timeout(limit, AssertUnwindSafe(self.execute(&check)).catch_unwind())
                .await;

        let mut result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                log::error!("Check of {target} panicked: {message}");
                self.aborted(&target, started, format!("Internal error: {message}"))
            }
            Err(_) => {
                let err = ProbeError::Timeout {
                    phase: TimeoutPhase::Check,
                    limit_ms: duration_to_ms(limit),
                };
                self.aborted(&target, started, err.to_string())
            }
        };
        result.monitor_id = check.monitor_id.clone();

        self.stats.record(result.status);
        match result.status {
            CheckStatus::Up | CheckStatus::Degraded => log::info!(
                "{} {} in {}ms ({})",
                result.status,
                target,
                result.response_time_ms,
                self.config.region
            ),
            CheckStatus::Down | CheckStatus::DnsFailure => log::warn!(
                "{} {} in {}ms: {}",
                result.status,
                target,
                result.response_time_ms,
                result.error.as_deref().unwrap_or("no detail")
            ),
        }

        Ok(result)
    }

    async fn execute(&self, check: &ValidatedCheck) -> CheckResult {
        match &check.target {
            CheckTarget::Http(url) => http::run_http(self, check, url).await,
            CheckTarget::Tcp { host, port } => tcp::run_tcp(self, check, host, *port).await,
        }
    }

    fn aborted(&self, target: &str, started: Instant, message: String) -> CheckResult {
        let mut result = CheckResult::new(CheckStatus::Down, target.to_string(), &self.config.region);
        result.response_time_ms = duration_to_ms(started.elapsed());
        result.timing.total_ms = result.response_time_ms;
        result.error = Some(message);
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
