//! Configuration types and CLI options.
//!
//! This module defines the enums and structs used for command-line and
//! environment parsing. Every flag can also be supplied through a `PROBE_*`
//! environment variable, which is how the probe is configured when it runs
//! as a service.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::constants::{
    CHECK_TIMEOUT_SECS, COOKIE_TTL_SECS, DEFAULT_BIND_ADDR, DEFAULT_REGION, DEFAULT_TIMEOUT_SECS,
    DNS_CACHE_TTL_SECS, DNS_TIMEOUT_MS, MAX_REDIRECT_HOPS, MAX_REDIRECT_HOPS_LIMIT,
    MAX_TIMEOUT_SECS,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for log shippers
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Probe configuration.
///
/// Read once at process start and shared immutably for the lifetime of the
/// process. Library users can build it programmatically through `Default`.
///
/// # Examples
///
/// ```no_run
/// use region_probe::Config;
///
/// let config = Config {
///     region: "eu-west".to_string(),
///     default_timeout_secs: 15,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Parser)]
#[command(name = "region_probe", version, about = "Regional HTTP/TCP reachability probe")]
pub struct Config {
    /// What to run (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Region tag attached to every result
    #[arg(long, global = true, env = "PROBE_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Address the check server listens on
    #[arg(long, global = true, env = "PROBE_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub bind: String,

    /// Shared bearer secret required on `/check`
    #[arg(long, global = true, env = "PROBE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds when a check does not specify one
    #[arg(long, global = true, env = "PROBE_DEFAULT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub default_timeout_secs: u64,

    /// Hard DNS resolution timeout in milliseconds
    #[arg(long, global = true, env = "PROBE_DNS_TIMEOUT_MS", default_value_t = DNS_TIMEOUT_MS)]
    pub dns_timeout_ms: u64,

    /// DNS cache entry lifetime in seconds
    #[arg(long, global = true, env = "PROBE_DNS_CACHE_TTL_SECS", default_value_t = DNS_CACHE_TTL_SECS)]
    pub dns_cache_ttl_secs: u64,

    /// Maximum redirect hops followed per check
    #[arg(long, global = true, env = "PROBE_MAX_REDIRECTS", default_value_t = MAX_REDIRECT_HOPS)]
    pub max_redirects: usize,

    /// Overall cap on a single check in seconds
    #[arg(long, global = true, env = "PROBE_CHECK_TIMEOUT_SECS", default_value_t = CHECK_TIMEOUT_SECS)]
    pub check_timeout_secs: u64,

    /// Idle lifetime of a per-monitor cookie jar in seconds
    #[arg(long, global = true, env = "PROBE_COOKIE_TTL_SECS", default_value_t = COOKIE_TTL_SECS)]
    pub cookie_ttl_secs: u64,

    /// Log level
    #[arg(long, global = true, env = "PROBE_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, env = "PROBE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Subcommands of the binary.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the check server (default)
    Serve,
    /// Run a single check and print the result as JSON
    Check(CheckArgs),
}

/// Arguments of the one-shot `check` subcommand.
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// URL to check over HTTP(S)
    #[arg(long, conflicts_with = "host")]
    pub url: Option<String>,

    /// Host for a TCP connect check
    #[arg(long, requires = "port")]
    pub host: Option<String>,

    /// Port for a TCP connect check
    #[arg(long)]
    pub port: Option<u16>,

    /// HTTP method
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Expected HTTP status code
    #[arg(long, default_value_t = 200)]
    pub expected_status: u16,

    /// Timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub ignore_ssl_errors: bool,

    /// Mark the result degraded above this latency (ms)
    #[arg(long)]
    pub degraded_threshold_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            region: DEFAULT_REGION.to_string(),
            bind: DEFAULT_BIND_ADDR.to_string(),
            api_key: None,
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            dns_timeout_ms: DNS_TIMEOUT_MS,
            dns_cache_ttl_secs: DNS_CACHE_TTL_SECS,
            max_redirects: MAX_REDIRECT_HOPS,
            check_timeout_secs: CHECK_TIMEOUT_SECS,
            cookie_ttl_secs: COOKIE_TTL_SECS,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Validates value ranges that clap cannot express.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message naming the first offending option.
    pub fn validate(&self) -> Result<(), String> {
        if self.region.trim().is_empty() {
            return Err("region must not be empty".to_string());
        }
        if self.default_timeout_secs == 0 || self.default_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(format!(
                "default timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds"
            ));
        }
        if self.dns_timeout_ms == 0 {
            return Err("DNS timeout must be greater than zero".to_string());
        }
        if self.max_redirects == 0 || self.max_redirects > MAX_REDIRECT_HOPS_LIMIT {
            return Err(format!(
                "max redirects must be between 1 and {MAX_REDIRECT_HOPS_LIMIT}"
            ));
        }
        if self.check_timeout_secs < self.default_timeout_secs {
            return Err("check timeout must not be shorter than the default timeout".to_string());
        }
        Ok(())
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    pub fn dns_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.dns_cache_ttl_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn cookie_ttl(&self) -> Duration {
        Duration::from_secs(self.cookie_ttl_secs)
    }
}
