//! region_probe library: regional HTTP/TCP reachability checks
//!
//! This library runs a single check against a target from the region the
//! process is deployed in and reports whether the target is up, down,
//! degraded or failing DNS, along with why: redirect chain, timing breakdown,
//! CDN challenges, WAF blocks, rate limiting, geo-blocking and DNS hijacking.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use region_probe::initialization::init_resolver;
//! use region_probe::{CheckRequest, Config, Prober};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(Config {
//!     region: "eu-west".to_string(),
//!     ..Default::default()
//! });
//! let prober = Prober::new(Arc::clone(&config), init_resolver(&config))?;
//!
//! let result = prober
//!     .run_check(CheckRequest {
//!         url: Some("https://example.com".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{} in {}ms", result.status, result.response_time_ms);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

mod check;
pub mod config;
mod cookies;
pub mod detection;
mod dns;
mod error_handling;
mod fetch;
pub mod initialization;
mod server;
mod utils;

// Re-export public API
pub use check::{
    ChallengeInfo, CheckRequest, CheckResult, CheckStatus, CheckType, Prober, RedirectSummary,
};
pub use config::{Config, LogFormat, LogLevel};
pub use cookies::CookieStore;
pub use dns::{DnsResult, HickoryLookup, HostLookup};
pub use error_handling::{
    CheckStats, CheckStatsSnapshot, FailureKind, InitializationError, ProbeError,
};
pub use fetch::{Hop, UserAgentPool};
pub use server::{build_router, run_server, HealthResponse};
pub use utils::TimingBreakdown;
