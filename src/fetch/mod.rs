//! HTTP fetching for checks.
//!
//! This module provides:
//! - Browser-like request headers and User-Agent rotation
//! - Manual redirect following with loop and hop-limit detection
//! - Bounded body reads
//! - Raw TCP/TLS connection probing for timing and TCP checks

mod body;
mod connect;
mod redirects;
mod request;
mod user_agent;

pub use connect::{probe_connection, tcp_connect};
pub use redirects::{
    follow_redirects, is_redirect_status, CookieSession, Hop, HopRequest, RedirectChain,
};
pub(crate) use request::RequestHeaders;
pub use user_agent::UserAgentPool;
