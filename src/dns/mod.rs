//! DNS resolution for checks.
//!
//! This module provides:
//! - [`DnsResolver`]: IPv4-first resolution with IPv6 fallback and a hard timeout
//! - A TTL cache shared by concurrent checks
//! - Hijack heuristics applied to every answer, cached or fresh
//! - [`HostLookup`]: the backend seam (hickory in production, fakes in tests)
//! - [`ProbeDnsResolve`]: plugs the resolver into reqwest

mod cache;
mod hijack;
mod lookup;
mod resolution;
mod transport;

// Re-export public API
pub use lookup::{HickoryLookup, HostLookup};
pub use resolution::{DnsResolver, DnsResult};
pub use transport::ProbeDnsResolve;

#[cfg(test)]
mod tests;
