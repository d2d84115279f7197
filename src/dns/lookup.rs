//! Address lookup backends.
//!
//! [`HostLookup`] is the seam between the resolver logic (timeouts, cache,
//! hijack checks) and the thing that actually talks to DNS. Production uses
//! [`HickoryLookup`]; tests plug in fakes.

use std::net::IpAddr;

use anyhow::{Error, Result};
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;

/// Performs A and AAAA lookups for a hostname.
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Returns the IPv4 addresses of `host`, or an error when there are none.
    async fn lookup_ipv4(&self, host: &str) -> Result<Vec<IpAddr>>;

    /// Returns the IPv6 addresses of `host`, or an error when there are none.
    async fn lookup_ipv6(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// [`HostLookup`] backed by `hickory-resolver`.
pub struct HickoryLookup {
    resolver: TokioAsyncResolver,
}

impl HickoryLookup {
    pub fn new(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl HostLookup for HickoryLookup {
    async fn lookup_ipv4(&self, host: &str) -> Result<Vec<IpAddr>> {
        let response = self.resolver.ipv4_lookup(host).await.map_err(Error::new)?;
        let ips: Vec<IpAddr> = response.iter().map(|a| IpAddr::V4(a.0)).collect();
        if ips.is_empty() {
            return Err(Error::msg(format!("No A records found for {host}")));
        }
        Ok(ips)
    }

    async fn lookup_ipv6(&self, host: &str) -> Result<Vec<IpAddr>> {
        let response = self.resolver.ipv6_lookup(host).await.map_err(Error::new)?;
        let ips: Vec<IpAddr> = response.iter().map(|aaaa| IpAddr::V6(aaaa.0)).collect();
        if ips.is_empty() {
            return Err(Error::msg(format!("No AAAA records found for {host}")));
        }
        Ok(ips)
    }
}
