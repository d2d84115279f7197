//! reqwest integration.
//!
//! Routes the HTTP client's own lookups (including every redirect hop's host)
//! through [`DnsResolver`], so hops share the cache and hijack checks.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};

use super::DnsResolver;

pub struct ProbeDnsResolve {
    resolver: Arc<DnsResolver>,
    timeout: Duration,
}

impl ProbeDnsResolve {
    pub fn new(resolver: Arc<DnsResolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }
}

impl Resolve for ProbeDnsResolve {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = Arc::clone(&self.resolver);
        let timeout = self.timeout;
        Box::pin(async move {
            let result = resolver.resolve(name.as_str(), timeout).await;
            if let Some(err) = result.failure() {
                return Err(err.to_string().into());
            }
            // reqwest fills in the port
            let addrs: Addrs = Box::new(
                result
                    .ips
                    .into_iter()
                    .map(|ip| SocketAddr::new(ip, 0))
                    .collect::<Vec<_>>()
                    .into_iter(),
            );
            Ok(addrs)
        })
    }
}
