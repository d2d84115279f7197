//! DNS resolver initialization.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::config::Config;
use crate::dns::{HickoryLookup, HostLookup};

/// Initializes the hickory lookup backend used by the probe's resolver.
///
/// The resolver's own timeout is set to the configured DNS timeout; the probe
/// still races every lookup against its own hard timer. `ndots` is 0 so that
/// search domains are never appended to check targets, and the resolver
/// cache is disabled because the probe keeps its own TTL cache.
pub fn init_resolver(config: &Config) -> Arc<dyn HostLookup> {
    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_millis(config.dns_timeout_ms);
    opts.attempts = 2;
    opts.ndots = 0;
    opts.cache_size = 0;

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);
    Arc::new(HickoryLookup::new(resolver))
}
