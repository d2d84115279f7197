//! DNS module tests.

use super::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted lookup backend that counts calls.
struct FakeLookup {
    v4: Option<Vec<IpAddr>>,
    v6: Option<Vec<IpAddr>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeLookup {
    fn new(v4: Option<&[&str]>, v6: Option<&[&str]>) -> Self {
        let parse = |list: &[&str]| list.iter().map(|s| s.parse().unwrap()).collect();
        Self {
            v4: v4.map(parse),
            v6: v6.map(parse),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl HostLookup for FakeLookup {
    async fn lookup_ipv4(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.v4
            .clone()
            .ok_or_else(|| anyhow!("no A records for {host}"))
    }

    async fn lookup_ipv6(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.v6
            .clone()
            .ok_or_else(|| anyhow!("no AAAA records for {host}"))
    }
}

fn resolver_with(lookup: FakeLookup) -> (DnsResolver, Arc<FakeLookup>) {
    let lookup = Arc::new(lookup);
    let resolver = DnsResolver::new(lookup.clone(), Duration::from_secs(60));
    (resolver, lookup)
}

const TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_resolve_ipv4_success_is_cached() {
    let (resolver, lookup) = resolver_with(FakeLookup::new(Some(&["93.184.216.34"]), None));

    let first = resolver.resolve("Example.COM.", TIMEOUT).await;
    assert!(first.success);
    assert!(!first.cache_hit);
    assert_eq!(first.hostname, "example.com");
    assert_eq!(first.ips, vec!["93.184.216.34".parse::<IpAddr>().unwrap()]);

    let second = resolver.resolve("example.com", TIMEOUT).await;
    assert!(second.success);
    assert!(second.cache_hit);
    assert_eq!(second.latency_ms, 0);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_resolve_falls_back_to_ipv6() {
    let (resolver, _) = resolver_with(FakeLookup::new(None, Some(&["2606:2800:220:1::248"])));
    let result = resolver.resolve("v6only.example", TIMEOUT).await;
    assert!(result.success);
    assert!(result.ips[0].is_ipv6());
}

#[tokio::test]
async fn test_resolve_reports_ipv4_error_when_both_fail() {
    let (resolver, _) = resolver_with(FakeLookup::new(None, None));
    let result = resolver.resolve("nowhere.example", TIMEOUT).await;
    assert!(!result.success);
    let error = result.error.as_deref().unwrap();
    assert!(error.contains("no A records"), "got: {error}");
    assert!(result.failure().is_some());
}

#[tokio::test]
async fn test_resolve_timeout_is_failure() {
    let (resolver, _) = resolver_with(
        FakeLookup::new(Some(&["93.184.216.34"]), None).with_delay(Duration::from_secs(5)),
    );
    let start = std::time::Instant::now();
    let result = resolver.resolve("slow.example", Duration::from_millis(100)).await;
    assert!(!result.success);
    assert!(result.timed_out);
    assert!(result.error.unwrap().contains("timed out"));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(resolver.cache().is_empty());
}

#[tokio::test]
async fn test_sinkhole_answer_is_flagged_and_not_cached() {
    let (resolver, lookup) = resolver_with(FakeLookup::new(Some(&["0.0.0.0"]), None));

    let result = resolver.resolve("blocked.example", TIMEOUT).await;
    assert!(result.hijack_detected);
    assert!(result.hijack_reason.as_deref().unwrap().contains("sinkhole"));
    assert!(matches!(
        result.failure(),
        Some(crate::error_handling::ProbeError::DnsHijackSuspected(_))
    ));
    assert!(resolver.cache().is_empty());

    // Not served from cache on the next attempt either
    let again = resolver.resolve("blocked.example", TIMEOUT).await;
    assert!(!again.cache_hit);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cached_answer_is_rechecked_for_hijack() {
    let (resolver, _) = resolver_with(FakeLookup::new(Some(&["93.184.216.34"]), None));
    // Simulate a poisoned cache entry
    resolver
        .cache()
        .insert("shop.example.org", vec!["127.0.0.1".parse().unwrap()]);

    let result = resolver.resolve("shop.example.org", TIMEOUT).await;
    assert!(result.cache_hit);
    assert!(result.hijack_detected);
    assert!(resolver.cache().get("shop.example.org").is_none());
}

#[tokio::test]
async fn test_ip_literal_skips_lookup() {
    let (resolver, lookup) = resolver_with(FakeLookup::new(None, None));
    let result = resolver.resolve("[::1]", TIMEOUT).await;
    assert!(result.success);
    assert_eq!(result.ips, vec!["::1".parse::<IpAddr>().unwrap()]);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
}
