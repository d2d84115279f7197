// Shared test helpers: a scripted DNS backend and local mock servers.
//
// Every test talks to axum servers bound on 127.0.0.1; DNS never leaves the process.
// Not every test file uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use region_probe::{CheckRequest, Config, HostLookup, Prober};

/// Lookup backend answering from a fixed table, optionally after a delay.
pub struct FakeLookup {
    answers: HashMap<String, Vec<IpAddr>>,
    delay: Duration,
}

impl FakeLookup {
    /// Resolves `localhost` to 127.0.0.1 and nothing else.
    pub fn localhost() -> Self {
        Self::new(&[("localhost", IpAddr::V4(Ipv4Addr::LOCALHOST))])
    }

    pub fn new(entries: &[(&str, IpAddr)]) -> Self {
        let mut answers: HashMap<String, Vec<IpAddr>> = HashMap::new();
        for (host, ip) in entries {
            answers.entry(host.to_string()).or_default().push(*ip);
        }
        Self {
            answers,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl HostLookup for FakeLookup {
    async fn lookup_ipv4(&self, host: &str) -> Result<Vec<IpAddr>> {
        tokio::time::sleep(self.delay).await;
        self.answers
            .get(host)
            .cloned()
            .ok_or_else(|| anyhow!("no A records for {host}"))
    }

    async fn lookup_ipv6(&self, host: &str) -> Result<Vec<IpAddr>> {
        Err(anyhow!("no AAAA records for {host}"))
    }
}

/// Serves `app` on an ephemeral local port and returns its address.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Mock server has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server failed");
    });
    addr
}

/// Base URL of a mock server, addressed by name so requests go through DNS.
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://localhost:{}", addr.port())
}

pub fn test_config() -> Config {
    Config {
        region: "test-region".to_string(),
        default_timeout_secs: 5,
        check_timeout_secs: 20,
        ..Default::default()
    }
}

pub fn prober_with(config: Config, lookup: FakeLookup) -> Prober {
    Prober::new(Arc::new(config), Arc::new(lookup)).expect("Failed to build prober")
}

pub fn prober() -> Prober {
    prober_with(test_config(), FakeLookup::localhost())
}

pub fn http_check(url: impl Into<String>) -> CheckRequest {
    CheckRequest {
        url: Some(url.into()),
        ..Default::default()
    }
}
