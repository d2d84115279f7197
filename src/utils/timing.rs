//! Timing capture for check sub-phases.
//!
//! A [`TimingCollector`] is created when a check starts; each phase records
//! its own duration and [`TimingCollector::finish`] produces the breakdown
//! attached to the result.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Converts a `Duration` to whole milliseconds, saturating at `u64::MAX`.
pub fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Latency of each phase of a check, in milliseconds.
///
/// Phases that did not run (e.g. TLS on a plain-HTTP target) are `None`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub dns_ms: Option<u64>,
    pub tcp_connect_ms: Option<u64>,
    pub tls_handshake_ms: Option<u64>,
    pub ttfb_ms: Option<u64>,
    pub download_ms: Option<u64>,
    pub total_ms: u64,
}

/// Accumulates phase latencies for a single check.
#[derive(Debug)]
pub struct TimingCollector {
    start: Instant,
    dns_ms: Option<u64>,
    tcp_connect_ms: Option<u64>,
    tls_handshake_ms: Option<u64>,
    ttfb_ms: Option<u64>,
    download_ms: Option<u64>,
    stopped: Option<Duration>,
}

impl TimingCollector {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            dns_ms: None,
            tcp_connect_ms: None,
            tls_handshake_ms: None,
            ttfb_ms: None,
            download_ms: None,
            stopped: None,
        }
    }

    pub fn record_dns(&mut self, ms: u64) {
        self.dns_ms = Some(ms);
    }

    pub fn record_tcp_connect(&mut self, duration: Duration) {
        self.tcp_connect_ms = Some(duration_to_ms(duration));
    }

    pub fn record_tls_handshake(&mut self, duration: Duration) {
        self.tls_handshake_ms = Some(duration_to_ms(duration));
    }

    pub fn record_ttfb(&mut self, duration: Duration) {
        self.ttfb_ms = Some(duration_to_ms(duration));
    }

    pub fn record_download(&mut self, duration: Duration) {
        self.download_ms = Some(duration_to_ms(duration));
    }

    /// Freezes the total; work after this point is not part of the check's time.
    pub fn stop(&mut self) {
        if self.stopped.is_none() {
            self.stopped = Some(self.start.elapsed());
        }
    }

    /// Milliseconds since the check started, or until [`stop`](Self::stop).
    pub fn elapsed_ms(&self) -> u64 {
        duration_to_ms(self.stopped.unwrap_or_else(|| self.start.elapsed()))
    }

    pub fn finish(&self) -> TimingBreakdown {
        TimingBreakdown {
            dns_ms: self.dns_ms,
            tcp_connect_ms: self.tcp_connect_ms,
            tls_handshake_ms: self.tls_handshake_ms,
            ttfb_ms: self.ttfb_ms,
            download_ms: self.download_ms,
            total_ms: self.elapsed_ms(),
        }
    }
}
