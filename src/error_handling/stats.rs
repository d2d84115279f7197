//! Check outcome statistics.
//!
//! Thread-safe counters of check outcomes since process start, reported by
//! the health endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::check::CheckStatus;

/// Thread-safe check statistics tracker.
///
/// Every [`CheckStatus`] is initialized to zero on creation, so lookups never
/// miss. Shared across tasks using `Arc`.
pub struct CheckStats {
    outcomes: HashMap<CheckStatus, AtomicUsize>,
    rejected: AtomicUsize,
}

/// Point-in-time copy of [`CheckStats`].
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckStatsSnapshot {
    /// All completed checks.
    pub total: usize,
    /// Checks that ended `up`.
    pub up: usize,
    /// Checks that ended `down`.
    pub down: usize,
    /// Checks that ended `degraded`.
    pub degraded: usize,
    /// Checks that ended `dns_failure`.
    pub dns_failure: usize,
    /// Requests rejected as malformed.
    pub rejected: usize,
}

impl CheckStats {
    /// Creates counters pre-seeded to zero for every status.
    pub fn new() -> Self {
        let mut outcomes = HashMap::new();
        for status in CheckStatus::iter() {
            outcomes.insert(status, AtomicUsize::new(0));
        }
        CheckStats {
            outcomes,
            rejected: AtomicUsize::new(0),
        }
    }

    /// Records the outcome of a completed check.
    pub fn record(&self, status: CheckStatus) {
        if let Some(counter) = self.outcomes.get(&status) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to record outcome {:?} which is not in the map. \
                 This indicates a bug in CheckStats initialization.",
                status
            );
        }
    }

    /// Records a request rejected as malformed before any network attempt.
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Completed checks with the given status.
    pub fn count(&self, status: CheckStatus) -> usize {
        self.outcomes
            .get(&status)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// All completed checks.
    pub fn total(&self) -> usize {
        CheckStatus::iter().map(|s| self.count(s)).sum()
    }

    /// Copies the current counters.
    pub fn snapshot(&self) -> CheckStatsSnapshot {
        CheckStatsSnapshot {
            total: self.total(),
            up: self.count(CheckStatus::Up),
            down: self.count(CheckStatus::Down),
            degraded: self.count(CheckStatus::Degraded),
            dns_failure: self.count(CheckStatus::DnsFailure),
            rejected: self.rejected.load(Ordering::SeqCst),
        }
    }
}

impl Default for CheckStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = CheckStats::new();
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.snapshot(), CheckStatsSnapshot::default());
    }

    #[test]
    fn test_record_counts_each_status() {
        let stats = CheckStats::new();
        stats.record(CheckStatus::Up);
        stats.record(CheckStatus::Up);
        stats.record(CheckStatus::DnsFailure);
        stats.record_rejected();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.up, 2);
        assert_eq!(snapshot.dns_failure, 1);
        assert_eq!(snapshot.down, 0);
        assert_eq!(snapshot.rejected, 1);
    }

    #[test]
    fn test_concurrent_records() {
        use std::sync::Arc;
        let stats = Arc::new(CheckStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record(CheckStatus::Degraded);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.count(CheckStatus::Degraded), 800);
    }
}
