//! TCP check path: a bare connect, no DNS phase reporting and no classification.

use super::models::{CheckResult, CheckStatus, ValidatedCheck};
use super::prober::Prober;
use super::status::degraded_message;
use crate::fetch::tcp_connect;
use crate::utils::{duration_to_ms, TimingCollector};

pub(super) async fn run_tcp(
    prober: &Prober,
    check: &ValidatedCheck,
    host: &str,
    port: u16,
) -> CheckResult {
    let mut timing = TimingCollector::start();
    let mut result = CheckResult::new(
        CheckStatus::Down,
        check.target.to_string(),
        &prober.config.region,
    );

    log::debug!("CONNECTING {}", check.target);
    match tcp_connect(host, port, check.timeout).await {
        Ok((_stream, elapsed)) => {
            timing.record_tcp_connect(elapsed);
            match degraded_message(duration_to_ms(elapsed), check.degraded_threshold_ms) {
                Some(message) => {
                    result.status = CheckStatus::Degraded;
                    result.error = Some(message);
                }
                None => result.status = CheckStatus::Up,
            }
        }
        Err(e) => {
            log::debug!("TCP connect to {host}:{port} failed: {e}");
            result.error = Some(e.to_string());
        }
    }

    result.timing = timing.finish();
    result.response_time_ms = result.timing.total_ms;
    result
}
