//! Up/down/degraded decision for HTTP checks.

use super::models::CheckStatus;
use crate::detection::ChallengePage;
use crate::fetch::is_redirect_status;

/// Everything the decision depends on, gathered after classification.
#[derive(Debug, Clone, Default)]
pub struct StatusInputs<'a> {
    pub final_status: u16,
    pub expected_status: u16,
    pub treat_redirect_as_up: bool,
    pub no_location_header: bool,
    /// Body of a no-`Location` redirect carries a challenge signature
    pub challenge_signature: bool,
    pub cdn_challenge: Option<&'a ChallengePage>,
    pub loop_url: Option<&'a str>,
    pub max_redirects_exceeded: bool,
    pub max_redirects: usize,
    pub elapsed_ms: u64,
    pub degraded_threshold_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDecision {
    pub status: CheckStatus,
    pub message: Option<String>,
    /// Set when the target was counted reachable behind an interstitial
    pub challenge_reason: Option<String>,
}

/// Exact match, or any 2xx when 200 is expected.
pub fn status_matches(actual: u16, expected: u16) -> bool {
    actual == expected || (expected == 200 && (200..300).contains(&actual))
}

/// Message explaining a downgrade to degraded, if `elapsed_ms` is over the threshold.
pub fn degraded_message(elapsed_ms: u64, threshold_ms: Option<u64>) -> Option<String> {
    let threshold = threshold_ms?;
    (elapsed_ms > threshold).then(|| {
        format!("Response time {elapsed_ms}ms exceeds degraded threshold {threshold}ms")
    })
}

pub fn decide(inputs: &StatusInputs<'_>) -> StatusDecision {
    let actual = inputs.final_status;
    let mut challenge_reason = None;

    let reachable = if status_matches(actual, inputs.expected_status)
        || (inputs.treat_redirect_as_up && is_redirect_status(actual))
    {
        true
    } else if inputs.no_location_header
        && (inputs.challenge_signature || actual == 302 || actual == 303)
    {
        challenge_reason = Some(format!(
            "HTTP {actual} without Location header: origin is responding behind an interstitial"
        ));
        true
    } else if let Some(page) = inputs.cdn_challenge {
        challenge_reason = Some(page.reason.clone());
        true
    } else {
        false
    };

    if !reachable {
        let message = if let Some(url) = inputs.loop_url {
            format!("Redirect loop detected at {url}")
        } else if inputs.max_redirects_exceeded {
            format!("Exceeded maximum of {} redirects", inputs.max_redirects)
        } else {
            format!("Expected status {}, got {actual}", inputs.expected_status)
        };
        return StatusDecision {
            status: CheckStatus::Down,
            message: Some(message),
            challenge_reason,
        };
    }

    if let Some(message) = degraded_message(inputs.elapsed_ms, inputs.degraded_threshold_ms) {
        return StatusDecision {
            status: CheckStatus::Degraded,
            message: Some(message),
            challenge_reason,
        };
    }

    StatusDecision {
        status: CheckStatus::Up,
        message: None,
        challenge_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{CdnVendor, ChallengeKind};

    fn inputs<'a>(final_status: u16) -> StatusInputs<'a> {
        StatusInputs {
            final_status,
            expected_status: 200,
            max_redirects: 10,
            elapsed_ms: 100,
            ..Default::default()
        }
    }

    #[test]
    fn test_any_2xx_counts_when_200_expected() {
        assert_eq!(decide(&inputs(204)).status, CheckStatus::Up);
        assert_eq!(decide(&inputs(500)).status, CheckStatus::Down);
    }

    #[test]
    fn test_exact_match_for_non_200_expectation() {
        let mut i = inputs(201);
        i.expected_status = 204;
        assert_eq!(decide(&i).status, CheckStatus::Down);
        i.final_status = 204;
        assert_eq!(decide(&i).status, CheckStatus::Up);
    }

    #[test]
    fn test_redirect_as_up_override() {
        let mut i = inputs(301);
        assert_eq!(decide(&i).status, CheckStatus::Down);
        i.treat_redirect_as_up = true;
        assert_eq!(decide(&i).status, CheckStatus::Up);
    }

    #[test]
    fn test_no_location_302_is_reachable() {
        let mut i = inputs(302);
        i.no_location_header = true;
        let decision = decide(&i);
        assert_eq!(decision.status, CheckStatus::Up);
        assert!(decision.challenge_reason.is_some());
    }

    #[test]
    fn test_no_location_307_needs_signature() {
        let mut i = inputs(307);
        i.no_location_header = true;
        assert_eq!(decide(&i).status, CheckStatus::Down);
        i.challenge_signature = true;
        assert_eq!(decide(&i).status, CheckStatus::Up);
    }

    #[test]
    fn test_cdn_challenge_is_up() {
        let page = ChallengePage {
            vendor: CdnVendor::Cloudflare,
            challenge: ChallengeKind::JsChallenge,
            marker: "just a moment...".into(),
            reason: "cloudflare JavaScript challenge page".into(),
        };
        let mut i = inputs(503);
        i.cdn_challenge = Some(&page);
        let decision = decide(&i);
        assert_eq!(decision.status, CheckStatus::Up);
        assert_eq!(decision.challenge_reason.as_deref(), Some(page.reason.as_str()));
    }

    #[test]
    fn test_degraded_only_applies_to_up() {
        let mut i = inputs(200);
        i.degraded_threshold_ms = Some(50);
        assert_eq!(decide(&i).status, CheckStatus::Degraded);

        let mut down = inputs(500);
        down.degraded_threshold_ms = Some(50);
        assert_eq!(decide(&down).status, CheckStatus::Down);
    }

    #[test]
    fn test_loop_message() {
        let mut i = inputs(302);
        i.loop_url = Some("https://a.example/");
        let decision = decide(&i);
        assert_eq!(decision.status, CheckStatus::Down);
        assert!(decision.message.unwrap().contains("loop"));
    }
}
