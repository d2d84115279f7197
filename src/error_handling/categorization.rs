//! Error categorization and message shaping.
//!
//! This module turns transport errors into [`ProbeError`]s with readable
//! messages, and keeps those messages bounded.

use std::error::Error as StdError;

use super::types::{FailureKind, ProbeError};

/// Substrings in an error source chain that indicate a TLS failure.
const TLS_MARKERS: &[&str] = &[
    "certificate",
    "tls",
    "ssl",
    "handshake",
    "unknownissuer",
    "invalid peer",
];

/// Categorizes a `reqwest::Error` into a [`FailureKind`].
///
/// reqwest reports TLS failures as connect errors, so the source chain is
/// inspected to separate them.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_connect() {
        let chain = error_chain_text(error).to_lowercase();
        if TLS_MARKERS.iter().any(|m| chain.contains(m)) {
            FailureKind::Tls
        } else {
            FailureKind::Connect
        }
    } else if error.is_builder() {
        FailureKind::Builder
    } else if error.is_redirect() {
        FailureKind::Redirect
    } else if error.is_body() {
        FailureKind::Body
    } else if error.is_decode() {
        FailureKind::Decode
    } else if error.is_request() {
        FailureKind::Request
    } else {
        FailureKind::Other
    }
}

/// Joins an error and all of its sources with `": "`.
///
/// reqwest's top-level message ("error sending request for url ...") hides the
/// useful part, which usually sits two or three sources down.
pub fn error_chain_text(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if parts.last().map(|p| p != &text).unwrap_or(true) {
            parts.push(text);
        }
        source = inner.source();
    }
    parts.join(": ")
}

/// Converts a `reqwest::Error` into a [`ProbeError::Network`].
pub fn probe_error_from_reqwest(error: &reqwest::Error) -> ProbeError {
    ProbeError::Network {
        kind: categorize_reqwest_error(error),
        message: sanitize_and_truncate_error_message(&error_chain_text(error)),
    }
}

/// Removes control characters (except tab, newline, carriage return).
pub fn sanitize_error_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| {
            let code = *c as u32;
            code >= 0x20 || code == 0x09 || code == 0x0A || code == 0x0D
        })
        .collect()
}

/// Sanitizes and truncates an error message to `MAX_ERROR_MESSAGE_LENGTH`.
///
/// Truncation happens on a character boundary and appends the original length.
pub fn sanitize_and_truncate_error_message(message: &str) -> String {
    let sanitized = sanitize_error_message(message);
    let max = crate::config::MAX_ERROR_MESSAGE_LENGTH;

    if sanitized.chars().count() > max {
        let keep = max.saturating_sub(50);
        let truncated: String = sanitized.chars().take(keep).collect();
        format!(
            "{}... (truncated, original length: {} chars)",
            truncated,
            sanitized.chars().count()
        )
    } else {
        sanitized
    }
}
