//! Error type definitions.
//!
//! This module defines the error taxonomy of the probe. Only
//! [`ProbeError::MalformedInput`] ever leaves a check; every other variant is
//! folded into the returned result as a status and message.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The check server could not bind its listen address.
    #[error("Failed to bind check server to {addr}: {source}")]
    ServerBindError {
        /// Address from the configuration
        addr: String,
        /// Underlying bind failure
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced while running a check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The request could not be turned into a target (bad URL, missing host/port).
    /// Rejected before any network attempt.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Resolution error or resolver timeout.
    #[error("DNS resolution failed: {0}")]
    DnsFailure(String),

    /// A resolved address failed a trust heuristic.
    #[error("DNS hijack suspected: {0}")]
    DnsHijackSuspected(String),

    /// Connection refused/reset, TLS failure and similar transport problems.
    #[error("{kind}: {message}")]
    Network {
        /// What broke
        kind: FailureKind,
        /// Sanitized error chain text
        message: String,
    },

    /// A phase exceeded its deadline; the in-flight operation has been dropped.
    #[error("{phase} timed out after {limit_ms}ms")]
    Timeout {
        /// Which timer fired
        phase: TimeoutPhase,
        /// The limit that was exceeded
        limit_ms: u64,
    },
}

impl ProbeError {
    /// True for phase timeouts and transport errors categorized as timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout { .. })
            || matches!(
                self,
                ProbeError::Network {
                    kind: FailureKind::Timeout,
                    ..
                }
            )
    }
}

/// Phase whose timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    /// Name resolution
    Dns,
    /// TCP connect, or TCP connect plus TLS handshake on the timing connection
    Connect,
    /// One redirect hop
    Request,
    /// The whole check
    Check,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimeoutPhase::Dns => "DNS resolution",
            TimeoutPhase::Connect => "TCP connect",
            TimeoutPhase::Request => "Request",
            TimeoutPhase::Check => "Check",
        })
    }
}

/// Categories of transport failure.
///
/// Derived from `reqwest::Error` so down messages name what actually broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    /// The transport gave up waiting
    Timeout,
    /// Refused, reset or unreachable
    Connect,
    /// Handshake or certificate failure
    Tls,
    /// The request could not be sent
    Request,
    /// The body stream failed mid-read
    Body,
    /// Content decoding failed
    Decode,
    /// A redirect could not be followed
    Redirect,
    /// The request could not be built
    Builder,
    /// Anything else
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    /// Human-readable prefix used in down messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "Request timeout",
            FailureKind::Connect => "Connection error",
            FailureKind::Tls => "TLS error",
            FailureKind::Request => "Request error",
            FailureKind::Body => "Body read error",
            FailureKind::Decode => "Decode error",
            FailureKind::Redirect => "Redirect error",
            FailureKind::Builder => "Request builder error",
            FailureKind::Other => "HTTP error",
        }
    }
}
