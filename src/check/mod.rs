//! Check orchestration.
//!
//! This module provides:
//! - Request validation and the result model
//! - The up/down/degraded decision
//! - The HTTP and TCP check paths
//! - [`Prober`], which runs a check end to end and never lets a failure
//!   other than malformed input escape

mod http;
mod models;
mod prober;
mod status;
mod tcp;

// Re-export public API
pub use models::{
    ChallengeInfo, CheckRequest, CheckResult, CheckStatus, CheckType, RedirectSummary,
};
pub use prober::Prober;
