//! Error handling and outcome statistics.
//!
//! This module provides:
//! - The probe's error taxonomy (`ProbeError`, `FailureKind`)
//! - Categorization of transport errors into readable messages
//! - Thread-safe counters of check outcomes

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{probe_error_from_reqwest, sanitize_and_truncate_error_message};
pub use stats::{CheckStats, CheckStatsSnapshot};
pub use types::{FailureKind, InitializationError, ProbeError, TimeoutPhase};
