//! Utility functions shared across the probe.
//!
//! This module provides:
//! - Timing capture for check sub-phases
//! - Lowercased views of response headers and bodies

mod response;
mod timing;

pub use response::{lowercase_body, lowercase_headers};
pub use timing::{duration_to_ms, TimingBreakdown, TimingCollector};
