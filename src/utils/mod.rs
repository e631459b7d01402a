//! Utilities module for logging, metrics, and error handling
//!
//! This module provides:
//! - Structured logging with tracing
//! - Running meters and accuracy helpers shared by training and evaluation
//! - Error handling types

pub mod error;
pub mod logging;
pub mod metrics;

// Re-export main types for convenience
pub use error::{GtzanError, Result};
pub use logging::init_logging;
pub use metrics::{accuracy_topk, AccuracyTracker, MeterSet, RunningAverage};

/// Format elapsed wall time for run summaries
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{:.1}s", seconds);
    }

    let whole = seconds as u64;
    if whole < 3600 {
        format!("{}m {}s", whole / 60, whole % 60)
    } else {
        format!("{}h {}m", whole / 3600, (whole % 3600) / 60)
    }
}
