//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// High-level classification of an [`ErrorCode`], used to decide whether an
/// error is worth logging at `error!` level and how a caller should react
/// to it (retry, surface to the operator, fail the whole job, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    General,
    Validation,
    /// Talking to the POS vendor API (network or parse failure).
    Pos,
    /// The GL aggregator produced an invariant violation.
    Aggregation,
    /// Postgres or Redis unavailable.
    Storage,
    /// Scheduler/worker/job-level failure.
    Scheduler,
    System,
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        let code = self.code();
        match code {
            0..=999 => ErrorCategory::General,
            1000..=1999 => ErrorCategory::Validation,
            2000..=2999 => ErrorCategory::Pos,
            3000..=3999 => ErrorCategory::Aggregation,
            4000..=4999 => ErrorCategory::Storage,
            5000..=5999 => ErrorCategory::Scheduler,
            _ => ErrorCategory::System,
        }
    }
}
