//! Runtime status normalization
//!
//! Maps the container runtime's raw state vocabulary onto the small set
//! of logical statuses the API exposes.

use crate::models::LogicalStatus;

/// Normalize a raw runtime state and exit code. First matching rule wins:
///
/// 1. `restarting`, `removing` -> processing
/// 2. `created`, or `exited` with exit code 0 -> stopped
/// 3. `dead`, `exited` -> error
/// 4. anything else passes through (`running`, `paused`, ...)
pub fn normalize(raw_status: &str, exit_code: i64) -> LogicalStatus {
    match raw_status {
        "restarting" | "removing" => LogicalStatus::Processing,
        "created" => LogicalStatus::Stopped,
        "exited" if exit_code == 0 => LogicalStatus::Stopped,
        "dead" | "exited" => LogicalStatus::Error,
        other => LogicalStatus::from(other.to_string()),
    }
}
