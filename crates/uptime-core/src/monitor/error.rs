use thiserror::Error;

use crate::model::TargetId;
use crate::store::StoreError;

/// Failure of a check pipeline. Probe failures are never errors; they are
/// recorded as `down` results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("target {0} not found")]
    TargetNotFound(TargetId),
    #[error("failed to record check result: {0}")]
    Persistence(#[from] StoreError),
    #[error("check task did not complete: {0}")]
    TaskFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("check interval must be between 1 and 59 minutes, got {0}")]
    InvalidInterval(u32),
}
