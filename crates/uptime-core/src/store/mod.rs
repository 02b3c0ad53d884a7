//! Persistence seam consumed by the engine.
//!
//! Targets, groups and settings are owned by an external CRUD layer; the
//! engine only reads them, appends check history and overwrites the status
//! snapshot of a target. [`MemoryStore`] is the in-process implementation
//! used by the binary and the tests.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{CheckResult, Group, GroupId, Target, TargetId, TargetStatus};
use crate::stats::Availability;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("target {0} not found")]
    TargetNotFound(TargetId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TargetStore: Send + Sync {
    /// All targets, ordered by id.
    async fn list_targets(&self) -> Result<Vec<Target>, StoreError>;

    async fn list_targets_by_group(&self, group_id: GroupId) -> Result<Vec<Target>, StoreError>;

    async fn get_target(&self, id: TargetId) -> Result<Option<Target>, StoreError>;

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError>;

    /// Appends one history row and returns it with its assigned id.
    async fn append_check_result(&self, result: CheckResult) -> Result<CheckResult, StoreError>;

    async fn update_target_snapshot(
        &self,
        id: TargetId,
        status: TargetStatus,
        response_time: Option<u64>,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Most recent history rows for a target, newest first.
    async fn recent_results(
        &self,
        id: TargetId,
        limit: usize,
    ) -> Result<Vec<CheckResult>, StoreError>;

    async fn availability(&self, id: TargetId) -> Result<Availability, StoreError>;
}

/// Key/value settings lookup. Read on every use so edits apply without restart.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError>;
}
