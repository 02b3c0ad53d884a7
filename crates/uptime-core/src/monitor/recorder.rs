use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::model::{CheckResult, Target};
use crate::probe::ProbeOutcome;
use crate::store::{StoreError, TargetStore};

#[derive(Clone)]
pub struct Recorder {
    store: Arc<dyn TargetStore>,
}

impl Recorder {
    pub fn new(store: Arc<dyn TargetStore>) -> Self {
        Self { store }
    }

    /// History is appended before the snapshot is overwritten, so an
    /// interrupted record leaves the snapshot one check stale at worst.
    pub async fn record(
        &self,
        target: &Target,
        outcome: &ProbeOutcome,
    ) -> Result<CheckResult, StoreError> {
        let checked_at = Utc::now();
        let result = self
            .store
            .append_check_result(CheckResult {
                id: None,
                target_id: target.id,
                status: outcome.status,
                response_time: outcome.latency_ms,
                error_message: outcome.error_message(),
                checked_at,
            })
            .await?;

        self.store
            .update_target_snapshot(target.id, outcome.status, outcome.latency_ms, checked_at)
            .await?;

        debug!(
            target_id = target.id,
            status = %result.status,
            result_id = ?result.id,
            "Check result recorded"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetStatus;
    use crate::probe::ProbeError;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn record_appends_history_and_updates_snapshot() {
        let store = MemoryStore::new();
        store.insert_target(
            Target::new(1, "ok", "https://ok.example").with_status(TargetStatus::Up),
        );
        let recorder = Recorder::new(Arc::new(store.clone()));
        let target = store.get_target(1).await.unwrap().unwrap();

        let result = recorder
            .record(&target, &ProbeOutcome::down(ProbeError::Timeout, Some(10_000)))
            .await
            .unwrap();

        assert_eq!(result.status, TargetStatus::Down);
        assert_eq!(result.error_message.as_deref(), Some("Connection timeout"));

        let snapshot = store.get_target(1).await.unwrap().unwrap();
        assert_eq!(snapshot.status, TargetStatus::Down);
        assert_eq!(snapshot.response_time, Some(10_000));
        assert_eq!(snapshot.last_checked, Some(result.checked_at));
    }

    #[tokio::test]
    async fn re_recording_adds_rows_but_snapshot_converges() {
        let store = MemoryStore::new();
        store.insert_target(Target::new(1, "ok", "https://ok.example"));
        let recorder = Recorder::new(Arc::new(store.clone()));
        let target = store.get_target(1).await.unwrap().unwrap();
        let outcome = ProbeOutcome::up(120);

        recorder.record(&target, &outcome).await.unwrap();
        recorder.record(&target, &outcome).await.unwrap();

        assert_eq!(store.history_len().await, 2);
        let snapshot = store.get_target(1).await.unwrap().unwrap();
        assert_eq!(snapshot.status, TargetStatus::Up);
        assert_eq!(snapshot.response_time, Some(120));
    }

    #[tokio::test]
    async fn deleted_target_keeps_history_and_reports_error() {
        let store = MemoryStore::new();
        let target = Target::new(5, "gone", "https://gone.example");
        let recorder = Recorder::new(Arc::new(store.clone()));

        let err = recorder
            .record(&target, &ProbeOutcome::up(1))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::TargetNotFound(5));
        assert_eq!(store.history_len().await, 1);
    }
}
