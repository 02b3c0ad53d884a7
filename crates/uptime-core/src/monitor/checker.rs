use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::model::{CheckResult, GroupId, Target, TargetId};
use crate::monitor::error::CheckError;
use crate::monitor::recorder::Recorder;
use crate::monitor::transition::is_alert_worthy;
use crate::notify::{down_alert_body, Notifier, DOWN_ALERT_TITLE};
use crate::probe::Prober;
use crate::store::TargetStore;

#[derive(Debug, Clone, Serialize)]
pub struct GroupCheckSummary {
    pub completed_count: usize,
    pub total: usize,
    pub results: Vec<CheckResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub total: usize,
    pub successful: usize,
}

#[derive(Clone)]
pub struct Checker {
    store: Arc<dyn TargetStore>,
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
    recorder: Recorder,
    sweep_timeout: Option<Duration>,
}

impl Checker {
    pub fn new(
        store: Arc<dyn TargetStore>,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            recorder: Recorder::new(Arc::clone(&store)),
            store,
            prober,
            notifier,
            sweep_timeout: None,
        }
    }

    pub fn with_sweep_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sweep_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn TargetStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Runs the full pipeline for one target. `target.status` is taken as the
    /// previous status for edge detection.
    ///
    /// Alert delivery failures are logged and swallowed; only recording errors
    /// are returned.
    pub async fn check_target(&self, target: &Target) -> Result<CheckResult, CheckError> {
        let outcome = self.prober.probe(target).await;
        let result = self.recorder.record(target, &outcome).await?;

        if is_alert_worthy(target.status, result.status) {
            info!(
                target_id = target.id,
                name = %target.name,
                error = result.error_message.as_deref().unwrap_or(""),
                "Target went down, sending alert"
            );
            let body = down_alert_body(target, result.error_message.as_deref(), result.checked_at);
            if let Err(e) = self.notifier.send(DOWN_ALERT_TITLE, &body).await {
                warn!(target_id = target.id, error = %e, "Failed to send down alert");
            }
        }

        Ok(result)
    }

    pub async fn check_one(&self, id: TargetId) -> Result<CheckResult, CheckError> {
        let target = self
            .store
            .get_target(id)
            .await?
            .ok_or(CheckError::TargetNotFound(id))?;
        self.check_target(&target).await
    }

    pub async fn check_group(&self, group_id: GroupId) -> Result<GroupCheckSummary, CheckError> {
        let targets = self.store.list_targets_by_group(group_id).await?;
        let total = targets.len();
        if total == 0 {
            info!(group_id, "No targets in group to check");
        }

        let results: Vec<CheckResult> = self
            .check_batch(targets)
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect();

        info!(group_id, completed = results.len(), total, "Group check finished");
        Ok(GroupCheckSummary {
            completed_count: results.len(),
            total,
            results,
        })
    }

    /// Checks every target once. The target list is snapshotted up front;
    /// targets added while the checks run are not included.
    pub async fn check_all_now(&self) -> Result<SweepSummary, CheckError> {
        let run_id = Uuid::new_v4();
        let targets = self.store.list_targets().await?;
        let total = targets.len();

        if total == 0 {
            info!(%run_id, "No targets to check");
            return Ok(SweepSummary { total: 0, successful: 0 });
        }

        info!(%run_id, total, "Checking targets");
        let successful = self
            .check_batch(targets)
            .await
            .iter()
            .filter(|r| r.is_ok())
            .count();
        info!(%run_id, successful, total, "Completed {}/{} target checks", successful, total);

        Ok(SweepSummary { total, successful })
    }

    async fn check_batch(&self, targets: Vec<Target>) -> Vec<Result<CheckResult, CheckError>> {
        let ids: Vec<TargetId> = targets.iter().map(|t| t.id).collect();
        let mut slots: Vec<Option<Result<CheckResult, CheckError>>> =
            ids.iter().map(|_| None).collect();

        let mut tasks = JoinSet::new();
        for (idx, target) in targets.into_iter().enumerate() {
            let checker = self.clone();
            tasks.spawn(async move {
                let result = checker.check_target(&target).await;
                if let Err(ref e) = result {
                    warn!(
                        target_id = target.id,
                        name = %target.name,
                        error = %e,
                        "Error checking target"
                    );
                }
                (idx, result)
            });
        }

        let collect = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((idx, result)) => slots[idx] = Some(result),
                    Err(e) => error!(error = %e, "Check task failed"),
                }
            }
        };

        match self.sweep_timeout {
            Some(limit) => {
                let timed_out = tokio::time::timeout(limit, collect).await.is_err();
                if timed_out {
                    warn!(
                        timeout_ms = limit.as_millis() as u64,
                        unfinished = tasks.len(),
                        "Check batch timed out, aborting unfinished checks"
                    );
                    tasks.abort_all();
                }
            }
            None => collect.await,
        }

        slots
            .into_iter()
            .zip(ids)
            .map(|(slot, id)| {
                slot.unwrap_or_else(|| {
                    Err(CheckError::TaskFailed(format!("check of target {} did not finish", id)))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TargetStatus;
    use crate::notify::DispatchError;
    use crate::probe::{ProbeError, ProbeOutcome};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct SlowProber(Duration);

    #[async_trait]
    impl Prober for SlowProber {
        async fn probe(&self, target: &Target) -> ProbeOutcome {
            if target.url.contains("slow") {
                tokio::time::sleep(self.0).await;
            }
            ProbeOutcome::up(1)
        }
    }

    struct PanickyProber;

    #[async_trait]
    impl Prober for PanickyProber {
        async fn probe(&self, target: &Target) -> ProbeOutcome {
            if target.id == 2 {
                panic!("probe exploded");
            }
            ProbeOutcome::down(ProbeError::DnsFailure, Some(3))
        }
    }

    #[derive(Default)]
    struct Outbox(Mutex<Vec<String>>);

    #[async_trait]
    impl Notifier for Outbox {
        async fn send(&self, title: &str, _body: &str) -> Result<(), DispatchError> {
            self.0.lock().unwrap().push(title.to_string());
            Ok(())
        }
    }

    fn store_with(targets: &[(TargetId, &str)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (id, url) in targets {
            store.insert_target(
                Target::new(*id, format!("t{}", id), *url).with_status(TargetStatus::Up),
            );
        }
        store
    }

    #[tokio::test]
    async fn panicked_task_does_not_cancel_siblings() {
        let store = store_with(&[(1, "https://a"), (2, "https://b"), (3, "https://c")]);
        let outbox = Arc::new(Outbox::default());
        let checker = Checker::new(
            Arc::new(store.clone()),
            Arc::new(PanickyProber),
            outbox.clone(),
        );

        let summary = checker.check_all_now().await.unwrap();
        assert_eq!(summary, SweepSummary { total: 3, successful: 2 });
        assert_eq!(store.history_len().await, 2);
        assert_eq!(outbox.0.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_timeout_aborts_unfinished_checks() {
        let store = store_with(&[(1, "https://fast"), (2, "https://slow")]);
        let checker = Checker::new(
            Arc::new(store.clone()),
            Arc::new(SlowProber(Duration::from_secs(60))),
            Arc::new(Outbox::default()),
        )
        .with_sweep_timeout(Some(Duration::from_secs(5)));

        let summary = checker.check_all_now().await.unwrap();
        assert_eq!(summary, SweepSummary { total: 2, successful: 1 });
        assert_eq!(store.get_target(2).await.unwrap().unwrap().last_checked, None);
    }

    #[tokio::test]
    async fn check_one_unknown_target_is_not_found() {
        let checker = Checker::new(
            Arc::new(MemoryStore::new()),
            Arc::new(PanickyProber),
            Arc::new(Outbox::default()),
        );
        assert_eq!(checker.check_one(99).await.unwrap_err(), CheckError::TargetNotFound(99));
    }
}
