use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::{SettingsStore, StoreError, TargetStore};
use crate::model::{CheckResult, Group, GroupId, Target, TargetId, TargetStatus};
use crate::stats::Availability;

/// In-process store. Cloning shares the underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    targets: Arc<DashMap<TargetId, Target>>,
    groups: Arc<DashMap<GroupId, Group>>,
    settings: Arc<DashMap<String, String>>,
    history: Arc<RwLock<Vec<CheckResult>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_target(&self, target: Target) {
        self.targets.insert(target.id, target);
    }

    pub fn insert_group(&self, group: Group) {
        self.groups.insert(group.id, group);
    }

    pub fn group(&self, id: GroupId) -> Option<Group> {
        self.groups.get(&id).map(|g| g.value().clone())
    }

    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.iter().map(|g| g.value().clone()).collect();
        groups.sort_by_key(|g| g.id);
        groups
    }

    pub fn set_setting(&self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), value.into());
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }
}

#[async_trait]
impl TargetStore for MemoryStore {
    async fn list_targets(&self) -> Result<Vec<Target>, StoreError> {
        let mut targets: Vec<Target> = self.targets.iter().map(|t| t.value().clone()).collect();
        targets.sort_by_key(|t| t.id);
        Ok(targets)
    }

    async fn list_targets_by_group(&self, group_id: GroupId) -> Result<Vec<Target>, StoreError> {
        let mut targets: Vec<Target> = self
            .targets
            .iter()
            .filter(|t| t.group_id == Some(group_id))
            .map(|t| t.value().clone())
            .collect();
        targets.sort_by_key(|t| t.id);
        Ok(targets)
    }

    async fn get_target(&self, id: TargetId) -> Result<Option<Target>, StoreError> {
        Ok(self.targets.get(&id).map(|t| t.value().clone()))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        Ok(self.groups())
    }

    async fn append_check_result(
        &self,
        mut result: CheckResult,
    ) -> Result<CheckResult, StoreError> {
        let mut history = self.history.write().await;
        result.id = Some(history.len() as u64 + 1);
        history.push(result.clone());
        Ok(result)
    }

    async fn update_target_snapshot(
        &self,
        id: TargetId,
        status: TargetStatus,
        response_time: Option<u64>,
        checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut target = self
            .targets
            .get_mut(&id)
            .ok_or(StoreError::TargetNotFound(id))?;
        target.status = status;
        target.response_time = response_time;
        target.last_checked = Some(checked_at);
        Ok(())
    }

    async fn recent_results(
        &self,
        id: TargetId,
        limit: usize,
    ) -> Result<Vec<CheckResult>, StoreError> {
        let history = self.history.read().await;
        Ok(history
            .iter()
            .rev()
            .filter(|r| r.target_id == id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn availability(&self, id: TargetId) -> Result<Availability, StoreError> {
        let history = self.history.read().await;
        Ok(Availability::from_results(
            history.iter().filter(|r| r.target_id == id),
        ))
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.settings.get(key).map(|v| v.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(target_id: TargetId, status: TargetStatus) -> CheckResult {
        CheckResult {
            id: None,
            target_id,
            status,
            response_time: Some(10),
            error_message: None,
            checked_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn lists_targets_by_group_in_id_order() {
        let store = MemoryStore::new();
        store.insert_target(Target::new(3, "c", "https://c.example").with_group(1));
        store.insert_target(Target::new(1, "a", "https://a.example").with_group(1));
        store.insert_target(Target::new(2, "b", "https://b.example"));

        let all = store.list_targets().await.unwrap();
        assert_eq!(all.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let grouped = store.list_targets_by_group(1).await.unwrap();
        assert_eq!(grouped.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(store.list_targets_by_group(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.append_check_result(result(1, TargetStatus::Up)).await.unwrap();
        let b = store.append_check_result(result(1, TargetStatus::Down)).await.unwrap();
        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert_eq!(store.history_len().await, 2);
    }

    #[tokio::test]
    async fn recent_results_are_newest_first_and_limited() {
        let store = MemoryStore::new();
        store.append_check_result(result(1, TargetStatus::Up)).await.unwrap();
        store.append_check_result(result(2, TargetStatus::Up)).await.unwrap();
        store.append_check_result(result(1, TargetStatus::Down)).await.unwrap();

        let recent = store.recent_results(1, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].status, TargetStatus::Down);
        assert_eq!(store.recent_results(1, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_appends_keep_ids_in_history_order() {
        let store = MemoryStore::new();
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let store = store.clone();
            tasks.spawn(async move {
                store
                    .append_check_result(result(i % 4, TargetStatus::Up))
                    .await
                    .unwrap()
            });
        }
        while tasks.join_next().await.is_some() {}

        let history = store.history.read().await;
        let ids: Vec<u64> = history.iter().filter_map(|r| r.id).collect();
        assert_eq!(ids, (1..=32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn availability_counts_only_the_target() {
        let store = MemoryStore::new();
        store.append_check_result(result(1, TargetStatus::Up)).await.unwrap();
        store.append_check_result(result(2, TargetStatus::Down)).await.unwrap();
        store.append_check_result(result(1, TargetStatus::Down)).await.unwrap();
        store.append_check_result(result(1, TargetStatus::Up)).await.unwrap();

        let a = store.availability(1).await.unwrap();
        assert_eq!(a.total_checks, 3);
        assert_eq!(a.up_checks, 2);
        assert_eq!(a.uptime_percentage, 67);
        assert_eq!(store.availability(3).await.unwrap(), Availability::default());
    }

    #[tokio::test]
    async fn snapshot_update_on_missing_target_fails() {
        let store = MemoryStore::new();
        let err = store
            .update_target_snapshot(9, TargetStatus::Up, Some(1), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::TargetNotFound(9));
    }

    #[tokio::test]
    async fn settings_lookup_reflects_latest_value() {
        let store = MemoryStore::new();
        assert_eq!(store.get_setting("telegram_chat_id").await.unwrap(), None);
        store.set_setting("telegram_chat_id", "123");
        assert_eq!(
            store.get_setting("telegram_chat_id").await.unwrap().as_deref(),
            Some("123")
        );
        store.set_setting("telegram_chat_id", "456");
        assert_eq!(
            store.get_setting("telegram_chat_id").await.unwrap().as_deref(),
            Some("456")
        );
    }
}
