//! In-memory mock implementation of ProjectStore for testing without a live store.

use super::error::StoreError;
use super::rows::{EffortRecord, ProjectPatch, ProjectRow};
use super::traits::ProjectStore;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory mock implementation of ProjectStore.
///
/// Rows live in `Vec`s behind async `RwLock`s. Failures can be scripted per
/// operation, and every call is counted so tests can assert on the exact
/// traffic a component produced.
#[derive(Default)]
pub struct MockProjectStore {
    projects: RwLock<Vec<ProjectRow>>,
    efforts: RwLock<Vec<EffortRecord>>,
    patches: RwLock<Vec<(String, ProjectPatch)>>,
    executed_sql: RwLock<Vec<String>>,

    /// Consumed one per probe call, front first
    probe_failures: RwLock<VecDeque<StoreError>>,
    list_failure: RwLock<Option<StoreError>>,
    write_failure: RwLock<Option<StoreError>>,
    probe_delay: RwLock<Option<Duration>>,

    probe_calls: AtomicUsize,
    list_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

impl MockProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(rows: Vec<ProjectRow>) -> Self {
        Self {
            projects: RwLock::new(rows),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    /// The next `times` probes fail with `err`.
    pub async fn fail_probe(&self, err: StoreError, times: usize) {
        let mut queue = self.probe_failures.write().await;
        for _ in 0..times {
            queue.push_back(err.clone());
        }
    }

    pub async fn fail_list(&self, err: StoreError) {
        *self.list_failure.write().await = Some(err);
    }

    pub async fn fail_writes(&self, err: StoreError) {
        *self.write_failure.write().await = Some(err);
    }

    pub async fn delay_probe(&self, delay: Duration) {
        *self.probe_delay.write().await = Some(delay);
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of write attempts (updates, upserts), failed ones included
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub async fn projects(&self) -> Vec<ProjectRow> {
        self.projects.read().await.clone()
    }

    pub async fn efforts(&self) -> Vec<EffortRecord> {
        self.efforts.read().await.clone()
    }

    pub async fn patches(&self) -> Vec<(String, ProjectPatch)> {
        self.patches.read().await.clone()
    }

    pub async fn executed_sql(&self) -> Vec<String> {
        self.executed_sql.read().await.clone()
    }

    async fn check_write(&self) -> Result<(), StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        match self.write_failure.read().await.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProjectStore for MockProjectStore {
    async fn probe(&self) -> Result<Option<u64>, StoreError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.probe_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.probe_failures.write().await.pop_front() {
            return Err(err);
        }
        Ok(Some(self.projects.read().await.len() as u64))
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRow>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_failure.read().await.as_ref() {
            return Err(err.clone());
        }
        let mut rows = self.projects.read().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn sample_projects(&self, limit: usize) -> Result<Vec<ProjectRow>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_failure.read().await.as_ref() {
            return Err(err.clone());
        }
        Ok(self.projects.read().await.iter().take(limit).cloned().collect())
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<(), StoreError> {
        self.check_write().await?;
        self.patches
            .write()
            .await
            .push((id.to_string(), patch.clone()));

        let mut rows = self.projects.write().await;
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            if let Some(category) = &patch.capex_category {
                row.capex_category = category.clone();
            }
            if let Some(activities) = &patch.activities {
                row.activities = Some(activities.clone());
            }
            if let Some(saved) = patch.activities_saved {
                row.activities_saved = Some(saved);
            }
            if patch.updated_at.is_some() {
                row.updated_at = patch.updated_at;
            }
        }
        Ok(())
    }

    async fn upsert_projects(&self, rows: &[ProjectRow]) -> Result<usize, StoreError> {
        self.check_write().await?;
        let mut stored = self.projects.write().await;
        for row in rows {
            match stored.iter_mut().find(|r| r.id == row.id) {
                Some(existing) => *existing = row.clone(),
                None => stored.push(row.clone()),
            }
        }
        Ok(rows.len())
    }

    async fn upsert_efforts(&self, records: &[EffortRecord]) -> Result<(), StoreError> {
        self.check_write().await?;
        let mut stored = self.efforts.write().await;
        for record in records {
            let existing = stored.iter_mut().find(|r| {
                r.project_id == record.project_id
                    && r.contributor_name == record.contributor_name
                    && r.month_year == record.month_year
            });
            match existing {
                Some(e) => *e = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(())
    }

    async fn execute_sql(&self, sql: &str) -> Result<(), StoreError> {
        self.check_write().await?;
        self.executed_sql.write().await.push(sql.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effort(contributor: &str, hours: f64) -> EffortRecord {
        EffortRecord {
            project_id: "BQ-002".into(),
            contributor_name: contributor.into(),
            month_year: "2025-07".into(),
            hours_spent: hours,
            submitted_by: "tester".into(),
        }
    }

    #[tokio::test]
    async fn test_upsert_efforts_replaces_on_composite_key() {
        let store = MockProjectStore::new();
        store.upsert_efforts(&[effort("A", 10.0)]).await.unwrap();
        store
            .upsert_efforts(&[effort("A", 25.0), effort("B", 5.0)])
            .await
            .unwrap();

        let efforts = store.efforts().await;
        assert_eq!(efforts.len(), 2);
        assert_eq!(efforts[0].hours_spent, 25.0);
        assert_eq!(store.write_calls(), 2);
    }

    #[tokio::test]
    async fn test_scripted_probe_failures_are_consumed_in_order() {
        let store = MockProjectStore::new();
        store.fail_probe(StoreError::Timeout, 2).await;

        assert!(store.probe().await.is_err());
        assert!(store.probe().await.is_err());
        assert_eq!(store.probe().await.unwrap(), Some(0));
        assert_eq!(store.probe_calls(), 3);
    }
}
