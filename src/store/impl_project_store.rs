//! ProjectStore trait implementation for RestStore
//!
//! Each trait method delegates directly to the corresponding inherent method
//! on `RestStore`.

use async_trait::async_trait;

use super::client::RestStore;
use super::error::StoreError;
use super::rows::{EffortRecord, ProjectPatch, ProjectRow};
use super::traits::ProjectStore;

#[async_trait]
impl ProjectStore for RestStore {
    async fn probe(&self) -> Result<Option<u64>, StoreError> {
        self.count_projects().await
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRow>, StoreError> {
        self.fetch_projects().await
    }

    async fn sample_projects(&self, limit: usize) -> Result<Vec<ProjectRow>, StoreError> {
        self.fetch_project_sample(limit).await
    }

    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<(), StoreError> {
        self.patch_project(id, patch).await
    }

    async fn upsert_projects(&self, rows: &[ProjectRow]) -> Result<usize, StoreError> {
        self.upsert_project_rows(rows).await
    }

    async fn upsert_efforts(&self, records: &[EffortRecord]) -> Result<(), StoreError> {
        self.upsert_effort_rows(records).await
    }

    async fn execute_sql(&self, sql: &str) -> Result<(), StoreError> {
        self.exec_sql(sql).await
    }
}
