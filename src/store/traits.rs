//! Trait abstraction for project store operations

use super::error::StoreError;
use super::rows::{EffortRecord, ProjectPatch, ProjectRow};
use async_trait::async_trait;

/// Trait abstracting every call the service makes against the project store.
///
/// `RestStore` talks to a PostgREST endpoint; tests use the in-memory
/// `MockProjectStore`.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Cheap existence check on the `projects` table. Returns the row count
    /// when the store reports one.
    async fn probe(&self) -> Result<Option<u64>, StoreError>;

    /// All projects, newest first.
    async fn list_projects(&self) -> Result<Vec<ProjectRow>, StoreError>;

    /// At most `limit` projects, used by connectivity diagnostics.
    async fn sample_projects(&self, limit: usize) -> Result<Vec<ProjectRow>, StoreError>;

    /// Apply a partial update to the project with the given id.
    async fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<(), StoreError>;

    /// Insert or replace projects keyed by id. Returns the number of rows written.
    async fn upsert_projects(&self, rows: &[ProjectRow]) -> Result<usize, StoreError>;

    /// Insert or replace monthly efforts keyed by
    /// (project_id, contributor_name, month_year).
    async fn upsert_efforts(&self, records: &[EffortRecord]) -> Result<(), StoreError>;

    /// Run raw SQL through the `exec_sql` RPC, when the database exposes it.
    async fn execute_sql(&self, sql: &str) -> Result<(), StoreError>;
}
