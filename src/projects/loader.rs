//! Fetch protocol for the project list.
//!
//! 1. No store configured: sample data after a simulated latency
//! 2. Probe the `projects` table under the retry policy
//! 3. Probe exhausted: sample data (degraded, not an error)
//! 4. Query all projects; missing table yields an empty live list
//! 5. Normalize rows into `Project`s

use super::models::Project;
use super::retry::RetryPolicy;
use crate::store::{fixtures, ProjectRow, ProjectStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Where a project list came from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    #[default]
    Mock,
}

/// Result of one fetch
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub projects: Vec<Project>,
    pub source: DataSource,
    /// Only set for unexpected failures; connectivity problems degrade silently
    pub error: Option<String>,
    pub attempts: u32,
    pub pauses: u32,
}

impl FetchOutcome {
    fn mock(rows: Vec<ProjectRow>, attempts: u32, pauses: u32, error: Option<String>) -> Self {
        Self {
            projects: rows.into_iter().map(Project::from_row).collect(),
            source: DataSource::Mock,
            error,
            attempts,
            pauses,
        }
    }
}

/// Message surfaced with sample data. Only an undecodable payload counts;
/// connectivity and query failures degrade silently.
fn reported_error(err: &StoreError) -> Option<String> {
    matches!(err, StoreError::Decode(_)).then(|| err.to_string())
}

/// Loads projects from the store, falling back to sample data
pub struct ProjectLoader {
    store: Option<Arc<dyn ProjectStore>>,
    policy: RetryPolicy,
    demo_latency: Duration,
}

impl ProjectLoader {
    pub fn new(store: Option<Arc<dyn ProjectStore>>, policy: RetryPolicy) -> Self {
        Self {
            store,
            policy,
            demo_latency: Duration::from_secs(1),
        }
    }

    /// Delay applied before returning sample data when no store is configured.
    pub fn with_demo_latency(mut self, latency: Duration) -> Self {
        self.demo_latency = latency;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub async fn fetch_projects(&self) -> FetchOutcome {
        let Some(store) = self.store.as_ref() else {
            info!("Store not configured, serving sample projects");
            tokio::time::sleep(self.demo_latency).await;
            return FetchOutcome::mock(fixtures::sample_projects(), 0, 0, None);
        };

        // Step 1: probe connectivity
        let probe = self.policy.run("probe projects", || store.probe()).await;
        match probe.result {
            Ok(count) => info!(count = ?count, attempts = probe.attempts, "Store reachable"),
            Err(StoreError::SchemaMissing(msg)) => {
                info!("Store reachable but projects table is missing: {}", msg)
            }
            Err(err) => {
                warn!(
                    attempts = probe.attempts,
                    "Could not reach store, serving sample projects: {}", err
                );
                return FetchOutcome::mock(
                    fixtures::sample_projects(),
                    probe.attempts,
                    probe.pauses,
                    reported_error(&err),
                );
            }
        }

        // Step 2: query
        let query = tokio::time::timeout(self.policy.attempt_timeout, store.list_projects()).await;
        let rows = match query {
            Ok(Ok(rows)) => rows,
            Ok(Err(StoreError::SchemaMissing(msg))) => {
                info!("Projects table does not exist yet: {}", msg);
                Vec::new()
            }
            Ok(Err(err)) => {
                warn!("Projects query failed, serving sample projects: {}", err);
                return FetchOutcome::mock(
                    fixtures::sample_projects(),
                    probe.attempts,
                    probe.pauses,
                    reported_error(&err),
                );
            }
            Err(_) => {
                warn!("Projects query timed out, serving sample projects");
                return FetchOutcome::mock(fixtures::sample_projects(), probe.attempts, probe.pauses, None);
            }
        };

        info!(count = rows.len(), "Loaded projects from store");
        FetchOutcome {
            projects: rows.into_iter().map(Project::from_row).collect(),
            source: DataSource::Live,
            error: None,
            attempts: probe.attempts,
            pauses: probe.pauses,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
