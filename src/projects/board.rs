//! In-memory classification state for the project list.
//!
//! Mutations apply locally even when the store write fails: the store is
//! written best-effort and failures are only logged.

use super::loader::{DataSource, FetchOutcome};
use super::models::{ActivityType, CapexCategory, Project};
use crate::store::{ProjectPatch, ProjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Project {0} has no category; activities cannot be saved")]
    CategoryRequired(String),
    #[error("Unknown activity: {0}")]
    UnknownActivity(String),
}

/// Category filter offered by the dashboard
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    #[serde(rename = "CAPEX")]
    Capex,
    #[serde(rename = "CAPEX R&D")]
    CapexRnd,
    #[serde(rename = "OPEX")]
    Opex,
}

impl CategoryFilter {
    pub fn matches(&self, project: &Project) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Capex => project.capex_category == Some(CapexCategory::Capex),
            CategoryFilter::CapexRnd => project.capex_category == Some(CapexCategory::CapexRnd),
            CategoryFilter::Opex => project.capex_category == Some(CapexCategory::Opex),
        }
    }
}

/// Dashboard counters
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BoardStats {
    pub total: usize,
    pub capex: usize,
    pub capex_rd: usize,
    pub opex: usize,
    pub open: usize,
}

pub fn compute_stats(projects: &[Project]) -> BoardStats {
    let count = |c: CapexCategory| {
        projects
            .iter()
            .filter(|p| p.capex_category == Some(c))
            .count()
    };
    BoardStats {
        total: projects.len(),
        capex: count(CapexCategory::Capex),
        capex_rd: count(CapexCategory::CapexRnd),
        opex: count(CapexCategory::Opex),
        open: projects.iter().filter(|p| p.status.is_open()).count(),
    }
}

/// Uncategorised projects first; relative order is otherwise kept.
pub fn sort_uncategorised_first(projects: &mut [Project]) {
    projects.sort_by_key(|p| p.capex_category.is_some());
}

fn validate_activity(id: &str) -> Result<(), BoardError> {
    ActivityType::from_id(id)
        .map(|_| ())
        .ok_or_else(|| BoardError::UnknownActivity(id.to_string()))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardSnapshot {
    pub projects: Vec<Project>,
    pub source: DataSource,
    pub error: Option<String>,
    pub loaded: bool,
}

/// Shared, mutable project list
pub struct ProjectBoard {
    state: RwLock<BoardSnapshot>,
    store: Option<Arc<dyn ProjectStore>>,
}

impl ProjectBoard {
    pub fn new(store: Option<Arc<dyn ProjectStore>>) -> Self {
        Self {
            state: RwLock::new(BoardSnapshot::default()),
            store,
        }
    }

    /// Replace the list with a fresh fetch.
    pub async fn install(&self, outcome: FetchOutcome) {
        let mut state = self.state.write().await;
        state.projects = outcome.projects;
        state.source = outcome.source;
        state.error = outcome.error;
        state.loaded = true;
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.loaded
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.state.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Project> {
        self.state
            .read()
            .await
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.projects.clone()
    }

    /// Projects matching `filter`, uncategorised first.
    pub async fn filtered(&self, filter: CategoryFilter) -> Vec<Project> {
        let mut projects: Vec<Project> = self
            .state
            .read()
            .await
            .projects
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        sort_uncategorised_first(&mut projects);
        projects
    }

    pub async fn stats(&self) -> BoardStats {
        compute_stats(&self.state.read().await.projects)
    }

    async fn ensure_exists(&self, id: &str) -> Result<(), BoardError> {
        if self.state.read().await.projects.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(BoardError::NotFound(id.to_string()))
        }
    }

    /// Mutate one project under the write lock; a rejected mutation leaves it untouched.
    async fn apply<F>(&self, id: &str, mutate: F) -> Result<Project, BoardError>
    where
        F: FnOnce(&mut Project) -> Result<(), BoardError>,
    {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))?;
        mutate(project)?;
        project.updated_at = Some(chrono::Utc::now());
        Ok(project.clone())
    }

    async fn write_through(&self, id: &str, patch: ProjectPatch) {
        let Some(store) = self.store.as_ref() else {
            debug!(project = %id, "Store not configured, local update only");
            return;
        };
        if let Err(e) = store.update_project(id, &patch).await {
            warn!(project = %id, "Store update failed, keeping local state: {}", e);
        }
    }

    /// Set or clear a project's category.
    ///
    /// Clearing the category also marks the activity selection as a draft.
    pub async fn set_category(
        &self,
        id: &str,
        category: Option<CapexCategory>,
    ) -> Result<Project, BoardError> {
        self.ensure_exists(id).await?;

        let mut patch = ProjectPatch::category(category.map(|c| c.as_str().to_string()));
        if category.is_none() {
            patch.activities_saved = Some(false);
        }
        self.write_through(id, patch).await;

        self.apply(id, |p| {
            p.capex_category = category;
            if category.is_none() {
                p.activities_saved = false;
            }
            Ok(())
        })
        .await
    }

    /// Replace a project's activity selection.
    ///
    /// The store is only written for committed (`saved`) selections.
    pub async fn set_activities(
        &self,
        id: &str,
        activities: Vec<String>,
        saved: bool,
    ) -> Result<Project, BoardError> {
        let mut selection: Vec<String> = Vec::with_capacity(activities.len());
        for activity in activities {
            validate_activity(&activity)?;
            if !selection.contains(&activity) {
                selection.push(activity);
            }
        }

        let updated = self
            .apply(id, |p| {
                if saved && p.capex_category.is_none() {
                    return Err(BoardError::CategoryRequired(id.to_string()));
                }
                p.activities = selection.clone();
                p.activities_saved = saved;
                Ok(())
            })
            .await?;

        if saved {
            self.write_through(id, ProjectPatch::activities(selection, true))
                .await;
        }
        Ok(updated)
    }

    /// Add or remove one activity, leaving the selection as a draft.
    pub async fn toggle_activity(&self, id: &str, activity: &str) -> Result<Project, BoardError> {
        validate_activity(activity)?;
        self.apply(id, |p| {
            if let Some(pos) = p.activities.iter().position(|a| a == activity) {
                p.activities.remove(pos);
            } else {
                p.activities.push(activity.to_string());
            }
            p.activities_saved = false;
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
