//! Effort grid derived from capitalised projects, and its persistence.

use super::models::{
    ContributorEffort, MonthKey, SaveOutcome, TimesheetError, TimesheetRow, DEFAULT_SUMMARY,
    MAX_EFFORT,
};
use crate::projects::{DataSource, Project, ProjectBoard};
use crate::store::{EffortRecord, ProjectStore, StoreError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Fallback submitter when no session user is known
pub const ANONYMOUS_SUBMITTER: &str = "current_user";

/// One zero-effort cell per distinct name; effort rows are keyed by
/// (project, contributor, month), so a repeated name would collide on save.
fn unique_contributors(names: &[String]) -> Vec<ContributorEffort> {
    let mut cells: Vec<ContributorEffort> = Vec::with_capacity(names.len());
    for name in names {
        if !cells.iter().any(|c| &c.name == name) {
            cells.push(ContributorEffort {
                name: name.clone(),
                effort: 0.0,
            });
        }
    }
    cells
}

/// Keep CAPEX / CAPEX R&D projects; every contributor starts at zero effort.
pub fn derive_timesheet(projects: &[Project]) -> Vec<TimesheetRow> {
    projects
        .iter()
        .filter_map(|p| {
            let category = p.capex_category.filter(|c| c.is_capitalised())?;
            Some(TimesheetRow {
                project_id: p.id.clone(),
                project_name: p.name.clone(),
                summary: p
                    .summary
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
                status: p.status.clone(),
                category,
                contributors: unique_contributors(&p.contributor_list),
            })
        })
        .collect()
}

/// One record per contributor with non-zero effort.
pub fn effort_records(
    rows: &[TimesheetRow],
    month: &MonthKey,
    submitted_by: &str,
) -> Vec<EffortRecord> {
    rows.iter()
        .flat_map(|row| {
            row.contributors
                .iter()
                .filter(|c| c.effort > 0.0)
                .map(move |c| EffortRecord {
                    project_id: row.project_id.clone(),
                    contributor_name: c.name.clone(),
                    month_year: month.as_str().to_string(),
                    hours_spent: c.effort,
                    submitted_by: submitted_by.to_string(),
                })
        })
        .collect()
}

/// Mutable effort grid shared by the timesheet endpoints
pub struct Timesheet {
    rows: RwLock<Vec<TimesheetRow>>,
    /// Source of the last installed project list; `None` until first load
    source: RwLock<Option<DataSource>>,
    store: Option<Arc<dyn ProjectStore>>,
}

impl Timesheet {
    pub fn new(store: Option<Arc<dyn ProjectStore>>) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            source: RwLock::new(None),
            store,
        }
    }

    /// Re-derive the grid from the board's current projects.
    ///
    /// Effort already entered is kept for every (project, contributor) cell
    /// that is still on the grid. The board is read while the grid is locked,
    /// so concurrent syncs apply in board order.
    pub async fn sync(&self, board: &ProjectBoard) {
        let mut rows = self.rows.write().await;
        let snapshot = board.snapshot().await;

        let mut fresh = derive_timesheet(&snapshot.projects);
        for row in &mut fresh {
            let Some(previous) = rows.iter().find(|r| r.project_id == row.project_id) else {
                continue;
            };
            for cell in &mut row.contributors {
                if let Some(old) = previous.contributors.iter().find(|c| c.name == cell.name) {
                    cell.effort = old.effort;
                }
            }
        }

        debug!(rows = fresh.len(), "Timesheet synced with board");
        *rows = fresh;
        *self.source.write().await = Some(snapshot.source);
    }

    pub async fn source(&self) -> Option<DataSource> {
        *self.source.read().await
    }

    pub async fn rows(&self) -> Vec<TimesheetRow> {
        self.rows.read().await.clone()
    }

    pub async fn total_effort(&self) -> f64 {
        self.rows
            .read()
            .await
            .iter()
            .flat_map(|r| r.contributors.iter())
            .map(|c| c.effort)
            .sum()
    }

    /// Set one cell of the grid.
    pub async fn update_effort(
        &self,
        row: usize,
        contributor: usize,
        effort: f64,
    ) -> Result<TimesheetRow, TimesheetError> {
        if !(0.0..=MAX_EFFORT).contains(&effort) {
            return Err(TimesheetError::EffortOutOfRange(effort));
        }

        let mut rows = self.rows.write().await;
        let target = rows
            .get_mut(row)
            .ok_or(TimesheetError::RowOutOfRange(row))?;
        let cell = target
            .contributors
            .get_mut(contributor)
            .ok_or(TimesheetError::ContributorOutOfRange { row, contributor })?;
        cell.effort = effort;
        Ok(target.clone())
    }

    /// Persist non-zero effort for `month`.
    ///
    /// Missing tables and unreachable stores are reported as successful saves
    /// with `persisted == false`; any other store error is a failed save.
    pub async fn save(&self, month: &MonthKey, submitted_by: &str) -> SaveOutcome {
        let Some(store) = self.store.as_ref() else {
            info!(month = %month, "Store not configured, timesheet save is a no-op");
            return SaveOutcome::new(true, false, "Timesheet saved successfully (demo mode)");
        };

        let records = effort_records(&self.rows.read().await, month, submitted_by);
        if records.is_empty() {
            return SaveOutcome::new(true, false, "No effort data to save");
        }

        info!(month = %month, records = records.len(), "Saving timesheet");
        match store.upsert_efforts(&records).await {
            Ok(()) => SaveOutcome::new(true, true, "Timesheet saved successfully")
                .with_records(records),
            Err(StoreError::SchemaMissing(msg)) => {
                warn!("monthly_efforts table missing, effort not persisted: {}", msg);
                SaveOutcome::new(true, false, "Timesheet saved successfully (table not set up yet)")
                    .with_records(records)
            }
            Err(err) if err.is_connectivity() => {
                warn!("Store unreachable, effort kept locally: {}", err);
                SaveOutcome::new(true, false, "Timesheet saved locally (network issue)")
                    .with_records(records)
            }
            Err(err) => {
                warn!("Timesheet save failed: {}", err);
                SaveOutcome::new(false, false, format!("Failed to save timesheet: {}", err))
                    .with_records(records)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
