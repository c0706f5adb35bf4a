//! Timesheet API handlers

use crate::auth::extractor::MaybeUser;
use crate::projects::DataSource;
use crate::slack::messages::{timesheet_submission_message, ChatMessage};
use crate::slack::{notify_in_background, Notification};
use crate::timesheet::export::to_csv;
use crate::timesheet::{MonthKey, SaveOutcome, TimesheetRow, ANONYMOUS_SUBMITTER};
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::handlers::{AppError, AppState};

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetResponse {
    pub month: MonthKey,
    pub rows: Vec<TimesheetRow>,
    pub total_effort: f64,
    pub source: DataSource,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEffortRequest {
    pub row: usize,
    pub contributor: usize,
    pub effort: f64,
}

#[derive(Debug, Deserialize)]
pub struct SaveTimesheetRequest {
    /// Defaults to the current month
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub month: Option<String>,
}

/// Body of `POST /api/timesheet`, as sent by the submit button
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTimesheetRequest {
    pub month: String,
    #[serde(default)]
    pub projects: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_hours: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTimesheetResponse {
    pub success: bool,
    pub message: String,
    pub slack_notification: ChatMessage,
}

fn month_or_current(raw: Option<&str>) -> Result<MonthKey, AppError> {
    match raw {
        Some(raw) => Ok(MonthKey::parse(raw)?),
        None => Ok(MonthKey::current()),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// The effort grid for capitalised projects
pub async fn get_timesheet(State(state): State<AppState>) -> Json<TimesheetResponse> {
    state.ensure_timesheet_loaded().await;
    Json(TimesheetResponse {
        month: MonthKey::current(),
        rows: state.timesheet.rows().await,
        total_effort: state.timesheet.total_effort().await,
        source: state.timesheet.source().await.unwrap_or_default(),
    })
}

/// Set one effort cell (0-100)
pub async fn update_effort(
    State(state): State<AppState>,
    Json(req): Json<UpdateEffortRequest>,
) -> Result<Json<TimesheetRow>, AppError> {
    state.ensure_timesheet_loaded().await;
    let row = state
        .timesheet
        .update_effort(req.row, req.contributor, req.effort)
        .await?;
    Ok(Json(row))
}

/// Persist non-zero effort for the month; the outcome message is shown to the user as-is
pub async fn save_timesheet(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<SaveTimesheetRequest>,
) -> Result<Json<SaveOutcome>, AppError> {
    let month = month_or_current(req.month.as_deref())?;
    state.ensure_timesheet_loaded().await;

    let submitted_by = user
        .as_ref()
        .map(|u| u.name.as_str())
        .unwrap_or(ANONYMOUS_SUBMITTER);
    Ok(Json(state.timesheet.save(&month, submitted_by).await))
}

/// Download the grid as CSV
pub async fn export_timesheet(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let month = month_or_current(query.month.as_deref())?;
    state.ensure_timesheet_loaded().await;

    let csv = to_csv(&state.timesheet.rows().await, &month);
    let disposition = format!("attachment; filename=\"capex-timesheet-{}.csv\"", month);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Acknowledge a submission and echo the finance notification; it is also
/// posted when Slack is configured.
pub async fn submit_timesheet(
    State(state): State<AppState>,
    Json(req): Json<SubmitTimesheetRequest>,
) -> Json<SubmitTimesheetResponse> {
    tracing::info!(
        month = %req.month,
        projects = req.projects.len(),
        total_hours = req.total_hours,
        "Timesheet submitted"
    );

    let message = timesheet_submission_message(
        &state.config.slack_finance_channel,
        &req.month,
        req.projects.len(),
        req.total_hours,
    );
    if let Some(notifier) = state.notifier.as_ref() {
        notify_in_background(notifier.clone(), Notification::Post(message.clone()));
    }

    Json(SubmitTimesheetResponse {
        success: true,
        message: "Timesheet submitted successfully".to_string(),
        slack_notification: message,
    })
}

// ============================================================================
// Tests
// ============================================================================
