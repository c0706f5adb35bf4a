//! Project board API handlers

use crate::auth::extractor::MaybeUser;
use crate::projects::board::BoardStats;
use crate::projects::models::{activity_catalog, ActivityDescriptor};
use crate::projects::{CapexCategory, CategoryFilter, DataSource, Project};
use crate::slack::messages::{classification_message, classification_text};
use crate::slack::{notify_in_background, ChannelMessageRequest, Notification};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::handlers::{AppError, AppState};

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    #[serde(default)]
    pub filter: CategoryFilter,
}

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
    pub source: DataSource,
    pub error: Option<String>,
    pub stats: BoardStats,
    /// Capitalised projects still waiting for a saved activity selection
    pub needs_activities: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub project_id: String,
    /// `null` or `""` clears the category
    pub capex_category: Option<String>,
}

#[derive(Serialize)]
pub struct ProjectUpdateResponse {
    pub success: bool,
    pub project: Project,
    /// Whether a finance notification was queued
    pub notified: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetActivitiesRequest {
    pub activities: Vec<String>,
    #[serde(default)]
    pub saved: bool,
}

#[derive(Debug, Deserialize)]
pub struct ToggleActivityRequest {
    pub activity: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_response(state: &AppState, filter: CategoryFilter) -> ProjectListResponse {
    let snapshot = state.board.snapshot().await;
    let needs_activities = snapshot
        .projects
        .iter()
        .filter(|p| p.needs_activities())
        .count();
    ProjectListResponse {
        projects: state.board.filtered(filter).await,
        source: snapshot.source,
        error: snapshot.error,
        stats: state.board.stats().await,
        needs_activities,
    }
}

/// List projects, uncategorised first, optionally filtered by category
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> Json<ProjectListResponse> {
    state.ensure_board_loaded().await;
    Json(list_response(&state, query.filter).await)
}

/// Re-run the fetch protocol, replacing the board and re-deriving the timesheet
pub async fn refresh_projects(State(state): State<AppState>) -> Json<ProjectListResponse> {
    state.reload_board().await;
    Json(list_response(&state, CategoryFilter::All).await)
}

/// Set or clear a project's category.
///
/// Moving a project into CAPEX or CAPEX R&D notifies the finance channel in
/// the background.
pub async fn update_category(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<ProjectUpdateResponse>, AppError> {
    let category = match req.capex_category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            CapexCategory::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown category: {}", raw)))?,
        ),
    };

    state.ensure_board_loaded().await;
    let project = state.board.set_category(&req.project_id, category).await?;
    state.timesheet.sync(&state.board).await;

    let mut notified = false;
    if let Some(category) = category.filter(|c| c.is_capitalised()) {
        match state.notifier.as_ref() {
            Some(notifier) => {
                let channel = &state.config.slack_finance_channel;
                let notification = match &user {
                    Some(user) => Notification::Channel(ChannelMessageRequest {
                        channel: channel.clone(),
                        email: user.email.clone(),
                        message: classification_text(&project.name, &project.id, category.as_str()),
                        title: project.name.clone(),
                        link: project.jira_url.clone().unwrap_or_default(),
                    }),
                    None => Notification::Post(classification_message(
                        channel,
                        &project.name,
                        &project.id,
                        category.as_str(),
                        project.jira_url.as_deref(),
                    )),
                };
                tracing::info!(project = %project.id, category = %category, "Notifying finance");
                notify_in_background(notifier.clone(), notification);
                notified = true;
            }
            None => tracing::info!(
                project = %project.id,
                category = %category,
                "Slack not configured, skipping finance notification"
            ),
        }
    }

    Ok(Json(ProjectUpdateResponse {
        success: true,
        project,
        notified,
    }))
}

/// Replace a project's activity selection (draft or saved)
pub async fn set_activities(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetActivitiesRequest>,
) -> Result<Json<Project>, AppError> {
    state.ensure_board_loaded().await;
    let project = state
        .board
        .set_activities(&id, req.activities, req.saved)
        .await?;
    Ok(Json(project))
}

/// Toggle one activity in the draft selection
pub async fn toggle_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ToggleActivityRequest>,
) -> Result<Json<Project>, AppError> {
    state.ensure_board_loaded().await;
    let project = state.board.toggle_activity(&id, &req.activity).await?;
    Ok(Json(project))
}

/// The fixed activity catalog
pub async fn list_activities() -> Json<Vec<ActivityDescriptor>> {
    Json(activity_catalog())
}

// ============================================================================
// Tests
// ============================================================================
