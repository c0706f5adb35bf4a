//! API route definitions

use super::handlers::{self, AppState};
use super::{
    auth_handlers, diagnostics_handlers, project_handlers, slack_handlers, timesheet_handlers,
};
use crate::auth::middleware::require_session;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router.
///
/// Every route sits behind [`require_session`]; the guard itself lets the
/// public login paths through.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Projects
        // ====================================================================
        .route(
            "/api/projects",
            get(project_handlers::list_projects).put(project_handlers::update_category),
        )
        .route("/api/projects/refresh", post(project_handlers::refresh_projects))
        .route(
            "/api/projects/{id}/activities",
            put(project_handlers::set_activities),
        )
        .route(
            "/api/projects/{id}/activities/toggle",
            post(project_handlers::toggle_activity),
        )
        .route("/api/activities", get(project_handlers::list_activities))
        // ====================================================================
        // Timesheet
        // ====================================================================
        .route(
            "/api/timesheet",
            get(timesheet_handlers::get_timesheet).post(timesheet_handlers::submit_timesheet),
        )
        .route("/api/timesheet/effort", put(timesheet_handlers::update_effort))
        .route("/api/timesheet/save", post(timesheet_handlers::save_timesheet))
        .route("/api/timesheet/export", get(timesheet_handlers::export_timesheet))
        // ====================================================================
        // Slack relay
        // ====================================================================
        .route("/api/slack-message", post(slack_handlers::send_channel_message))
        .route("/api/slack-dm", post(slack_handlers::send_direct_message))
        // Diagnostics
        .route("/api/diagnostics", get(diagnostics_handlers::get_diagnostics))
        // ====================================================================
        // Auth
        // ====================================================================
        .route("/login", get(auth_handlers::login_page))
        .route("/auth/google", get(auth_handlers::google_login))
        .route("/auth/callback", get(auth_handlers::google_callback))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/auth/me", get(auth_handlers::get_me))
        .route("/auth-error", get(auth_handlers::auth_error))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
