//! Store connectivity report

use super::handlers::AppState;
use crate::diagnostics::{self, DiagnosticReport};
use axum::{extract::State, Json};

/// GET /api/diagnostics
pub async fn get_diagnostics(State(state): State<AppState>) -> Json<DiagnosticReport> {
    Json(diagnostics::run(&state.config, state.store.as_deref()).await)
}
