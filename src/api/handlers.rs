//! Shared server state, error mapping and the health check

use crate::auth::google::GoogleOAuthClient;
use crate::auth::session::should_set_secure;
use crate::projects::{BoardError, ProjectBoard, ProjectLoader, RetryPolicy};
use crate::slack::{NotifyError, Notifier};
use crate::store::{ProjectStore, StoreError};
use crate::timesheet::{Timesheet, TimesheetError};
use crate::{AuthConfig, Config};
use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared server state
pub struct ServerState {
    pub config: Config,
    /// None: sample-data mode
    pub store: Option<Arc<dyn ProjectStore>>,
    /// Fetch protocol behind the project board
    pub loader: ProjectLoader,
    /// Held across fetch and install so loads never overwrite each other
    board_load: Mutex<()>,
    pub board: ProjectBoard,
    pub timesheet: Timesheet,
    /// None when no Slack bot token is configured
    pub notifier: Option<Arc<dyn Notifier>>,
    /// None means the route guard is open
    pub auth_config: Option<AuthConfig>,
    pub oauth: Option<GoogleOAuthClient>,
}

/// Handle shared by every handler
pub type AppState = Arc<ServerState>;

impl ServerState {
    /// Connect the configured backends and build empty board/timesheet state.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = crate::connect_store(&config)?;
        let notifier = crate::connect_notifier(&config)?;

        match store {
            Some(_) => tracing::info!("Project store configured"),
            None => tracing::warn!("SUPABASE_URL / SUPABASE_ANON_KEY not set, serving sample data"),
        }
        if notifier.is_none() {
            tracing::warn!("SLACK_BOT_TOKEN not set, Slack notifications disabled");
        }
        if config.auth_config.is_none() {
            tracing::warn!("No auth configuration, all routes are open");
        }

        Ok(Self::new(config, store, notifier))
    }

    pub fn new(
        config: Config,
        store: Option<Arc<dyn ProjectStore>>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let loader = ProjectLoader::new(store.clone(), RetryPolicy::default());

        let auth_config = config.auth_config.clone();
        let oauth = auth_config.as_ref().map(GoogleOAuthClient::new);

        Self {
            board: ProjectBoard::new(store.clone()),
            timesheet: Timesheet::new(store.clone()),
            config,
            store,
            loader,
            board_load: Mutex::new(()),
            notifier,
            auth_config,
            oauth,
        }
    }

    /// Run the fetch protocol once, on first use of the board.
    pub async fn ensure_board_loaded(&self) {
        if self.board.is_loaded().await {
            return;
        }
        let _guard = self.board_load.lock().await;
        if !self.board.is_loaded().await {
            let outcome = self.loader.fetch_projects().await;
            self.board.install(outcome).await;
        }
    }

    /// Re-run the fetch protocol, replace the board and re-derive the timesheet.
    pub async fn reload_board(&self) {
        {
            let _guard = self.board_load.lock().await;
            let outcome = self.loader.fetch_projects().await;
            tracing::info!(
                source = ?outcome.source,
                attempts = outcome.attempts,
                count = outcome.projects.len(),
                "Projects refreshed"
            );
            self.board.install(outcome).await;
        }
        self.timesheet.sync(&self.board).await;
    }

    /// Derive the grid from the board on first use of the timesheet.
    pub async fn ensure_timesheet_loaded(&self) {
        self.ensure_board_loaded().await;
        if self.timesheet.source().await.is_none() {
            self.timesheet.sync(&self.board).await;
        }
    }

    pub fn cookie_secure(&self) -> bool {
        should_set_secure(self.config.public_url.as_deref())
    }
}

// ============================================================================
// Health check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// "connected", "disconnected" or "not_configured"
    pub store: String,
}

/// Health check handler.
///
/// Always 200: an unreachable store degrades to sample data rather than
/// failing requests, so it is reported as `"degraded"`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = match state.store.as_ref() {
        None => "not_configured",
        Some(store) => match tokio::time::timeout(HEALTH_PROBE_TIMEOUT, store.probe()).await {
            Ok(Ok(_)) | Ok(Err(StoreError::SchemaMissing(_))) => "connected",
            Ok(Err(e)) => {
                tracing::debug!("Health probe failed: {}", e);
                "disconnected"
            }
            Err(_) => "disconnected",
        },
    };

    Json(HealthResponse {
        status: if store == "disconnected" { "degraded" } else { "ok" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store.to_string(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    /// Upstream (Slack) call failed; reported as `{ok: false, error}`
    Upstream(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": e.to_string() }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, serde_json::json!({ "error": msg }))
            }
            AppError::Upstream(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "ok": false, "error": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        match err {
            BoardError::NotFound(_) => AppError::NotFound(err.to_string()),
            BoardError::CategoryRequired(_) | BoardError::UnknownActivity(_) => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<TimesheetError> for AppError {
    fn from(err: TimesheetError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<NotifyError> for AppError {
    fn from(err: NotifyError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::MockProjectStore;
    use crate::test_helpers::{body_json, test_config, test_state, test_state_with};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn get_health(state: AppState) -> serde_json::Value {
        let app = Router::new().route("/health", get(health)).with_state(state);
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await
    }

    #[tokio::test]
    async fn test_health_without_store() {
        let body = get_health(test_state(None).await).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "not_configured");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_health_with_unreachable_store() {
        let store = Arc::new(MockProjectStore::new());
        store
            .fail_probe(StoreError::Transport("connection refused".into()), 1)
            .await;
        let body = get_health(test_state_with(Some(store), None, None).await).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["store"], "disconnected");
    }

    #[tokio::test]
    async fn test_health_with_missing_table_is_connected() {
        let store = Arc::new(MockProjectStore::new());
        store
            .fail_probe(StoreError::SchemaMissing("relation does not exist".into()), 1)
            .await;
        let body = get_health(test_state_with(Some(store), None, None).await).await;
        assert_eq!(body["store"], "connected");
    }

    #[test]
    fn test_board_errors_map_to_status() {
        let resp = AppError::from(BoardError::NotFound("X-1".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::from(BoardError::CategoryRequired("X-1".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timesheet_error_is_bad_request() {
        let resp = AppError::from(TimesheetError::EffortOutOfRange(120.0)).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_notify_error_body() {
        let resp = AppError::from(NotifyError::Lookup("users_not_found".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "Slack user lookup failed: users_not_found");
    }

    #[test]
    fn test_from_config_sample_mode() {
        let state = ServerState::from_config(test_config()).unwrap();
        assert!(state.store.is_none());
        assert!(state.notifier.is_none());
        assert!(state.oauth.is_none());
        assert!(!state.loader.is_configured());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_load_once() {
        let store = Arc::new(MockProjectStore::with_projects(
            crate::store::fixtures::sample_projects(),
        ));
        store.delay_probe(Duration::from_millis(20)).await;
        let state = test_state_with(Some(store.clone()), None, None).await;

        let loads: Vec<_> = (0..4)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move { state.ensure_board_loaded().await })
            })
            .collect();
        for load in loads {
            load.await.unwrap();
        }

        assert_eq!(store.probe_calls(), 1);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_first_load_does_not_clobber_later_edits() {
        let state = test_state(None).await;
        state.ensure_board_loaded().await;
        state
            .board
            .set_category("SPARK-001", Some(crate::projects::CapexCategory::Capex))
            .await
            .unwrap();

        state.ensure_board_loaded().await;
        let project = state.board.get("SPARK-001").await.unwrap();
        assert_eq!(
            project.capex_category,
            Some(crate::projects::CapexCategory::Capex)
        );
    }
}
