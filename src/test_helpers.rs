//! Shared builders for handler and middleware tests.

use crate::api::handlers::{AppState, ServerState};
use crate::auth::jwt::encode_session;
use crate::projects::{ProjectLoader, RetryPolicy};
use crate::slack::notifier::recording::RecordingNotifier;
use crate::slack::Notifier;
use crate::store::mock::MockProjectStore;
use crate::store::ProjectStore;
use crate::{AuthConfig, Config};
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        google_client_id: "test-client.apps.googleusercontent.com".to_string(),
        google_client_secret: "test-client-secret".to_string(),
        google_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
        session_secret: TEST_SECRET.to_string(),
        session_expiry_secs: 3600,
        allowed_email_domain: None,
    }
}

/// Sample-data mode: no store, no Slack, open guard.
pub fn test_config() -> Config {
    Config {
        server_port: 3000,
        public_url: None,
        store_url: None,
        store_key: None,
        slack_bot_token: None,
        slack_finance_channel: crate::DEFAULT_FINANCE_CHANNEL.to_string(),
        slack_api_url: crate::slack::SLACK_API_URL.to_string(),
        auth_config: None,
    }
}

pub async fn test_state(auth_config: Option<AuthConfig>) -> AppState {
    test_state_with(None, None, auth_config).await
}

/// Server state with zero demo latency and zero retry pauses.
pub async fn test_state_with(
    store: Option<Arc<MockProjectStore>>,
    notifier: Option<Arc<RecordingNotifier>>,
    auth_config: Option<AuthConfig>,
) -> AppState {
    Arc::new(test_server_state(store, notifier, auth_config))
}

/// Unshared variant of [`test_state_with`] for tests that swap a field first.
pub fn test_server_state(
    store: Option<Arc<MockProjectStore>>,
    notifier: Option<Arc<RecordingNotifier>>,
    auth_config: Option<AuthConfig>,
) -> ServerState {
    let mut config = test_config();
    config.auth_config = auth_config;

    let store = store.map(|s| s as Arc<dyn ProjectStore>);
    let notifier = notifier.map(|n| n as Arc<dyn Notifier>);
    let mut state = ServerState::new(config, store.clone(), notifier);

    let policy = RetryPolicy::default().with_delay(Duration::ZERO);
    state.loader = ProjectLoader::new(store, policy).with_demo_latency(Duration::ZERO);
    state
}

/// `Cookie` header value carrying a valid session for `email`.
pub fn session_cookie(email: &str, name: &str) -> String {
    let token = encode_session(email, name, TEST_SECRET, 3600).unwrap();
    format!("capex_session={}", token)
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
