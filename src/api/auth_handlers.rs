//! Authentication route handlers: Google OAuth login and session cookie.
//!
//! Endpoints:
//! - `GET  /login`         - login page payload (public)
//! - `GET  /auth/google`   - redirect to Google consent (public)
//! - `GET  /auth/callback` - exchange code, set session cookie (public)
//! - `POST /auth/logout`   - clear session cookie
//! - `GET  /auth/me`       - session user
//! - `GET  /auth-error`    - error page payload (public)

use crate::api::handlers::{AppError, AppState};
use crate::auth::extractor::AuthUser;
use crate::auth::jwt::encode_session;
use crate::auth::session::{
    build_clear_cookie, build_cookie, cookie_from_headers, generate_state, session_from_headers,
    SESSION_COOKIE_NAME, STATE_COOKIE_NAME, STATE_MAX_AGE_SECS,
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginQuery {
    pub error: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPageResponse {
    pub auth_enabled: bool,
    /// Where the "Sign in with Google" button points
    pub login_url: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorQuery {
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Human-readable text for a login error code
pub fn describe_login_error(code: &str) -> &'static str {
    match code {
        "no_code" => "Google did not return an authorization code.",
        "invalid_state" => "The login request expired or was tampered with. Please try again.",
        "exchange_failed" => "Could not complete sign-in with Google.",
        "domain_not_allowed" => "This account is not allowed to use the CAPEX tracker.",
        "session_failed" => "Could not create a session.",
        "not_configured" => "Login is not configured on this server.",
        _ => "An unexpected authentication error occurred.",
    }
}

fn login_error(code: &str) -> Response {
    Redirect::to(&format!("/login?error={}", code)).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /login: already signed-in users go straight to the dashboard.
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    headers: HeaderMap,
) -> Response {
    if let Some(auth_config) = state.auth_config.as_ref() {
        let signed_in = session_from_headers(&headers, &auth_config.session_secret)
            .is_some_and(|claims| auth_config.allows_email(&claims.email));
        if signed_in && query.error.is_none() {
            return Redirect::to("/").into_response();
        }
    }

    Json(LoginPageResponse {
        auth_enabled: state.auth_config.is_some(),
        login_url: "/auth/google".to_string(),
        error_description: query.error.as_deref().map(|c| describe_login_error(c).to_string()),
        error: query.error,
        redirect_to: query.redirect_to,
    })
    .into_response()
}

/// GET /auth/google: remember a `state` nonce and redirect to Google.
pub async fn google_login(State(state): State<AppState>) -> Result<Response, AppError> {
    let client = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Authentication not configured".to_string()))?;

    let nonce = generate_state();
    let cookie = build_cookie(STATE_COOKIE_NAME, &nonce, STATE_MAX_AGE_SECS, state.cookie_secure())?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to(&client.auth_url(&nonce)),
    )
        .into_response())
}

/// GET /auth/callback: exchange the code and start a session.
///
/// Every failure redirects to `/login?error=<reason>`.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let (Some(auth_config), Some(client)) = (state.auth_config.as_ref(), state.oauth.as_ref())
    else {
        return login_error("not_configured");
    };

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        warn!("OAuth callback without code");
        return login_error("no_code");
    };

    let expected_state = cookie_from_headers(&headers, STATE_COOKIE_NAME);
    if expected_state.is_none() || expected_state != query.state {
        warn!("OAuth callback state mismatch");
        return login_error("invalid_state");
    }

    let user = match client.exchange_code(&code).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Error exchanging code for session: {:#}", e);
            return login_error("exchange_failed");
        }
    };

    if !auth_config.allows_email(&user.email) {
        warn!(email = %user.email, "Login from outside the allowed domain");
        return login_error("domain_not_allowed");
    }

    let secure = state.cookie_secure();
    let cookies = encode_session(
        &user.email,
        user.display_name(),
        &auth_config.session_secret,
        auth_config.session_expiry_secs,
    )
    .and_then(|token| {
        Ok([
            build_cookie(SESSION_COOKIE_NAME, &token, auth_config.session_expiry_secs, secure)?,
            build_clear_cookie(STATE_COOKIE_NAME, secure)?,
        ])
    });
    let [session_cookie, clear_state] = match cookies {
        Ok(cookies) => cookies,
        Err(e) => {
            warn!("Failed to create session: {:#}", e);
            return login_error("session_failed");
        }
    };

    info!(email = %user.email, "User signed in");
    (
        AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, clear_state),
        ]),
        Redirect::to("/"),
    )
        .into_response()
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    let cookie = build_clear_cookie(SESSION_COOKIE_NAME, state.cookie_secure())?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(LogoutResponse { success: true }),
    )
        .into_response())
}

/// GET /auth/me
pub async fn get_me(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}

/// GET /auth-error
pub async fn auth_error(Query(query): Query<ErrorQuery>) -> Json<AuthErrorResponse> {
    let error = query.error.unwrap_or_else(|| "unknown".to_string());
    Json(AuthErrorResponse {
        message: describe_login_error(&error).to_string(),
        error,
    })
}

// ============================================================================
// Tests
// ============================================================================
