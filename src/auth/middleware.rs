//! Route guard for the whole router.
//!
//! Public paths pass through untouched. Everything else needs a valid session
//! cookie: API calls are answered with 401 JSON, page requests are redirected
//! to the login page with the original path in `redirectTo`. Without an auth
//! configuration the guard is open.

use crate::api::handlers::{AppError, AppState};
use crate::auth::session::session_from_headers;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

/// Path prefixes reachable without a session.
pub const PUBLIC_PATHS: &[&str] = &["/login", "/auth/callback", "/auth-error", "/auth/google", "/health"];

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|prefix| path.starts_with(prefix))
}

pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(auth_config) = state.auth_config.as_ref() else {
        return next.run(req).await;
    };

    let path = req.uri().path().to_string();
    if is_public_path(&path) {
        return next.run(req).await;
    }

    let claims = session_from_headers(req.headers(), &auth_config.session_secret)
        .filter(|claims| auth_config.allows_email(&claims.email));

    match claims {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None if path.starts_with("/api/") => {
            debug!(path = %path, "Rejecting API call without session");
            AppError::Unauthorized("Authentication required".to_string()).into_response()
        }
        None => {
            debug!(path = %path, "Redirecting to login");
            Redirect::to(&format!("/login?redirectTo={}", path)).into_response()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::encode_session;
    use crate::test_helpers::{test_auth_config, test_state, TEST_SECRET};
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn test_app(state: AppState) -> Router {
        Router::new()
            .route("/", get(ok_handler))
            .route("/timesheet", get(ok_handler))
            .route("/login", get(ok_handler))
            .route("/health", get(ok_handler))
            .route("/api/projects", get(ok_handler))
            .layer(from_fn_with_state(state.clone(), require_session))
            .with_state(state)
    }

    fn get_req(uri: &str, cookie: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/login"));
        assert!(is_public_path("/auth/callback"));
        assert!(is_public_path("/auth-error"));
        assert!(!is_public_path("/"));
        assert!(!is_public_path("/api/projects"));
        assert!(!is_public_path("/auth/me"));
    }

    #[tokio::test]
    async fn test_open_mode_without_auth_config() {
        let app = test_app(test_state(None).await);
        let resp = app.oneshot(get_req("/timesheet", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_page_without_session_redirects_to_login() {
        let app = test_app(test_state(Some(test_auth_config())).await);
        let resp = app.oneshot(get_req("/timesheet", None)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/login?redirectTo=/timesheet"
        );
    }

    #[tokio::test]
    async fn test_api_without_session_returns_401() {
        let app = test_app(test_state(Some(test_auth_config())).await);
        let resp = app.oneshot(get_req("/api/projects", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_paths_pass_without_session() {
        let state = test_state(Some(test_auth_config())).await;
        for uri in ["/login", "/health"] {
            let resp = test_app(state.clone()).oneshot(get_req(uri, None)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{} should be public", uri);
        }
    }

    #[tokio::test]
    async fn test_valid_session_passes() {
        let app = test_app(test_state(Some(test_auth_config())).await);
        let token = encode_session("dana@company.com", "Dana", TEST_SECRET, 3600).unwrap();
        let cookie = format!("capex_session={}", token);

        let resp = app.oneshot(get_req("/timesheet", Some(&cookie))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tampered_session_redirects() {
        let app = test_app(test_state(Some(test_auth_config())).await);
        let resp = app
            .oneshot(get_req("/", Some("capex_session=not.a.jwt")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_session_outside_allowed_domain_rejected() {
        let mut config = test_auth_config();
        config.allowed_email_domain = Some("company.com".to_string());
        let app = test_app(test_state(Some(config)).await);
        let token = encode_session("dana@gmail.com", "Dana", TEST_SECRET, 3600).unwrap();
        let cookie = format!("capex_session={}", token);

        let resp = app.oneshot(get_req("/api/projects", Some(&cookie))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
