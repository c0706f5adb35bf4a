//! Session user extractors for Axum handlers.
//!
//! Both read the `Claims` the route guard put in the request extensions.

use crate::api::handlers::AppError;
use crate::auth::jwt::Claims;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use uuid::Uuid;

/// Logged-in user; rejects with 401 when there is no session.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub session_id: Uuid,
    pub email: String,
    pub name: String,
}

impl AuthUser {
    fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let session_id: Uuid = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid session id in token".to_string()))?;

        Ok(Self {
            session_id,
            email: claims.email.clone(),
            name: claims.name.clone(),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        Self::from_claims(claims)
    }
}

/// Session user when there is one (open mode has none).
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<Claims>()
                .and_then(|claims| AuthUser::from_claims(claims).ok()),
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "dana@company.com".to_string(),
            name: "Dana".to_string(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn test_auth_user_from_valid_claims() {
        let id = Uuid::new_v4();
        let user = AuthUser::from_claims(&claims(&id.to_string())).unwrap();
        assert_eq!(user.session_id, id);
        assert_eq!(user.email, "dana@company.com");
        assert_eq!(user.name, "Dana");
    }

    #[test]
    fn test_auth_user_from_invalid_session_id() {
        assert!(AuthUser::from_claims(&claims("not-a-uuid")).is_err());
    }

    #[tokio::test]
    async fn test_maybe_user_without_claims() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let MaybeUser(user) = MaybeUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_maybe_user_with_claims() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        parts.extensions.insert(claims(&Uuid::new_v4().to_string()));
        let MaybeUser(user) = MaybeUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.unwrap().name, "Dana");
    }
}
