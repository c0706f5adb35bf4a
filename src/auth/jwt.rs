//! Session token encoding and decoding (HS256).
//!
//! The session cookie carries a signed JWT with the user's identity, so the
//! server needs no session table. Each login gets a fresh session id (`sub`).

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Session id
    pub sub: String,
    pub email: String,
    /// Display name used as `submitted_by` on timesheet saves
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Encode a session token for a freshly authenticated user.
pub fn encode_session(email: &str, name: &str, secret: &str, expiry_secs: u64) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: email.to_string(),
        name: name.to_string(),
        iat: now,
        exp: now + expiry_secs as i64,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode session token")
}

/// Decode and validate a session token (signature and expiry).
pub fn decode_session(token: &str, secret: &str) -> Result<Claims> {
    let token_data: TokenData<Claims> = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode session token")?;

    Ok(token_data.claims)
}

// ============================================================================
// Tests
// ============================================================================
