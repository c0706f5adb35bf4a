//! Session and OAuth-state cookie helpers.
//!
//! Cookie format: `<name>=<value>; HttpOnly; SameSite=Lax; Path=/; Max-Age=N[; Secure]`.
//! `Secure` is only set when the public URL is HTTPS.

use anyhow::{Context, Result};
use axum::http::{header, HeaderMap, HeaderValue};

use super::jwt::{decode_session, Claims};

pub const SESSION_COOKIE_NAME: &str = "capex_session";

/// Short-lived cookie holding the OAuth `state` nonce between redirect and callback.
pub const STATE_COOKIE_NAME: &str = "capex_oauth_state";
pub const STATE_MAX_AGE_SECS: u64 = 600;

/// Random 128-bit nonce, hex encoded.
pub fn generate_state() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

pub fn build_cookie(name: &str, value: &str, max_age_secs: u64, is_secure: bool) -> Result<HeaderValue> {
    let secure_flag = if is_secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        name, value, max_age_secs, secure_flag
    );
    HeaderValue::from_str(&cookie).with_context(|| format!("Invalid value for cookie {}", name))
}

/// `Set-Cookie` value that deletes `name` in the browser.
pub fn build_clear_cookie(name: &str, is_secure: bool) -> Result<HeaderValue> {
    build_cookie(name, "", 0, is_secure)
}

/// Find `name=<value>` in a `Cookie` header.
pub fn extract_cookie(cookie_header: &str, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    cookie_header
        .split(';')
        .filter_map(|part| part.trim().strip_prefix(&prefix))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Cookie value `name` from any `Cookie` header of a request.
pub fn cookie_from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| extract_cookie(raw, name))
}

/// Valid session claims carried by the request, if any.
pub fn session_from_headers(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let token = cookie_from_headers(headers, SESSION_COOKIE_NAME)?;
    decode_session(&token, secret).ok()
}

/// `Secure` flag only when served over HTTPS.
pub fn should_set_secure(public_url: Option<&str>) -> bool {
    public_url.is_some_and(|url| url.starts_with("https://"))
}

// ============================================================================
// Tests
// ============================================================================
