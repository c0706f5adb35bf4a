//! Google OAuth2 Authorization Code Flow
//!
//! 1. Redirect the user to the consent page with a `state` nonce
//! 2. Exchange the returned code for an access token
//! 3. Fetch the user's identity from the userinfo endpoint

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::AuthConfig;

/// Identity returned by Google after a successful exchange
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    #[serde(rename = "sub")]
    pub google_id: String,
    pub email: String,
    /// Absent for accounts without a profile name
    #[serde(default)]
    pub name: Option<String>,
}

impl GoogleUserInfo {
    /// Display name, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    userinfo_url: String,
    http_client: reqwest::Client,
}

impl GoogleOAuthClient {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.google_redirect_uri.clone(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Point the token and userinfo calls at another server.
    pub fn with_endpoints(mut self, token_url: &str, userinfo_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self.userinfo_url = userinfo_url.to_string();
        self
    }

    /// Consent page URL; Google redirects back to `redirect_uri` with `code` and `state`.
    pub fn auth_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode("openid email profile"),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for the user's identity.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleUserInfo> {
        let token_response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("redirect_uri", &self.redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Failed to request Google token")?;

        if !token_response.status().is_success() {
            let status = token_response.status();
            let body = token_response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            bail!("Google token exchange failed ({}): {}", status, body);
        }

        let token: TokenResponse = token_response
            .json()
            .await
            .context("Failed to parse Google token response")?;

        let userinfo_response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("Failed to request Google userinfo")?;

        if !userinfo_response.status().is_success() {
            let status = userinfo_response.status();
            bail!("Google userinfo fetch failed ({})", status);
        }

        userinfo_response
            .json()
            .await
            .context("Failed to parse Google userinfo response")
    }
}

// ============================================================================
// Tests
// ============================================================================
