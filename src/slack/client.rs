//! Slack Web API client
//!
//! Resolves an email to a workspace user (`users.lookupByEmail`) and posts
//! messages (`chat.postMessage`) with a bot token. No retries: a failed
//! notification is reported to the caller once.

use super::error::NotifyError;
use super::messages::{self, ChannelMessageRequest, ChatMessage, SlackUser};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const SLACK_API_URL: &str = "https://slack.com/api";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    ok: bool,
    error: Option<String>,
    user: Option<LookupUser>,
}

#[derive(Debug, Deserialize)]
struct LookupUser {
    id: String,
    name: Option<String>,
    profile: Option<LookupProfile>,
}

#[derive(Debug, Deserialize)]
struct LookupProfile {
    display_name: Option<String>,
}

/// Slack client bound to one bot token
#[derive(Clone)]
pub struct SlackClient {
    token: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl SlackClient {
    pub fn new(token: &str, base_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to create Slack HTTP client")?;

        Ok(Self {
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Resolve an email to a user id and display name.
    ///
    /// The display name falls back to the account name when the profile has none.
    pub async fn lookup_user_by_email(&self, email: &str) -> Result<SlackUser, NotifyError> {
        let url = format!(
            "{}/users.lookupByEmail?email={}",
            self.base_url,
            urlencoding::encode(email)
        );
        let response: LookupResponse = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(NotifyError::Lookup(
                response.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        let user = response
            .user
            .ok_or_else(|| NotifyError::Lookup("missing user in response".to_string()))?;

        let display_name = user
            .profile
            .and_then(|p| p.display_name)
            .filter(|n| !n.is_empty());
        Ok(SlackUser {
            name: display_name.or(user.name).unwrap_or_default(),
            id: user.id,
        })
    }

    /// POST `chat.postMessage`. Returns Slack's response body on `ok: true`,
    /// otherwise the `error` reason.
    pub async fn post_message(&self, payload: &ChatMessage) -> Result<Value, String> {
        let response = self
            .http_client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let body: Value = response.json().await.map_err(|e| e.to_string())?;

        if body.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(body)
        } else {
            Err(body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string())
        }
    }

    /// Look up the lead by email and post the classification message to a channel.
    pub async fn send_channel_message(
        &self,
        request: &ChannelMessageRequest,
    ) -> Result<Value, NotifyError> {
        let lead = self.lookup_user_by_email(&request.email).await?;
        let payload = messages::channel_message(request, &lead);
        self.post_message(&payload).await.map_err(NotifyError::Post)
    }

    /// Look up the user by email and send them a private message.
    pub async fn send_direct_message(&self, email: &str, message: &str) -> Result<Value, NotifyError> {
        let user = self.lookup_user_by_email(email).await?;
        let timestamp = chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string();
        let payload = messages::direct_message(&user, message, &timestamp);
        self.post_message(&payload)
            .await
            .map_err(NotifyError::DirectMessage)
    }
}

// ============================================================================
// Tests
// ============================================================================
