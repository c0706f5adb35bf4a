//! Slack message relay handlers

use crate::slack::{ChannelMessageRequest, Notifier, NotifyError};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{AppError, AppState};

#[derive(Serialize)]
pub struct SlackResponse {
    pub ok: bool,
    pub result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct DirectMessageRequest {
    pub email: String,
    /// `USER_NAME_PLACEHOLDER` is replaced with the recipient's display name
    pub message: String,
}

fn notifier(state: &AppState) -> Result<&Arc<dyn Notifier>, AppError> {
    state
        .notifier
        .as_ref()
        .ok_or_else(|| NotifyError::NotConfigured.into())
}

/// Post a message to a channel, mentioning the user behind `email` as the lead
pub async fn send_channel_message(
    State(state): State<AppState>,
    Json(req): Json<ChannelMessageRequest>,
) -> Result<Json<SlackResponse>, AppError> {
    let result = notifier(&state)?.send_channel_message(&req).await?;
    Ok(Json(SlackResponse { ok: true, result }))
}

/// Send a private message to the user behind `email`
pub async fn send_direct_message(
    State(state): State<AppState>,
    Json(req): Json<DirectMessageRequest>,
) -> Result<Json<SlackResponse>, AppError> {
    let result = notifier(&state)?
        .send_direct_message(&req.email, &req.message)
        .await?;
    Ok(Json(SlackResponse { ok: true, result }))
}
