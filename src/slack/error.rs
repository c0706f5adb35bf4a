//! Slack notification errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SLACK_BOT_TOKEN not set in environment")]
    NotConfigured,

    #[error("Slack user lookup failed: {0}")]
    Lookup(String),

    #[error("Slack channel message failed: {0}")]
    Post(String),

    #[error("Slack DM failed: {0}")]
    DirectMessage(String),

    #[error("Slack request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}
