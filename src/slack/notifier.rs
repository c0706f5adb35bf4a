//! Notification seam between the HTTP layer and Slack.
//!
//! Handlers that answer a user request (`/api/slack-message`) await the
//! notifier directly. Side-effect notices (classification, timesheet
//! submission) go through [`notify_in_background`]: fire-and-forget, errors
//! are logged but never block or fail the caller.

use super::client::SlackClient;
use super::error::NotifyError;
use super::messages::{ChannelMessageRequest, ChatMessage};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Mention the lead (looked up by email) in a channel post.
    async fn send_channel_message(&self, request: &ChannelMessageRequest)
        -> Result<Value, NotifyError>;

    /// Private message to the user behind `email`.
    async fn send_direct_message(&self, email: &str, message: &str) -> Result<Value, NotifyError>;

    /// Post a prebuilt payload as-is.
    async fn post(&self, message: &ChatMessage) -> Result<Value, NotifyError>;
}

#[async_trait]
impl Notifier for SlackClient {
    async fn send_channel_message(
        &self,
        request: &ChannelMessageRequest,
    ) -> Result<Value, NotifyError> {
        SlackClient::send_channel_message(self, request).await
    }

    async fn send_direct_message(&self, email: &str, message: &str) -> Result<Value, NotifyError> {
        SlackClient::send_direct_message(self, email, message).await
    }

    async fn post(&self, message: &ChatMessage) -> Result<Value, NotifyError> {
        self.post_message(message).await.map_err(NotifyError::Post)
    }
}

/// A notice delivered off the request path
#[derive(Debug, Clone)]
pub enum Notification {
    Channel(ChannelMessageRequest),
    Post(ChatMessage),
}

impl Notification {
    fn channel(&self) -> &str {
        match self {
            Notification::Channel(req) => &req.channel,
            Notification::Post(msg) => &msg.channel,
        }
    }
}

/// Deliver `notification` on a spawned task.
pub fn notify_in_background(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        let result = match &notification {
            Notification::Channel(req) => notifier.send_channel_message(req).await,
            Notification::Post(msg) => notifier.post(msg).await,
        };
        match result {
            Ok(_) => debug!(channel = %notification.channel(), "Slack notification delivered"),
            Err(e) => warn!(
                channel = %notification.channel(),
                "Failed to deliver Slack notification: {}",
                e
            ),
        }
    });
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use tokio::sync::Mutex;

    /// Records every delivery; optionally fails them all.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
        pub direct: Mutex<Vec<(String, String)>>,
        pub fail_with: Option<String>,
    }

    impl RecordingNotifier {
        pub fn failing(reason: &str) -> Self {
            Self {
                fail_with: Some(reason.to_string()),
                ..Default::default()
            }
        }

        pub async fn sent(&self) -> Vec<Notification> {
            self.sent.lock().await.clone()
        }

        /// Poll until `n` notifications arrived (background delivery).
        pub async fn wait_for(&self, n: usize) -> Vec<Notification> {
            for _ in 0..50 {
                let sent = self.sent().await;
                if sent.len() >= n {
                    return sent;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
            self.sent().await
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_channel_message(
            &self,
            request: &ChannelMessageRequest,
        ) -> Result<Value, NotifyError> {
            if let Some(reason) = &self.fail_with {
                return Err(NotifyError::Lookup(reason.clone()));
            }
            self.sent
                .lock()
                .await
                .push(Notification::Channel(request.clone()));
            Ok(serde_json::json!({"ok": true, "channel": request.channel}))
        }

        async fn send_direct_message(
            &self,
            email: &str,
            message: &str,
        ) -> Result<Value, NotifyError> {
            if let Some(reason) = &self.fail_with {
                return Err(NotifyError::DirectMessage(reason.clone()));
            }
            self.direct
                .lock()
                .await
                .push((email.to_string(), message.to_string()));
            Ok(serde_json::json!({"ok": true}))
        }

        async fn post(&self, message: &ChatMessage) -> Result<Value, NotifyError> {
            if let Some(reason) = &self.fail_with {
                return Err(NotifyError::Post(reason.clone()));
            }
            self.sent
                .lock()
                .await
                .push(Notification::Post(message.clone()));
            Ok(serde_json::json!({"ok": true}))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::RecordingNotifier;
    use super::*;
    use crate::slack::messages::classification_message;

    #[tokio::test]
    async fn test_background_delivery_reaches_notifier() {
        let notifier = Arc::new(RecordingNotifier::default());
        let msg = classification_message("#finance-capex", "SPARK", "SPARK-001", "CAPEX", None);
        notify_in_background(notifier.clone(), Notification::Post(msg.clone()));

        let sent = notifier.wait_for(1).await;
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Notification::Post(m) if *m == msg));
    }

    #[tokio::test]
    async fn test_background_failure_is_swallowed() {
        let notifier = Arc::new(RecordingNotifier::failing("channel_not_found"));
        let msg = classification_message("#finance-capex", "SPARK", "SPARK-001", "CAPEX", None);
        notify_in_background(notifier.clone(), Notification::Post(msg));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(notifier.sent().await.is_empty());
    }
}
