//! Slack notifications
//!
//! - [`client`]: Web API calls (`users.lookupByEmail`, `chat.postMessage`)
//! - [`messages`]: payload shapes and builders
//! - [`notifier`]: the [`Notifier`] trait and background delivery

pub mod client;
pub mod error;
pub mod messages;
pub mod notifier;

pub use client::{SlackClient, SLACK_API_URL};
pub use error::NotifyError;
pub use messages::{ChannelMessageRequest, ChatMessage, SlackUser};
pub use notifier::{notify_in_background, Notification, Notifier};
