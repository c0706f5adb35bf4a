//! Slack message payloads (`chat.postMessage` body shapes) and their builders.

use serde::{Deserialize, Serialize};

pub const USER_NAME_PLACEHOLDER: &str = "USER_NAME_PLACEHOLDER";
const GOOD: &str = "good";
const DM_COLOR: &str = "#36a64f";
const FOOTER_ICON: &str = "https://platform.slack-edge.com/img/default_application_icon.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl AttachmentField {
    fn short(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
            short: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub color: String,
    pub fields: Vec<AttachmentField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub channel: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Request body of `POST /api/slack-message`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelMessageRequest {
    pub channel: String,
    pub email: String,
    pub message: String,
    pub title: String,
    pub link: String,
}

/// A resolved workspace user
#[derive(Debug, Clone, PartialEq)]
pub struct SlackUser {
    pub id: String,
    pub name: String,
}

impl SlackUser {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// Channel post with the lead mention, project title and link fields.
pub fn channel_message(request: &ChannelMessageRequest, lead: &SlackUser) -> ChatMessage {
    ChatMessage {
        channel: request.channel.clone(),
        text: request.message.clone(),
        attachments: vec![Attachment {
            color: GOOD.to_string(),
            fields: vec![
                AttachmentField::short("Project Lead", lead.mention()),
                AttachmentField::short("Project Title", request.title.clone()),
                AttachmentField::short("Link", format!("<{}|Click here>", request.link)),
            ],
            footer: None,
            footer_icon: None,
        }],
    }
}

/// Private message addressed to the user id, with their name substituted.
pub fn direct_message(user: &SlackUser, message: &str, timestamp: &str) -> ChatMessage {
    ChatMessage {
        channel: user.id.clone(),
        text: message.replace(USER_NAME_PLACEHOLDER, &user.name),
        attachments: vec![Attachment {
            color: DM_COLOR.to_string(),
            fields: vec![
                AttachmentField {
                    title: "Direct Message".to_string(),
                    value: "This is a private message sent directly to you.".to_string(),
                    short: false,
                },
                AttachmentField::short("Timestamp", timestamp),
                AttachmentField::short("Sent By", "Automated System"),
            ],
            footer: Some("Direct Message System".to_string()),
            footer_icon: Some(FOOTER_ICON.to_string()),
        }],
    }
}

/// Finance notice text for a project entering a capitalised category
pub fn classification_text(project_name: &str, project_id: &str, category: &str) -> String {
    format!(
        "Project {} ({}) marked as {}",
        project_name, project_id, category
    )
}

/// Finance notice when nobody can be mentioned as the classifier
pub fn classification_message(
    channel: &str,
    project_name: &str,
    project_id: &str,
    category: &str,
    link: Option<&str>,
) -> ChatMessage {
    let mut fields = vec![
        AttachmentField::short("Project Title", project_name),
        AttachmentField::short("Category", category),
    ];
    if let Some(link) = link {
        fields.push(AttachmentField::short("Link", format!("<{}|Click here>", link)));
    }
    ChatMessage {
        channel: channel.to_string(),
        text: classification_text(project_name, project_id, category),
        attachments: vec![Attachment {
            color: GOOD.to_string(),
            fields,
            footer: None,
            footer_icon: None,
        }],
    }
}

/// Summary posted when a monthly timesheet is submitted
pub fn timesheet_submission_message(
    channel: &str,
    month: &str,
    project_count: usize,
    total_hours: f64,
) -> ChatMessage {
    ChatMessage {
        channel: channel.to_string(),
        text: format!("📊 Monthly CAPEX timesheet submitted for {}", month),
        attachments: vec![Attachment {
            color: GOOD.to_string(),
            fields: vec![
                AttachmentField::short("Projects", project_count.to_string()),
                AttachmentField::short("Total Hours", total_hours.to_string()),
            ],
            footer: None,
            footer_icon: None,
        }],
    }
}
