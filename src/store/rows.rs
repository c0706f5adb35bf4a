//! Row shapes exchanged with the store's REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `projects` table as returned by the store.
///
/// Every column except `id` is optional: rows written by older tooling may
/// omit columns entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub lead: Option<String>,
    /// Comma-separated contributor names
    #[serde(default)]
    pub contributors: Option<String>,
    #[serde(default)]
    pub capex_category: Option<String>,
    #[serde(default)]
    pub activities: Option<Vec<String>>,
    #[serde(default)]
    pub activities_saved: Option<bool>,
    #[serde(default)]
    pub jira_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update of a project row. Only `Some` fields are sent.
///
/// `capex_category` is doubly optional so a category can be cleared
/// (`Some(None)` serializes to `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capex_category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities_saved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectPatch {
    pub fn category(category: Option<String>) -> Self {
        Self {
            capex_category: Some(category),
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn activities(activities: Vec<String>, saved: bool) -> Self {
        Self {
            activities: Some(activities),
            activities_saved: Some(saved),
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }
}

/// One `monthly_efforts` upsert record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortRecord {
    pub project_id: String,
    pub contributor_name: String,
    /// `YYYY-MM`
    pub month_year: String,
    pub hours_spent: f64,
    pub submitted_by: String,
}
