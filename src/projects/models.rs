//! Project domain models

use crate::store::ProjectRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Category
// ============================================================================

/// Financial classification of a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CapexCategory {
    #[serde(rename = "CAPEX")]
    Capex,
    #[serde(rename = "CAPEX R&D")]
    CapexRnd,
    #[serde(rename = "OPEX")]
    Opex,
}

impl CapexCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapexCategory::Capex => "CAPEX",
            CapexCategory::CapexRnd => "CAPEX R&D",
            CapexCategory::Opex => "OPEX",
        }
    }

    /// Parse a stored category string. Empty strings mean "unset".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "CAPEX" => Some(CapexCategory::Capex),
            "CAPEX R&D" => Some(CapexCategory::CapexRnd),
            "OPEX" => Some(CapexCategory::Opex),
            _ => None,
        }
    }

    /// CAPEX and CAPEX R&D projects carry activity tags and appear on the timesheet.
    pub fn is_capitalised(&self) -> bool {
        matches!(self, CapexCategory::Capex | CapexCategory::CapexRnd)
    }
}

impl std::fmt::Display for CapexCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Status
// ============================================================================

/// Project lifecycle status. Unknown values from the store are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    #[default]
    Open,
    InProgress,
    Closed,
    Other(String),
}

impl ProjectStatus {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "OPEN" => ProjectStatus::Open,
            "IN PROGRESS" => ProjectStatus::InProgress,
            "CLOSED" => ProjectStatus::Closed,
            _ => ProjectStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProjectStatus::Open => "OPEN",
            ProjectStatus::InProgress => "IN PROGRESS",
            ProjectStatus::Closed => "CLOSED",
            ProjectStatus::Other(s) => s,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ProjectStatus::Open)
    }
}

impl From<String> for ProjectStatus {
    fn from(raw: String) -> Self {
        ProjectStatus::parse(&raw)
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        status.as_str().to_string()
    }
}

// ============================================================================
// Activities
// ============================================================================

/// Fixed catalog of capitalisable activity types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityType {
    FunctionalDesign,
    TechnicalDesign,
    SoftwareConfig,
    InterfaceDev,
    Coding,
    Hardware,
    Testing,
}

impl ActivityType {
    pub const ALL: [ActivityType; 7] = [
        ActivityType::FunctionalDesign,
        ActivityType::TechnicalDesign,
        ActivityType::SoftwareConfig,
        ActivityType::InterfaceDev,
        ActivityType::Coding,
        ActivityType::Hardware,
        ActivityType::Testing,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ActivityType::FunctionalDesign => "functional-design",
            ActivityType::TechnicalDesign => "technical-design",
            ActivityType::SoftwareConfig => "software-config",
            ActivityType::InterfaceDev => "interface-dev",
            ActivityType::Coding => "coding",
            ActivityType::Hardware => "hardware",
            ActivityType::Testing => "testing",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::FunctionalDesign => "Functional Design",
            ActivityType::TechnicalDesign => "Technical Design",
            ActivityType::SoftwareConfig => "Software Config",
            ActivityType::InterfaceDev => "Interface Dev",
            ActivityType::Coding => "Coding",
            ActivityType::Hardware => "Hardware",
            ActivityType::Testing => "Testing",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.id() == id)
    }
}

/// Catalog entry as exposed over the API
#[derive(Debug, Clone, Serialize)]
pub struct ActivityDescriptor {
    pub id: &'static str,
    pub label: &'static str,
}

pub fn activity_catalog() -> Vec<ActivityDescriptor> {
    ActivityType::ALL
        .iter()
        .map(|a| ActivityDescriptor {
            id: a.id(),
            label: a.label(),
        })
        .collect()
}

// ============================================================================
// Project
// ============================================================================

/// A project as held in memory and served to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub summary: Option<String>,
    pub status: ProjectStatus,
    pub lead: String,
    /// Raw comma-separated contributor names, as stored
    pub contributors: String,
    pub contributor_list: Vec<String>,
    pub contributor_count: usize,
    pub capex_category: Option<CapexCategory>,
    /// Activity ids in selection order
    pub activities: Vec<String>,
    /// Draft (false) vs committed (true) activity selection
    pub activities_saved: bool,
    pub jira_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Normalize a raw store row into the in-memory shape.
    pub fn from_row(row: ProjectRow) -> Self {
        let contributors = row.contributors.unwrap_or_default();
        let contributor_list = parse_contributors(&contributors);

        let capex_category = row.capex_category.as_deref().and_then(|raw| {
            let parsed = CapexCategory::parse(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                tracing::warn!(project = %row.id, category = %raw, "Ignoring unknown category");
            }
            parsed
        });

        let mut activities: Vec<String> = Vec::new();
        for activity in row.activities.unwrap_or_default() {
            if !activities.contains(&activity) {
                activities.push(activity);
            }
        }

        Self {
            name: row
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown Project".to_string()),
            summary: row.summary,
            status: row
                .status
                .as_deref()
                .map(ProjectStatus::parse)
                .unwrap_or_default(),
            lead: row
                .lead
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            contributor_count: contributor_list.len(),
            contributor_list,
            contributors,
            // A saved selection without a category would be meaningless.
            activities_saved: row.activities_saved.unwrap_or(false) && capex_category.is_some(),
            capex_category,
            activities,
            jira_url: row.jira_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            id: row.id,
        }
    }

    /// True when a capitalised project still lacks a committed activity selection.
    pub fn needs_activities(&self) -> bool {
        self.capex_category.is_some_and(|c| c.is_capitalised())
            && (self.activities.is_empty() || !self.activities_saved)
    }
}

/// Split a free-text contributor list on commas, trimming and dropping empties.
pub fn parse_contributors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
