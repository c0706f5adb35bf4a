//! Timesheet models

use crate::projects::{CapexCategory, ProjectStatus};
use crate::store::EffortRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for a single effort cell (percentage of the month)
pub const MAX_EFFORT: f64 = 100.0;

pub const DEFAULT_SUMMARY: &str = "No summary available";

#[derive(Debug, Error, PartialEq)]
pub enum TimesheetError {
    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    #[error("Timesheet row {0} does not exist")]
    RowOutOfRange(usize),
    #[error("Contributor {contributor} does not exist on row {row}")]
    ContributorOutOfRange { row: usize, contributor: usize },
    #[error("Effort {0} is outside 0-100")]
    EffortOutOfRange(f64),
}

/// A `YYYY-MM` month key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MonthKey(String);

impl MonthKey {
    pub fn parse(raw: &str) -> Result<Self, TimesheetError> {
        let raw = raw.trim();
        let well_formed = raw.len() == 7
            && raw.as_bytes()[4] == b'-'
            && NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d").is_ok();
        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(TimesheetError::InvalidMonth(raw.to_string()))
        }
    }

    /// The current month in UTC
    pub fn current() -> Self {
        Self(chrono::Utc::now().format("%Y-%m").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorEffort {
    pub name: String,
    pub effort: f64,
}

/// One capitalised project and its contributors' effort for the month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimesheetRow {
    pub project_id: String,
    pub project_name: String,
    pub summary: String,
    pub status: ProjectStatus,
    pub category: CapexCategory,
    pub contributors: Vec<ContributorEffort>,
}

/// Result of a save, reported to the user as-is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
    /// Whether the records reached the store
    pub persisted: bool,
    pub records: Vec<EffortRecord>,
}

impl SaveOutcome {
    pub(crate) fn new(success: bool, persisted: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            persisted,
            records: Vec::new(),
        }
    }

    pub(crate) fn with_records(mut self, records: Vec<EffortRecord>) -> Self {
        self.records = records;
        self
    }
}
