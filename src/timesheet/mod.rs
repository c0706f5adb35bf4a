//! Monthly effort timesheet

pub mod aggregator;
pub mod export;
pub mod models;

pub use aggregator::{derive_timesheet, Timesheet, ANONYMOUS_SUBMITTER};
pub use models::{ContributorEffort, MonthKey, SaveOutcome, TimesheetError, TimesheetRow};
