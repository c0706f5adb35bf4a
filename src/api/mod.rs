//! HTTP API for the tracker

pub mod auth_handlers;
pub mod diagnostics_handlers;
pub mod handlers;
pub mod project_handlers;
pub mod routes;
pub mod slack_handlers;
pub mod timesheet_handlers;

pub use routes::create_router;
