//! Project list: models, fetch protocol and classification state

pub mod board;
pub mod loader;
pub mod models;
pub mod retry;

pub use board::{BoardError, BoardStats, CategoryFilter, ProjectBoard};
pub use loader::{DataSource, FetchOutcome, ProjectLoader};
pub use models::{ActivityType, CapexCategory, Project, ProjectStatus};
pub use retry::{RetryOutcome, RetryPolicy};
