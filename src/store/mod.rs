//! Project store client, row types and sample data

pub mod client;
pub mod error;
pub mod fixtures;
mod impl_project_store;
pub mod rows;
pub mod traits;

pub use client::RestStore;
pub use error::StoreError;
pub use rows::{EffortRecord, ProjectPatch, ProjectRow};
pub use traits::ProjectStore;

#[cfg(test)]
pub(crate) mod mock;
