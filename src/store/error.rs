//! Error types for project store operations.

use thiserror::Error;

/// Postgres "undefined_table" SQLSTATE.
const PG_UNDEFINED_TABLE: &str = "42P01";
/// PostgREST "table not found in schema cache".
const PGRST_TABLE_NOT_FOUND: &str = "PGRST205";

/// Errors from the project store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No store URL / API key configured.
    #[error("Store is not configured")]
    NotConfigured,

    /// The request never reached the store (DNS, TLS, connection refused).
    #[error("Failed to fetch: {0}")]
    Transport(String),

    /// A single attempt exceeded its deadline.
    #[error("Connection failed: request timed out")]
    Timeout,

    /// The table being queried does not exist yet.
    #[error("relation does not exist: {0}")]
    SchemaMissing(String),

    /// The store answered with an error payload.
    #[error("{message}")]
    Query {
        code: Option<String>,
        message: String,
    },

    /// The store answered with a body we could not decode.
    #[error("Unexpected store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Classify an error payload returned by the store.
    ///
    /// Missing-table errors are detected by SQLSTATE/PostgREST code first and
    /// then by message text, since older PostgREST versions only report the
    /// message.
    pub fn from_api(code: Option<String>, message: String) -> Self {
        let code_says_missing = matches!(
            code.as_deref(),
            Some(PG_UNDEFINED_TABLE) | Some(PGRST_TABLE_NOT_FOUND)
        );
        if code_says_missing || message.contains("relation") || message.contains("does not exist")
        {
            StoreError::SchemaMissing(message)
        } else {
            StoreError::Query { code, message }
        }
    }

    /// True for failures where the store could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Transport(_) | StoreError::Timeout)
    }

    pub fn is_schema_missing(&self) -> bool {
        matches!(self, StoreError::SchemaMissing(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}
