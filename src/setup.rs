//! Database bootstrap: schema DDL and sample seed data.

use crate::store::{fixtures, ProjectStore, StoreError};
use tracing::info;

/// DDL for the tables the tracker reads and writes.
///
/// Idempotent, so it can be re-applied to an existing database.
pub const SCHEMA_SQL: &str = r#"CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    summary TEXT,
    status TEXT DEFAULT 'OPEN',
    lead TEXT,
    contributors TEXT,
    start_date DATE,
    capex_category TEXT,
    activities TEXT[] DEFAULT '{}',
    activities_saved BOOLEAN DEFAULT FALSE,
    jira_url TEXT,
    created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
    updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS contributors (
    id SERIAL PRIMARY KEY,
    project_id TEXT REFERENCES projects(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    email TEXT,
    role TEXT
);

CREATE TABLE IF NOT EXISTS monthly_efforts (
    id SERIAL PRIMARY KEY,
    project_id TEXT REFERENCES projects(id) ON DELETE CASCADE,
    contributor_name TEXT,
    month_year TEXT,
    hours_spent DECIMAL(5,2) DEFAULT 0,
    documentation_links TEXT,
    submitted_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
    submitted_by TEXT,
    UNIQUE(project_id, contributor_name, month_year)
);
"#;

/// Run [`SCHEMA_SQL`] through the store's `exec_sql` RPC.
///
/// Only works when that function has been installed in the database; most
/// deployments paste the DDL into the SQL editor instead.
pub async fn apply_schema(store: &dyn ProjectStore) -> Result<(), StoreError> {
    store.execute_sql(SCHEMA_SQL).await?;
    info!("Schema applied");
    Ok(())
}

/// Upsert the sample projects, keyed by id. Returns the number of rows written.
pub async fn seed(store: &dyn ProjectStore) -> Result<usize, StoreError> {
    let rows = fixtures::sample_projects();
    let written = store.upsert_projects(&rows).await?;
    info!(rows = written, "Sample projects seeded");
    Ok(written)
}
