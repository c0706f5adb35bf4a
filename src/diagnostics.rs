//! Store connectivity diagnostics.
//!
//! Walks the same checks an operator would do by hand when the board falls
//! back to sample data: are credentials set, does the URL look right, can we
//! reach the table, and does a real query come back.

use crate::store::{ProjectStore, StoreError};
use crate::Config;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const STEP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticStep {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    /// Both store URL and key are set
    pub configured: bool,
    /// First label of the store hostname (the hosted project id)
    pub project_ref: Option<String>,
    pub steps: Vec<DiagnosticStep>,
}

impl DiagnosticReport {
    /// All steps passed (an unconfigured store is never healthy)
    pub fn ok(&self) -> bool {
        self.configured && self.steps.iter().all(|s| s.ok)
    }

    fn push(&mut self, name: &str, ok: bool, detail: impl Into<String>) -> bool {
        let detail = detail.into();
        debug!(step = name, ok, "{}", detail);
        self.steps.push(DiagnosticStep {
            name: name.to_string(),
            ok,
            detail,
        });
        ok
    }
}

/// Hosted project id: `abcd` for `https://abcd.supabase.co`.
pub fn project_ref(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    host.split('.')
        .next()
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

async fn timed<T, F>(fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(STEP_TIMEOUT, fut)
        .await
        .unwrap_or(Err(StoreError::Timeout))
}

fn set_or_missing(value: Option<&str>) -> &'static str {
    if value.is_some() {
        "set"
    } else {
        "missing"
    }
}

/// Run every check in order, stopping at the first one that makes the rest
/// meaningless.
pub async fn run(config: &Config, store: Option<&dyn ProjectStore>) -> DiagnosticReport {
    let configured = config.store_credentials().is_some();
    let mut report = DiagnosticReport {
        configured,
        project_ref: None,
        steps: Vec::new(),
    };

    let env_detail = format!(
        "SUPABASE_URL: {}, SUPABASE_ANON_KEY: {}",
        set_or_missing(config.store_url.as_deref()),
        set_or_missing(config.store_key.as_deref())
    );
    if !report.push("environment", configured, env_detail) {
        return report;
    }

    let url = config.store_url.as_deref().unwrap_or_default();
    report.project_ref = project_ref(url);
    let url_ok = report.project_ref.is_some();
    let url_detail = match &report.project_ref {
        Some(r) => format!("project ref {}", r),
        None => format!("cannot parse {:?} as a URL", url),
    };
    if !report.push("url", url_ok, url_detail) {
        return report;
    }

    let Some(store) = store else {
        report.push("connection", false, "store client not available");
        return report;
    };

    match timed(store.probe()).await {
        Ok(count) => {
            let detail = match count {
                Some(n) => format!("projects table reachable ({} rows)", n),
                None => "projects table reachable".to_string(),
            };
            report.push("connection", true, detail);
        }
        Err(e) => {
            let hint = if matches!(e, StoreError::SchemaMissing(_)) {
                " (run `capex-tracker setup --print-sql`)"
            } else {
                ""
            };
            report.push("connection", false, format!("{}{}", e, hint));
            return report;
        }
    }

    match timed(store.list_projects()).await {
        Ok(rows) => report.push("table_access", true, format!("{} records", rows.len())),
        Err(e) => report.push("table_access", false, e.to_string()),
    };

    match timed(store.sample_projects(1)).await {
        Ok(rows) => {
            let detail = match rows.first() {
                Some(row) => format!("first record {}", row.id),
                None => "query returned no records".to_string(),
            };
            report.push("sample_query", true, detail)
        }
        Err(e) => report.push("sample_query", false, e.to_string()),
    };

    report
}
