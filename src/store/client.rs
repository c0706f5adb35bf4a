//! PostgREST client for the project store
//!
//! Talks to `{url}/rest/v1/...` with the anon key sent both as `apikey` and as
//! a Bearer token, the way the hosted store expects.

use super::error::StoreError;
use super::rows::{EffortRecord, ProjectPatch, ProjectRow};
use anyhow::{Context, Result};
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Conflict target for `monthly_efforts` upserts.
pub const EFFORT_CONFLICT_KEY: &str = "project_id,contributor_name,month_year";

/// Backstop for a single request; retry policies use shorter per-attempt deadlines.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error payload returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Client for the project store REST API
pub struct RestStore {
    rest_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl RestStore {
    /// Create a new store client for the given project URL and anon key.
    pub fn new(url: &str, api_key: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create store HTTP client")?;

        Ok(Self {
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            http_client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.rest_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn a non-success response into a classified `StoreError`.
    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            // HEAD responses carry no body; a 404 there means the table is unknown.
            if status == StatusCode::NOT_FOUND {
                return Err(StoreError::SchemaMissing(format!(
                    "relation not found ({})",
                    status
                )));
            }
            return Err(StoreError::Query {
                code: Some(status.as_u16().to_string()),
                message: format!("Store request failed with status {}", status),
            });
        }

        match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(api) => {
                if api.details.is_some() || api.hint.is_some() {
                    tracing::debug!(
                        code = ?api.code,
                        details = ?api.details,
                        hint = ?api.hint,
                        "Store returned error details"
                    );
                }
                let message = api
                    .message
                    .unwrap_or_else(|| format!("Store request failed with status {}", status));
                Err(StoreError::from_api(api.code, message))
            }
            Err(_) => Err(StoreError::Query {
                code: Some(status.as_u16().to_string()),
                message: body,
            }),
        }
    }

    // ========================================================================
    // Projects
    // ========================================================================

    /// HEAD request with an exact count; the total comes back in `Content-Range`.
    pub async fn count_projects(&self) -> Result<Option<u64>, StoreError> {
        let response = self
            .request(Method::HEAD, "/projects?select=count")
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;

        Ok(response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total))
    }

    /// All projects, newest first
    pub async fn fetch_projects(&self) -> Result<Vec<ProjectRow>, StoreError> {
        let response = self
            .request(Method::GET, "/projects?select=*&order=created_at.desc")
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<ProjectRow>>().await?)
    }

    pub async fn fetch_project_sample(&self, limit: usize) -> Result<Vec<ProjectRow>, StoreError> {
        let response = self
            .request(Method::GET, &format!("/projects?select=*&limit={}", limit))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Vec<ProjectRow>>().await?)
    }

    /// PATCH a single project by id
    pub async fn patch_project(&self, id: &str, patch: &ProjectPatch) -> Result<(), StoreError> {
        let path = format!("/projects?id=eq.{}", urlencoding::encode(id));
        let response = self
            .request(Method::PATCH, &path)
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Upsert projects keyed by id, returning the rows written
    pub async fn upsert_project_rows(&self, rows: &[ProjectRow]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let response = self
            .request(Method::POST, "/projects?on_conflict=id")
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(rows)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let written = response.json::<Vec<ProjectRow>>().await?;
        Ok(written.len())
    }

    // ========================================================================
    // Monthly efforts
    // ========================================================================

    /// Single batch upsert of effort records
    pub async fn upsert_effort_rows(&self, records: &[EffortRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let path = format!("/monthly_efforts?on_conflict={}", EFFORT_CONFLICT_KEY);
        let response = self
            .request(Method::POST, &path)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(records)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    // ========================================================================
    // Schema
    // ========================================================================

    pub async fn exec_sql(&self, sql: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, "/rpc/exec_sql")
            .json(&serde_json::json!({ "sql": sql }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Extract the total from a `Content-Range` value such as `0-2/3` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_for(server: &MockServer) -> RestStore {
        RestStore::new(&server.uri(), "anon-key").unwrap()
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-2/3"), Some(3));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-2/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let store = RestStore::new("https://abc.supabase.co/", "k").unwrap();
        assert_eq!(store.rest_url, "https://abc.supabase.co/rest/v1");
    }

    #[tokio::test]
    async fn test_count_projects_reads_content_range() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/projects"))
            .and(header_eq("apikey", "anon-key"))
            .and(header_eq("authorization", "Bearer anon-key"))
            .and(header_eq("prefer", "count=exact"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/3"))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        assert_eq!(store.count_projects().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_count_projects_missing_table_on_head_404() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store.count_projects().await.unwrap_err();
        assert!(err.is_schema_missing());
    }

    #[tokio::test]
    async fn test_fetch_projects_orders_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .and(query_param("select", "*"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "AM-003", "name": "New Order Model for AM", "contributors": "A, B"},
                {"id": "BQ-002", "name": "BigQuery Column Lineage Phase 2"}
            ])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let rows = store.fetch_projects().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "AM-003");
        assert_eq!(rows[0].contributors.as_deref(), Some("A, B"));
    }

    #[tokio::test]
    async fn test_fetch_projects_classifies_missing_relation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "code": "42P01",
                "details": null,
                "hint": null,
                "message": "relation \"public.projects\" does not exist"
            })))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store.fetch_projects().await.unwrap_err();
        assert!(err.is_schema_missing());
    }

    #[tokio::test]
    async fn test_fetch_projects_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store.fetch_projects().await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_patch_project_targets_id() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/projects"))
            .and(query_param("id", "eq.BQ-002"))
            .and(body_json(serde_json::json!({"activities": ["coding"], "activities_saved": true})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let patch = ProjectPatch {
            activities: Some(vec!["coding".into()]),
            activities_saved: Some(true),
            ..Default::default()
        };
        store.patch_project("BQ-002", &patch).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_efforts_uses_composite_conflict_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/monthly_efforts"))
            .and(query_param("on_conflict", EFFORT_CONFLICT_KEY))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let records = vec![EffortRecord {
            project_id: "BQ-002".into(),
            contributor_name: "Cristea Ionut".into(),
            month_year: "2025-07".into(),
            hours_spent: 40.0,
            submitted_by: "alice@example.com".into(),
        }];
        store.upsert_effort_rows(&records).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_efforts_empty_batch_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        store.upsert_effort_rows(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_error_keeps_code_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/monthly_efforts"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "code": "42501",
                "message": "permission denied for table monthly_efforts"
            })))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let records = vec![EffortRecord {
            project_id: "P".into(),
            contributor_name: "C".into(),
            month_year: "2025-07".into(),
            hours_spent: 10.0,
            submitted_by: "u".into(),
        }];
        match store.upsert_effort_rows(&records).await.unwrap_err() {
            StoreError::Query { code, message } => {
                assert_eq!(code.as_deref(), Some("42501"));
                assert!(message.contains("permission denied"));
            }
            other => panic!("expected Query, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let store = RestStore::new("http://127.0.0.1:1", "k").unwrap();
        let err = store.fetch_projects().await.unwrap_err();
        assert!(err.is_connectivity(), "got {:?}", err);
    }
}
