//! Sample project rows.
//!
//! Used three ways: as the seed written by `setup`, as the fallback data served
//! when the store is unreachable, and as test fixtures.

use super::rows::ProjectRow;

#[allow(clippy::too_many_arguments)]
fn row(
    id: &str,
    name: &str,
    summary: &str,
    status: &str,
    lead: &str,
    contributors: &str,
    category: Option<&str>,
    activities: &[&str],
) -> ProjectRow {
    ProjectRow {
        id: id.to_string(),
        name: Some(name.to_string()),
        summary: Some(summary.to_string()),
        status: Some(status.to_string()),
        lead: Some(lead.to_string()),
        contributors: Some(contributors.to_string()),
        capex_category: category.map(str::to_string),
        activities: Some(activities.iter().map(|a| a.to_string()).collect()),
        activities_saved: Some(!activities.is_empty()),
        jira_url: Some(format!("https://company.atlassian.net/browse/{}", id)),
        created_at: None,
        updated_at: None,
    }
}

/// The three sample projects: one uncategorised, one CAPEX, one CAPEX R&D.
pub fn sample_projects() -> Vec<ProjectRow> {
    vec![
        row(
            "SPARK-001",
            "SPARK",
            "For Content Generators, it's important to have visibility on content usage & performance, to effectively allocate their resources towards what works for content consumers.",
            "OPEN",
            "Dragos Ionita",
            "Ionita Dragos, Guta Laurentiu, Proca Cosmin, Carsote Cosmin, Dragomir Diana, Tij Andrei, Tarziu Silvia",
            None,
            &[],
        ),
        row(
            "BQ-002",
            "BigQuery Column Lineage Phase 2",
            "Complete and ready dashboards, so the lineage will be completed and ready to build applications on top of it.",
            "CLOSED",
            "Alex Giurgiu",
            "Mantu Razvan-Viorel, Vintila Cosmina, Cristea Ionut",
            Some("CAPEX"),
            &["technical-design", "coding", "testing"],
        ),
        row(
            "AM-003",
            "New Order Model for AM",
            "Create new Order model for AM. This a foundational piece for future enhancements.",
            "OPEN",
            "Alex Giurgiu",
            "Streche Diana, Albata Anda, Giurgiu Alexandru, Platon Elena",
            Some("CAPEX R&D"),
            &["functional-design", "technical-design"],
        ),
    ]
}
