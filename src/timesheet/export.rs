//! CSV export of the effort grid

use super::models::{MonthKey, TimesheetRow};

const HEADER: &str = "month,project_id,project_name,category,contributor,effort";

/// Quote a field when it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One line per (project, contributor) cell, zero-effort cells included.
pub fn to_csv(rows: &[TimesheetRow], month: &MonthKey) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for row in rows {
        for contributor in &row.contributors {
            let line = [
                escape(month.as_str()),
                escape(&row.project_id),
                escape(&row.project_name),
                escape(row.category.as_str()),
                escape(&contributor.name),
                contributor.effort.to_string(),
            ]
            .join(",");
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}
