//! Site statistics rows.
//!
//! Rows come from the aggregation step as JSON objects keyed by the registry's
//! statistics column names. Numeric cells are read leniently: numbers, numeric
//! strings (optionally with a trailing `%`) and booleans are accepted, anything
//! else reads as `0`.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::domain::SiteMetricRow;
use crate::error::{EngineError, EngineResult, ErrorContext};

pub const SITE_ID_COLUMN: &str = "Site ID";
pub const TOTAL_PATIENTS_COLUMN: &str = "Total Patients";
pub const ELIGIBLE_THROMBOLYSIS_COLUMN: &str = "# patients eligible thrombolysis";
pub const ELIGIBLE_THROMBECTOMY_COLUMN: &str = "# patients eligible thrombectomy";

/// Raw JSON structure for one site row
#[derive(Debug, Clone, Deserialize)]
pub struct RawSiteRow {
    #[serde(rename = "Site ID", default)]
    pub site_id: Value,
    #[serde(rename = "Total Patients", default)]
    pub total_patients: Value,
    #[serde(rename = "# patients eligible thrombolysis", default)]
    pub eligible_thrombolysis: Value,
    #[serde(rename = "# patients eligible thrombectomy", default)]
    pub eligible_thrombectomy: Value,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Value>,
}

/// Read a cell as a number; junk and missing read as `0.0`.
///
/// # Examples
///
/// ```
/// use resq_rust::parsing::site_rows::lenient_number;
/// use serde_json::json;
///
/// assert_eq!(lenient_number(&json!(72.5)), 72.5);
/// assert_eq!(lenient_number(&json!(" 80 ")), 80.0);
/// assert_eq!(lenient_number(&json!("85.5%")), 85.5);
/// assert_eq!(lenient_number(&json!("n/a")), 0.0);
/// assert_eq!(lenient_number(&json!(null)), 0.0);
/// ```
pub fn lenient_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn lenient_count(value: &Value) -> u64 {
    let n = lenient_number(value);
    if n > 0.0 {
        n as u64
    } else {
        0
    }
}

fn site_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl TryFrom<RawSiteRow> for SiteMetricRow {
    type Error = EngineError;

    fn try_from(raw: RawSiteRow) -> EngineResult<Self> {
        let site_id = site_id(&raw.site_id).ok_or_else(|| {
            EngineError::malformed_record(
                "Site ID is missing",
                ErrorContext::new("parse_site_row").with_entity("site_row"),
            )
        })?;

        let percentages = raw
            .columns
            .iter()
            .filter(|(column, _)| column.starts_with('%'))
            .map(|(column, value)| (column.clone(), lenient_number(value)))
            .collect();

        Ok(SiteMetricRow {
            site_id,
            total_patients: lenient_count(&raw.total_patients),
            eligible_thrombolysis: lenient_count(&raw.eligible_thrombolysis),
            eligible_thrombectomy: lenient_count(&raw.eligible_thrombectomy),
            percentages,
        })
    }
}

/// Parse a JSON array of site rows from a file
pub fn parse_site_rows_json(path: &Path) -> Result<Vec<RawSiteRow>> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read site rows file: {}", path.display()))?;
    parse_site_rows_json_str(&content)
}

/// Parse a JSON array of site rows from a string
pub fn parse_site_rows_json_str(json_str: &str) -> Result<Vec<RawSiteRow>> {
    let deserializer = &mut serde_json::Deserializer::from_str(json_str);
    serde_path_to_error::deserialize(deserializer)
        .map_err(|e| anyhow::anyhow!("Invalid site row JSON at '{}': {}", e.path(), e.inner()))
}
