use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::domain::SiteMetricRow;
use crate::parsing::records::{self, RawEncounter};
use crate::parsing::site_rows::{self, RawSiteRow};

fn require_json(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .context("File has no extension")?;

    match extension.to_lowercase().as_str() {
        "json" => Ok(()),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Loader for raw encounter records
pub struct EncounterLoader;

impl EncounterLoader {
    /// Load raw encounters from a JSON array file
    pub fn load_from_file(path: &Path) -> Result<Vec<RawEncounter>> {
        require_json(path)?;
        records::parse_encounters_json(path).context("Failed to parse encounter file")
    }

    /// Load raw encounters from a JSON string
    pub fn load_from_json_str(json_str: &str) -> Result<Vec<RawEncounter>> {
        records::parse_encounters_json_str(json_str).context("Failed to parse encounter JSON")
    }
}

/// Loader for aggregated site statistics rows
pub struct SiteRowLoader;

impl SiteRowLoader {
    /// Load site rows from a JSON array file
    pub fn load_from_file(path: &Path) -> Result<Vec<SiteMetricRow>> {
        require_json(path)?;
        let raw = site_rows::parse_site_rows_json(path).context("Failed to parse site rows file")?;
        Self::convert(raw)
    }

    /// Load site rows from a JSON string
    pub fn load_from_json_str(json_str: &str) -> Result<Vec<SiteMetricRow>> {
        let raw = site_rows::parse_site_rows_json_str(json_str)
            .context("Failed to parse site rows JSON")?;
        Self::convert(raw)
    }

    fn convert(raw: Vec<RawSiteRow>) -> Result<Vec<SiteMetricRow>> {
        raw.into_iter()
            .enumerate()
            .map(|(index, row)| {
                SiteMetricRow::try_from(row).with_context(|| format!("Invalid site row #{}", index))
            })
            .collect()
    }
}

/// Write any serializable value as pretty-printed JSON, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    fs::write(path, json).with_context(|| format!("Failed to write file: {}", path.display()))
}
