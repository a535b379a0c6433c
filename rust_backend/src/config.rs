//! Engine configuration file support.
//!
//! This module reads reconciler and award settings from a TOML file. Every key
//! has a default, so an empty file (or no file at all) yields the registry's
//! standard behaviour.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::awards::criteria::AwardPolicy;
use crate::core::domain::DurationCeilings;
use crate::error::{EngineError, EngineResult, ErrorContext};
use crate::timeline::stay::StayPolicy;

/// Engine configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub reconciler: ReconcilerSettings,
    #[serde(default)]
    pub award: AwardSettings,
}

/// Timeline reconciler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerSettings {
    #[serde(default = "default_max_stay_days")]
    pub max_stay_days: i64,
    #[serde(default = "default_sentinel_year")]
    pub sentinel_year: i32,
    /// Latest year a repaired discharge may move into; current UTC year when unset.
    #[serde(default)]
    pub reference_year: Option<i32>,
    #[serde(default = "default_needle_ceiling")]
    pub needle_ceiling_minutes: i64,
    #[serde(default = "default_groin_ceiling")]
    pub groin_ceiling_minutes: i64,
}

/// Award classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardSettings {
    #[serde(default = "default_min_total_patients")]
    pub min_total_patients: u64,
    #[serde(default)]
    pub policy: AwardPolicy,
    /// Fewer thrombectomy-eligible patients than this leaves the door-to-groin criteria satisfied.
    #[serde(default = "default_thrombectomy_min_eligible")]
    pub thrombectomy_min_eligible: u64,
}

fn default_max_stay_days() -> i64 {
    300
}

fn default_sentinel_year() -> i32 {
    1900
}

fn default_needle_ceiling() -> i64 {
    400
}

fn default_groin_ceiling() -> i64 {
    700
}

fn default_min_total_patients() -> u64 {
    30
}

fn default_thrombectomy_min_eligible() -> u64 {
    4
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            max_stay_days: default_max_stay_days(),
            sentinel_year: default_sentinel_year(),
            reference_year: None,
            needle_ceiling_minutes: default_needle_ceiling(),
            groin_ceiling_minutes: default_groin_ceiling(),
        }
    }
}

impl Default for AwardSettings {
    fn default() -> Self {
        Self {
            min_total_patients: default_min_total_patients(),
            policy: AwardPolicy::default(),
            thrombectomy_min_eligible: default_thrombectomy_min_eligible(),
        }
    }
}

impl ReconcilerSettings {
    /// Stay repair policy; an unset reference year resolves to the current UTC year.
    pub fn stay_policy(&self) -> StayPolicy {
        StayPolicy {
            max_stay_days: self.max_stay_days,
            sentinel_year: self.sentinel_year,
            reference_year: self.reference_year.unwrap_or_else(|| Utc::now().year()),
        }
    }

    pub fn ceilings(&self) -> DurationCeilings {
        DurationCeilings {
            needle_minutes: self.needle_ceiling_minutes,
            groin_minutes: self.groin_ceiling_minutes,
        }
    }
}

impl EngineConfig {
    /// Load engine configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(EngineConfig)` if the file was read, parsed and validated
    /// * `Err(EngineError::ConfigurationError)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let context = || {
            ErrorContext::new("load_config").with_details(path.display().to_string())
        };

        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::configuration_with_context(
                format!("Failed to read config file: {}", e),
                context(),
            )
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            EngineError::ConfigurationError { message, .. } => {
                EngineError::configuration_with_context(message, context())
            }
            other => other,
        })
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load engine configuration from the default location.
    ///
    /// Searches for `resq.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> EngineResult<Self> {
        let search_paths = [
            PathBuf::from("resq.toml"),
            PathBuf::from("rust_backend/resq.toml"),
            PathBuf::from("../resq.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(EngineError::configuration(
            "No resq.toml found in standard locations",
        ))
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> EngineResult<()> {
        let r = &self.reconciler;
        if r.max_stay_days < 1 {
            return Err(EngineError::configuration(format!(
                "reconciler.max_stay_days must be positive, got {}",
                r.max_stay_days
            )));
        }
        if r.needle_ceiling_minutes < 1 || r.groin_ceiling_minutes < 1 {
            return Err(EngineError::configuration(
                "reconciler ceilings must be positive",
            ));
        }
        if let Some(year) = r.reference_year {
            if year <= r.sentinel_year {
                return Err(EngineError::configuration(format!(
                    "reconciler.reference_year {} must be later than sentinel_year {}",
                    year, r.sentinel_year
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.reconciler.max_stay_days, 300);
        assert_eq!(config.reconciler.sentinel_year, 1900);
        assert_eq!(config.award.min_total_patients, 30);
        assert_eq!(config.award.policy, AwardPolicy::Thrombectomy);
        assert_eq!(config.award.thrombectomy_min_eligible, 4);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[reconciler]
max_stay_days = 200
reference_year = 2021
needle_ceiling_minutes = 300

[award]
min_total_patients = 20
policy = "thrombectomy"
"#;
        let config = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.reconciler.max_stay_days, 200);
        assert_eq!(config.reconciler.groin_ceiling_minutes, 700);
        assert_eq!(config.reconciler.stay_policy().reference_year, 2021);
        assert_eq!(config.reconciler.ceilings().needle_minutes, 300);
        assert_eq!(config.award.policy, AwardPolicy::Thrombectomy);
        assert_eq!(config.award.min_total_patients, 20);
    }

    #[test]
    fn test_unset_reference_year_is_current_year() {
        let policy = ReconcilerSettings::default().stay_policy();
        assert_eq!(policy.reference_year, Utc::now().year());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = EngineConfig::from_toml_str("[award]\npolicy = \"platinum-only\"\n").unwrap_err();
        assert!(matches!(err, EngineError::ConfigurationError { .. }));
        assert_eq!(err.context().operation.as_deref(), Some("parse_config"));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        let err = EngineConfig::from_toml_str("[reconciler]\nmax_stay_days = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_stay_days"));

        let err = EngineConfig::from_toml_str("[reconciler]\nreference_year = 1850\n").unwrap_err();
        assert!(err.to_string().contains("reference_year"));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[award]\npolicy = \"recanalization\"").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.award.policy, AwardPolicy::Recanalization);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = EngineConfig::from_file("/nonexistent/resq.toml").unwrap_err();
        assert_eq!(
            err.context().details.as_deref(),
            Some("/nonexistent/resq.toml")
        );
    }
}
