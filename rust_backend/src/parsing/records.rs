use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::core::domain::{ClinicalEvent, RecanalizationPathway};
use crate::error::{EngineError, EngineResult, ErrorContext};
use crate::timeline::clock::parse_time_of_day;

const ABSENT_MARKERS: [&str; 5] = ["", "none", "nan", "null", "nat"];

/// Custom deserializer that accepts a string, an integer or a float cell as text
fn deserialize_cell<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        String(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Cell>::deserialize(deserializer)?.map(|cell| match cell {
        Cell::String(s) => s,
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{}", f as i64),
        Cell::Float(f) => f.to_string(),
        Cell::Bool(b) => b.to_string(),
    }))
}

/// Raw JSON structure for one encounter as exported by the registry
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEncounter {
    #[serde(rename = "Protocol ID", default, deserialize_with = "deserialize_cell")]
    pub protocol_id: Option<String>,
    #[serde(rename = "Site ID", default, deserialize_with = "deserialize_cell")]
    pub site_id: Option<String>,
    #[serde(rename = "VISIT_DATE", default, deserialize_with = "deserialize_cell")]
    pub visit_date: Option<String>,
    #[serde(rename = "VISIT_TIME", default, deserialize_with = "deserialize_cell")]
    pub visit_time: Option<String>,
    #[serde(rename = "HOSPITAL_DATE", default, deserialize_with = "deserialize_cell")]
    pub hospital_date: Option<String>,
    #[serde(rename = "HOSPITAL_TIME", default, deserialize_with = "deserialize_cell")]
    pub hospital_time: Option<String>,
    #[serde(rename = "DISCHARGE_DATE", default, deserialize_with = "deserialize_cell")]
    pub discharge_date: Option<String>,
    #[serde(rename = "RECANALIZATION_PROCEDURES", default, deserialize_with = "deserialize_cell")]
    pub recanalization_procedures: Option<String>,

    #[serde(rename = "IVT_ONLY_ADMISSION_TIME", default, deserialize_with = "deserialize_cell")]
    pub ivt_only_admission_time: Option<String>,
    #[serde(rename = "IVT_ONLY_BOLUS_TIME", default, deserialize_with = "deserialize_cell")]
    pub ivt_only_bolus_time: Option<String>,

    #[serde(rename = "IVT_TBY_ADMISSION_TIME", default, deserialize_with = "deserialize_cell")]
    pub ivt_tby_admission_time: Option<String>,
    #[serde(rename = "IVT_TBY_BOLUS_TIME", default, deserialize_with = "deserialize_cell")]
    pub ivt_tby_bolus_time: Option<String>,
    #[serde(rename = "IVT_TBY_GROIN_PUNCTURE_TIME", default, deserialize_with = "deserialize_cell")]
    pub ivt_tby_groin_puncture_time: Option<String>,

    #[serde(rename = "IVT_TBY_REFER_ADMISSION_TIME", default, deserialize_with = "deserialize_cell")]
    pub ivt_tby_refer_admission_time: Option<String>,
    #[serde(rename = "IVT_TBY_REFER_BOLUS_TIME", default, deserialize_with = "deserialize_cell")]
    pub ivt_tby_refer_bolus_time: Option<String>,
    #[serde(rename = "IVT_TBY_REFER_DISCHARGE_TIME", default, deserialize_with = "deserialize_cell")]
    pub ivt_tby_refer_discharge_time: Option<String>,

    #[serde(rename = "TBY_ONLY_ADMISSION_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_only_admission_time: Option<String>,
    #[serde(rename = "TBY_ONLY_PUNCTURE_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_only_puncture_time: Option<String>,

    #[serde(rename = "TBY_REFER_ADMISSION_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_refer_admission_time: Option<String>,
    #[serde(rename = "TBY_REFER_DISCHARGE_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_refer_discharge_time: Option<String>,

    #[serde(rename = "TBY_REFER_ALL_ADMISSION_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_refer_all_admission_time: Option<String>,
    #[serde(rename = "TBY_REFER_ALL_DISCHARGE_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_refer_all_discharge_time: Option<String>,
    #[serde(rename = "TBY_REFER_ALL_BOLUS_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_refer_all_bolus_time: Option<String>,

    #[serde(rename = "TBY_REFER_LIM_ADMISSION_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_refer_lim_admission_time: Option<String>,
    #[serde(rename = "TBY_REFER_LIM_DISCHARGE_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_refer_lim_discharge_time: Option<String>,
    #[serde(rename = "TBY_REFER_LIM_BOLUS_TIME", default, deserialize_with = "deserialize_cell")]
    pub tby_refer_lim_bolus_time: Option<String>,
}

fn is_absent(raw: &str) -> bool {
    let trimmed = raw.trim();
    ABSENT_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

fn time(cell: &Option<String>) -> Option<chrono::NaiveTime> {
    cell.as_deref().and_then(parse_time_of_day)
}

/// Parse a registry calendar date.
///
/// Accepts `YYYY-MM-DD` and `DD/MM/YYYY`, optionally followed by a time part
/// (`2019-03-01 00:00:00`, `2019-03-01T00:00:00`), which is dropped.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use resq_rust::parsing::records::parse_date;
///
/// let expected = NaiveDate::from_ymd_opt(2019, 3, 1);
/// assert_eq!(parse_date("2019-03-01"), expected);
/// assert_eq!(parse_date("01/03/2019"), expected);
/// assert_eq!(parse_date("2019-03-01 00:00:00"), expected);
/// assert_eq!(parse_date("2019-02-30"), None);
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day_part, "%d/%m/%Y"))
        .ok()
}

impl RawEncounter {
    fn context(&self) -> ErrorContext {
        let ctx = ErrorContext::new("parse_encounter").with_entity("encounter");
        match &self.protocol_id {
            Some(id) => ctx.with_entity_id(id),
            None => ctx,
        }
    }

    fn required_date(&self, column: &str, cell: &Option<String>) -> EngineResult<NaiveDate> {
        let raw = cell.as_deref().filter(|s| !is_absent(s)).ok_or_else(|| {
            EngineError::malformed_date(
                format!("{} is missing", column),
                self.context().with_details(format!("column={}", column)),
            )
        })?;
        parse_date(raw).ok_or_else(|| {
            EngineError::malformed_date(
                format!("unparsable {} '{}'", column, raw),
                self.context().with_details(format!("column={}", column)),
            )
        })
    }

    fn pathway(&self) -> EngineResult<Option<RecanalizationPathway>> {
        let Some(raw) = self
            .recanalization_procedures
            .as_deref()
            .filter(|s| !is_absent(s))
        else {
            return Ok(None);
        };

        let unknown = || {
            EngineError::malformed_record(
                format!("unknown RECANALIZATION_PROCEDURES code '{}'", raw),
                self.context()
                    .with_details("column=RECANALIZATION_PROCEDURES"),
            )
        };
        let code = raw.trim().parse::<f64>().map_err(|_| unknown())?;
        if code.fract() != 0.0 {
            return Err(unknown());
        }
        let pathway = RecanalizationPathway::from_code(code as i64).ok_or_else(unknown)?;

        Ok(Some(self.with_times(pathway)))
    }

    fn with_times(&self, pathway: RecanalizationPathway) -> RecanalizationPathway {
        use RecanalizationPathway::*;
        match pathway {
            IvtOnly { .. } => IvtOnly {
                admission: time(&self.ivt_only_admission_time),
                bolus: time(&self.ivt_only_bolus_time),
            },
            IvtTby { .. } => IvtTby {
                admission: time(&self.ivt_tby_admission_time),
                bolus: time(&self.ivt_tby_bolus_time),
                groin_puncture: time(&self.ivt_tby_groin_puncture_time),
            },
            TbyOnly { .. } => TbyOnly {
                admission: time(&self.tby_only_admission_time),
                groin_puncture: time(&self.tby_only_puncture_time),
            },
            IvtTbyRefer { .. } => IvtTbyRefer {
                admission: time(&self.ivt_tby_refer_admission_time),
                bolus: time(&self.ivt_tby_refer_bolus_time),
                discharge: time(&self.ivt_tby_refer_discharge_time),
            },
            TbyRefer { .. } => TbyRefer {
                admission: time(&self.tby_refer_admission_time),
                discharge: time(&self.tby_refer_discharge_time),
            },
            TbyReferAll { .. } => TbyReferAll {
                admission: time(&self.tby_refer_all_admission_time),
                discharge: time(&self.tby_refer_all_discharge_time),
                groin_puncture: time(&self.tby_refer_all_bolus_time),
            },
            TbyReferLim { .. } => TbyReferLim {
                admission: time(&self.tby_refer_lim_admission_time),
                discharge: time(&self.tby_refer_lim_discharge_time),
                groin_puncture: time(&self.tby_refer_lim_bolus_time),
            },
            NotDone | ReturnedAfterElsewhere => pathway,
        }
    }
}

impl TryFrom<&RawEncounter> for ClinicalEvent {
    type Error = EngineError;

    fn try_from(raw: &RawEncounter) -> EngineResult<Self> {
        let protocol_id = raw
            .protocol_id
            .clone()
            .filter(|s| !is_absent(s))
            .ok_or_else(|| {
                EngineError::malformed_record("Protocol ID is missing", raw.context())
            })?;

        Ok(ClinicalEvent {
            protocol_id,
            site_id: raw.site_id.clone().filter(|s| !is_absent(s)),
            visit_date: raw.required_date("VISIT_DATE", &raw.visit_date)?,
            visit_time: time(&raw.visit_time),
            hospital_date: raw.required_date("HOSPITAL_DATE", &raw.hospital_date)?,
            hospital_time: time(&raw.hospital_time),
            discharge_date: raw.required_date("DISCHARGE_DATE", &raw.discharge_date)?,
            pathway: raw.pathway()?,
        })
    }
}

/// Parse a JSON array of encounters from a file
pub fn parse_encounters_json(path: &Path) -> Result<Vec<RawEncounter>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read encounter file: {}", path.display()))?;
    parse_encounters_json_str(&content)
}

/// Parse a JSON array of encounters from a string
pub fn parse_encounters_json_str(json_str: &str) -> Result<Vec<RawEncounter>> {
    let deserializer = &mut serde_json::Deserializer::from_str(json_str);
    serde_path_to_error::deserialize(deserializer)
        .map_err(|e| anyhow::anyhow!("Invalid encounter JSON at '{}': {}", e.path(), e.inner()))
}
