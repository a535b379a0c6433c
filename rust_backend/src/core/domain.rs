//! Domain models for stroke-registry encounters and per-site quality rows.
//!
//! This module provides the core data structures shared by the timeline
//! reconciler and the award classifier: the encounter record with its
//! recanalization pathway, the duration measurements each pathway implies,
//! the aggregated site row, and the ordered award tier.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Quality award tier, ordered `None < Gold < Platinum < Diamond`.
///
/// # Examples
///
/// ```
/// use resq_rust::core::domain::AwardTier;
///
/// assert!(AwardTier::Gold < AwardTier::Platinum);
/// assert_eq!(AwardTier::Diamond.as_str(), "DIAMOND");
/// assert_eq!(AwardTier::Gold.min(AwardTier::Platinum), AwardTier::Gold);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AwardTier {
    None,
    Gold,
    Platinum,
    Diamond,
}

impl AwardTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwardTier::None => "NONE",
            AwardTier::Gold => "GOLD",
            AwardTier::Platinum => "PLATINUM",
            AwardTier::Diamond => "DIAMOND",
        }
    }
}

impl fmt::Display for AwardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family of a procedure-duration measurement, which fixes its plausibility ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureKind {
    /// Door-to-needle (thrombolysis bolus).
    Needle,
    /// Door-to-groin (endovascular puncture).
    Groin,
    /// Door-in-door-out (transfer for endovascular treatment).
    Dido,
}

/// Plausibility ceilings in minutes per procedure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationCeilings {
    pub needle_minutes: i64,
    pub groin_minutes: i64,
}

impl Default for DurationCeilings {
    fn default() -> Self {
        Self {
            needle_minutes: 400,
            groin_minutes: 700,
        }
    }
}

impl DurationCeilings {
    /// Ceiling for the given procedure family. DIDO shares the groin ceiling.
    pub fn for_kind(&self, kind: ProcedureKind) -> i64 {
        match kind {
            ProcedureKind::Needle => self.needle_minutes,
            ProcedureKind::Groin | ProcedureKind::Dido => self.groin_minutes,
        }
    }
}

/// One derived duration column of the reconciled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Measurement {
    IvtOnlyNeedle,
    IvtTbyNeedle,
    IvtTbyGroin,
    IvtTbyReferNeedle,
    IvtTbyReferDido,
    TbyOnlyGroin,
    TbyReferDido,
    TbyReferAllDido,
    TbyReferAllGroin,
    TbyReferLimDido,
    TbyReferLimGroin,
}

impl Measurement {
    pub const ALL: [Measurement; 11] = [
        Measurement::IvtOnlyNeedle,
        Measurement::IvtTbyNeedle,
        Measurement::IvtTbyGroin,
        Measurement::IvtTbyReferNeedle,
        Measurement::IvtTbyReferDido,
        Measurement::TbyOnlyGroin,
        Measurement::TbyReferDido,
        Measurement::TbyReferAllDido,
        Measurement::TbyReferAllGroin,
        Measurement::TbyReferLimDido,
        Measurement::TbyReferLimGroin,
    ];

    pub fn kind(&self) -> ProcedureKind {
        use Measurement::*;
        match self {
            IvtOnlyNeedle | IvtTbyNeedle | IvtTbyReferNeedle => ProcedureKind::Needle,
            IvtTbyGroin | TbyOnlyGroin | TbyReferAllGroin | TbyReferLimGroin => {
                ProcedureKind::Groin
            }
            IvtTbyReferDido | TbyReferDido | TbyReferAllDido | TbyReferLimDido => {
                ProcedureKind::Dido
            }
        }
    }

    /// Registry column holding the computed minutes.
    pub fn column(&self) -> &'static str {
        use Measurement::*;
        match self {
            IvtOnlyNeedle => "IVT_ONLY_NEEDLE_TIME_MIN",
            IvtTbyNeedle => "IVT_TBY_NEEDLE_TIME_MIN",
            IvtTbyGroin => "IVT_TBY_GROIN_TIME_MIN",
            IvtTbyReferNeedle => "IVT_TBY_REFER_NEEDLE_TIME_MIN",
            IvtTbyReferDido => "IVT_TBY_REFER_DIDO_TIME_MIN",
            TbyOnlyGroin => "TBY_ONLY_GROIN_TIME_MIN",
            TbyReferDido => "TBY_REFER_DIDO_TIME_MIN",
            TbyReferAllDido => "TBY_REFER_ALL_DIDO_TIME_MIN",
            TbyReferAllGroin => "TBY_REFER_ALL_GROIN_PUNCTURE_TIME_MIN",
            TbyReferLimDido => "TBY_REFER_LIM_DIDO_TIME_MIN",
            TbyReferLimGroin => "TBY_REFER_LIM_GROIN_PUNCTURE_TIME_MIN",
        }
    }

    /// Registry column holding the fallback flag.
    ///
    /// The registry export drops the `_MIN` infix for the all-centre groin
    /// puncture flag only.
    pub fn changed_column(&self) -> String {
        match self {
            Measurement::TbyReferAllGroin => "TBY_REFER_ALL_GROIN_PUNCTURE_TIME_CHANGED".to_string(),
            _ => format!("{}_CHANGED", self.column()),
        }
    }
}

/// A pair of clock readings delimiting one procedure duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimePair {
    pub admission: Option<NaiveTime>,
    pub target: Option<NaiveTime>,
}

impl TimePair {
    pub fn new(admission: Option<NaiveTime>, target: Option<NaiveTime>) -> Self {
        Self { admission, target }
    }
}

/// Recanalization treatment route for an encounter.
///
/// Each variant carries exactly the clock readings its route records, so the
/// set of derivable measurements follows from the variant alone. The integer
/// codes are those of the registry's `RECANALIZATION_PROCEDURES` column.
///
/// # Examples
///
/// ```
/// use resq_rust::core::domain::{Measurement, RecanalizationPathway};
///
/// let pathway = RecanalizationPathway::from_code(1).unwrap();
/// assert!(pathway.measurements().is_empty());
/// assert!(RecanalizationPathway::from_code(12).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecanalizationPathway {
    /// Code 1.
    NotDone,
    /// Code 2: IV thrombolysis only.
    IvtOnly {
        admission: Option<NaiveTime>,
        bolus: Option<NaiveTime>,
    },
    /// Code 3: IV thrombolysis followed by endovascular treatment.
    IvtTby {
        admission: Option<NaiveTime>,
        bolus: Option<NaiveTime>,
        groin_puncture: Option<NaiveTime>,
    },
    /// Code 4: endovascular treatment only.
    TbyOnly {
        admission: Option<NaiveTime>,
        groin_puncture: Option<NaiveTime>,
    },
    /// Code 5: IV thrombolysis, then referred for endovascular treatment.
    IvtTbyRefer {
        admission: Option<NaiveTime>,
        bolus: Option<NaiveTime>,
        discharge: Option<NaiveTime>,
    },
    /// Code 6: referred for endovascular treatment.
    TbyRefer {
        admission: Option<NaiveTime>,
        discharge: Option<NaiveTime>,
    },
    /// Code 7: referred, hospitalization continues at the receiving centre.
    TbyReferAll {
        admission: Option<NaiveTime>,
        discharge: Option<NaiveTime>,
        groin_puncture: Option<NaiveTime>,
    },
    /// Code 8: referred and returned to the initial centre.
    TbyReferLim {
        admission: Option<NaiveTime>,
        discharge: Option<NaiveTime>,
        groin_puncture: Option<NaiveTime>,
    },
    /// Code 9: returned after procedures performed elsewhere.
    ReturnedAfterElsewhere,
}

impl RecanalizationPathway {
    /// Build an empty pathway for a registry code; times are filled in by the parser.
    pub fn from_code(code: i64) -> Option<Self> {
        let pathway = match code {
            1 => Self::NotDone,
            2 => Self::IvtOnly {
                admission: None,
                bolus: None,
            },
            3 => Self::IvtTby {
                admission: None,
                bolus: None,
                groin_puncture: None,
            },
            4 => Self::TbyOnly {
                admission: None,
                groin_puncture: None,
            },
            5 => Self::IvtTbyRefer {
                admission: None,
                bolus: None,
                discharge: None,
            },
            6 => Self::TbyRefer {
                admission: None,
                discharge: None,
            },
            7 => Self::TbyReferAll {
                admission: None,
                discharge: None,
                groin_puncture: None,
            },
            8 => Self::TbyReferLim {
                admission: None,
                discharge: None,
                groin_puncture: None,
            },
            9 => Self::ReturnedAfterElsewhere,
            _ => return None,
        };
        Some(pathway)
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::NotDone => 1,
            Self::IvtOnly { .. } => 2,
            Self::IvtTby { .. } => 3,
            Self::TbyOnly { .. } => 4,
            Self::IvtTbyRefer { .. } => 5,
            Self::TbyRefer { .. } => 6,
            Self::TbyReferAll { .. } => 7,
            Self::TbyReferLim { .. } => 8,
            Self::ReturnedAfterElsewhere => 9,
        }
    }

    /// Measurements this pathway yields, each with its delimiting clock readings.
    pub fn measurements(&self) -> Vec<(Measurement, TimePair)> {
        match *self {
            Self::NotDone | Self::ReturnedAfterElsewhere => Vec::new(),
            Self::IvtOnly { admission, bolus } => {
                vec![(Measurement::IvtOnlyNeedle, TimePair::new(admission, bolus))]
            }
            Self::IvtTby {
                admission,
                bolus,
                groin_puncture,
            } => vec![
                (Measurement::IvtTbyNeedle, TimePair::new(admission, bolus)),
                (
                    Measurement::IvtTbyGroin,
                    TimePair::new(admission, groin_puncture),
                ),
            ],
            Self::TbyOnly {
                admission,
                groin_puncture,
            } => vec![(
                Measurement::TbyOnlyGroin,
                TimePair::new(admission, groin_puncture),
            )],
            Self::IvtTbyRefer {
                admission,
                bolus,
                discharge,
            } => vec![
                (
                    Measurement::IvtTbyReferNeedle,
                    TimePair::new(admission, bolus),
                ),
                (
                    Measurement::IvtTbyReferDido,
                    TimePair::new(admission, discharge),
                ),
            ],
            Self::TbyRefer {
                admission,
                discharge,
            } => vec![(
                Measurement::TbyReferDido,
                TimePair::new(admission, discharge),
            )],
            Self::TbyReferAll {
                admission,
                discharge,
                groin_puncture,
            } => vec![
                (
                    Measurement::TbyReferAllDido,
                    TimePair::new(admission, discharge),
                ),
                (
                    Measurement::TbyReferAllGroin,
                    TimePair::new(admission, groin_puncture),
                ),
            ],
            Self::TbyReferLim {
                admission,
                discharge,
                groin_puncture,
            } => vec![
                (
                    Measurement::TbyReferLimDido,
                    TimePair::new(admission, discharge),
                ),
                (
                    Measurement::TbyReferLimGroin,
                    TimePair::new(admission, groin_puncture),
                ),
            ],
        }
    }
}

/// One patient encounter as read from the registry export.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalEvent {
    pub protocol_id: String,
    pub site_id: Option<String>,
    pub visit_date: NaiveDate,
    pub visit_time: Option<NaiveTime>,
    pub hospital_date: NaiveDate,
    pub hospital_time: Option<NaiveTime>,
    pub discharge_date: NaiveDate,
    /// `None` when the encounter records no recanalization pathway at all.
    pub pathway: Option<RecanalizationPathway>,
}

impl ClinicalEvent {
    /// Creates an encounter with no pathway and no clock readings.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use resq_rust::core::domain::ClinicalEvent;
    ///
    /// let day = NaiveDate::from_ymd_opt(2019, 6, 30).unwrap();
    /// let event = ClinicalEvent::new("P-1", day, day, day);
    /// assert!(event.pathway.is_none());
    /// ```
    pub fn new(
        protocol_id: impl Into<String>,
        visit_date: NaiveDate,
        hospital_date: NaiveDate,
        discharge_date: NaiveDate,
    ) -> Self {
        Self {
            protocol_id: protocol_id.into(),
            site_id: None,
            visit_date,
            visit_time: None,
            hospital_date,
            hospital_time: None,
            discharge_date,
            pathway: None,
        }
    }

    pub fn with_hospital_time(mut self, time: NaiveTime) -> Self {
        self.hospital_time = Some(time);
        self
    }

    pub fn with_pathway(mut self, pathway: RecanalizationPathway) -> Self {
        self.pathway = Some(pathway);
        self
    }
}

/// Aggregated per-site metrics consumed by the award classifier.
///
/// Percentages are keyed by their registry column name. A column that is
/// absent reads as `0.0`, as does a non-finite value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteMetricRow {
    pub site_id: String,
    pub total_patients: u64,
    pub eligible_thrombolysis: u64,
    pub eligible_thrombectomy: u64,
    pub percentages: BTreeMap<String, f64>,
}

impl SiteMetricRow {
    pub fn new(site_id: impl Into<String>, total_patients: u64) -> Self {
        Self {
            site_id: site_id.into(),
            total_patients,
            ..Default::default()
        }
    }

    pub fn with_eligible(mut self, thrombolysis: u64, thrombectomy: u64) -> Self {
        self.eligible_thrombolysis = thrombolysis;
        self.eligible_thrombectomy = thrombectomy;
        self
    }

    pub fn with_percentage(mut self, column: impl Into<String>, value: f64) -> Self {
        self.percentages.insert(column.into(), value);
        self
    }

    /// Percentage for a column, treating missing and NaN as zero.
    pub fn percentage(&self, column: &str) -> f64 {
        match self.percentages.get(column) {
            Some(v) if v.is_finite() => *v,
            _ => 0.0,
        }
    }
}
