//! Award classification as a fold over ordered criteria.
//!
//! The tier starts at `Diamond` when the site passes the volume gate and at
//! `None` otherwise. Each criterion can only lower it; once `None` is reached
//! the remaining criteria are skipped.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::awards::criteria::{AwardPolicy, Criterion, Metric};
use crate::config::AwardSettings;
use crate::core::domain::{AwardTier, SiteMetricRow};
use crate::observe::{AuditEvent, AuditSink};
use crate::parsing::site_rows::{
    ELIGIBLE_THROMBECTOMY_COLUMN, ELIGIBLE_THROMBOLYSIS_COLUMN, SITE_ID_COLUMN,
    TOTAL_PATIENTS_COLUMN,
};

/// Column appended to each classified site row.
pub const PROPOSED_AWARD_COLUMN: &str = "Proposed Award";

/// How a criterion was handled for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    /// Eligible population below the criterion's minimum.
    Vacuous,
    /// Tier was already `None`.
    Skipped,
}

/// One entry of the classification trail.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CriterionStep {
    pub metric: Metric,
    pub value: f64,
    pub before: AwardTier,
    pub after: AwardTier,
    pub outcome: StepOutcome,
}

/// Final tier together with the trail that produced it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AwardDecision {
    pub tier: AwardTier,
    pub volume_gate_passed: bool,
    pub steps: Vec<CriterionStep>,
}

impl AwardDecision {
    /// First criterion that lowered the tier, if any.
    pub fn first_downgrade(&self) -> Option<&CriterionStep> {
        self.steps.iter().find(|s| s.after < s.before)
    }
}

/// Classification result for one site row.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteAward {
    pub row: SiteMetricRow,
    pub decision: AwardDecision,
}

impl SiteAward {
    pub fn site_id(&self) -> &str {
        &self.row.site_id
    }

    pub fn tier(&self) -> AwardTier {
        self.decision.tier
    }
}

impl Serialize for SiteAward {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(SITE_ID_COLUMN, &self.row.site_id)?;
        map.serialize_entry(TOTAL_PATIENTS_COLUMN, &self.row.total_patients)?;
        map.serialize_entry(ELIGIBLE_THROMBOLYSIS_COLUMN, &self.row.eligible_thrombolysis)?;
        map.serialize_entry(ELIGIBLE_THROMBECTOMY_COLUMN, &self.row.eligible_thrombectomy)?;
        for (column, value) in &self.row.percentages {
            map.serialize_entry(column, value)?;
        }
        map.serialize_entry(PROPOSED_AWARD_COLUMN, &self.decision.tier)?;
        map.end()
    }
}

/// Applies an ordered list of criteria to site rows.
#[derive(Debug, Clone, PartialEq)]
pub struct AwardClassifier {
    policy: AwardPolicy,
    min_total_patients: u64,
    criteria: Vec<Criterion>,
}

impl Default for AwardClassifier {
    fn default() -> Self {
        Self::from_settings(&AwardSettings::default())
    }
}

impl AwardClassifier {
    pub fn new(policy: AwardPolicy, min_total_patients: u64, thrombectomy_min_eligible: u64) -> Self {
        Self {
            policy,
            min_total_patients,
            criteria: policy.criteria(thrombectomy_min_eligible),
        }
    }

    pub fn from_settings(settings: &AwardSettings) -> Self {
        Self::new(
            settings.policy,
            settings.min_total_patients,
            settings.thrombectomy_min_eligible,
        )
    }

    /// Replace the policy's criteria with a custom list.
    pub fn with_criteria(mut self, criteria: Vec<Criterion>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn policy(&self) -> AwardPolicy {
        self.policy
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Classify one site row.
    ///
    /// # Examples
    ///
    /// ```
    /// use resq_rust::awards::classifier::AwardClassifier;
    /// use resq_rust::core::domain::{AwardTier, SiteMetricRow};
    /// use resq_rust::observe::NullSink;
    ///
    /// let classifier = AwardClassifier::default();
    /// let small_site = SiteMetricRow::new("XX_001", 12);
    /// let decision = classifier.classify(&small_site, &NullSink);
    /// assert_eq!(decision.tier, AwardTier::None);
    /// assert!(!decision.volume_gate_passed);
    /// ```
    pub fn classify(&self, row: &SiteMetricRow, sink: &dyn AuditSink) -> AwardDecision {
        let volume_gate_passed = row.total_patients >= self.min_total_patients;
        let start = if volume_gate_passed {
            AwardTier::Diamond
        } else {
            AwardTier::None
        };

        let mut steps = Vec::with_capacity(self.criteria.len());
        let tier = self.criteria.iter().fold(start, |before, criterion| {
            let value = row.percentage(criterion.metric.column());
            let (after, outcome) = if before == AwardTier::None {
                (before, StepOutcome::Skipped)
            } else if criterion.is_vacuous(row) {
                sink.record(AuditEvent::CriterionSkipped {
                    site_id: row.site_id.clone(),
                    criterion: criterion.metric.to_string(),
                    eligible: criterion.denominator.eligible(row).unwrap_or(0),
                });
                (before, StepOutcome::Vacuous)
            } else {
                (criterion.ladder.apply(before, value), StepOutcome::Applied)
            };

            if after < before {
                sink.record(AuditEvent::CriterionDowngraded {
                    site_id: row.site_id.clone(),
                    criterion: criterion.metric.to_string(),
                    value,
                    before,
                    after,
                });
            }
            steps.push(CriterionStep {
                metric: criterion.metric,
                value,
                before,
                after,
                outcome,
            });
            after
        });

        AwardDecision {
            tier,
            volume_gate_passed,
            steps,
        }
    }

    /// Classify every row; output order matches input order.
    pub fn classify_all(&self, rows: &[SiteMetricRow], sink: &dyn AuditSink) -> Vec<SiteAward> {
        rows.iter()
            .map(|row| SiteAward {
                row: row.clone(),
                decision: self.classify(row, sink),
            })
            .collect()
    }
}
