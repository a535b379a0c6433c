//! Award criteria and the policies that order them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::awards::ladder::{Band, Ladder, HOLD};
use crate::core::domain::{AwardTier, SiteMetricRow};

/// A percentage metric read from the site row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DoorToNeedle60,
    DoorToNeedle45,
    DoorToGroin120,
    DoorToGroin90,
    DoorToRecanalization60,
    DoorToRecanalization45,
    RecanalizationRate,
    CtMri,
    DysphagiaScreening,
    Antiplatelets,
    Anticoagulants,
    StrokeUnit,
}

impl Metric {
    /// Registry statistics column holding the percentage.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::DoorToNeedle60 => "% patients treated with door to thrombolysis < 60 minutes",
            Metric::DoorToNeedle45 => "% patients treated with door to thrombolysis < 45 minutes",
            Metric::DoorToGroin120 => "% patients treated with door to thrombectomy < 120 minutes",
            Metric::DoorToGroin90 => "% patients treated with door to thrombectomy < 90 minutes",
            Metric::DoorToRecanalization60 => {
                "% patients treated with door to recanalization therapy < 60 minutes"
            }
            Metric::DoorToRecanalization45 => {
                "% patients treated with door to recanalization therapy < 45 minutes"
            }
            Metric::RecanalizationRate => "% recanalization rate out of total ischemic incidence",
            Metric::CtMri => "% suspected stroke patients undergoing CT/MRI",
            Metric::DysphagiaScreening => "% all stroke patients undergoing dysphagia screening",
            Metric::Antiplatelets => {
                "% ischemic stroke patients discharged (home) with antiplatelets"
            }
            Metric::Anticoagulants => "% afib patients discharged (home) with anticoagulants",
            Metric::StrokeUnit => "% stroke patients treated in a dedicated stroke unit / ICU",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::DoorToNeedle60 => "door_to_needle_60",
            Metric::DoorToNeedle45 => "door_to_needle_45",
            Metric::DoorToGroin120 => "door_to_groin_120",
            Metric::DoorToGroin90 => "door_to_groin_90",
            Metric::DoorToRecanalization60 => "door_to_recanalization_60",
            Metric::DoorToRecanalization45 => "door_to_recanalization_45",
            Metric::RecanalizationRate => "recanalization_rate",
            Metric::CtMri => "ct_mri",
            Metric::DysphagiaScreening => "dysphagia_screening",
            Metric::Antiplatelets => "antiplatelets",
            Metric::Anticoagulants => "anticoagulants",
            Metric::StrokeUnit => "stroke_unit",
        }
    }

    /// Every metric column the site row parser should read.
    pub const ALL: [Metric; 12] = [
        Metric::DoorToNeedle60,
        Metric::DoorToNeedle45,
        Metric::DoorToGroin120,
        Metric::DoorToGroin90,
        Metric::DoorToRecanalization60,
        Metric::DoorToRecanalization45,
        Metric::RecanalizationRate,
        Metric::CtMri,
        Metric::DysphagiaScreening,
        Metric::Antiplatelets,
        Metric::Anticoagulants,
        Metric::StrokeUnit,
    ];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eligible population a criterion is conditioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denominator {
    Thrombolysis,
    Thrombectomy,
    /// Always evaluated.
    Unconditional,
}

impl Denominator {
    /// Eligible count for this denominator, `None` when unconditional.
    pub fn eligible(&self, row: &SiteMetricRow) -> Option<u64> {
        match self {
            Denominator::Thrombolysis => Some(row.eligible_thrombolysis),
            Denominator::Thrombectomy => Some(row.eligible_thrombectomy),
            Denominator::Unconditional => None,
        }
    }
}

/// One step of an award policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub metric: Metric,
    pub denominator: Denominator,
    /// Fewer eligible patients than this leaves the tier untouched.
    pub min_eligible: u64,
    pub ladder: Ladder,
}

impl Criterion {
    pub fn new(metric: Metric, ladder: Ladder) -> Self {
        Self {
            metric,
            denominator: Denominator::Unconditional,
            min_eligible: 0,
            ladder,
        }
    }

    pub fn on(mut self, denominator: Denominator, min_eligible: u64) -> Self {
        self.denominator = denominator;
        self.min_eligible = min_eligible;
        self
    }

    /// Whether the row's eligible population is too small for this criterion to apply.
    pub fn is_vacuous(&self, row: &SiteMetricRow) -> bool {
        match self.denominator.eligible(row) {
            Some(eligible) => eligible < self.min_eligible,
            None => false,
        }
    }
}

fn time_compliance_primary() -> Ladder {
    Ladder::new(vec![Band::at(50.0, AwardTier::Gold), Band::at(75.0, HOLD)])
}

fn time_compliance_secondary() -> Ladder {
    Ladder::new(vec![Band::below(AwardTier::Platinum), Band::at(50.0, HOLD)])
}

fn care_rate() -> Ladder {
    Ladder::new(vec![
        Band::at(80.0, AwardTier::Gold),
        Band::at(85.0, AwardTier::Platinum),
        Band::at(90.0, HOLD),
    ])
}

fn tail_criteria() -> Vec<Criterion> {
    vec![
        Criterion::new(
            Metric::RecanalizationRate,
            Ladder::new(vec![
                Band::at(5.0, AwardTier::Gold),
                Band::at(15.0, AwardTier::Platinum),
                Band::at(25.0, HOLD),
            ]),
        ),
        Criterion::new(Metric::CtMri, care_rate()),
        Criterion::new(Metric::DysphagiaScreening, care_rate()),
        Criterion::new(Metric::Antiplatelets, care_rate()),
        Criterion::new(Metric::Anticoagulants, care_rate()),
        Criterion::new(
            Metric::StrokeUnit,
            Ladder::new(vec![Band::below(AwardTier::Platinum), Band::at(1.0, HOLD)]),
        ),
    ]
}

/// Variant of the award ladder to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AwardPolicy {
    /// Door-to-needle compliance, then the shared tail. No door-to-groin rules.
    Standard,
    /// Standard plus door-to-groin compliance. The registry's award ladder.
    #[default]
    Thrombectomy,
    /// Door-to-recanalization compliance in place of door-to-needle.
    Recanalization,
}

impl AwardPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwardPolicy::Standard => "standard",
            AwardPolicy::Thrombectomy => "thrombectomy",
            AwardPolicy::Recanalization => "recanalization",
        }
    }

    /// Ordered criteria for this policy.
    ///
    /// # Arguments
    ///
    /// * `thrombectomy_min_eligible` - Minimum thrombectomy-eligible patients
    ///   for the door-to-groin criteria to apply
    ///
    /// # Examples
    ///
    /// ```
    /// use resq_rust::awards::criteria::{AwardPolicy, Metric};
    ///
    /// let order: Vec<Metric> = AwardPolicy::Standard
    ///     .criteria(4)
    ///     .iter()
    ///     .map(|c| c.metric)
    ///     .collect();
    /// assert_eq!(order[0], Metric::DoorToNeedle60);
    /// assert_eq!(order[1], Metric::DoorToNeedle45);
    /// assert_eq!(order.last(), Some(&Metric::StrokeUnit));
    /// ```
    pub fn criteria(&self, thrombectomy_min_eligible: u64) -> Vec<Criterion> {
        let mut criteria = match self {
            AwardPolicy::Standard | AwardPolicy::Thrombectomy => vec![
                Criterion::new(Metric::DoorToNeedle60, time_compliance_primary())
                    .on(Denominator::Thrombolysis, 1),
                Criterion::new(Metric::DoorToNeedle45, time_compliance_secondary())
                    .on(Denominator::Thrombolysis, 1),
            ],
            AwardPolicy::Recanalization => vec![
                Criterion::new(Metric::DoorToRecanalization60, time_compliance_primary()),
                Criterion::new(Metric::DoorToRecanalization45, time_compliance_secondary()),
            ],
        };
        if *self == AwardPolicy::Thrombectomy {
            criteria.push(
                Criterion::new(Metric::DoorToGroin120, time_compliance_primary())
                    .on(Denominator::Thrombectomy, thrombectomy_min_eligible),
            );
            criteria.push(
                Criterion::new(Metric::DoorToGroin90, time_compliance_secondary())
                    .on(Denominator::Thrombectomy, thrombectomy_min_eligible),
            );
        }
        criteria.extend(tail_criteria());
        criteria
    }
}

impl FromStr for AwardPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(AwardPolicy::Standard),
            "thrombectomy" => Ok(AwardPolicy::Thrombectomy),
            "recanalization" => Ok(AwardPolicy::Recanalization),
            other => Err(format!("Unknown award policy: {}", other)),
        }
    }
}

impl fmt::Display for AwardPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(policy: AwardPolicy) -> Vec<Metric> {
        policy.criteria(4).iter().map(|c| c.metric).collect()
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            metrics(AwardPolicy::Standard),
            vec![
                Metric::DoorToNeedle60,
                Metric::DoorToNeedle45,
                Metric::RecanalizationRate,
                Metric::CtMri,
                Metric::DysphagiaScreening,
                Metric::Antiplatelets,
                Metric::Anticoagulants,
                Metric::StrokeUnit,
            ]
        );
    }

    #[test]
    fn test_thrombectomy_inserts_groin_after_needle() {
        let order = metrics(AwardPolicy::Thrombectomy);
        assert_eq!(order[2], Metric::DoorToGroin120);
        assert_eq!(order[3], Metric::DoorToGroin90);
        assert_eq!(order.len(), 10);

        let criteria = AwardPolicy::Thrombectomy.criteria(6);
        assert_eq!(criteria[2].min_eligible, 6);
        assert_eq!(criteria[2].denominator, Denominator::Thrombectomy);
    }

    #[test]
    fn test_recanalization_replaces_needle() {
        let order = metrics(AwardPolicy::Recanalization);
        assert_eq!(order[0], Metric::DoorToRecanalization60);
        assert_eq!(order[1], Metric::DoorToRecanalization45);
        assert!(!order.contains(&Metric::DoorToNeedle60));
    }

    #[test]
    fn test_vacuous_criterion() {
        let row = SiteMetricRow::new("A", 40).with_eligible(0, 3);
        let criteria = AwardPolicy::Thrombectomy.criteria(4);
        assert!(criteria[0].is_vacuous(&row));
        assert!(criteria[2].is_vacuous(&row));
        assert!(!criteria[4].is_vacuous(&row));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Thrombectomy".parse::<AwardPolicy>(), Ok(AwardPolicy::Thrombectomy));
        assert!("diamond".parse::<AwardPolicy>().is_err());
        assert_eq!(AwardPolicy::default(), AwardPolicy::Thrombectomy);
    }
}
