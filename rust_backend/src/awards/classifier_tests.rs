#[cfg(test)]
mod tests {
    use crate::awards::classifier::{AwardClassifier, StepOutcome};
    use crate::awards::criteria::{AwardPolicy, Metric};
    use crate::core::domain::{AwardTier, SiteMetricRow};
    use crate::observe::{AuditEvent, MemorySink, NullSink};
    use proptest::prelude::*;

    /// Row that reaches DIAMOND under every policy.
    fn diamond_row() -> SiteMetricRow {
        let mut row = SiteMetricRow::new("CZ_001", 120).with_eligible(25, 10);
        for metric in Metric::ALL {
            row = row.with_percentage(metric.column(), 95.0);
        }
        row
    }

    fn set(row: SiteMetricRow, metric: Metric, value: f64) -> SiteMetricRow {
        row.with_percentage(metric.column(), value)
    }

    fn classify(row: &SiteMetricRow) -> AwardTier {
        AwardClassifier::default().classify(row, &NullSink).tier
    }

    #[test]
    fn test_all_diamond_row() {
        assert_eq!(classify(&diamond_row()), AwardTier::Diamond);
    }

    #[test]
    fn test_failing_first_metric_gives_none() {
        let row = set(diamond_row(), Metric::DoorToNeedle60, 49.99);
        let decision = AwardClassifier::default().classify(&row, &NullSink);
        assert_eq!(decision.tier, AwardTier::None);
        assert!(decision.steps[1..]
            .iter()
            .all(|s| s.outcome == StepOutcome::Skipped));
    }

    #[test]
    fn test_gold_is_never_upgraded() {
        let row = set(diamond_row(), Metric::DoorToNeedle60, 60.0);
        let decision = AwardClassifier::default().classify(&row, &NullSink);
        assert_eq!(decision.tier, AwardTier::Gold);
        assert_eq!(decision.steps[0].after, AwardTier::Gold);
        assert!(decision.steps.iter().skip(1).all(|s| s.after == AwardTier::Gold));
    }

    #[test]
    fn test_secondary_time_compliance_caps_at_platinum() {
        let row = set(diamond_row(), Metric::DoorToNeedle45, 30.0);
        assert_eq!(classify(&row), AwardTier::Platinum);

        let gold = set(row, Metric::DoorToNeedle60, 55.0);
        assert_eq!(classify(&gold), AwardTier::Gold);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(
            classify(&set(diamond_row(), Metric::DoorToNeedle60, 74.99)),
            AwardTier::Gold
        );
        assert_eq!(
            classify(&set(diamond_row(), Metric::DoorToNeedle60, 75.0)),
            AwardTier::Diamond
        );
        // No gap between the GOLD and PLATINUM bands.
        assert_eq!(
            classify(&set(diamond_row(), Metric::CtMri, 84.995)),
            AwardTier::Gold
        );
        assert_eq!(
            classify(&set(diamond_row(), Metric::CtMri, 85.0)),
            AwardTier::Platinum
        );
        assert_eq!(
            classify(&set(diamond_row(), Metric::CtMri, 79.0)),
            AwardTier::None
        );
        assert_eq!(
            classify(&set(diamond_row(), Metric::RecanalizationRate, 14.0)),
            AwardTier::Gold
        );
        assert_eq!(
            classify(&set(diamond_row(), Metric::RecanalizationRate, 4.9)),
            AwardTier::None
        );
    }

    #[test]
    fn test_stroke_unit_has_no_none_floor() {
        let row = set(diamond_row(), Metric::StrokeUnit, 0.0);
        assert_eq!(classify(&row), AwardTier::Platinum);
    }

    #[test]
    fn test_zero_thrombolysis_eligible_is_vacuous() {
        let row = set(diamond_row(), Metric::DoorToNeedle60, 0.0)
            .with_eligible(0, 0);
        let sink = MemorySink::new();
        let decision = AwardClassifier::default().classify(&row, &sink);
        assert_eq!(decision.tier, AwardTier::Diamond);
        assert_eq!(decision.steps[0].outcome, StepOutcome::Vacuous);
        assert_eq!(
            sink.events()
                .iter()
                .filter(|e| matches!(e, AuditEvent::CriterionSkipped { .. }))
                .count(),
            4
        );
    }

    #[test]
    fn test_volume_gate() {
        let mut row = diamond_row();
        row.total_patients = 29;
        let decision = AwardClassifier::default().classify(&row, &NullSink);
        assert!(!decision.volume_gate_passed);
        assert_eq!(decision.tier, AwardTier::None);

        row.total_patients = 30;
        assert_eq!(classify(&row), AwardTier::Diamond);
    }

    #[test]
    fn test_missing_and_nan_percentages_read_as_zero() {
        let mut row = diamond_row();
        row.percentages.remove(Metric::CtMri.column());
        assert_eq!(classify(&row), AwardTier::None);

        let nan = set(diamond_row(), Metric::StrokeUnit, f64::NAN);
        assert_eq!(classify(&nan), AwardTier::Platinum);
    }

    #[test]
    fn test_thrombectomy_policy_min_eligible() {
        let classifier = AwardClassifier::new(AwardPolicy::Thrombectomy, 30, 4);
        let slow_groin = set(diamond_row(), Metric::DoorToGroin120, 60.0);

        let few = slow_groin.clone().with_eligible(25, 3);
        assert_eq!(classifier.classify(&few, &NullSink).tier, AwardTier::Diamond);

        let enough = slow_groin.with_eligible(25, 4);
        assert_eq!(classifier.classify(&enough, &NullSink).tier, AwardTier::Gold);

        let failing = set(diamond_row(), Metric::DoorToGroin120, 20.0);
        assert_eq!(classifier.classify(&failing, &NullSink).tier, AwardTier::None);
    }

    #[test]
    fn test_default_policy_applies_door_to_groin() {
        let classifier = AwardClassifier::default();
        assert_eq!(classifier.policy(), AwardPolicy::Thrombectomy);

        let row = set(diamond_row(), Metric::DoorToGroin120, 20.0).with_eligible(25, 10);
        let decision = classifier.classify(&row, &NullSink);
        assert_eq!(decision.tier, AwardTier::None);
        assert_eq!(
            decision.first_downgrade().map(|s| s.metric),
            Some(Metric::DoorToGroin120)
        );

        // the needle-only ladder stays available on request
        let needle_only = AwardClassifier::new(AwardPolicy::Standard, 30, 4);
        assert_eq!(needle_only.classify(&row, &NullSink).tier, AwardTier::Diamond);
    }

    #[test]
    fn test_recanalization_policy_ignores_needle_columns() {
        let classifier = AwardClassifier::new(AwardPolicy::Recanalization, 30, 4);
        let row = set(diamond_row(), Metric::DoorToNeedle60, 0.0);
        assert_eq!(classifier.classify(&row, &NullSink).tier, AwardTier::Diamond);

        let slow = set(diamond_row(), Metric::DoorToRecanalization45, 10.0);
        assert_eq!(classifier.classify(&slow, &NullSink).tier, AwardTier::Platinum);
    }

    #[test]
    fn test_downgrades_are_audited_with_trail() {
        let row = set(
            set(diamond_row(), Metric::DoorToNeedle45, 10.0),
            Metric::Anticoagulants,
            82.0,
        );
        let sink = MemorySink::new();
        let decision = AwardClassifier::default().classify(&row, &sink);
        assert_eq!(decision.tier, AwardTier::Gold);
        assert_eq!(decision.steps.len(), 10);

        let first = decision.first_downgrade().unwrap();
        assert_eq!(first.metric, Metric::DoorToNeedle45);
        assert_eq!(first.before, AwardTier::Diamond);
        assert_eq!(first.after, AwardTier::Platinum);

        let downgrades: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                AuditEvent::CriterionDowngraded { criterion, after, .. } => Some((criterion, after)),
                _ => None,
            })
            .collect();
        assert_eq!(
            downgrades,
            vec![
                ("door_to_needle_45".to_string(), AwardTier::Platinum),
                ("anticoagulants".to_string(), AwardTier::Gold),
            ]
        );
    }

    #[test]
    fn test_classify_all_serializes_proposed_award() {
        let rows = vec![diamond_row(), SiteMetricRow::new("SK_002", 3)];
        let awards = AwardClassifier::default().classify_all(&rows, &NullSink);
        assert_eq!(awards[0].site_id(), "CZ_001");
        assert_eq!(awards[1].tier(), AwardTier::None);

        let json = serde_json::to_value(&awards[0]).unwrap();
        assert_eq!(json["Proposed Award"], "DIAMOND");
        assert_eq!(json["Total Patients"], 120);
        assert_eq!(json[Metric::CtMri.column()], 95.0);
    }

    fn any_row() -> impl Strategy<Value = SiteMetricRow> {
        (
            0u64..200,
            0u64..20,
            0u64..20,
            proptest::collection::vec(0.0f64..100.0, Metric::ALL.len()),
        )
            .prop_map(|(total, lysis, ectomy, values)| {
                let mut row = SiteMetricRow::new("P", total).with_eligible(lysis, ectomy);
                for (metric, value) in Metric::ALL.iter().zip(values) {
                    row = row.with_percentage(metric.column(), value);
                }
                row
            })
    }

    fn any_policy() -> impl Strategy<Value = AwardPolicy> {
        prop_oneof![
            Just(AwardPolicy::Standard),
            Just(AwardPolicy::Thrombectomy),
            Just(AwardPolicy::Recanalization),
        ]
    }

    proptest! {
        #[test]
        fn prop_trail_is_non_increasing(row in any_row(), policy in any_policy()) {
            let decision = AwardClassifier::new(policy, 30, 4).classify(&row, &NullSink);
            for step in &decision.steps {
                prop_assert!(step.after <= step.before);
            }
            if let Some(last) = decision.steps.last() {
                prop_assert_eq!(last.after, decision.tier);
            }
        }

        #[test]
        fn prop_extra_criterion_never_upgrades(row in any_row(), policy in any_policy()) {
            let full = AwardClassifier::new(policy, 30, 4);
            let criteria = full.criteria().to_vec();
            for k in 0..criteria.len() {
                let shorter = full.clone().with_criteria(criteria[..k].to_vec());
                let longer = full.clone().with_criteria(criteria[..=k].to_vec());
                prop_assert!(
                    longer.classify(&row, &NullSink).tier <= shorter.classify(&row, &NullSink).tier
                );
            }
        }
    }
}
