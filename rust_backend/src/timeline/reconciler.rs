//! Per-encounter reconciliation.
//!
//! [`Reconciler`] turns one parsed [`ClinicalEvent`] into a [`ReconciledEvent`]:
//! the recorded dates are kept under `*_OLD` columns, the repaired stay and
//! every duration measurement implied by the recanalization pathway are added,
//! and each notable outcome is reported to the caller's [`AuditSink`].

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::ReconcilerSettings;
use crate::core::domain::{ClinicalEvent, DurationCeilings, Measurement};
use crate::observe::{AuditEvent, AuditSink};
use crate::timeline::calendar::days_between;
use crate::timeline::clock::ProcedureDuration;
use crate::timeline::stay::{repair_stay_dates, StayEdit, StayPolicy};

/// An encounter after stay repair and duration measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledEvent {
    pub protocol_id: String,
    pub site_id: Option<String>,
    pub pathway_code: Option<i64>,
    pub visit_date_old: NaiveDate,
    pub hospital_date_old: NaiveDate,
    pub discharge_date_old: NaiveDate,
    /// Raw recorded stay, possibly negative.
    pub hospital_days_old: i64,
    pub visit_date: NaiveDate,
    pub hospital_date: NaiveDate,
    pub discharge_date: NaiveDate,
    pub hospital_days: i64,
    pub hospital_days_fixed: bool,
    pub hospital_days_resolved: bool,
    pub stay_edits: Vec<StayEdit>,
    pub durations: BTreeMap<Measurement, ProcedureDuration>,
}

impl ReconciledEvent {
    /// Any measured duration of the active pathway is zero or above its ceiling.
    pub fn incorrect_times(&self) -> bool {
        self.durations.values().any(|d| !d.is_plausible())
    }

    pub fn duration(&self, measurement: Measurement) -> Option<&ProcedureDuration> {
        self.durations.get(&measurement)
    }

    /// Number of durations where a fallback rule fired on measured readings.
    pub fn fixed_durations(&self) -> usize {
        self.durations
            .values()
            .filter(|d| d.measured && d.was_fixed)
            .count()
    }

    pub fn implausible_durations(&self) -> usize {
        self.durations.values().filter(|d| !d.is_plausible()).count()
    }
}

impl Serialize for ReconciledEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("Protocol ID", &self.protocol_id)?;
        map.serialize_entry("Site ID", &self.site_id)?;
        map.serialize_entry("RECANALIZATION_PROCEDURES", &self.pathway_code)?;
        map.serialize_entry("VISIT_DATE_OLD", &self.visit_date_old)?;
        map.serialize_entry("HOSPITAL_DATE_OLD", &self.hospital_date_old)?;
        map.serialize_entry("DISCHARGE_DATE_OLD", &self.discharge_date_old)?;
        map.serialize_entry("HOSPITAL_DAYS_OLD", &self.hospital_days_old)?;
        map.serialize_entry("VISIT_DATE", &self.visit_date)?;
        map.serialize_entry("HOSPITAL_DATE", &self.hospital_date)?;
        map.serialize_entry("DISCHARGE_DATE", &self.discharge_date)?;
        map.serialize_entry("HOSPITAL_DAYS", &self.hospital_days)?;
        map.serialize_entry("HOSPITAL_DAYS_FIXED", &self.hospital_days_fixed)?;
        map.serialize_entry("HOSPITAL_DAYS_RESOLVED", &self.hospital_days_resolved)?;
        for (measurement, duration) in &self.durations {
            map.serialize_entry(measurement.column(), &duration.minutes)?;
            map.serialize_entry(&measurement.changed_column(), &duration.was_fixed)?;
        }
        map.serialize_entry("INCORRECT_TIMES", &self.incorrect_times())?;
        map.end()
    }
}

/// Applies stay repair and duration measurement to encounters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciler {
    policy: StayPolicy,
    ceilings: DurationCeilings,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::from_settings(&ReconcilerSettings::default())
    }
}

impl Reconciler {
    pub fn new(policy: StayPolicy, ceilings: DurationCeilings) -> Self {
        Self { policy, ceilings }
    }

    pub fn from_settings(settings: &ReconcilerSettings) -> Self {
        Self::new(settings.stay_policy(), settings.ceilings())
    }

    pub fn policy(&self) -> &StayPolicy {
        &self.policy
    }

    pub fn ceilings(&self) -> &DurationCeilings {
        &self.ceilings
    }

    /// Reconcile one encounter.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use resq_rust::core::domain::{ClinicalEvent, DurationCeilings};
    /// use resq_rust::observe::NullSink;
    /// use resq_rust::timeline::reconciler::Reconciler;
    /// use resq_rust::timeline::stay::StayPolicy;
    ///
    /// let day = NaiveDate::from_ymd_opt(2019, 6, 30).unwrap();
    /// let reconciler = Reconciler::new(StayPolicy::new(2024), DurationCeilings::default());
    /// let out = reconciler.reconcile(&ClinicalEvent::new("P-1", day, day, day), &NullSink);
    /// assert_eq!(out.hospital_days, 1);
    /// assert!(!out.hospital_days_fixed);
    /// ```
    pub fn reconcile(&self, event: &ClinicalEvent, sink: &dyn AuditSink) -> ReconciledEvent {
        let repair = repair_stay_dates(
            event.visit_date,
            event.hospital_date,
            event.discharge_date,
            &self.policy,
        );

        if repair.was_corrected {
            sink.record(AuditEvent::StayRepaired {
                record_id: event.protocol_id.clone(),
                hospital_date: repair.hospital_date,
                discharge_date: repair.discharge_date,
                stay_days: repair.stay_days,
                edits: repair.edits.clone(),
            });
        }
        if !repair.resolved {
            sink.record(AuditEvent::StayUnresolved {
                record_id: event.protocol_id.clone(),
                hospital_date: repair.hospital_date,
                discharge_date: repair.discharge_date,
                raw_stay_days: repair.stay_days,
            });
        }

        let mut durations = BTreeMap::new();
        if let Some(pathway) = &event.pathway {
            for (measurement, times) in pathway.measurements() {
                let ceiling = self.ceilings.for_kind(measurement.kind());
                let duration = ProcedureDuration::measure(
                    times.admission,
                    times.target,
                    event.hospital_time,
                    ceiling,
                );
                self.audit_duration(&event.protocol_id, measurement, &duration, sink);
                durations.insert(measurement, duration);
            }
        }

        ReconciledEvent {
            protocol_id: event.protocol_id.clone(),
            site_id: event.site_id.clone(),
            pathway_code: event.pathway.as_ref().map(|p| p.code()),
            visit_date_old: event.visit_date,
            hospital_date_old: event.hospital_date,
            discharge_date_old: event.discharge_date,
            hospital_days_old: days_between(event.hospital_date, event.discharge_date),
            visit_date: event.visit_date,
            hospital_date: repair.hospital_date,
            discharge_date: repair.discharge_date,
            hospital_days: repair.stay_days,
            hospital_days_fixed: repair.was_corrected,
            hospital_days_resolved: repair.resolved,
            stay_edits: repair.edits,
            durations,
        }
    }

    /// Reconcile a batch; output order matches input order.
    pub fn reconcile_all(
        &self,
        events: &[ClinicalEvent],
        sink: &dyn AuditSink,
    ) -> Vec<ReconciledEvent> {
        events.iter().map(|e| self.reconcile(e, sink)).collect()
    }

    fn audit_duration(
        &self,
        record_id: &str,
        measurement: Measurement,
        duration: &ProcedureDuration,
        sink: &dyn AuditSink,
    ) {
        if duration.measured && duration.was_fixed {
            sink.record(AuditEvent::DurationFallback {
                record_id: record_id.to_string(),
                measurement,
                minutes: duration.minutes,
            });
        }
        if !duration.is_plausible() {
            sink.record(AuditEvent::DurationImplausible {
                record_id: record_id.to_string(),
                measurement,
                minutes: duration.minutes,
                ceiling: duration.ceiling,
            });
        }
    }
}
