//! Audit sinks for reconciliation and classification outcomes.
//!
//! The engine never configures logging itself. Callers pass an [`AuditSink`]
//! into the reconciler and classifier; [`LogSink`] forwards events to the `log`
//! facade, [`MemorySink`] keeps them for inspection.

use std::sync::Mutex;

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::domain::{AwardTier, Measurement};
use crate::timeline::stay::StayEdit;

/// A noteworthy outcome produced while processing one record or site row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    StayRepaired {
        record_id: String,
        hospital_date: NaiveDate,
        discharge_date: NaiveDate,
        stay_days: i64,
        edits: Vec<StayEdit>,
    },
    StayUnresolved {
        record_id: String,
        hospital_date: NaiveDate,
        discharge_date: NaiveDate,
        raw_stay_days: i64,
    },
    DurationFallback {
        record_id: String,
        measurement: Measurement,
        minutes: i64,
    },
    DurationImplausible {
        record_id: String,
        measurement: Measurement,
        minutes: i64,
        ceiling: i64,
    },
    CriterionDowngraded {
        site_id: String,
        criterion: String,
        value: f64,
        before: AwardTier,
        after: AwardTier,
    },
    CriterionSkipped {
        site_id: String,
        criterion: String,
        eligible: u64,
    },
}

impl AuditEvent {
    /// Log target under which the event is reported.
    pub fn target(&self) -> &'static str {
        match self {
            AuditEvent::StayRepaired { .. } | AuditEvent::StayUnresolved { .. } => {
                "resq::timeline::stay"
            }
            AuditEvent::DurationFallback { .. } | AuditEvent::DurationImplausible { .. } => {
                "resq::timeline::clock"
            }
            AuditEvent::CriterionDowngraded { .. } | AuditEvent::CriterionSkipped { .. } => {
                "resq::awards"
            }
        }
    }
}

/// Receiver of audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AuditSink for LogSink {
    fn record(&self, event: AuditEvent) {
        let target = event.target();
        match &event {
            AuditEvent::StayRepaired {
                record_id,
                hospital_date,
                discharge_date,
                stay_days,
                edits,
            } => log::info!(
                target: target,
                "record {}: stay repaired to {}..{} ({} days) via {:?}",
                record_id,
                hospital_date,
                discharge_date,
                stay_days,
                edits
            ),
            AuditEvent::StayUnresolved {
                record_id,
                hospital_date,
                discharge_date,
                raw_stay_days,
            } => log::warn!(
                target: target,
                "record {}: stay {}..{} unresolved ({} days)",
                record_id,
                hospital_date,
                discharge_date,
                raw_stay_days
            ),
            AuditEvent::DurationFallback {
                record_id,
                measurement,
                minutes,
            } => log::debug!(
                target: target,
                "record {}: {} recomputed from hospital time ({} min)",
                record_id,
                measurement.column(),
                minutes
            ),
            AuditEvent::DurationImplausible {
                record_id,
                measurement,
                minutes,
                ceiling,
            } => log::warn!(
                target: target,
                "record {}: {} = {} min outside 1..={}",
                record_id,
                measurement.column(),
                minutes,
                ceiling
            ),
            AuditEvent::CriterionDowngraded {
                site_id,
                criterion,
                value,
                before,
                after,
            } => log::debug!(
                target: target,
                "site {}: {} = {:.2} lowered {} -> {}",
                site_id,
                criterion,
                value,
                before,
                after
            ),
            AuditEvent::CriterionSkipped {
                site_id,
                criterion,
                eligible,
            } => log::trace!(
                target: target,
                "site {}: {} skipped ({} eligible)",
                site_id,
                criterion,
                eligible
            ),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    fn record(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.record(AuditEvent::CriterionSkipped {
            site_id: "A".to_string(),
            criterion: "dtn_60".to_string(),
            eligible: 0,
        });
        sink.record(AuditEvent::DurationFallback {
            record_id: "P-1".to_string(),
            measurement: Measurement::IvtOnlyNeedle,
            minutes: 30,
        });
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].target(), "resq::awards");
        assert_eq!(events[1].target(), "resq::timeline::clock");
    }

    #[test]
    fn test_null_and_log_sinks_accept_events() {
        let event = AuditEvent::StayUnresolved {
            record_id: "P-2".to_string(),
            hospital_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            discharge_date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            raw_stay_days: 731,
        };
        NullSink.record(event.clone());
        LogSink.record(event);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = AuditEvent::CriterionSkipped {
            site_id: "A".to_string(),
            criterion: "dtn_60".to_string(),
            eligible: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "criterion_skipped");
    }
}
