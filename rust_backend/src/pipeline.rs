use anyhow::{Context, Result};
use std::path::Path;

use crate::core::domain::ClinicalEvent;
use crate::error::EngineError;
use crate::io::loaders::EncounterLoader;
use crate::observe::AuditSink;
use crate::parsing::records::RawEncounter;
use crate::timeline::reconciler::{ReconciledEvent, Reconciler};

/// A record that could not be converted into a clinical event
#[derive(Debug)]
pub struct RejectedRecord {
    /// Position in the input array
    pub index: usize,
    pub protocol_id: Option<String>,
    pub error: EngineError,
}

/// Counters collected over one reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReconcileSummary {
    pub records: usize,
    pub corrected_stays: usize,
    pub unresolved_stays: usize,
    pub fixed_durations: usize,
    pub implausible_durations: usize,
    pub rejected: usize,
}

/// Result of a reconciliation run
#[derive(Debug)]
pub struct ReconcileResult {
    pub events: Vec<ReconciledEvent>,
    pub rejected: Vec<RejectedRecord>,
    pub summary: ReconcileSummary,
}

/// Configuration for the reconciliation pipeline
#[derive(Debug, Clone, Default)]
pub struct ReconcileConfig {
    pub reconciler: Reconciler,
    /// Abort on the first malformed record instead of collecting it
    pub fail_fast: bool,
}

/// Parse, convert and reconcile a batch of encounter records
pub struct ReconcilePipeline {
    config: ReconcileConfig,
}

impl ReconcilePipeline {
    /// Create a new pipeline with default configuration
    pub fn new() -> Self {
        Self {
            config: ReconcileConfig::default(),
        }
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: ReconcileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Process an encounter JSON file
    pub fn process(&self, path: &Path, sink: &dyn AuditSink) -> Result<ReconcileResult> {
        let raw = EncounterLoader::load_from_file(path)
            .with_context(|| format!("Failed to load encounters from {}", path.display()))?;
        self.process_raw(&raw, sink)
    }

    /// Process from a JSON string (useful for testing or API usage)
    pub fn process_json_str(&self, json_str: &str, sink: &dyn AuditSink) -> Result<ReconcileResult> {
        let raw = EncounterLoader::load_from_json_str(json_str)?;
        self.process_raw(&raw, sink)
    }

    /// Convert and reconcile already-decoded records.
    ///
    /// Malformed records are collected in [`ReconcileResult::rejected`] and do
    /// not stop the batch unless `fail_fast` is set.
    pub fn process_raw(&self, raw: &[RawEncounter], sink: &dyn AuditSink) -> Result<ReconcileResult> {
        let mut events = Vec::with_capacity(raw.len());
        let mut rejected = Vec::new();

        for (index, record) in raw.iter().enumerate() {
            match ClinicalEvent::try_from(record) {
                Ok(event) => events.push(event),
                Err(error) if self.config.fail_fast => {
                    return Err(anyhow::Error::new(error))
                        .with_context(|| format!("Malformed record #{}", index));
                }
                Err(error) => {
                    log::warn!(
                        target: "resq::pipeline",
                        "rejected record #{} ({}): {}",
                        index,
                        record.protocol_id.as_deref().unwrap_or("<no id>"),
                        error
                    );
                    rejected.push(RejectedRecord {
                        index,
                        protocol_id: record.protocol_id.clone(),
                        error,
                    });
                }
            }
        }

        let reconciled = self.config.reconciler.reconcile_all(&events, sink);
        let summary = summarize(&reconciled, rejected.len());

        Ok(ReconcileResult {
            events: reconciled,
            rejected,
            summary,
        })
    }
}

impl Default for ReconcilePipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(events: &[ReconciledEvent], rejected: usize) -> ReconcileSummary {
    events.iter().fold(
        ReconcileSummary {
            rejected,
            ..ReconcileSummary::default()
        },
        |mut acc, event| {
            acc.records += 1;
            if event.hospital_days_fixed {
                acc.corrected_stays += 1;
            }
            if !event.hospital_days_resolved {
                acc.unresolved_stays += 1;
            }
            acc.fixed_durations += event.fixed_durations();
            acc.implausible_durations += event.implausible_durations();
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{DurationCeilings, Measurement};
    use crate::observe::{MemorySink, NullSink};
    use crate::timeline::stay::StayPolicy;

    fn pipeline() -> ReconcilePipeline {
        ReconcilePipeline::with_config(ReconcileConfig {
            reconciler: Reconciler::new(StayPolicy::new(2024), DurationCeilings::default()),
            fail_fast: false,
        })
    }

    const BATCH: &str = r#"[
        {
            "Protocol ID": "ok-1",
            "VISIT_DATE": "2019-03-30",
            "HOSPITAL_DATE": "2019-12-31",
            "DISCHARGE_DATE": "2018-01-02",
            "RECANALIZATION_PROCEDURES": "2",
            "IVT_ONLY_ADMISSION_TIME": "23:50:00",
            "IVT_ONLY_BOLUS_TIME": "00:20:00"
        },
        {
            "Protocol ID": "bad-date",
            "VISIT_DATE": "2019-13-45",
            "HOSPITAL_DATE": "2019-05-01",
            "DISCHARGE_DATE": "2019-05-04"
        },
        {
            "Protocol ID": "ok-2",
            "VISIT_DATE": "2019-05-01",
            "HOSPITAL_DATE": "2019-05-01",
            "DISCHARGE_DATE": "2019-05-06",
            "RECANALIZATION_PROCEDURES": 4,
            "TBY_ONLY_ADMISSION_TIME": "10:00",
            "TBY_ONLY_PUNCTURE_TIME": "10:00"
        }
    ]"#;

    #[test]
    fn test_batch_continues_past_bad_records() {
        let result = pipeline().process_json_str(BATCH, &NullSink).unwrap();

        assert_eq!(result.events.len(), 2);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].index, 1);
        assert_eq!(result.rejected[0].protocol_id.as_deref(), Some("bad-date"));
        assert!(matches!(result.rejected[0].error, EngineError::MalformedDate { .. }));
    }

    #[test]
    fn test_summary_counts() {
        let result = pipeline().process_json_str(BATCH, &NullSink).unwrap();
        assert_eq!(
            result.summary,
            ReconcileSummary {
                records: 2,
                corrected_stays: 1,
                unresolved_stays: 0,
                fixed_durations: 0,
                implausible_durations: 1,
                rejected: 1,
            }
        );

        let first = &result.events[0];
        assert_eq!(first.hospital_days, 2);
        assert_eq!(first.duration(Measurement::IvtOnlyNeedle).map(|d| d.minutes), Some(30));
    }

    #[test]
    fn test_fail_fast() {
        let pipeline = ReconcilePipeline::with_config(ReconcileConfig {
            fail_fast: true,
            ..ReconcileConfig::default()
        });
        let err = pipeline.process_json_str(BATCH, &NullSink).unwrap_err();
        assert!(format!("{:#}", err).contains("Malformed record #1"));
    }

    #[test]
    fn test_audit_events_reach_sink() {
        let sink = MemorySink::new();
        pipeline().process_json_str(BATCH, &sink).unwrap();
        // one stay repair, one implausible zero-minute puncture
        assert_eq!(sink.len(), 2);
    }
}
