use pyo3::prelude::*;
use std::collections::HashMap;

use crate::awards::{AwardClassifier, AwardPolicy};
use crate::core::domain::SiteMetricRow;
use crate::error::EngineError;
use crate::observe::NullSink;

/// Classify one site and return the tier name (`NONE`, `GOLD`, `PLATINUM`, `DIAMOND`).
///
/// `percentages` is keyed by the registry statistics column names.
#[pyfunction]
#[pyo3(signature = (
    site_id,
    total_patients,
    percentages,
    eligible_thrombolysis=0,
    eligible_thrombectomy=0,
    policy="thrombectomy",
    min_total_patients=30,
    thrombectomy_min_eligible=4
))]
#[allow(clippy::too_many_arguments)]
pub fn classify_site(
    site_id: String,
    total_patients: u64,
    percentages: HashMap<String, f64>,
    eligible_thrombolysis: u64,
    eligible_thrombectomy: u64,
    policy: &str,
    min_total_patients: u64,
    thrombectomy_min_eligible: u64,
) -> PyResult<String> {
    let policy: AwardPolicy = policy
        .parse()
        .map_err(|msg: String| EngineError::configuration(msg))?;
    let row = SiteMetricRow {
        site_id,
        total_patients,
        eligible_thrombolysis,
        eligible_thrombectomy,
        percentages: percentages.into_iter().collect(),
    };

    let classifier = AwardClassifier::new(policy, min_total_patients, thrombectomy_min_eligible);
    Ok(classifier.classify(&row, &NullSink).tier.to_string())
}
