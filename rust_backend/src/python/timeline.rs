use chrono::{Datelike, Utc};
use pyo3::prelude::*;

use crate::error::{EngineError, ErrorContext};
use crate::parsing::records::parse_date;
use crate::timeline::{clock, stay, StayPolicy};

fn date_arg(name: &str, raw: &str) -> Result<chrono::NaiveDate, EngineError> {
    parse_date(raw).ok_or_else(|| {
        EngineError::malformed_date(
            format!("unparsable {} '{}'", name, raw),
            ErrorContext::new("repair_stay_dates").with_details(format!("argument={}", name)),
        )
    })
}

/// Repair a stay and return `(hospital_date, discharge_date, stay_days, was_corrected)`.
///
/// `reference_year` defaults to the current UTC year.
#[pyfunction]
#[pyo3(signature = (visit_date, hospital_date, discharge_date, reference_year=None, max_stay_days=300))]
pub fn repair_stay_dates(
    visit_date: &str,
    hospital_date: &str,
    discharge_date: &str,
    reference_year: Option<i32>,
    max_stay_days: i64,
) -> PyResult<(String, String, i64, bool)> {
    let visit = date_arg("visit_date", visit_date)?;
    let hospital = date_arg("hospital_date", hospital_date)?;
    let discharge = date_arg("discharge_date", discharge_date)?;

    let policy = StayPolicy {
        max_stay_days,
        ..StayPolicy::new(reference_year.unwrap_or_else(|| Utc::now().year()))
    };
    let repair = stay::repair_stay_dates(visit, hospital, discharge, &policy);

    Ok((
        repair.hospital_date.to_string(),
        repair.discharge_date.to_string(),
        repair.stay_days,
        repair.was_corrected,
    ))
}

/// Minutes from admission to target, returning `(minutes, was_fixed)`.
///
/// Unparsable or absent times are treated as missing.
#[pyfunction]
#[pyo3(signature = (admission, target, hospital=None, max_plausible_minutes=400))]
pub fn minutes_between(
    admission: Option<&str>,
    target: Option<&str>,
    hospital: Option<&str>,
    max_plausible_minutes: i64,
) -> (i64, bool) {
    clock::minutes_between(
        admission.and_then(clock::parse_time_of_day),
        target.and_then(clock::parse_time_of_day),
        hospital.and_then(clock::parse_time_of_day),
        max_plausible_minutes,
    )
}
