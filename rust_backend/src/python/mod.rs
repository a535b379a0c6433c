//! Python bindings for the quality engine.
//!
//! Exposed as the `resq_rust` extension module when built with the `python`
//! feature. Dates cross the boundary as ISO `YYYY-MM-DD` strings and times as
//! `HH:MM[:SS]` strings, the same cells the reporting layer reads from the
//! registry export.
//!
//! # Modules
//!
//! - [`timeline`]: stay date repair and procedure durations
//! - [`awards`]: site tier classification

pub mod awards;
pub mod timeline;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::EngineError;

pub use awards::*;
pub use timeline::*;

impl From<EngineError> for PyErr {
    fn from(err: EngineError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

#[pymodule]
fn resq_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(timeline::repair_stay_dates, m)?)?;
    m.add_function(wrap_pyfunction!(timeline::minutes_between, m)?)?;
    m.add_function(wrap_pyfunction!(awards::classify_site, m)?)?;
    Ok(())
}
