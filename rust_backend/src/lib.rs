//! RESQ registry quality engine.
//!
//! Two independent stages operate on registry exports:
//!
//! - [`timeline`] repairs hospital stay dates of encounter records and derives
//!   procedure durations from wall-clock times.
//! - [`awards`] assigns a quality tier to each site from its aggregated
//!   statistics row.
//!
//! [`pipeline`] and [`io`] wrap both stages for batch files; the `python`
//! feature exposes the core operations as a Python extension module.

pub mod awards;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod observe;
pub mod parsing;
pub mod pipeline;
pub mod timeline;

#[cfg(feature = "python")]
pub mod python;

pub use awards::{AwardClassifier, AwardDecision, AwardPolicy, SiteAward};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use observe::{AuditEvent, AuditSink, LogSink, MemorySink, NullSink};
pub use timeline::{ReconciledEvent, Reconciler};
