//! Quality award classification.
//!
//! A site row is scored by walking a fixed, ordered list of criteria. Each
//! criterion reads one percentage column and narrows the tier through a
//! threshold [`ladder`]. The order and ladders of each policy live in
//! [`criteria`]; the fold itself is in [`classifier`].
//!
//! # Example
//!
//! ```
//! use resq_rust::awards::AwardClassifier;
//! use resq_rust::awards::criteria::Metric;
//! use resq_rust::core::domain::{AwardTier, SiteMetricRow};
//! use resq_rust::observe::NullSink;
//!
//! let row = SiteMetricRow::new("CZ_001", 45)
//!     .with_eligible(12, 0)
//!     .with_percentage(Metric::DoorToNeedle60.column(), 40.0);
//! let decision = AwardClassifier::default().classify(&row, &NullSink);
//! assert_eq!(decision.tier, AwardTier::None);
//! ```

pub mod classifier;
pub mod criteria;
pub mod ladder;

#[cfg(test)]
mod classifier_tests;

pub use classifier::{AwardClassifier, AwardDecision, CriterionStep, SiteAward, StepOutcome};
pub use criteria::{AwardPolicy, Criterion, Denominator, Metric};
pub use ladder::{Band, Ladder};
