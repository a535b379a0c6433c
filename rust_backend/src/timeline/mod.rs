//! Timeline reconciliation for registry encounters.
//!
//! # Modules
//!
//! - [`calendar`]: clamped year/month arithmetic
//! - [`stay`]: hospital stay repair
//! - [`clock`]: time-of-day parsing and procedure durations
//! - [`reconciler`]: per-encounter reconciliation producing the derived record
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use resq_rust::timeline::{repair_stay_dates, StayPolicy};
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2019, m, day).unwrap();
//! let repair = repair_stay_dates(d(5, 10), d(5, 10), d(5, 14), &StayPolicy::new(2024));
//! assert_eq!(repair.stay_days, 4);
//! ```

pub mod calendar;
pub mod clock;
pub mod reconciler;
pub mod stay;


pub use clock::{minutes_between, parse_time_of_day, ProcedureDuration};
pub use reconciler::{ReconciledEvent, Reconciler};
pub use stay::{repair_stay_dates, StayEdit, StayPolicy, StayRepair};
