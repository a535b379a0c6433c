//! Time-of-day parsing and procedure durations.
//!
//! Registry clock readings carry no date, so a duration that crosses midnight
//! shows up as a negative difference and is wrapped by one day. Missing readings
//! never raise: the duration degrades to `0`, which downstream aggregation reads
//! as "excluded from this metric's denominator".

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: i64 = 24 * 60;
const SECONDS_PER_DAY: i64 = MINUTES_PER_DAY * 60;

/// Values the registry export uses for "no reading".
const ABSENT_MARKERS: [&str; 5] = ["", "none", "nan", "null", "nat"];

/// Parse a registry clock reading (`HH:MM:SS` or `HH:MM`).
///
/// A leading date part (`2019-03-01 08:15:00`) is ignored. Absent markers and
/// unparsable text both yield `None`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use resq_rust::timeline::clock::parse_time_of_day;
///
/// assert_eq!(parse_time_of_day("08:15"), NaiveTime::from_hms_opt(8, 15, 0));
/// assert_eq!(parse_time_of_day("23:50:00"), NaiveTime::from_hms_opt(23, 50, 0));
/// assert_eq!(parse_time_of_day("nan"), None);
/// assert_eq!(parse_time_of_day("25:00"), None);
/// ```
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    if ABSENT_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        return None;
    }
    let clock = trimmed.rsplit(' ').next().unwrap_or(trimmed);
    NaiveTime::parse_from_str(clock, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M"))
        .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M:%S%.f"))
        .ok()
}

/// Whole minutes from `from` to `to`, wrapping once across midnight.
fn wrapped_minutes(from: NaiveTime, to: NaiveTime) -> i64 {
    let mut seconds =
        to.num_seconds_from_midnight() as i64 - from.num_seconds_from_midnight() as i64;
    if seconds < 0 {
        seconds += SECONDS_PER_DAY;
    }
    seconds / 60
}

/// Minutes between an admission reading and a procedure reading.
///
/// Returns the duration and whether a fallback rule fired:
///
/// * both readings missing, or the procedure reading missing: `(0, true)`
/// * admission missing but hospital arrival known: measured from arrival, `true`
/// * a duration above `max_plausible_minutes` is re-measured from the hospital
///   arrival time when that is recorded, differs from the admission reading and
///   is later than it
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use resq_rust::timeline::clock::minutes_between;
///
/// let t = |h, m| NaiveTime::from_hms_opt(h, m, 0);
/// assert_eq!(minutes_between(t(22, 0), t(23, 30), None, 400), (90, false));
/// assert_eq!(minutes_between(t(23, 50), t(0, 10), None, 400), (20, false));
/// assert_eq!(minutes_between(None, t(9, 0), t(8, 30), 400), (30, true));
/// ```
pub fn minutes_between(
    admission: Option<NaiveTime>,
    target: Option<NaiveTime>,
    hospital: Option<NaiveTime>,
    max_plausible_minutes: i64,
) -> (i64, bool) {
    let Some(target) = target else {
        return (0, true);
    };
    let Some(admission) = admission else {
        return match hospital {
            Some(anchor) => (wrapped_minutes(anchor, target), true),
            None => (0, true),
        };
    };

    let minutes = wrapped_minutes(admission, target);
    if minutes > max_plausible_minutes {
        if let Some(anchor) = hospital.filter(|h| *h > admission) {
            return (wrapped_minutes(anchor, target), true);
        }
    }
    (minutes, false)
}

/// A computed procedure duration with its data-quality flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureDuration {
    /// Whole minutes; `0` means excluded.
    pub minutes: i64,
    /// A fallback rule fired while computing the value.
    pub was_fixed: bool,
    /// Enough readings were present to attempt a measurement.
    pub measured: bool,
    /// Ceiling applied when judging plausibility.
    pub ceiling: i64,
}

impl ProcedureDuration {
    /// Measure a duration and keep the ceiling it was judged against.
    pub fn measure(
        admission: Option<NaiveTime>,
        target: Option<NaiveTime>,
        hospital: Option<NaiveTime>,
        ceiling: i64,
    ) -> Self {
        let measured = target.is_some() && (admission.is_some() || hospital.is_some());
        let (minutes, was_fixed) = minutes_between(admission, target, hospital, ceiling);
        Self {
            minutes,
            was_fixed,
            measured,
            ceiling,
        }
    }

    /// A measured duration of zero or above the ceiling is implausible.
    pub fn is_plausible(&self) -> bool {
        !self.measured || (self.minutes > 0 && self.minutes <= self.ceiling)
    }
}
