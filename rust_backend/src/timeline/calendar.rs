//! Year and month arithmetic on calendar dates.
//!
//! All helpers keep the day-of-month and clamp it to the length of the target
//! month (31 March shifted to February becomes 28 or 29 February), so a field
//! edit never fails on a short month.

use chrono::{Datelike, Months, NaiveDate};

/// Number of days in the given month.
///
/// # Examples
///
/// ```
/// use resq_rust::timeline::calendar::days_in_month;
///
/// assert_eq!(days_in_month(2020, 2), Some(29));
/// assert_eq!(days_in_month(2019, 2), Some(28));
/// assert_eq!(days_in_month(2019, 13), None);
/// ```
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Replace both year and month, keeping the day where the target month allows.
pub fn with_year_month_clamped(date: NaiveDate, year: i32, month: u32) -> Option<NaiveDate> {
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Replace the year, clamping the day (29 February into a common year).
pub fn with_year_clamped(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    with_year_month_clamped(date, year, date.month())
}

/// Replace the month, clamping the day to the target month's length.
pub fn with_month_clamped(date: NaiveDate, month: u32) -> Option<NaiveDate> {
    with_year_month_clamped(date, date.year(), month)
}

/// Shift by a signed number of months, clamping the day.
pub fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

/// Signed number of whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}
