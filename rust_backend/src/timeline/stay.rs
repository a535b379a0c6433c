//! Hospital stay repair.
//!
//! Registry entry errors on admission and discharge dates are almost always a
//! wrong year or a wrong month, never a wrong day. Repair therefore only edits
//! year and month fields, treats the visit date as ground truth, and keeps the
//! smallest change that brings the stay back into `0..=max_stay_days`.
//!
//! The repair runs in three stages:
//!
//! 1. A discharge date carrying the "unset" sentinel year collapses onto the
//!    hospital date.
//! 2. Deterministic snaps: a negative stay across two different years snaps
//!    the offending year onto the visit year; an over-long stay does the same,
//!    after first pulling an early hospital month onto the visit month.
//! 3. If the stay is still out of range, a bounded search over compositions of
//!    at most two single-field edits picks the candidate whose hospital date is
//!    closest to the visit date, then the one with fewer edits, then the
//!    shortest stay.
//!
//! A record no candidate can fix is returned as recorded and flagged unresolved.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::{
    days_between, shift_months, with_month_clamped, with_year_clamped, with_year_month_clamped,
};

/// Tunables for stay repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayPolicy {
    /// Longest plausible stay in days.
    pub max_stay_days: i64,
    /// Year the registry writes into unset discharge dates.
    pub sentinel_year: i32,
    /// Latest year a repaired discharge date may be moved into.
    pub reference_year: i32,
}

impl StayPolicy {
    /// Policy with the registry defaults (300 days, sentinel 1900).
    pub fn new(reference_year: i32) -> Self {
        Self {
            max_stay_days: 300,
            sentinel_year: 1900,
            reference_year,
        }
    }

    fn stay(&self, dates: Dates) -> i64 {
        days_between(dates.hospital, dates.discharge)
    }

    fn in_range(&self, dates: Dates) -> bool {
        let stay = self.stay(dates);
        (0..=self.max_stay_days).contains(&stay)
    }
}

/// A single field edit applied while repairing a stay.
///
/// Declaration order doubles as the tie-break order between equally good
/// repair candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StayEdit {
    /// Discharge carried the sentinel year; replaced by the hospital date.
    SentinelDischarge,
    HospitalYearToVisit,
    DischargeYearToVisit,
    HospitalMonthToVisit,
    HospitalMonthToDischarge,
    DischargeNextMonth,
    /// Discharge moved into the hospital month, or the month after it.
    DischargeFollowsHospital,
    DischargeNextYear,
    HospitalPreviousYear,
}

const SEARCH_EDITS: [StayEdit; 8] = [
    StayEdit::HospitalYearToVisit,
    StayEdit::DischargeYearToVisit,
    StayEdit::HospitalMonthToVisit,
    StayEdit::HospitalMonthToDischarge,
    StayEdit::DischargeNextMonth,
    StayEdit::DischargeFollowsHospital,
    StayEdit::DischargeNextYear,
    StayEdit::HospitalPreviousYear,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dates {
    hospital: NaiveDate,
    discharge: NaiveDate,
}

impl StayEdit {
    /// Apply the edit; `None` when it does not apply or would not change anything.
    fn apply(self, visit: NaiveDate, dates: Dates, policy: &StayPolicy) -> Option<Dates> {
        let Dates {
            hospital: h,
            discharge: d,
        } = dates;
        let next = match self {
            StayEdit::SentinelDischarge => Dates {
                hospital: h,
                discharge: h,
            },
            StayEdit::HospitalYearToVisit => Dates {
                hospital: with_year_clamped(h, visit.year())?,
                discharge: d,
            },
            StayEdit::DischargeYearToVisit => Dates {
                hospital: h,
                discharge: with_year_clamped(d, visit.year())?,
            },
            StayEdit::HospitalMonthToVisit => Dates {
                hospital: with_month_clamped(h, visit.month())?,
                discharge: d,
            },
            StayEdit::HospitalMonthToDischarge => Dates {
                hospital: with_month_clamped(h, d.month())?,
                discharge: d,
            },
            StayEdit::DischargeNextMonth => Dates {
                hospital: h,
                discharge: shift_months(d, 1)?,
            },
            StayEdit::DischargeFollowsHospital => {
                let mut moved = with_year_month_clamped(d, h.year(), h.month())?;
                if moved < h {
                    moved = shift_months(moved, 1)?;
                }
                Dates {
                    hospital: h,
                    discharge: moved,
                }
            }
            StayEdit::DischargeNextYear => Dates {
                hospital: h,
                discharge: shift_months(d, 12)?,
            },
            StayEdit::HospitalPreviousYear => Dates {
                hospital: shift_months(h, -12)?,
                discharge: d,
            },
        };
        if next == dates {
            return None;
        }
        let moves_discharge_forward = matches!(
            self,
            StayEdit::DischargeNextMonth
                | StayEdit::DischargeFollowsHospital
                | StayEdit::DischargeNextYear
        );
        if moves_discharge_forward && next.discharge.year() > policy.reference_year.max(d.year()) {
            return None;
        }
        Some(next)
    }
}

/// Outcome of [`repair_stay_dates`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRepair {
    pub hospital_date: NaiveDate,
    pub discharge_date: NaiveDate,
    /// Final stay in days; a same-day stay counts as 1.
    pub stay_days: i64,
    /// Whether either date differs from what was recorded.
    pub was_corrected: bool,
    /// Whether the final stay lies within the plausible range.
    pub resolved: bool,
    /// Edits applied, in order.
    pub edits: Vec<StayEdit>,
}

#[derive(Debug, Clone)]
struct Candidate {
    dates: Dates,
    edits: Vec<StayEdit>,
}

impl Candidate {
    fn rank(&self, visit: NaiveDate, policy: &StayPolicy) -> (i64, usize, i64, Vec<StayEdit>) {
        (
            days_between(visit, self.dates.hospital).abs(),
            self.edits.len(),
            policy.stay(self.dates),
            self.edits.clone(),
        )
    }
}

/// Repair hospital and discharge dates whose stay length is implausible.
///
/// # Arguments
///
/// * `visit_date` - Trusted anchor date of the encounter
/// * `hospital_date` - Recorded admission date
/// * `discharge_date` - Recorded discharge date
/// * `policy` - Range, sentinel year and latest admissible year
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use resq_rust::timeline::stay::{repair_stay_dates, StayPolicy};
///
/// let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
/// let policy = StayPolicy::new(2024);
///
/// let same_day = repair_stay_dates(d(2019, 6, 30), d(2019, 6, 30), d(2019, 6, 30), &policy);
/// assert_eq!(same_day.stay_days, 1);
/// assert!(!same_day.was_corrected);
///
/// let repaired = repair_stay_dates(d(2019, 3, 30), d(2019, 12, 31), d(2018, 1, 2), &policy);
/// assert_eq!(repaired.hospital_date, d(2019, 3, 31));
/// assert_eq!(repaired.discharge_date, d(2019, 4, 2));
/// assert_eq!(repaired.stay_days, 2);
/// assert!(repaired.was_corrected);
/// ```
pub fn repair_stay_dates(
    visit_date: NaiveDate,
    hospital_date: NaiveDate,
    discharge_date: NaiveDate,
    policy: &StayPolicy,
) -> StayRepair {
    let recorded = Dates {
        hospital: hospital_date,
        discharge: discharge_date,
    };
    let mut current = Candidate {
        dates: recorded,
        edits: Vec::new(),
    };

    if recorded.discharge.year() == policy.sentinel_year {
        push_edit(&mut current, StayEdit::SentinelDischarge, visit_date, policy);
    }
    let anchored = current.clone();

    if policy.stay(current.dates) < 0 && years_differ(current.dates) {
        snap_years_to_visit(&mut current, visit_date, policy);
    }

    if policy.stay(current.dates) > policy.max_stay_days {
        let h = current.dates.hospital;
        if h.year() == visit_date.year() && h.month() < visit_date.month() && h.day() >= visit_date.day()
        {
            push_edit(&mut current, StayEdit::HospitalMonthToVisit, visit_date, policy);
        }
        if years_differ(current.dates) {
            snap_years_to_visit(&mut current, visit_date, policy);
        }
    }

    if !policy.in_range(current.dates) {
        let best = [
            search(visit_date, &current, policy),
            search(visit_date, &anchored, policy),
        ]
        .into_iter()
        .flatten()
        .min_by_key(|c| c.rank(visit_date, policy));

        match best {
            Some(found) => current = found,
            None => {
                return StayRepair {
                    hospital_date,
                    discharge_date,
                    stay_days: normalize_stay(policy.stay(recorded)),
                    was_corrected: false,
                    resolved: false,
                    edits: Vec::new(),
                };
            }
        }
    }

    StayRepair {
        hospital_date: current.dates.hospital,
        discharge_date: current.dates.discharge,
        stay_days: normalize_stay(policy.stay(current.dates)),
        was_corrected: current.dates != recorded,
        resolved: true,
        edits: current.edits,
    }
}

/// Raw stay in days between two dates, normalized so a same-day stay counts as 1.
pub fn stay_days(hospital_date: NaiveDate, discharge_date: NaiveDate) -> i64 {
    normalize_stay(days_between(hospital_date, discharge_date))
}

fn normalize_stay(days: i64) -> i64 {
    if days == 0 {
        1
    } else {
        days
    }
}

fn years_differ(dates: Dates) -> bool {
    dates.hospital.year() != dates.discharge.year()
}

fn push_edit(candidate: &mut Candidate, edit: StayEdit, visit: NaiveDate, policy: &StayPolicy) {
    if let Some(next) = edit.apply(visit, candidate.dates, policy) {
        candidate.dates = next;
        candidate.edits.push(edit);
    }
}

fn snap_years_to_visit(candidate: &mut Candidate, visit: NaiveDate, policy: &StayPolicy) {
    if candidate.dates.hospital.year() != visit.year() {
        push_edit(candidate, StayEdit::HospitalYearToVisit, visit, policy);
    }
    if candidate.dates.discharge.year() != visit.year() {
        push_edit(candidate, StayEdit::DischargeYearToVisit, visit, policy);
    }
}

fn search(visit: NaiveDate, start: &Candidate, policy: &StayPolicy) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    let mut consider = |candidate: Candidate| {
        if !policy.in_range(candidate.dates) {
            return;
        }
        let better = match &best {
            Some(current) => candidate.rank(visit, policy) < current.rank(visit, policy),
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    };

    for first in SEARCH_EDITS {
        let Some(one) = first.apply(visit, start.dates, policy) else {
            continue;
        };
        let mut edits = start.edits.clone();
        edits.push(first);
        for second in SEARCH_EDITS {
            if let Some(two) = second.apply(visit, one, policy) {
                let mut both = edits.clone();
                both.push(second);
                consider(Candidate {
                    dates: two,
                    edits: both,
                });
            }
        }
        consider(Candidate { dates: one, edits });
    }
    best
}
