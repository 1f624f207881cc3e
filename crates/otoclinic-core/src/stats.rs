//! Aggregate statistics over a caller's treatment scope.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Counts over the caller's visible scope, evaluated in a single SQL pass.
///
/// The three status counts partition `total`; the calendar counts overlap
/// freely with them and with each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreatmentStats {
    pub total: u64,
    pub pending: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub this_month: u64,
    pub this_week: u64,
}

/// Inclusive calendar bounds for the month and week containing a snapshot
/// date. Weeks are ISO-8601: Monday through Sunday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsWindow {
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

impl StatsWindow {
    /// Compute the window containing `date` (normally the server's today).
    pub fn containing(date: NaiveDate) -> Self {
        let month_start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
        let next_month_start = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        }
        .unwrap_or(date);
        let month_end = next_month_start - Duration::days(1);

        let week_start =
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        let week_end = week_start + Duration::days(6);

        Self {
            month_start,
            month_end,
            week_start,
            week_end,
        }
    }
}
