//! Whole-day calendar arithmetic on ISO `YYYY-MM-DD` strings.
//!
//! Dates live on the model as strings; anything that does not parse is treated as
//! absent by callers rather than propagated into arithmetic.

use chrono::{Duration, NaiveDate};

const ISO_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO date. Empty or malformed input yields `None`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, ISO_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Signed number of whole days from `from` to `to`.
#[inline]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// `date + days`, or `None` if the offset or the result leaves chrono's supported range.
#[inline]
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|d| date.checked_add_signed(d))
}

/// Shift a date string by `delta` days.
pub fn shift_date(s: &str, delta: i64) -> Option<String> {
    parse_date(s).and_then(|d| add_days(d, delta)).map(format_date)
}

/// Day number used by the critical path passes.
#[inline]
pub fn day_number(date: NaiveDate) -> i64 {
    i64::from(chrono::Datelike::num_days_from_ce(&date))
}
