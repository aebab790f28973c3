//! Future timestamp generation.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::calendar::month_days;
use crate::domain::{TimeSeriesPoint, YearMonth};

/// Midnight of every day in `month`.
pub fn month_timestamps(month: YearMonth) -> Vec<NaiveDateTime> {
    month_days(month).into_iter().map(|d| d.and_time(NaiveTime::MIN)).collect()
}

/// Midnight of the `days` days following `last`.
pub fn days_after(last: NaiveDate, days: u32) -> Vec<NaiveDateTime> {
    (1..=i64::from(days))
        .map(|i| (last + Duration::days(i)).and_time(NaiveTime::MIN))
        .collect()
}

/// Every `slot` of every day in `month`.
pub fn month_slots(month: YearMonth, slots: &BTreeSet<NaiveTime>) -> Vec<NaiveDateTime> {
    let mut out = Vec::with_capacity(slots.len() * 31);
    for day in month_days(month) {
        for &slot in slots {
            out.push(day.and_time(slot));
        }
    }
    out
}

/// Distinct times of day present in a series (the intrahour operating window).
pub fn observed_slots(points: &[TimeSeriesPoint]) -> BTreeSet<NaiveTime> {
    points.iter().map(|p| p.timestamp.time()).collect()
}

/// True when `history` has at least one point on every day of `month`.
pub fn covers_month(history: &[TimeSeriesPoint], month: YearMonth) -> bool {
    let seen: BTreeSet<NaiveDate> = history
        .iter()
        .map(|p| p.date())
        .filter(|d| month.contains(*d))
        .collect();
    month_days(month).iter().all(|d| seen.contains(d))
}
