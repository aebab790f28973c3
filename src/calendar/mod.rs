//! Calendar occurrence labeling.
//!
//! Every date maps to "Nth occurrence of its weekday within its month"
//! (e.g. 2024-06-11 is the 2nd Tuesday of June). That composite key groups all
//! occurrence curves and comparisons.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::domain::{DayOfWeek, LabeledPoint, OccurrenceLabel, TimeSeriesPoint, YearMonth};

/// Highest ordinal included in the expected key space of a curve.
pub const MAX_EXPECTED_ORDINAL: u32 = 5;

/// Count of days in `[first-of-month, date]` sharing `date`'s weekday.
///
/// Same-weekday days are exactly 7 apart, so the count is `(day - 1) / 7 + 1`.
pub fn occurrence_ordinal(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// Label for a timestamp (only the date part matters).
pub fn label(timestamp: NaiveDateTime) -> OccurrenceLabel {
    label_date(timestamp.date())
}

pub fn label_date(date: NaiveDate) -> OccurrenceLabel {
    OccurrenceLabel::new(occurrence_ordinal(date), DayOfWeek::of(date))
}

/// Annotate each point with its weekday and occurrence ordinal.
pub fn label_points(points: &[TimeSeriesPoint]) -> Vec<LabeledPoint> {
    points
        .iter()
        .map(|p| {
            let l = label(p.timestamp);
            LabeledPoint {
                point: *p,
                weekday: l.weekday,
                occurrence_ordinal: l.ordinal,
            }
        })
        .collect()
}

/// Labels a curve must contain for the given day filter: filtered weekdays × 1..=5.
pub fn expected_labels(day_filter: &BTreeSet<DayOfWeek>) -> Vec<OccurrenceLabel> {
    let mut out = Vec::with_capacity(day_filter.len() * MAX_EXPECTED_ORDINAL as usize);
    for ordinal in 1..=MAX_EXPECTED_ORDINAL {
        for &day in day_filter {
            out.push(OccurrenceLabel::new(ordinal, day));
        }
    }
    out
}

/// All dates of a month, in order.
pub fn month_days(month: YearMonth) -> Vec<NaiveDate> {
    let first = month.first_day();
    let next = month.next().first_day();
    let n = (next - first).num_days();
    (0..n).map(|i| first + Duration::days(i)).collect()
}

pub fn days_in_month(month: YearMonth) -> usize {
    month_days(month).len()
}
