//! Scale an intrahour forecast so each day agrees with the daily forecast.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::curve::builder::aggregate;
use crate::domain::{Aggregation, DayOfWeek, TimeSeriesPoint};

/// Reconcile `fine` against the per-day `coarse` values.
///
/// Points on weekdays outside `day_filter` are set to 0 first. Then, per date,
/// every point is multiplied by `coarse[date] / denom`, where `denom` is the
/// day's sum (additive) or mean (average) of the fine values. A zero `denom` or
/// a date absent from `coarse` gives factor 0.
///
/// Afterwards the day's sum (additive) or mean (average) equals `coarse[date]`
/// whenever `denom > 0`.
pub fn reconcile(
    fine: &[TimeSeriesPoint],
    coarse: &BTreeMap<NaiveDate, f64>,
    aggregation: Aggregation,
    day_filter: &BTreeSet<DayOfWeek>,
) -> Vec<TimeSeriesPoint> {
    let mut zeroed_days = BTreeSet::new();
    let masked: Vec<TimeSeriesPoint> = fine
        .iter()
        .map(|p| {
            if day_filter.contains(&DayOfWeek::of(p.date())) {
                *p
            } else {
                zeroed_days.insert(p.date());
                TimeSeriesPoint::new(p.timestamp, 0.0)
            }
        })
        .collect();
    if !zeroed_days.is_empty() {
        log::debug!("reconcile: zeroed {} disabled day(s)", zeroed_days.len());
    }

    let mut per_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for p in &masked {
        per_day.entry(p.date()).or_default().push(p.value);
    }

    let factors: BTreeMap<NaiveDate, f64> = per_day
        .into_iter()
        .map(|(day, values)| {
            let denom = aggregate(aggregation, &values);
            let target = coarse.get(&day).copied().unwrap_or(0.0);
            let factor = if denom > 0.0 { target / denom } else { 0.0 };
            (day, factor)
        })
        .collect();

    masked
        .into_iter()
        .map(|p| {
            let factor = factors.get(&p.date()).copied().unwrap_or(0.0);
            TimeSeriesPoint::new(p.timestamp, p.value * factor)
        })
        .collect()
}
