//! Percentage curves.
//!
//! Every builder follows the same normalization:
//!
//! - `Additive` (volume): `value = Σ group`, `percentage = value / Σ all groups × 100`
//! - `Average` (TMA): `value = mean(group)`, `percentage = value / mean(group values) × 100`,
//!   where the outer mean runs over the groups that actually have data
//!
//! A zero denominator gives 0 for every key. Expected keys with no data are
//! present with value and percentage 0.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::calendar::expected_labels;
use crate::domain::{
    Aggregation, Curve, CurveEntry, CurveKey, DayOfWeek, LabeledPoint, MetricKind, TimeSeriesPoint, YearMonth,
};
use crate::math::{mean, percent_of};

/// Curve over `(occurrence, weekday)` labels for the weekdays in `day_filter`.
pub fn build_occurrence_curve(points: &[LabeledPoint], metric: MetricKind, day_filter: &BTreeSet<DayOfWeek>) -> Curve {
    let mut groups: BTreeMap<CurveKey, Vec<f64>> = BTreeMap::new();
    for p in points.iter().filter(|p| day_filter.contains(&p.weekday)) {
        groups.entry(CurveKey::Occurrence(p.label())).or_default().push(p.value());
    }
    let expected = expected_labels(day_filter).into_iter().map(CurveKey::Occurrence);
    normalize(metric, groups, expected)
}

/// Curve over weekdays (share of the period falling on each enabled weekday).
pub fn build_weekday_curve(points: &[TimeSeriesPoint], metric: MetricKind, day_filter: &BTreeSet<DayOfWeek>) -> Curve {
    let mut groups: BTreeMap<CurveKey, Vec<f64>> = BTreeMap::new();
    for p in points {
        let day = DayOfWeek::of(p.date());
        if day_filter.contains(&day) {
            groups.entry(CurveKey::Weekday(day)).or_default().push(p.value);
        }
    }
    let expected = day_filter.iter().copied().map(CurveKey::Weekday);
    normalize(metric, groups, expected)
}

/// Curve over time-of-day slots. Keys are the slots present on enabled days.
pub fn build_slot_curve(points: &[TimeSeriesPoint], metric: MetricKind, day_filter: &BTreeSet<DayOfWeek>) -> Curve {
    let mut groups: BTreeMap<CurveKey, Vec<f64>> = BTreeMap::new();
    for p in points.iter().filter(|p| day_filter.contains(&DayOfWeek::of(p.date()))) {
        groups.entry(CurveKey::Slot(p.timestamp.time())).or_default().push(p.value);
    }
    normalize(metric, groups, std::iter::empty())
}

/// Per-month sum (additive) or mean (average) of a series.
pub fn monthly_totals(points: &[TimeSeriesPoint], metric: MetricKind) -> Vec<(YearMonth, f64)> {
    let mut by_month: BTreeMap<YearMonth, Vec<f64>> = BTreeMap::new();
    for p in points {
        by_month.entry(YearMonth::of(p.date())).or_default().push(p.value);
    }
    by_month
        .into_iter()
        .map(|(month, values)| (month, aggregate(metric.aggregation(), &values)))
        .collect()
}

/// Per-day sum (additive) or mean (average) of a sub-daily series.
pub fn daily_aggregate(points: &[TimeSeriesPoint], aggregation: Aggregation) -> BTreeMap<NaiveDate, f64> {
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for p in points {
        by_day.entry(p.date()).or_default().push(p.value);
    }
    by_day
        .into_iter()
        .map(|(day, values)| (day, aggregate(aggregation, &values)))
        .collect()
}

/// Sum or mean of `values`; 0 for an empty slice.
pub fn aggregate(aggregation: Aggregation, values: &[f64]) -> f64 {
    match aggregation {
        Aggregation::Additive => values.iter().sum(),
        Aggregation::Average => mean(values).unwrap_or(0.0),
    }
}

fn normalize(
    metric: MetricKind,
    groups: BTreeMap<CurveKey, Vec<f64>>,
    expected: impl Iterator<Item = CurveKey>,
) -> Curve {
    let aggregation = metric.aggregation();
    let values: BTreeMap<CurveKey, f64> = groups
        .into_iter()
        .map(|(key, members)| (key, aggregate(aggregation, &members)))
        .collect();

    let group_values: Vec<f64> = values.values().copied().collect();
    let denom = match aggregation {
        Aggregation::Additive => group_values.iter().sum(),
        Aggregation::Average => mean(&group_values).unwrap_or(0.0),
    };

    let mut entries: BTreeMap<CurveKey, CurveEntry> = expected
        .map(|key| {
            (
                key,
                CurveEntry {
                    value: 0.0,
                    percentage: 0.0,
                },
            )
        })
        .collect();
    for (key, value) in values {
        entries.insert(
            key,
            CurveEntry {
                value,
                percentage: percent_of(value, denom),
            },
        );
    }

    Curve {
        metric,
        aggregation,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::label_points;
    use crate::domain::OccurrenceLabel;
    use chrono::{Duration, NaiveTime};

    fn days(start: NaiveDate, values: &[f64]) -> Vec<TimeSeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| TimeSeriesPoint::daily(start + Duration::days(i as i64), v))
            .collect()
    }

    fn june() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn additive_curve_sums_to_one_hundred() {
        let values: Vec<f64> = (0..30).map(|i| 10.0 + (i % 7) as f64 * 3.0).collect();
        let labeled = label_points(&days(june(), &values));
        let curve = build_occurrence_curve(&labeled, MetricKind::Volume, &DayOfWeek::all_set());
        assert_eq!(curve.len(), 35);
        assert!((curve.total_percentage() - 100.0).abs() < 1e-6);

        let sat1 = CurveKey::Occurrence(OccurrenceLabel::new(1, DayOfWeek::Saturday));
        let total: f64 = values.iter().sum();
        assert!((curve.percentage(&sat1) - values[0] / total * 100.0).abs() < 1e-9);
    }

    #[test]
    fn missing_labels_are_zero_filled() {
        // June 2024 has no 5th Monday.
        let labeled = label_points(&days(june(), &[5.0; 30]));
        let curve = build_occurrence_curve(&labeled, MetricKind::Volume, &DayOfWeek::all_set());
        let mon5 = CurveKey::Occurrence(OccurrenceLabel::new(5, DayOfWeek::Monday));
        let entry = curve.get(&mon5).unwrap();
        assert_eq!(entry.value, 0.0);
        assert_eq!(entry.percentage, 0.0);
    }

    #[test]
    fn all_zero_and_empty_inputs_give_zero_curves() {
        let labeled = label_points(&days(june(), &[0.0; 30]));
        let curve = build_occurrence_curve(&labeled, MetricKind::Volume, &DayOfWeek::all_set());
        assert!(curve.entries.values().all(|e| e.percentage == 0.0 && e.percentage.is_finite()));

        let curve = build_occurrence_curve(&[], MetricKind::Aht, &DayOfWeek::all_set());
        assert_eq!(curve.len(), 35);
        assert_eq!(curve.total_percentage(), 0.0);
    }

    #[test]
    fn day_filter_excludes_disabled_weekdays() {
        let labeled = label_points(&days(june(), &[5.0; 30]));
        let filter: BTreeSet<DayOfWeek> = [DayOfWeek::Monday, DayOfWeek::Tuesday].into_iter().collect();
        let curve = build_occurrence_curve(&labeled, MetricKind::Volume, &filter);
        assert_eq!(curve.len(), 10);
        assert!(curve.entries.keys().all(|k| matches!(k, CurveKey::Occurrence(l) if filter.contains(&l.weekday))));
        assert!((curve.total_percentage() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn average_curve_is_relative_to_mean_of_groups() {
        // Weekday group means: Mon 100, Tue 300 → mean 200 → 50% and 150%.
        let filter: BTreeSet<DayOfWeek> = [DayOfWeek::Monday, DayOfWeek::Tuesday].into_iter().collect();
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let points = vec![
            TimeSeriesPoint::daily(monday, 80.0),
            TimeSeriesPoint::daily(monday + Duration::days(7), 120.0),
            TimeSeriesPoint::daily(monday + Duration::days(1), 300.0),
        ];
        let curve = build_weekday_curve(&points, MetricKind::Aht, &filter);
        assert!((curve.percentage(&CurveKey::Weekday(DayOfWeek::Monday)) - 50.0).abs() < 1e-9);
        assert!((curve.percentage(&CurveKey::Weekday(DayOfWeek::Tuesday)) - 150.0).abs() < 1e-9);
        assert_eq!(curve.get(&CurveKey::Weekday(DayOfWeek::Monday)).unwrap().value, 100.0);
    }

    #[test]
    fn slot_curve_groups_by_time_of_day() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let t8 = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let t9 = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let points = vec![
            TimeSeriesPoint::new(day.and_time(t8), 10.0),
            TimeSeriesPoint::new(day.and_time(t9), 30.0),
            TimeSeriesPoint::new((day + Duration::days(1)).and_time(t8), 10.0),
            TimeSeriesPoint::new((day + Duration::days(1)).and_time(t9), 50.0),
        ];
        let curve = build_slot_curve(&points, MetricKind::Volume, &DayOfWeek::all_set());
        assert_eq!(curve.len(), 2);
        assert!((curve.percentage(&CurveKey::Slot(t8)) - 20.0).abs() < 1e-9);
        assert!((curve.percentage(&CurveKey::Slot(t9)) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_and_daily_aggregates() {
        let points = days(NaiveDate::from_ymd_opt(2024, 6, 29).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
        let totals = monthly_totals(&points, MetricKind::Volume);
        assert_eq!(totals, vec![(YearMonth::new(2024, 6).unwrap(), 3.0), (YearMonth::new(2024, 7).unwrap(), 7.0)]);
        let means = monthly_totals(&points, MetricKind::Aht);
        assert_eq!(means[1].1, 3.5);

        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let intraday = vec![
            TimeSeriesPoint::new(day.and_hms_opt(8, 0, 0).unwrap(), 10.0),
            TimeSeriesPoint::new(day.and_hms_opt(8, 30, 0).unwrap(), 30.0),
        ];
        assert_eq!(daily_aggregate(&intraday, Aggregation::Additive)[&day], 40.0);
        assert_eq!(daily_aggregate(&intraday, Aggregation::Average)[&day], 20.0);
    }
}
