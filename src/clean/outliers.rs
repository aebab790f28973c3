//! Quartile-based outlier removal.
//!
//! Points are partitioned by a caller-supplied key (normally the occurrence
//! label). Per group:
//!
//! - a group flagged by the `collapse` predicate is replaced by a single point
//!   carrying the group mean at the timestamp of its first member
//! - a group smaller than `min_group_size` passes through unchanged
//! - otherwise only members within `[Q1 - k·IQR, Q3 + k·IQR]` survive
//!
//! The bounds pass is repeated until it removes nothing, so filtering the output
//! again with the same grouping is a no-op.

use std::collections::{BTreeMap, BTreeSet};

use crate::calendar::label;
use crate::domain::{DayOfWeek, OccurrenceLabel, OutlierPolicy, TimeSeriesPoint};
use crate::math::{mean, quantile_sorted};

/// What a filter pass did (for logging and run summaries).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub kept: usize,
    pub removed: usize,
    pub collapsed_groups: usize,
}

/// Filter output: surviving points sorted by timestamp plus counts.
#[derive(Debug, Clone)]
pub struct Filtered {
    pub points: Vec<TimeSeriesPoint>,
    pub report: FilterReport,
}

/// Filter per group of `group_by`, collapsing groups for which `collapse` holds.
pub fn filter_grouped<K, G, C>(
    points: &[TimeSeriesPoint],
    group_by: G,
    collapse: C,
    policy: &OutlierPolicy,
) -> Filtered
where
    K: Ord,
    G: Fn(&TimeSeriesPoint) -> K,
    C: Fn(&K) -> bool,
{
    // BTreeMap keeps group iteration deterministic; members stay in input order,
    // so "first member" is the earliest point once input is time-sorted.
    let mut groups: BTreeMap<K, Vec<TimeSeriesPoint>> = BTreeMap::new();
    for p in points {
        groups.entry(group_by(p)).or_default().push(*p);
    }

    let mut out = Vec::with_capacity(points.len());
    let mut report = FilterReport::default();

    for (key, members) in groups {
        let Some(first) = members.first() else {
            continue;
        };

        if collapse(&key) {
            let values: Vec<f64> = members.iter().map(|p| p.value).collect();
            let avg = mean(&values).unwrap_or(0.0);
            out.push(TimeSeriesPoint::new(first.timestamp, avg));
            report.collapsed_groups += 1;
            report.removed += members.len() - 1;
            continue;
        }

        let before = members.len();
        let kept = iqr_until_stable(members, policy);
        report.removed += before - kept.len();
        out.extend(kept);
    }

    out.sort_by_key(|p| p.timestamp);
    report.kept = out.len();
    Filtered { points: out, report }
}

/// Standard call-center grouping: by `(weekday, occurrence)`, collapsing every
/// group whose weekday is in `collapse_weekdays`.
pub fn filter_by_occurrence(
    points: &[TimeSeriesPoint],
    collapse_weekdays: &BTreeSet<DayOfWeek>,
    policy: &OutlierPolicy,
) -> Filtered {
    let filtered = filter_grouped(
        points,
        |p| label(p.timestamp),
        |l: &OccurrenceLabel| collapse_weekdays.contains(&l.weekday),
        policy,
    );
    log::debug!(
        "outlier filter (by occurrence): kept={} removed={} collapsed_groups={}",
        filtered.report.kept,
        filtered.report.removed,
        filtered.report.collapsed_groups
    );
    filtered
}

/// Apply the bounds across the whole series at once (no grouping, no collapse).
pub fn filter_global(points: &[TimeSeriesPoint], policy: &OutlierPolicy) -> Filtered {
    let filtered = filter_grouped(points, |_| (), |_| false, policy);
    log::debug!(
        "outlier filter (global): kept={} removed={}",
        filtered.report.kept,
        filtered.report.removed
    );
    filtered
}

fn iqr_until_stable(mut members: Vec<TimeSeriesPoint>, policy: &OutlierPolicy) -> Vec<TimeSeriesPoint> {
    loop {
        if members.len() < policy.min_group_size {
            return members;
        }
        let Some((lo, hi)) = iqr_bounds(&members, policy.iqr_multiplier) else {
            return members;
        };
        let before = members.len();
        members.retain(|p| p.value >= lo && p.value <= hi);
        if members.len() == before {
            return members;
        }
    }
}

/// `[Q1 - k·IQR, Q3 + k·IQR]` over the members' values.
fn iqr_bounds(members: &[TimeSeriesPoint], k: f64) -> Option<(f64, f64)> {
    if members.is_empty() {
        return None;
    }
    let mut values: Vec<f64> = members.iter().map(|p| p.value).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q1 = quantile_sorted(&values, 0.25);
    let q3 = quantile_sorted(&values, 0.75);
    let iqr = q3 - q1;
    Some((q1 - k * iqr, q3 + k * iqr))
}
