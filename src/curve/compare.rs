//! Side-by-side alignment of two curves.

use std::collections::BTreeSet;

use crate::domain::{Curve, CurveKey};

/// One aligned row: the key's percentage in each curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow {
    pub key: CurveKey,
    pub value_a: f64,
    pub value_b: f64,
}

impl ComparisonRow {
    /// `value_b - value_a`, in percentage points.
    pub fn delta(&self) -> f64 {
        self.value_b - self.value_a
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
}

/// Align `a` and `b` over the union of their keys, filling absent entries with 0.
///
/// Rows follow `CurveKey` ordering (ordinal, then weekday; slots by time).
pub fn compare(a: &Curve, b: &Curve) -> Comparison {
    let keys: BTreeSet<CurveKey> = a.entries.keys().chain(b.entries.keys()).copied().collect();
    let rows = keys
        .into_iter()
        .map(|key| ComparisonRow {
            key,
            value_a: a.percentage(&key),
            value_b: b.percentage(&key),
        })
        .collect();
    Comparison { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveEntry, DayOfWeek, MetricKind, OccurrenceLabel};
    use std::collections::BTreeMap;

    fn curve(entries: &[(u32, DayOfWeek, f64)]) -> Curve {
        let entries: BTreeMap<CurveKey, CurveEntry> = entries
            .iter()
            .map(|&(ordinal, day, pct)| {
                (
                    CurveKey::Occurrence(OccurrenceLabel::new(ordinal, day)),
                    CurveEntry {
                        value: pct,
                        percentage: pct,
                    },
                )
            })
            .collect();
        Curve {
            metric: MetricKind::Volume,
            aggregation: MetricKind::Volume.aggregation(),
            entries,
        }
    }

    #[test]
    fn union_of_keys_with_zero_fill() {
        let a = curve(&[(1, DayOfWeek::Monday, 40.0), (2, DayOfWeek::Monday, 60.0)]);
        let b = curve(&[(2, DayOfWeek::Monday, 30.0), (5, DayOfWeek::Friday, 70.0)]);
        let cmp = compare(&a, &b);

        assert_eq!(cmp.rows.len(), 3);
        for key in a.entries.keys().chain(b.entries.keys()) {
            let row = cmp.rows.iter().find(|r| r.key == *key).unwrap();
            assert_eq!(row.value_a, a.percentage(key));
            assert_eq!(row.value_b, b.percentage(key));
        }
        let last = cmp.rows.last().unwrap();
        assert_eq!(last.key, CurveKey::Occurrence(OccurrenceLabel::new(5, DayOfWeek::Friday)));
        assert_eq!(last.value_a, 0.0);
        assert_eq!(cmp.rows[0].value_b, 0.0);
        assert!((cmp.rows[1].delta() + 30.0).abs() < 1e-12);
    }

    #[test]
    fn rows_are_ordered_by_ordinal_then_weekday() {
        let a = curve(&[(2, DayOfWeek::Monday, 1.0), (1, DayOfWeek::Sunday, 1.0)]);
        let b = curve(&[(1, DayOfWeek::Tuesday, 1.0)]);
        let cmp = compare(&a, &b);
        let labels: Vec<String> = cmp.rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(labels, vec!["1ª Terça-feira", "1ª Domingo", "2ª Segunda-feira"]);
    }

    #[test]
    fn empty_curves_compare_empty() {
        let cmp = compare(&curve(&[]), &curve(&[]));
        assert!(cmp.rows.is_empty());
    }
}
