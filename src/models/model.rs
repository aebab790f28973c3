//! Model evaluation for the trend + seasonality + holiday regression.
//!
//! The forecaster relies on two primitive operations:
//! - build a design row for a timestamp (for least squares)
//! - predict `y(t)` given the fitted coefficients (for forecasts)
//!
//! Column order: intercept, scaled trend, one Fourier block per component, then
//! the holiday indicator when holidays are in play.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::math::{push_fourier_terms, scaled_trend};

/// A cyclic component: period in days and Fourier order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalComponent {
    pub name: &'static str,
    pub period_days: f64,
    pub order: usize,
}

pub const YEARLY: SeasonalComponent = SeasonalComponent {
    name: "yearly",
    period_days: 365.25,
    order: 10,
};

pub const WEEKLY: SeasonalComponent = SeasonalComponent {
    name: "weekly",
    period_days: 7.0,
    order: 3,
};

pub const DAILY: SeasonalComponent = SeasonalComponent {
    name: "daily",
    period_days: 1.0,
    order: 4,
};

/// Everything needed to turn a timestamp into a design row.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    /// `t = 0` (first historical timestamp).
    pub origin: NaiveDateTime,
    /// History span in days, used to scale the trend column.
    pub span_days: f64,
    pub components: Vec<SeasonalComponent>,
    /// Holiday dates; the indicator is 1 on the holiday and the day after.
    pub holidays: Option<BTreeSet<NaiveDate>>,
}

impl ModelLayout {
    /// Number of coefficients (design row width).
    pub fn width(&self) -> usize {
        let seasonal: usize = self.components.iter().map(|c| 2 * c.order).sum();
        2 + seasonal + usize::from(self.holidays.is_some())
    }

    fn t_days(&self, timestamp: NaiveDateTime) -> f64 {
        (timestamp - self.origin).num_seconds() as f64 / 86_400.0
    }
}

/// A fitted layout plus its coefficients.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub layout: ModelLayout,
    pub coefficients: Vec<f64>,
}

impl FittedModel {
    pub fn predict(&self, timestamp: NaiveDateTime) -> f64 {
        predict(&self.layout, &self.coefficients, timestamp)
    }
}

/// Fill `out` (cleared first) with the design row for `timestamp`.
pub fn fill_design_row(layout: &ModelLayout, timestamp: NaiveDateTime, out: &mut Vec<f64>) {
    out.clear();
    let t = layout.t_days(timestamp);
    out.push(1.0);
    out.push(scaled_trend(t, layout.span_days));
    for c in &layout.components {
        push_fourier_terms(t, c.period_days, c.order, out);
    }
    if let Some(holidays) = &layout.holidays {
        out.push(holiday_indicator(holidays, timestamp.date()));
    }
}

/// Predict `y(t)` for the given layout and coefficients.
pub fn predict(layout: &ModelLayout, coefficients: &[f64], timestamp: NaiveDateTime) -> f64 {
    let mut row = Vec::with_capacity(layout.width());
    fill_design_row(layout, timestamp, &mut row);
    row.iter().zip(coefficients.iter()).map(|(x, b)| x * b).sum()
}

/// 1.0 on a holiday or the day after it, else 0.0.
pub fn holiday_indicator(holidays: &BTreeSet<NaiveDate>, date: NaiveDate) -> f64 {
    let day_before = date - Duration::days(1);
    if holidays.contains(&date) || holidays.contains(&day_before) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(holidays: Option<BTreeSet<NaiveDate>>) -> ModelLayout {
        ModelLayout {
            origin: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            span_days: 100.0,
            components: vec![WEEKLY],
            holidays,
        }
    }

    #[test]
    fn design_row_width_matches_layout() {
        let l = layout(None);
        let mut row = Vec::new();
        fill_design_row(&l, l.origin + Duration::days(3), &mut row);
        assert_eq!(row.len(), l.width());
        assert_eq!(row.len(), 8);
        assert_eq!(row[0], 1.0);
        assert!((row[1] - 0.03).abs() < 1e-12);
    }

    #[test]
    fn holiday_window_covers_day_after() {
        let h: BTreeSet<NaiveDate> = [NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()].into_iter().collect();
        assert_eq!(holiday_indicator(&h, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()), 1.0);
        assert_eq!(holiday_indicator(&h, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()), 1.0);
        assert_eq!(holiday_indicator(&h, NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()), 0.0);
        assert_eq!(layout(Some(h)).width(), 9);
    }

    #[test]
    fn predict_is_intercept_when_other_coefficients_vanish() {
        let l = layout(None);
        let mut coefficients = vec![0.0; l.width()];
        coefficients[0] = 42.0;
        let y = predict(&l, &coefficients, l.origin + Duration::days(17));
        assert!((y - 42.0).abs() < 1e-12);
    }
}
