//! Basis functions for the seasonal additive model.
//!
//! Each cyclic component with period `P` (days) and order `N` contributes the
//! columns
//!
//! `sin(2πk·t/P), cos(2πk·t/P)` for `k = 1..=N`
//!
//! where `t` is measured in days since the first historical timestamp. The trend
//! is a straight line on `t / span`, scaled so the column stays O(1) regardless of
//! history length.

use std::f64::consts::PI;

/// Append the `2·order` Fourier columns for one component to `out`.
pub fn push_fourier_terms(t_days: f64, period: f64, order: usize, out: &mut Vec<f64>) {
    for k in 1..=order {
        let x = 2.0 * PI * k as f64 * t_days / period;
        out.push(x.sin());
        out.push(x.cos());
    }
}

/// Scaled trend regressor; a non-positive span collapses to 0.
pub fn scaled_trend(t_days: f64, span_days: f64) -> f64 {
    if span_days > 0.0 { t_days / span_days } else { 0.0 }
}
