//! Summary statistics used by cleaning and normalization.

/// Linear-interpolated quantile of `values` (need not be sorted).
///
/// Position `q·(n-1)` between order statistics, the usual dataframe and
/// spreadsheet definition. Returns `None` for empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(quantile_sorted(&sorted, q))
}

/// Same as [`quantile`] for an already sorted, non-empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Arithmetic mean, `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// `numer / denom × 100`, or 0 when the denominator is zero.
///
/// The zero branch is explicit so no NaN or infinity reaches a curve.
pub fn percent_of(numer: f64, denom: f64) -> f64 {
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    numer / denom * 100.0
}
