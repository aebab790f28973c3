//! Least squares solver.
//!
//! The seasonal model is linear in its coefficients once the basis columns are
//! evaluated, so fitting it means solving
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD so tall design matrices (many more rows than columns) are fine.
//! - Rank-deficient designs are expected (e.g. a weekly Fourier block on a series
//!   that only has weekdays). Singular values below tolerance are dropped, which
//!   yields the minimum-norm solution instead of a failure.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
