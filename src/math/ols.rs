//! Unconstrained least squares on a subset of columns.
//!
//! The NNLS solver repeatedly solves
//!
//! ```text
//! minimize ‖A_P z - b‖₂
//! ```
//!
//! where `A_P` keeps only the columns in the current passive set `P`. `P` grows
//! one column at a time and may become rank deficient (neighbouring templates
//! are nearly collinear), so we solve with SVD, which returns the minimum-norm
//! solution instead of failing.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve least squares using only `columns` of `a`.
///
/// The returned vector has one entry per selected column, in the same order.
pub fn solve_on_columns(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    columns: &[usize],
) -> Option<DVector<f64>> {
    if columns.is_empty() {
        return Some(DVector::zeros(0));
    }
    let sub = a.select_columns(columns);
    solve_least_squares(&sub, b)
}
