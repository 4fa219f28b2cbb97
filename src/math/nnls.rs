//! Non-negative least squares.
//!
//! ```text
//! minimize ‖A x - b‖₂  subject to  x ≥ 0
//! ```
//!
//! The approximator only depends on the [`NnlsSolver`] trait; [`LawsonHanson`]
//! is the default implementation (the classic active-set method). Each outer
//! iteration moves the column with the largest positive gradient into the
//! passive set, solves the unconstrained problem on that set, and steps back
//! toward feasibility whenever a passive coefficient turns non-positive.
//!
//! The method is deterministic: entering columns are chosen by largest
//! gradient, with ties broken by lowest column index.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::AppError;
use crate::math::ols::solve_on_columns;

/// Output of a successful NNLS solve.
#[derive(Debug, Clone)]
pub struct NnlsSolution {
    /// Component-wise non-negative coefficients, one per column of `A`.
    pub x: DVector<f64>,
    /// `‖A x - b‖₂` at the returned solution.
    pub residual_norm: f64,
    /// Number of passive-set updates performed.
    pub iterations: usize,
}

/// A non-negative least squares capability.
///
/// Implementations must return `x ≥ 0` minimising `‖A x - b‖₂`, or fail outright.
pub trait NnlsSolver {
    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<NnlsSolution, AppError>;
}

/// Lawson–Hanson active-set NNLS.
#[derive(Debug, Clone, Default)]
pub struct LawsonHanson {
    /// Iteration budget. Defaults to `3 * ncols`.
    pub max_iter: Option<usize>,
    /// Gradient/feasibility tolerance. Defaults to `10 * eps * max(nrows, ncols)`.
    pub tolerance: Option<f64>,
}

impl LawsonHanson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

impl NnlsSolver for LawsonHanson {
    fn solve(&self, a: &DMatrix<f64>, b: &DVector<f64>) -> Result<NnlsSolution, AppError> {
        let (m, n) = a.shape();
        if b.len() != m {
            return Err(AppError::new(
                2,
                format!(
                    "NNLS dimension mismatch: matrix has {m} rows but rhs has {} entries.",
                    b.len()
                ),
            ));
        }
        if n == 0 {
            return Err(AppError::new(2, "NNLS needs at least one column."));
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::new(4, "NNLS inputs contain non-finite values."));
        }

        let tol = self.tolerance.unwrap_or(10.0 * f64::EPSILON * m.max(n) as f64);
        let max_iter = self.max_iter.unwrap_or(3 * n).max(1);

        let mut x = DVector::<f64>::zeros(n);
        let mut passive = vec![false; n];
        // Columns whose entry step made no progress; skipped until the passive
        // set changes successfully again. Prevents cycling on round-off.
        let mut blocked = vec![false; n];
        let mut iterations = 0usize;
        let mut grad = a.tr_mul(b);

        while let Some(j) = select_entering(&grad, &passive, &blocked, tol) {
            if iterations >= max_iter {
                return Err(nonconvergence(max_iter));
            }
            iterations += 1;
            passive[j] = true;

            let mut s = passive_solution(a, b, &passive)?;
            while passive.iter().zip(s.iter()).any(|(&p, &si)| p && si <= 0.0) {
                if iterations >= max_iter {
                    return Err(nonconvergence(max_iter));
                }
                iterations += 1;

                let alpha = (0..n)
                    .filter(|&i| passive[i] && s[i] <= 0.0)
                    .map(|i| {
                        let denom = x[i] - s[i];
                        if denom > 0.0 { x[i] / denom } else { 0.0 }
                    })
                    .fold(f64::INFINITY, f64::min);

                for i in 0..n {
                    x[i] += alpha * (s[i] - x[i]);
                    if passive[i] && x[i] <= tol {
                        passive[i] = false;
                        x[i] = 0.0;
                    }
                }
                s = passive_solution(a, b, &passive)?;
            }

            if passive[j] {
                blocked.iter_mut().for_each(|v| *v = false);
            } else {
                blocked[j] = true;
            }

            x = s;
            grad = a.tr_mul(&(b - a * &x));
        }

        let residual_norm = (b - a * &x).norm();
        debug!(
            iterations,
            passive = passive.iter().filter(|&&p| p).count(),
            residual_norm,
            "nnls converged"
        );

        Ok(NnlsSolution {
            x,
            residual_norm,
            iterations,
        })
    }
}

/// Column with the largest gradient above `tol` outside the passive set.
fn select_entering(
    grad: &DVector<f64>,
    passive: &[bool],
    blocked: &[bool],
    tol: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &g) in grad.iter().enumerate() {
        if passive[i] || blocked[i] || g <= tol {
            continue;
        }
        match best {
            Some((_, bg)) if g <= bg => {}
            _ => best = Some((i, g)),
        }
    }
    best.map(|(i, _)| i)
}

/// Unconstrained solution on the passive columns, scattered back to full length.
fn passive_solution(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    passive: &[bool],
) -> Result<DVector<f64>, AppError> {
    let columns: Vec<usize> = passive
        .iter()
        .enumerate()
        .filter_map(|(i, &p)| p.then_some(i))
        .collect();
    let z = solve_on_columns(a, b, &columns)
        .ok_or_else(|| AppError::new(4, "Least-squares subproblem failed during NNLS."))?;

    let mut s = DVector::<f64>::zeros(a.ncols());
    for (k, &i) in columns.iter().enumerate() {
        s[i] = z[k];
    }
    Ok(s)
}

fn nonconvergence(max_iter: usize) -> AppError {
    AppError::new(4, format!("NNLS did not converge within {max_iter} iterations."))
}
