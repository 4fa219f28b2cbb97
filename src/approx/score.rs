//! Reconstruction quality metrics.

/// Guard added to the total sum of squares in `r_squared`.
pub const R_SQUARED_EPS: f64 = 1e-12;

/// Euclidean norm of `target - approximation`.
pub fn residual_norm(target: &[f64], approximation: &[f64]) -> f64 {
    sum_squared_error(target, approximation).sqrt()
}

/// `Σ (target - approximation)²`.
pub fn sum_squared_error(target: &[f64], approximation: &[f64]) -> f64 {
    target
        .iter()
        .zip(approximation.iter())
        .map(|(&t, &a)| (t - a) * (t - a))
        .sum()
}

/// Coefficient of determination `1 - SS_res / (SS_tot + ε)`.
///
/// Not clamped: an approximation worse than the constant mean predictor gives
/// a negative value.
pub fn r_squared(target: &[f64], approximation: &[f64]) -> f64 {
    if target.is_empty() {
        return 0.0;
    }
    let mean = target.iter().sum::<f64>() / target.len() as f64;
    let ss_tot: f64 = target.iter().map(|&t| (t - mean) * (t - mean)).sum();
    let ss_res = sum_squared_error(target, approximation);
    1.0 - ss_res / (ss_tot + R_SQUARED_EPS)
}
