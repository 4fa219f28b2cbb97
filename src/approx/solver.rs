//! Sparse non-negative approximation of a target over a template dictionary.
//!
//! Given:
//! - a target vector over `B` bins
//! - a template matrix (rows = templates, columns = bins)
//!
//! we:
//! - solve `min ‖Tᵀ w - target‖₂` subject to `w ≥ 0`
//! - keep only weights above `ACTIVE_WEIGHT_THRESHOLD`
//! - optionally keep only the `max_strategies` largest of those
//! - renormalise surviving weights to sum to one
//! - reconstruct and score the fit
//!
//! Everything after the solve is deterministic bookkeeping; ties when pruning
//! are broken by lowest template index.

use std::cmp::Ordering;

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::approx::score::{r_squared, residual_norm};
use crate::dictionary::Dictionary;
use crate::domain::{Strategy, TemplateParams};
use crate::error::AppError;
use crate::math::{LawsonHanson, NnlsSolver};

/// Weights at or below this are treated as exactly zero.
pub const ACTIVE_WEIGHT_THRESHOLD: f64 = 1e-6;

/// Minimum total weight required before renormalising.
pub const RENORMALIZE_EPS: f64 = 1e-12;

/// Approximation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApproxOptions {
    /// Cap on the number of templates kept in the final combination.
    pub max_strategies: Option<usize>,
}

impl ApproxOptions {
    pub fn with_max_strategies(max_strategies: usize) -> Self {
        Self {
            max_strategies: Some(max_strategies),
        }
    }
}

/// Active-set bookkeeping, exposed instead of printed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveSetTrace {
    /// `(index, raw weight)` for every template above the threshold straight
    /// out of the solver, ascending index.
    pub solved: Vec<(usize, f64)>,
    /// Indices kept after pruning, ascending.
    pub retained: Vec<usize>,
    /// Whether top-K pruning removed anything.
    pub pruned: bool,
    pub solver_iterations: usize,
}

/// Result of one approximation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Approximation {
    /// Final weights, one per template (zero for unused templates).
    pub weights: Vec<f64>,
    /// `Tᵀ · weights`, one value per bin.
    pub approximation: Vec<f64>,
    /// `‖target - approximation‖₂`.
    pub residual: f64,
    pub r_squared: f64,
    /// Retained templates in ascending index order (empty without params).
    pub strategies: Vec<Strategy>,
    pub trace: ActiveSetTrace,
}

impl Approximation {
    /// Sum of the final weights.
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Approximate `target` with the default Lawson–Hanson solver.
pub fn approximate(
    target: &[f64],
    dictionary: &Dictionary,
    opts: &ApproxOptions,
) -> Result<Approximation, AppError> {
    approximate_with(&LawsonHanson::default(), target, dictionary, opts)
}

/// Approximate `target` with a caller-provided NNLS solver.
pub fn approximate_with<S: NnlsSolver + ?Sized>(
    solver: &S,
    target: &[f64],
    dictionary: &Dictionary,
    opts: &ApproxOptions,
) -> Result<Approximation, AppError> {
    approximate_matrix(solver, target, dictionary.templates(), Some(dictionary.params()), opts)
}

/// Approximate `target` against a raw template matrix.
///
/// `params`, when given, must be index-aligned with the matrix rows; without it
/// the strategy list is empty.
pub fn approximate_matrix<S: NnlsSolver + ?Sized>(
    solver: &S,
    target: &[f64],
    templates: &DMatrix<f64>,
    params: Option<&[TemplateParams]>,
    opts: &ApproxOptions,
) -> Result<Approximation, AppError> {
    let (n, bins) = templates.shape();
    validate_inputs(target, n, bins, params, opts)?;

    // 1) Solve NNLS on A = Tᵀ (bins × templates).
    let a = templates.transpose();
    let b = DVector::from_column_slice(target);
    let solution = solver.solve(&a, &b)?;
    let raw = solution.x;
    if raw.len() != n {
        return Err(AppError::new(
            4,
            format!("NNLS solver returned {} weights for {n} templates.", raw.len()),
        ));
    }
    if raw.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(AppError::new(4, "NNLS solver returned negative or non-finite weights."));
    }

    // 2) Active set: everything at or below the threshold is dropped.
    let mut active: Vec<usize> = (0..n).filter(|&i| raw[i] > ACTIVE_WEIGHT_THRESHOLD).collect();
    let solved: Vec<(usize, f64)> = active.iter().map(|&i| (i, raw[i])).collect();
    debug!(active = ?solved, "solver active set");

    // 3) Optional top-K pruning.
    let mut pruned = false;
    if let Some(k) = opts.max_strategies {
        if active.len() > k {
            active = top_k_by_weight(&active, raw.as_slice(), k);
            pruned = true;
            debug!(retained = ?active, k, "pruned active set");
        }
    }

    let mut weights = vec![0.0; n];
    for &i in &active {
        weights[i] = raw[i];
    }

    // 4) Renormalise.
    let total: f64 = weights.iter().sum();
    if total > RENORMALIZE_EPS {
        for w in &mut weights {
            *w /= total;
        }
    }

    // 5) Reconstruct.
    let w = DVector::from_column_slice(&weights);
    let approximation: Vec<f64> = templates.tr_mul(&w).iter().copied().collect();

    // 6) Score.
    let residual = residual_norm(target, &approximation);
    let r2 = r_squared(target, &approximation);

    // 7) Strategies in ascending dictionary order.
    let strategies = match params {
        Some(params) => active
            .iter()
            .map(|&i| Strategy {
                index: i,
                params: params[i],
                weight: weights[i],
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(Approximation {
        weights,
        approximation,
        residual,
        r_squared: r2,
        strategies,
        trace: ActiveSetTrace {
            solved,
            retained: active,
            pruned,
            solver_iterations: solution.iterations,
        },
    })
}

fn validate_inputs(
    target: &[f64],
    n: usize,
    bins: usize,
    params: Option<&[TemplateParams]>,
    opts: &ApproxOptions,
) -> Result<(), AppError> {
    if n == 0 {
        return Err(AppError::new(2, "Template dictionary is empty."));
    }
    if bins == 0 {
        return Err(AppError::new(2, "Bin count must be > 0."));
    }
    if target.len() != bins {
        return Err(AppError::new(
            2,
            format!("Target has {} bins but the dictionary has {bins}.", target.len()),
        ));
    }
    if let Some(params) = params {
        if params.len() != n {
            return Err(AppError::new(
                2,
                format!("Parameter list has {} entries for {n} templates.", params.len()),
            ));
        }
    }
    if opts.max_strategies == Some(0) {
        return Err(AppError::new(2, "max_strategies must be >= 1."));
    }
    if target.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(4, "Target contains non-finite values."));
    }
    Ok(())
}

/// The `k` indices with the largest weights, returned in ascending index order.
fn top_k_by_weight(active: &[usize], weights: &[f64], k: usize) -> Vec<usize> {
    let mut ranked = active.to_vec();
    ranked.sort_by(|&a, &b| {
        weights[b]
            .partial_cmp(&weights[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    ranked.truncate(k);
    ranked.sort_unstable();
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{GeneratorConfig, generate};
    use crate::domain::ShapeKind;
    use crate::math::NnlsSolution;

    /// Solver stub returning fixed weights.
    struct FixedSolver(Vec<f64>);

    impl NnlsSolver for FixedSolver {
        fn solve(&self, _a: &DMatrix<f64>, _b: &DVector<f64>) -> Result<NnlsSolution, AppError> {
            Ok(NnlsSolution {
                x: DVector::from_vec(self.0.clone()),
                residual_norm: 0.0,
                iterations: 0,
            })
        }
    }

    fn gaussian(bins: usize, center: f64, sigma: f64) -> Vec<f64> {
        let raw: Vec<f64> = (0..bins)
            .map(|i| (-0.5 * ((i as f64 - center) / sigma).powi(2)).exp())
            .collect();
        let sum: f64 = raw.iter().sum();
        raw.into_iter().map(|v| v / sum).collect()
    }

    fn identity_params(n: usize) -> Vec<TemplateParams> {
        (0..n)
            .map(|i| TemplateParams {
                kind: ShapeKind::Rectangle,
                center: i as i64,
                width: 1,
            })
            .collect()
    }

    #[test]
    fn dictionary_member_is_reconstructed_exactly() {
        let dict = generate(&GeneratorConfig::new(69).with_steps(1, 2)).unwrap();
        let idx = dict.find(ShapeKind::Curve, 34, 15).unwrap();
        let target = dict.template(idx).unwrap();

        let result = approximate(&target, &dict, &ApproxOptions::default()).unwrap();
        assert!((result.r_squared - 1.0).abs() < 1e-6, "r2 = {}", result.r_squared);
        assert!(result.residual < 1e-6, "residual = {}", result.residual);
        assert!(result.weights.iter().all(|&w| w >= 0.0));
        assert!((result.weight_sum() - 1.0).abs() < 1e-9);

        // The full dictionary is rank deficient: narrower curves plus bid-ask
        // notches rebuild the same profile, and the solver enters the
        // narrowest curve first, so the template itself is not reported.
        assert!(result.strategies.len() > 1);
        assert!(result.strategies.iter().all(|s| s.index != idx));

        let single = approximate(&target, &dict, &ApproxOptions::with_max_strategies(1)).unwrap();
        assert_eq!(single.strategies.len(), 1);
        assert_ne!(single.strategies[0].index, idx);
        assert!(single.r_squared < 0.9, "r2 = {}", single.r_squared);
    }

    #[test]
    fn single_template_recovered_when_representation_is_unique() {
        // Rectangle, curve and bid-ask at one center/width: the curve has no
        // other non-negative representation.
        let cfg = GeneratorConfig::new(69)
            .with_center_range(34, 34)
            .with_width_range(15, 15);
        let dict = generate(&cfg).unwrap();
        assert_eq!(dict.len(), 3);
        let idx = dict.find(ShapeKind::Curve, 34, 15).unwrap();
        let target = dict.template(idx).unwrap();

        let result = approximate(&target, &dict, &ApproxOptions::default()).unwrap();
        assert!((result.r_squared - 1.0).abs() < 1e-6, "r2 = {}", result.r_squared);
        assert_eq!(result.strategies.len(), 1);
        let s = result.strategies[0];
        assert_eq!(s.index, idx);
        assert_eq!(s.params.kind, ShapeKind::Curve);
        assert_eq!((s.params.center, s.params.width), (34, 15));
        assert!((s.weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn two_shape_mixture_is_reconstructed_exactly() {
        let bins = 69;
        let raw: Vec<f64> = crate::math::bid_ask(34, 25, bins)
            .iter()
            .zip(crate::math::curve(34, 15, bins).iter())
            .map(|(a, b)| 0.5 * a + 0.5 * b)
            .collect();
        let sum: f64 = raw.iter().sum();
        let target: Vec<f64> = raw.iter().map(|v| v / sum).collect();

        let dict = generate(&GeneratorConfig::new(bins).with_steps(1, 2)).unwrap();
        let result = approximate(&target, &dict, &ApproxOptions::default()).unwrap();

        assert!(!result.strategies.is_empty());
        assert!(result.r_squared > 0.999, "r2 = {}", result.r_squared);
        assert!((result.weight_sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn approximation_is_deterministic() {
        let dict = generate(&GeneratorConfig::new(40)).unwrap();
        let target = gaussian(40, 20.0, 6.0);
        let opts = ApproxOptions::with_max_strategies(3);

        let a = approximate(&target, &dict, &opts).unwrap();
        let b = approximate(&target, &dict, &opts).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.approximation, b.approximation);
        assert_eq!(a.residual, b.residual);
        assert_eq!(a.r_squared, b.r_squared);
        assert_eq!(a.strategies, b.strategies);
    }

    #[test]
    fn weights_are_non_negative_and_sum_to_one() {
        let dict = generate(&GeneratorConfig::new(40)).unwrap();
        let target = gaussian(40, 17.0, 5.0);
        let result = approximate(&target, &dict, &ApproxOptions::default()).unwrap();

        assert_eq!(result.weights.len(), dict.len());
        assert_eq!(result.approximation.len(), 40);
        assert!(result.weights.iter().all(|&w| w >= 0.0));
        assert!(!result.strategies.is_empty());
        assert!((result.weight_sum() - 1.0).abs() < 1e-9);
        let strat_sum: f64 = result.strategies.iter().map(|s| s.weight).sum();
        assert!((strat_sum - 1.0).abs() < 1e-9);
        assert!(result.r_squared > 0.9);

        // Strategies are reported in ascending dictionary order.
        let idx: Vec<usize> = result.strategies.iter().map(|s| s.index).collect();
        let mut sorted = idx.clone();
        sorted.sort_unstable();
        assert_eq!(idx, sorted);
        for s in &result.strategies {
            assert_eq!(s.params, dict.params()[s.index]);
        }
    }

    #[test]
    fn pruning_keeps_the_largest_weights() {
        let dict = generate(&GeneratorConfig::new(40)).unwrap();
        let target = gaussian(40, 20.0, 6.0);
        let k = 2;

        let full = approximate(&target, &dict, &ApproxOptions::default()).unwrap();
        assert!(full.trace.solved.len() > k, "need more than {k} active templates");
        assert!(!full.trace.pruned);

        let pruned = approximate(&target, &dict, &ApproxOptions::with_max_strategies(k)).unwrap();
        assert!(pruned.trace.pruned);
        assert_eq!(pruned.strategies.len(), k);
        assert_eq!(pruned.trace.solved, full.trace.solved);

        let mut ranked = full.trace.solved.clone();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(&b.0)));
        let mut expected: Vec<usize> = ranked.iter().take(k).map(|(i, _)| *i).collect();
        expected.sort_unstable();
        assert_eq!(pruned.trace.retained, expected);

        let kept: Vec<usize> = pruned.strategies.iter().map(|s| s.index).collect();
        assert_eq!(kept, expected);
        assert!((pruned.weight_sum() - 1.0).abs() < 1e-9);
        for (i, w) in pruned.weights.iter().enumerate() {
            if !expected.contains(&i) {
                assert_eq!(*w, 0.0);
            }
        }
    }

    #[test]
    fn threshold_and_renormalisation_with_stub_solver() {
        let templates = DMatrix::<f64>::identity(3, 3);
        let params = identity_params(3);
        let solver = FixedSolver(vec![0.5, 1e-7, 1.5]);

        let result = approximate_matrix(
            &solver,
            &[0.25, 0.0, 0.75],
            &templates,
            Some(&params),
            &ApproxOptions::default(),
        )
        .unwrap();

        assert_eq!(result.weights, vec![0.25, 0.0, 0.75]);
        assert_eq!(result.approximation, vec![0.25, 0.0, 0.75]);
        assert_eq!(result.trace.retained, vec![0, 2]);
        assert!(result.residual < 1e-15);
    }

    #[test]
    fn ties_are_broken_by_lowest_index() {
        let templates = DMatrix::<f64>::identity(3, 3);
        let params = identity_params(3);
        let solver = FixedSolver(vec![0.3, 0.3, 0.3]);

        let result = approximate_matrix(
            &solver,
            &[1.0, 1.0, 1.0],
            &templates,
            Some(&params),
            &ApproxOptions::with_max_strategies(2),
        )
        .unwrap();
        assert_eq!(result.trace.retained, vec![0, 1]);
        assert!((result.weights[0] - 0.5).abs() < 1e-12);
        assert_eq!(result.weights[2], 0.0);
    }

    #[test]
    fn negative_solver_output_is_rejected() {
        let templates = DMatrix::<f64>::identity(2, 2);
        let solver = FixedSolver(vec![0.3, -0.1]);
        let opts = ApproxOptions::default();
        let err = approximate_matrix(&solver, &[1.0, 1.0], &templates, None, &opts).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn zero_target_gives_zero_solution() {
        let dict = generate(&GeneratorConfig::new(20)).unwrap();
        let result = approximate(&[0.0; 20], &dict, &ApproxOptions::default()).unwrap();
        assert!(result.weights.iter().all(|&w| w == 0.0));
        assert!(result.approximation.iter().all(|&v| v == 0.0));
        assert!(result.strategies.is_empty());
        assert_eq!(result.residual, 0.0);
        assert!((result.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_templates_propagate_negative_r_squared() {
        let templates = DMatrix::<f64>::zeros(3, 5);
        let target = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = approximate_matrix(
            &LawsonHanson::new(),
            &target,
            &templates,
            None,
            &ApproxOptions::default(),
        )
        .unwrap();

        assert!(result.weights.iter().all(|&w| w == 0.0));
        assert!((result.residual - 55.0_f64.sqrt()).abs() < 1e-12);
        // SS_res = 55, SS_tot = 10
        assert!((result.r_squared - (1.0 - 5.5)).abs() < 1e-9);
    }

    #[test]
    fn missing_params_yield_no_strategies() {
        let dict = generate(&GeneratorConfig::new(20)).unwrap();
        let target = gaussian(20, 10.0, 3.0);
        let result = approximate_matrix(
            &LawsonHanson::new(),
            &target,
            dict.templates(),
            None,
            &ApproxOptions::default(),
        )
        .unwrap();
        assert!(result.strategies.is_empty());
        assert!(!result.trace.retained.is_empty());
    }

    #[test]
    fn configuration_errors_fail_fast() {
        let dict = generate(&GeneratorConfig::new(20)).unwrap();
        let opts = ApproxOptions::default();

        let err = approximate(&[0.1; 19], &dict, &opts).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = approximate(&[0.1; 21], &dict, &opts).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let zero_k = ApproxOptions::with_max_strategies(0);
        let err = approximate(&[0.1; 20], &dict, &zero_k).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let empty = generate(&GeneratorConfig::new(20).with_width_range(9, 3)).unwrap();
        let err = approximate(&[0.1; 20], &empty, &opts).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let short_params = &dict.params()[..3];
        let err = approximate_matrix(
            &LawsonHanson::new(),
            &[0.1; 20],
            dict.templates(),
            Some(short_params),
            &opts,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let mut bad = vec![0.1; 20];
        bad[3] = f64::NAN;
        assert_eq!(approximate(&bad, &dict, &opts).unwrap_err().exit_code(), 4);
    }
}
