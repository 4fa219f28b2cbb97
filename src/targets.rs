//! Target distributions to approximate.
//!
//! The approximator accepts any non-negative vector; these builders cover the
//! usual ways of producing one:
//!
//! - `mixture`: scaled raw shapes (a hand-built position)
//! - `gaussian`: a discretised bell curve
//! - `sampled`: a histogram of seeded Gaussian draws (a noisy, "observed" position)
//!
//! All builders return vectors normalised to unit mass.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ShapeComponent, TargetSpec};
use crate::error::AppError;

/// Build the target described by `spec`.
pub fn build_target(bins: usize, spec: &TargetSpec) -> Result<Vec<f64>, AppError> {
    match spec {
        TargetSpec::Mixture(components) => mixture(bins, components),
        TargetSpec::Gaussian { center, sigma } => gaussian(bins, *center, *sigma),
        TargetSpec::Sampled {
            center,
            sigma,
            samples,
            seed,
        } => sampled(bins, *center, *sigma, *samples, *seed),
    }
}

/// Sum of `scale * raw_shape`, normalised to unit mass.
pub fn mixture(bins: usize, components: &[ShapeComponent]) -> Result<Vec<f64>, AppError> {
    check_bins(bins)?;
    if components.is_empty() {
        return Err(AppError::new(2, "Mixture target needs at least one component."));
    }

    let mut out = vec![0.0; bins];
    for c in components {
        if !(c.scale.is_finite() && c.scale >= 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid component scale {} (must be finite and >= 0).", c.scale),
            ));
        }
        let shape = c.kind.evaluate(c.center, c.width, bins);
        for (o, v) in out.iter_mut().zip(shape) {
            *o += c.scale * v;
        }
    }

    normalize_mass(out, "Mixture target has zero mass on the bin axis.")
}

/// `exp(-0.5 ((x - center) / sigma)²)` normalised to unit mass.
///
/// `center` defaults to `bins / 2`.
pub fn gaussian(bins: usize, center: Option<f64>, sigma: f64) -> Result<Vec<f64>, AppError> {
    check_bins(bins)?;
    check_sigma(sigma)?;
    let center = resolve_center(bins, center)?;

    let raw = (0..bins)
        .map(|i| {
            let z = (i as f64 - center) / sigma;
            (-0.5 * z * z).exp()
        })
        .collect();

    normalize_mass(raw, "Gaussian target underflowed to zero mass.")
}

/// Histogram of `samples` Gaussian draws rounded to the nearest bin.
///
/// Draws that land off the axis are discarded. Deterministic for a fixed `seed`.
pub fn sampled(
    bins: usize,
    center: Option<f64>,
    sigma: f64,
    samples: usize,
    seed: u64,
) -> Result<Vec<f64>, AppError> {
    check_bins(bins)?;
    check_sigma(sigma)?;
    if samples == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    let center = resolve_center(bins, center)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(center, sigma)
        .map_err(|e| AppError::new(2, format!("Sampling distribution error: {e}")))?;

    let mut counts = vec![0.0; bins];
    for _ in 0..samples {
        let x = normal.sample(&mut rng).round();
        if x >= 0.0 && x < bins as f64 {
            counts[x as usize] += 1.0;
        }
    }

    normalize_mass(counts, "No samples landed on the bin axis.")
}

fn check_bins(bins: usize) -> Result<(), AppError> {
    if bins == 0 {
        return Err(AppError::new(2, "Bin count must be > 0."));
    }
    Ok(())
}

fn check_sigma(sigma: f64) -> Result<(), AppError> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(AppError::new(2, format!("Invalid sigma {sigma} (must be finite and > 0).")));
    }
    Ok(())
}

fn resolve_center(bins: usize, center: Option<f64>) -> Result<f64, AppError> {
    let center = center.unwrap_or((bins / 2) as f64);
    if !center.is_finite() {
        return Err(AppError::new(2, "Target center must be finite."));
    }
    Ok(center)
}

fn normalize_mass(mut v: Vec<f64>, empty_msg: &str) -> Result<Vec<f64>, AppError> {
    let total: f64 = v.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(AppError::new(2, empty_msg));
    }
    for x in &mut v {
        *x /= total;
    }
    Ok(v)
}
