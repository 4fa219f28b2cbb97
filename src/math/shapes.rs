//! Raw liquidity shape profiles over a discrete bin axis.
//!
//! Each function maps `(center, width, bins)` to a non-negative vector of length
//! `bins`. The profiles are *raw*: normalisation to unit mass happens in the
//! dictionary generator.
//!
//! - `rectangle`: flat top over exactly `width` bins around `center`
//! - `curve`: triangular taper peaking at `center`, zero at distance `width/2`
//! - `bid_ask`: inverted taper inside the same window (zero-ish at the center,
//!   `1.0` at the window edges), zero outside it

use crate::domain::ShapeKind;

/// Guard added to the half-width so a zero width never divides by zero.
const TAPER_EPS: f64 = 1e-12;

/// Flat-topped indicator of `width` contiguous bins centred (rounded) at `center`.
///
/// The window start is `round(center - (width - 1) / 2)` with ties rounded to
/// even. Window positions outside `[0, bins)` are dropped, not wrapped.
pub fn rectangle(center: i64, width: usize, bins: usize) -> Vec<f64> {
    let mut out = vec![0.0; bins];
    let left = (center as f64 - (width as f64 - 1.0) / 2.0).round_ties_even() as i64;
    let right = left.saturating_add(width as i64);

    let start = left.clamp(0, bins as i64) as usize;
    let end = right.clamp(0, bins as i64) as usize;
    for v in &mut out[start..end] {
        *v = 1.0;
    }
    out
}

/// Triangular taper: `max(0, (w/2 - d) / (w/2))` with `d = |i - center|`.
pub fn curve(center: i64, width: usize, bins: usize) -> Vec<f64> {
    let maxd = width as f64 / 2.0;
    (0..bins)
        .map(|i| {
            let d = (i as f64 - center as f64).abs();
            ((maxd - d) / (maxd + TAPER_EPS)).max(0.0)
        })
        .collect()
}

/// Inverted taper inside `[center - w/2, center + w/2]`, zero outside.
pub fn bid_ask(center: i64, width: usize, bins: usize) -> Vec<f64> {
    let maxd = width as f64 / 2.0;
    let c = center as f64;
    (0..bins)
        .map(|i| {
            let x = i as f64;
            if x < c - maxd || x > c + maxd {
                return 0.0;
            }
            let d = (x - c).abs();
            (1.0 - (maxd - d) / (maxd + TAPER_EPS)).max(0.0)
        })
        .collect()
}

impl ShapeKind {
    /// Evaluate the raw (unnormalised) profile for this shape family.
    pub fn evaluate(self, center: i64, width: usize, bins: usize) -> Vec<f64> {
        match self {
            ShapeKind::Rectangle => rectangle(center, width, bins),
            ShapeKind::Curve => curve(center, width, bins),
            ShapeKind::BidAsk => bid_ask(center, width, bins),
        }
    }
}
