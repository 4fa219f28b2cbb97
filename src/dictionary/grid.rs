//! Integer parameter grids.
//!
//! Template centers and widths are enumerated on inclusive, evenly stepped
//! integer ranges. The grid is deterministic given the same inputs, which keeps
//! dictionary row indices stable across runs.

use crate::error::AppError;

/// Values `lo, lo + step, …` up to and including `hi` (when reachable).
///
/// `lo > hi` yields an empty grid; `step == 0` is a configuration error.
pub fn stepped_range(lo: i64, hi: i64, step: usize) -> Result<Vec<i64>, AppError> {
    if step == 0 {
        return Err(AppError::new(2, "Grid step must be >= 1."));
    }
    if lo > hi {
        return Ok(Vec::new());
    }

    let span = hi
        .checked_sub(lo)
        .ok_or_else(|| AppError::new(2, format!("Grid range [{lo}, {hi}] is too wide.")))?;
    let step = i64::try_from(step).unwrap_or(i64::MAX);
    let count = span / step + 1;
    Ok((0..count).map(|k| lo + k * step).collect())
}

/// Width grid: like [`stepped_range`] but over non-negative widths.
pub fn width_range(lo: usize, hi: usize, step: usize) -> Result<Vec<usize>, AppError> {
    let to_i64 = |w: usize| {
        i64::try_from(w).map_err(|_| AppError::new(2, format!("Width {w} is out of range.")))
    };
    Ok(stepped_range(to_i64(lo)?, to_i64(hi)?, step)?
        .into_iter()
        .map(|w| w as usize)
        .collect())
}
