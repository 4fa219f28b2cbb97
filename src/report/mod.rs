//! Reporting utilities: per-strategy contributions and formatted terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::approx::Approximation;
use crate::dictionary::Dictionary;
use crate::domain::Strategy;
use crate::error::AppError;

/// One strategy's weighted template, i.e. its share of the approximation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub strategy: Strategy,
    pub profile: Vec<f64>,
}

impl Contribution {
    /// Total liquidity mass contributed.
    pub fn mass(&self) -> f64 {
        self.profile.iter().sum()
    }

    /// First and last bin with non-zero contribution.
    pub fn support(&self) -> Option<(usize, usize)> {
        let first = self.profile.iter().position(|&v| v > 0.0)?;
        let last = self.profile.iter().rposition(|&v| v > 0.0)?;
        Some((first, last))
    }
}

/// Weighted template profile for every reported strategy.
///
/// Summing the profiles reproduces `result.approximation`.
pub fn contributions(
    result: &Approximation,
    dictionary: &Dictionary,
) -> Result<Vec<Contribution>, AppError> {
    result
        .strategies
        .iter()
        .map(|s| {
            let template = dictionary.template(s.index).ok_or_else(|| {
                AppError::new(2, format!("Strategy index {} is outside the dictionary.", s.index))
            })?;
            Ok(Contribution {
                strategy: *s,
                profile: template.into_iter().map(|v| v * s.weight).collect(),
            })
        })
        .collect()
}
