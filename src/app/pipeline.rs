//! Shared "fit pipeline" logic used by the CLI front-end and tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! target -> dictionary -> NNLS approximation -> contributions
//!
//! The CLI can then focus on presentation (text, plot, JSON).

use tracing::info;

use crate::approx::{Approximation, approximate};
use crate::dictionary::{Dictionary, generate};
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::report::{Contribution, contributions};
use crate::targets::build_target;

/// All computed outputs of a single `shapes fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dictionary: Dictionary,
    pub target: Vec<f64>,
    pub result: Approximation,
    pub contributions: Vec<Contribution>,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    // 1) Validate enumeration settings and build the target before any heavy work.
    config.dictionary.validate()?;
    let target = build_target(config.dictionary.bins, &config.target)?;

    // 2) Materialise the dictionary.
    let dictionary = generate(&config.dictionary)?;
    info!(templates = dictionary.len(), bins = dictionary.bins(), "generated templates");

    run_fit_with_dictionary(config, dictionary, target)
}

/// Execute the approximation against a pre-built dictionary.
///
/// Useful when several targets share one dictionary.
pub fn run_fit_with_dictionary(
    config: &RunConfig,
    dictionary: Dictionary,
    target: Vec<f64>,
) -> Result<RunOutput, AppError> {
    // 3) Solve, prune, score.
    let result = approximate(&target, &dictionary, &config.approx)?;
    info!(
        r_squared = result.r_squared,
        residual = result.residual,
        strategies = result.strategies.len(),
        "approximation finished"
    );

    // 4) Per-strategy breakdown for reporting.
    let contributions = contributions(&result, &dictionary)?;

    Ok(RunOutput {
        dictionary,
        target,
        result,
        contributions,
    })
}
