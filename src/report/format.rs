//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/solver code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use std::cmp::Ordering;

use serde::Serialize;

use crate::approx::Approximation;
use crate::dictionary::Dictionary;
use crate::domain::{RunConfig, Strategy, TargetSpec};
use crate::error::AppError;
use crate::report::Contribution;

/// Format the run summary (dictionary, target, fit quality).
pub fn format_run_summary(
    dictionary: &Dictionary,
    result: &Approximation,
    config: &RunConfig,
) -> String {
    let mut out = String::new();
    let dict_cfg = &config.dictionary;
    let (c_lo, c_hi) = dict_cfg.resolved_center_range();

    out.push_str("=== shapes - sparse liquidity shape fit ===\n");
    out.push_str(&format!("Bins: {}\n", dictionary.bins()));
    out.push_str(&format!(
        "Dictionary: {} templates | centers=[{c_lo}, {c_hi}] step {} | widths=[{}, {}] step {}\n",
        dictionary.len(),
        dict_cfg.center_step,
        dict_cfg.width_range.0,
        dict_cfg.width_range.1,
        dict_cfg.width_step,
    ));
    out.push_str(&format!("Target: {}\n", describe_target(&config.target)));
    match config.approx.max_strategies {
        Some(k) => out.push_str(&format!("Max strategies: {k}\n")),
        None => out.push_str("Max strategies: unlimited\n"),
    }

    out.push_str("\nResults:\n");
    out.push_str(&format!("  R-squared: {:.4}\n", result.r_squared));
    out.push_str(&format!("  Residual: {:.4}\n", result.residual));
    out.push_str(&format!(
        "  Active templates: {} solved -> {} kept{}\n",
        result.trace.solved.len(),
        result.trace.retained.len(),
        if result.trace.pruned { " (pruned)" } else { "" },
    ));
    out.push_str(&format!("  Solver iterations: {}\n", result.trace.solver_iterations));
    out.push_str(&format!("  Strategies used: {}\n", result.strategies.len()));

    out
}

/// Format the strongest `top_n` strategies, largest weight first.
pub fn format_strategies(strategies: &[Strategy], top_n: usize) -> String {
    let mut out = String::new();
    out.push_str("Top strategies:\n");

    if strategies.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }

    for (rank, s) in by_weight(strategies).into_iter().take(top_n).enumerate() {
        out.push_str(&format!(
            "  {}. {:<10} | center={:>3} width={:>3} | weight={:.4} | template #{}\n",
            rank + 1,
            s.params.kind.name(),
            s.params.center,
            s.params.width,
            s.weight,
            s.index + 1,
        ));
    }
    out
}

/// Format per-strategy contributions (mass and support on the bin axis).
pub fn format_contributions(contributions: &[Contribution]) -> String {
    let mut out = String::new();
    out.push_str("Strategy contributions:\n");
    for c in contributions {
        let support = match c.support() {
            Some((lo, hi)) => format!("bins {lo}..={hi}"),
            None => "empty".to_string(),
        };
        let peak = c.profile.iter().cloned().fold(0.0_f64, f64::max);
        out.push_str(&format!(
            "  {:<10} c={:>3} w={:>3} | mass={:.4} peak={:.4} | {support}\n",
            c.strategy.params.kind.name(),
            c.strategy.params.center,
            c.strategy.params.width,
            c.mass(),
            peak,
        ));
    }
    out
}

/// Machine-readable summary printed by `shapes fit --json`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary<'a> {
    pub bins: usize,
    pub templates: usize,
    pub residual: f64,
    pub r_squared: f64,
    pub strategies: &'a [Strategy],
    pub target: &'a [f64],
    pub approximation: &'a [f64],
}

pub fn format_json(
    dictionary: &Dictionary,
    target: &[f64],
    result: &Approximation,
) -> Result<String, AppError> {
    let summary = JsonSummary {
        bins: dictionary.bins(),
        templates: dictionary.len(),
        residual: result.residual,
        r_squared: result.r_squared,
        strategies: &result.strategies,
        target,
        approximation: &result.approximation,
    };
    serde_json::to_string_pretty(&summary)
        .map_err(|e| AppError::new(4, format!("Failed to serialize summary: {e}")))
}

fn by_weight(strategies: &[Strategy]) -> Vec<&Strategy> {
    let mut sorted: Vec<&Strategy> = strategies.iter().collect();
    sorted.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });
    sorted
}

fn describe_target(spec: &TargetSpec) -> String {
    match spec {
        TargetSpec::Mixture(components) => {
            let parts: Vec<String> = components
                .iter()
                .map(|c| format!("{:.2}*{}({}, {})", c.scale, c.kind.name(), c.center, c.width))
                .collect();
            format!("mixture {}", parts.join(" + "))
        }
        TargetSpec::Gaussian { center, sigma } => match center {
            Some(c) => format!("gaussian center={c} sigma={sigma}"),
            None => format!("gaussian center=mid sigma={sigma}"),
        },
        TargetSpec::Sampled {
            center,
            sigma,
            samples,
            seed,
        } => {
            let c = center.map(|c| c.to_string()).unwrap_or_else(|| "mid".to_string());
            format!("sampled center={c} sigma={sigma} n={samples} seed={seed}")
        }
    }
}
