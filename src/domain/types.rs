//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while generating dictionaries and solving
//! - printed as a JSON summary from the CLI

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::AppError;

/// Liquidity shape family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Flat liquidity across the window.
    Rectangle,
    /// Liquidity concentrated at the center, tapering linearly to the edges.
    Curve,
    /// Liquidity concentrated at the edges, notched at the center.
    #[value(name = "bid-ask", alias = "bid_ask")]
    BidAsk,
}

impl ShapeKind {
    /// Enumeration order used by the dictionary generator.
    pub const ALL: [ShapeKind; 3] = [ShapeKind::Rectangle, ShapeKind::Curve, ShapeKind::BidAsk];

    /// Stable identifier (matches the serde representation).
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Curve => "curve",
            ShapeKind::BidAsk => "bid_ask",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" | "spot" => Ok(ShapeKind::Rectangle),
            "curve" => Ok(ShapeKind::Curve),
            "bid_ask" | "bid-ask" | "bidask" => Ok(ShapeKind::BidAsk),
            other => Err(AppError::new(2, format!("Unknown shape kind '{other}'."))),
        }
    }
}

/// Parameters of one dictionary template.
///
/// `params[i]` always describes dictionary row `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TemplateParams {
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub center: i64,
    pub width: usize,
}

impl fmt::Display for TemplateParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} center={} width={}", self.kind, self.center, self.width)
    }
}

/// A template that survived solving/pruning, with its final weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Strategy {
    /// Dictionary row of the template.
    pub index: usize,
    pub params: TemplateParams,
    pub weight: f64,
}

/// One scaled raw shape in a hand-built target, e.g. `bid_ask:34:25:0.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeComponent {
    pub kind: ShapeKind,
    pub center: i64,
    pub width: usize,
    pub scale: f64,
}

impl FromStr for ShapeComponent {
    type Err = AppError;

    /// Parse `kind:center:width[:scale]` (scale defaults to `1.0`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        if !(parts.len() == 3 || parts.len() == 4) {
            return Err(AppError::new(
                2,
                format!("Invalid shape component '{s}' (expected kind:center:width[:scale])."),
            ));
        }

        let kind: ShapeKind = parts[0].parse()?;
        let center: i64 = parts[1]
            .parse()
            .map_err(|e| AppError::new(2, format!("Invalid center in '{s}': {e}")))?;
        let width: usize = parts[2]
            .parse()
            .map_err(|e| AppError::new(2, format!("Invalid width in '{s}': {e}")))?;
        let scale: f64 = match parts.get(3) {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::new(2, format!("Invalid scale in '{s}': {e}")))?,
            None => 1.0,
        };

        Ok(ShapeComponent {
            kind,
            center,
            width,
            scale,
        })
    }
}

/// Which external target builder the CLI uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetKind {
    /// Scaled mix of raw shapes (`--component`).
    Mixture,
    /// Discretised Gaussian (`--center`, `--sigma`).
    Gaussian,
    /// Histogram of seeded Gaussian draws (`--center`, `--sigma`, `--samples`, `--seed`).
    Sampled,
}

/// How the target vector is built for a run.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSpec {
    Mixture(Vec<ShapeComponent>),
    Gaussian {
        center: Option<f64>,
        sigma: f64,
    },
    Sampled {
        center: Option<f64>,
        sigma: f64,
        samples: usize,
        seed: u64,
    },
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dictionary: crate::dictionary::GeneratorConfig,
    pub target: TargetSpec,
    pub approx: crate::approx::ApproxOptions,

    /// Number of strategies shown in the text report.
    pub top_n: usize,
    pub plot: bool,
    pub plot_height: usize,
    /// Print per-strategy contribution profiles.
    pub contributions: bool,
    /// Emit a JSON summary instead of the text report.
    pub json: bool,
}
