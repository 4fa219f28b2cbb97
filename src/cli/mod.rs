//! Command-line parsing for the shape decomposition tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the generation/solver code.

use clap::{Args, Parser, Subcommand};

use crate::domain::{ShapeComponent, ShapeKind, TargetKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "shapes",
    version,
    about = "Sparse liquidity shape decomposition (NNLS over a template dictionary)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Approximate a target distribution with a few weighted shape templates.
    Fit(FitArgs),
    /// Inspect the template dictionary (size and template lookup).
    Templates(TemplatesArgs),
}

/// Dictionary enumeration options shared by all subcommands.
#[derive(Debug, Args, Clone)]
pub struct DictionaryArgs {
    /// Number of bins on the axis.
    #[arg(short = 'b', long, default_value_t = 69)]
    pub bins: usize,

    /// Lowest template center (defaults to 0).
    #[arg(long, allow_negative_numbers = true)]
    pub center_min: Option<i64>,

    /// Highest template center (defaults to bins - 1).
    #[arg(long, allow_negative_numbers = true)]
    pub center_max: Option<i64>,

    /// Center grid step.
    #[arg(long, default_value_t = 1)]
    pub center_step: usize,

    /// Smallest template width.
    #[arg(long, default_value_t = 7)]
    pub width_min: usize,

    /// Largest template width.
    #[arg(long, default_value_t = 69)]
    pub width_max: usize,

    /// Width grid step.
    #[arg(long, default_value_t = 2)]
    pub width_step: usize,
}

/// Options for fitting a target.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub dictionary: DictionaryArgs,

    /// Keep at most this many templates in the final combination.
    #[arg(short = 'k', long, default_value_t = 2)]
    pub max_strategies: usize,

    /// Keep every active template (ignore --max-strategies).
    #[arg(long)]
    pub no_limit: bool,

    /// How the target distribution is built.
    #[arg(long, value_enum, default_value_t = TargetKind::Mixture)]
    pub target: TargetKind,

    /// Mixture component, repeatable (e.g. `bid-ask:34:25:0.5`).
    ///
    /// Defaults to `bid_ask:34:25:0.5` + `curve:34:15:0.5`.
    #[arg(long = "component", value_name = "KIND:CENTER:WIDTH[:SCALE]")]
    pub components: Vec<ShapeComponent>,

    /// Gaussian/sampled target center (defaults to bins / 2).
    #[arg(long, allow_negative_numbers = true)]
    pub center: Option<f64>,

    /// Gaussian/sampled target standard deviation (bins).
    #[arg(long, default_value_t = 12.0)]
    pub sigma: f64,

    /// Number of draws for the sampled target.
    #[arg(long, default_value_t = 10_000)]
    pub samples: usize,

    /// Random seed for the sampled target.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Show the top-N strategies.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,

    /// Print per-strategy contribution profiles.
    #[arg(long)]
    pub contributions: bool,

    /// Print a JSON summary instead of the text report.
    #[arg(long)]
    pub json: bool,
}

/// Options for inspecting the dictionary.
#[derive(Debug, Args, Clone)]
pub struct TemplatesArgs {
    #[command(flatten)]
    pub dictionary: DictionaryArgs,

    /// Only list templates of this shape.
    #[arg(long, value_enum)]
    pub kind: Option<ShapeKind>,

    /// Only list templates with this center.
    #[arg(long, allow_negative_numbers = true)]
    pub center: Option<i64>,

    /// Only list templates with this width.
    #[arg(long)]
    pub width: Option<usize>,
}
