//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the tracing subscriber
//! - parses CLI arguments
//! - builds the target and the template dictionary
//! - runs the sparse approximation
//! - prints reports/plots

use clap::Parser;

use crate::approx::ApproxOptions;
use crate::cli::{Command, DictionaryArgs, FitArgs, TemplatesArgs};
use crate::dictionary::{GeneratorConfig, generate};
use crate::domain::{RunConfig, ShapeComponent, ShapeKind, TargetKind, TargetSpec};
use crate::error::AppError;

pub mod logging;
pub mod pipeline;

/// Target used when `--target mixture` is given without components.
pub const DEFAULT_MIXTURE: [ShapeComponent; 2] = [
    ShapeComponent {
        kind: ShapeKind::BidAsk,
        center: 34,
        width: 25,
        scale: 0.5,
    },
    ShapeComponent {
        kind: ShapeKind::Curve,
        center: 34,
        width: 15,
        scale: 0.5,
    },
];

/// Entry point for the `shapes` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    logging::init_tracing()?;

    // `shapes` and `shapes -k 3` behave like `shapes fit ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Templates(args) => handle_templates(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;

    if config.json {
        println!(
            "{}",
            crate::report::format_json(&run.dictionary, &run.target, &run.result)?
        );
        return Ok(());
    }

    println!(
        "{}",
        crate::report::format_run_summary(&run.dictionary, &run.result, &config)
    );
    println!(
        "{}",
        crate::report::format_strategies(&run.result.strategies, config.top_n)
    );

    if config.contributions {
        println!("{}", crate::report::format_contributions(&run.contributions));
    }

    if config.plot {
        let plot = crate::plot::render_fit_plot(
            &run.target,
            &run.result.approximation,
            config.plot_height,
        );
        println!("{plot}");
    }

    Ok(())
}

fn handle_templates(args: TemplatesArgs) -> Result<(), AppError> {
    let dictionary = generate(&generator_config_from_args(&args.dictionary))?;
    println!("Generated {} templates", dictionary.len());

    if args.kind.is_none() && args.center.is_none() && args.width.is_none() {
        return Ok(());
    }

    let mut matched = 0usize;
    for (i, p) in dictionary.params().iter().enumerate() {
        let keep = args.kind.is_none_or(|k| k == p.kind)
            && args.center.is_none_or(|c| c == p.center)
            && args.width.is_none_or(|w| w == p.width);
        if keep {
            println!("Template {}: {p}", i + 1);
            matched += 1;
        }
    }

    if matched == 0 {
        return Err(AppError::new(2, "No template in the dictionary matches the given filters."));
    }
    Ok(())
}

pub fn generator_config_from_args(args: &DictionaryArgs) -> GeneratorConfig {
    let center_range = match (args.center_min, args.center_max) {
        (None, None) => None,
        (lo, hi) => Some((lo.unwrap_or(0), hi.unwrap_or(args.bins as i64 - 1))),
    };

    GeneratorConfig {
        bins: args.bins,
        center_range,
        width_range: (args.width_min, args.width_max),
        center_step: args.center_step,
        width_step: args.width_step,
    }
}

pub fn run_config_from_args(args: &FitArgs) -> Result<RunConfig, AppError> {
    let target = match args.target {
        TargetKind::Mixture => {
            if args.components.is_empty() {
                TargetSpec::Mixture(DEFAULT_MIXTURE.to_vec())
            } else {
                TargetSpec::Mixture(args.components.clone())
            }
        }
        TargetKind::Gaussian => TargetSpec::Gaussian {
            center: args.center,
            sigma: args.sigma,
        },
        TargetKind::Sampled => TargetSpec::Sampled {
            center: args.center,
            sigma: args.sigma,
            samples: args.samples,
            seed: args.seed,
        },
    };

    if args.target != TargetKind::Mixture && !args.components.is_empty() {
        return Err(AppError::new(2, "--component is only valid with --target mixture."));
    }

    let approx = if args.no_limit {
        ApproxOptions::default()
    } else {
        ApproxOptions::with_max_strategies(args.max_strategies)
    };

    Ok(RunConfig {
        dictionary: generator_config_from_args(&args.dictionary),
        target,
        approx,
        top_n: args.top,
        plot: !args.no_plot,
        plot_height: args.height,
        contributions: args.contributions,
        json: args.json,
    })
}

/// Rewrite argv so `shapes` defaults to `shapes fit`.
///
/// Rules:
/// - `shapes`                      -> `shapes fit`
/// - `shapes -k 3 ...`             -> `shapes fit -k 3 ...`
/// - `shapes --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "templates");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "fit flags".
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn fit_args(args: &[&str]) -> FitArgs {
        let cli = Cli::try_parse_from(rewrite_args(argv(args))).unwrap();
        match cli.command {
            Command::Fit(args) => args,
            other => panic!("expected fit, got {other:?}"),
        }
    }

    #[test]
    fn bare_invocation_defaults_to_fit() {
        assert_eq!(rewrite_args(argv(&["shapes"])), argv(&["shapes", "fit"]));
        assert_eq!(
            rewrite_args(argv(&["shapes", "-k", "3"])),
            argv(&["shapes", "fit", "-k", "3"])
        );
        assert_eq!(rewrite_args(argv(&["shapes", "--help"])), argv(&["shapes", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["shapes", "templates"])),
            argv(&["shapes", "templates"])
        );
    }

    #[test]
    fn defaults_reproduce_the_reference_run() {
        let config = run_config_from_args(&fit_args(&["shapes"])).unwrap();
        assert_eq!(config.dictionary.bins, 69);
        assert_eq!(config.dictionary.center_range, None);
        assert_eq!(config.dictionary.width_range, (7, 69));
        assert_eq!((config.dictionary.center_step, config.dictionary.width_step), (1, 2));
        assert_eq!(config.approx.max_strategies, Some(2));
        assert_eq!(config.target, TargetSpec::Mixture(DEFAULT_MIXTURE.to_vec()));
        assert!(config.plot);
        assert!(!config.json);
    }

    #[test]
    fn gaussian_and_limits_are_parsed() {
        let config = run_config_from_args(&fit_args(&[
            "shapes",
            "fit",
            "--target",
            "gaussian",
            "--center",
            "20",
            "--sigma",
            "8",
            "--no-limit",
            "-b",
            "40",
        ]))
        .unwrap();
        assert_eq!(config.dictionary.bins, 40);
        assert_eq!(config.approx.max_strategies, None);
        assert_eq!(
            config.target,
            TargetSpec::Gaussian {
                center: Some(20.0),
                sigma: 8.0
            }
        );
    }

    #[test]
    fn components_are_parsed_from_flags() {
        let config = run_config_from_args(&fit_args(&[
            "shapes",
            "fit",
            "--component",
            "bid-ask:30:21:0.7",
            "--component",
            "rectangle:10:9",
        ]))
        .unwrap();
        match config.target {
            TargetSpec::Mixture(c) => {
                assert_eq!(c.len(), 2);
                assert_eq!(c[0].kind, ShapeKind::BidAsk);
                assert_eq!(c[1].scale, 1.0);
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn bad_component_is_a_parse_error() {
        assert!(Cli::try_parse_from(argv(&["shapes", "fit", "--component", "blob:1:2"])).is_err());
    }

    #[test]
    fn components_require_mixture_target() {
        let args = fit_args(&["shapes", "fit", "--target", "gaussian", "--component", "curve:3:7"]);
        assert_eq!(run_config_from_args(&args).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn partial_center_range_fills_defaults() {
        let cli = Cli::try_parse_from(argv(&[
            "shapes",
            "templates",
            "-b",
            "20",
            "--center-min",
            "-4",
        ]))
        .unwrap();
        let Command::Templates(args) = cli.command else {
            panic!("expected templates");
        };
        let config = generator_config_from_args(&args.dictionary);
        assert_eq!(config.center_range, Some((-4, 19)));
    }
}
