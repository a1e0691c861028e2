// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loupe — forensic image inspection from the command line.
//
// Entry point. Initialises logging, loads the optional config file, and
// dispatches to the subcommands.

mod commands;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use loupe_core::config::LoupeConfig;
use loupe_core::error::Result;
use loupe_core::human_errors::humanize_error;

use commands::{CombineArgs, ExtractArgs, LensArgs, LoupeArgs};

#[derive(Parser)]
#[command(name = "loupe")]
#[command(version, about = "Head silhouettes, consensus shapes and forensic lenses", long_about = None)]
struct Cli {
    /// JSON settings file; command-line flags override its values
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the normalized silhouette of one photo
    Extract(ExtractArgs),

    /// Extract labelled photos and build one consensus shape per view
    Combine(CombineArgs),

    /// Enhanced microscope view (CLAHE + magnification) around a point
    Lens(LensArgs),

    /// Zoomed loupe with blended histogram equalization around a point
    Loupe(LoupeArgs),

    /// Write the built-in demo image
    Demo {
        #[arg(long, value_name = "FILE", default_value = "loupe_demo.png")]
        out: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        let human = humanize_error(&e);
        tracing::error!(error = %e, "loupe failed");
        eprintln!("Error: {}", human.message);
        eprintln!("       {}", human.suggestion);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => LoupeConfig::load(path)?,
        None => LoupeConfig::default(),
    };

    match cli.command {
        Commands::Extract(args) => {
            for path in commands::run_extract(&args, &config)? {
                println!("{}", path.display());
            }
        }
        Commands::Combine(args) => {
            let report = commands::run_combine(&args, &config)?;
            for category in &report.categories {
                let status = if category.outcome.is_ok() { "ok" } else { "failed" };
                println!(
                    "{}: {} ({} shapes)",
                    category.category, status, category.contributors
                );
            }
            if report.failed_images() > 0 {
                println!(
                    "{} of {} images could not be used",
                    report.failed_images(),
                    report.images.len()
                );
            }
        }
        Commands::Lens(args) => commands::run_lens(&args, &config)?,
        Commands::Loupe(args) => commands::run_loupe(&args, &config)?,
        Commands::Demo { out } => commands::run_demo(&out)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn combine_accepts_multiple_files_per_view() {
        let cli = Cli::try_parse_from([
            "loupe", "combine", "--front", "a.jpg", "b.jpg", "--profile", "c.jpg", "--out-dir", "out",
            "--threshold-mode", "adaptive",
        ])
        .unwrap();
        match cli.command {
            Commands::Combine(args) => {
                assert_eq!(args.front.len(), 2);
                assert_eq!(args.profile.len(), 1);
                assert_eq!(
                    args.settings.threshold_mode,
                    Some(loupe_core::types::ThresholdMode::Adaptive)
                );
            }
            _ => panic!("expected combine"),
        }
    }

    #[test]
    fn unknown_threshold_mode_is_rejected() {
        let parsed = Cli::try_parse_from([
            "loupe", "extract", "--image", "a.png", "--out-dir", "out", "--threshold-mode", "fuzzy",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn last_inversion_flag_wins() {
        let cli = Cli::try_parse_from([
            "loupe", "extract", "--image", "a.png", "--out-dir", "out", "--invert", "--no-invert",
        ])
        .unwrap();
        match cli.command {
            Commands::Extract(args) => {
                assert!(!args.settings.invert);
                assert!(args.settings.no_invert);
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["loupe", "demo", "--config", "settings.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("settings.json")));
    }
}
