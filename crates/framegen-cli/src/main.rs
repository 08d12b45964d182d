//! framegen - FrameGen pipeline driver
//!
//! Runs the frame-generation pipeline against a synthetic scene and reports
//! what it did, or inspects configuration files.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;
mod source;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{ConfigCommands, RunArgs};
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "framegen")]
#[command(about = "Real-time adaptive frame interpolation pipeline")]
#[command(version)]
#[command(long_about = "
framegen drives the frame-generation pipeline: captured frames go through
motion estimation and interpolation, synthetic frames are placed between them,
and the result is presented at the display cadence while the adaptive
controller trades quality for latency.

Use --json for machine-readable output.
")]
struct Cli {
    /// Output in JSON format for machine parsing
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline on a synthetic scene
    Run(RunArgs),

    /// Show backend, shader and thermal information
    Info,

    /// Configuration file commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.json),
        Commands::Info => commands::info::execute(cli.json),
        Commands::Config(cmd) => commands::config::execute(cmd, cli.json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegen_core::InterpolationMode;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["framegen", "run"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        let Commands::Run(args) = cli.command else {
            return Err("expected run".into());
        };
        assert_eq!(args.source_fps, 30);
        assert!(args.mode.is_none());
        assert!(!args.overlay);
        Ok(())
    }

    #[test]
    fn parse_run_overrides() -> TestResult {
        let cli = Cli::try_parse_from([
            "framegen", "-vv", "--json", "run", "--mode", "4x", "--rate", "90", "--quality", "0.8",
            "--temperature", "70",
        ])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            return Err("expected run".into());
        };
        assert_eq!(args.mode, Some(InterpolationMode::Quadruple));
        assert_eq!(args.rate, Some(90));
        assert_eq!(args.temperature.map(f32::to_bits), Some(70.0_f32.to_bits()));
        Ok(())
    }

    #[test]
    fn parse_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["framegen", "run", "--mode", "5x"]).is_err());
    }

    #[test]
    fn parse_config_check() -> TestResult {
        let cli = Cli::try_parse_from(["framegen", "config", "check", "engine.yaml"])?;
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommands::Check { ref path }) if path.as_os_str() == "engine.yaml"
        ));
        Ok(())
    }
}
