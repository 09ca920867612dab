//! # railbook CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use railbook_cli::settings::{load_config, run_config, ConfigArgs};
use railbook_cli::simulate::{run_simulate, SimulateArgs};

/// Railbook: train ticket booking and settlement ledger.
#[derive(Parser, Debug)]
#[command(name = "railbook", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a ledger configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a booking scenario against a fresh in-memory ledger.
    Simulate(SimulateArgs),

    /// Print the effective ledger configuration.
    Config(ConfigArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Simulate(args) => run_simulate(args, config),
        Commands::Config(args) => run_config(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_simulate() {
        let cli = Cli::try_parse_from(["railbook", "simulate", "scenario.yaml"]).unwrap();
        if let Commands::Simulate(args) = cli.command {
            assert_eq!(args.scenario, PathBuf::from("scenario.yaml"));
            assert!(args.out.is_none());
            assert!(!args.compact);
        } else {
            panic!("expected simulate");
        }
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "railbook",
            "config",
            "--format",
            "json",
            "-vv",
            "--log-json",
            "--config",
            "railbook.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert_eq!(cli.config, Some(PathBuf::from("railbook.yaml")));
        assert!(matches!(cli.command, Commands::Config(_)));
    }

    #[test]
    fn cli_parse_simulate_requires_scenario() {
        assert!(Cli::try_parse_from(["railbook", "simulate"]).is_err());
    }
}
