//! Binary entry point for symphony.
//!
//! This binary provides the CLI interface for the Symphony social graph.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use symphony::SymphonyConfig;
use symphony::cli::{self, Command};
use symphony::observability::{self, LoggingConfig};
use symphony::services::StoreFactory;

/// Symphony - social graph and genre recommendations for a music network.
#[derive(Parser)]
#[command(name = "symphony")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose, env_lookup);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command and prints its JSON output.
fn run_command(command: Command, config: &SymphonyConfig) -> anyhow::Result<()> {
    let services = StoreFactory::create_services(config).context("could not open stores")?;
    let output = cli::execute(command, &services)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Loads configuration from file or default.
fn load_config(path: Option<&Path>) -> anyhow::Result<SymphonyConfig> {
    let config = if let Some(config_path) = path {
        SymphonyConfig::load_from_file(config_path)?
    } else {
        match std::env::var("SYMPHONY_CONFIG_PATH") {
            Ok(config_path) if !config_path.trim().is_empty() => {
                SymphonyConfig::load_from_file(Path::new(&config_path))?
            },
            // Logging is not set up yet, so a broken default file is reported here.
            _ => SymphonyConfig::load_default().unwrap_or_else(|e| {
                eprintln!("Ignoring unreadable config file: {e}");
                SymphonyConfig::default()
            }),
        }
    };
    Ok(config.with_env_overrides(env_lookup))
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
