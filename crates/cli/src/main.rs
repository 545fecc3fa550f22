//! uiflow CLI - Main Entry Point
//!
//! Runs scenario suites against the review-cycle wizard and the
//! saucedemo storefront, and inspects the locator registry.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{check, locators, run, validate};

/// uiflow - Playwright-driven UI flows
#[derive(Parser)]
#[command(name = "uiflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = "uiflow.toml", env = "UIFLOW_CONFIG", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenario suites
    Run(run::RunArgs),

    /// List the locator registry
    Locators(locators::LocatorsArgs),

    /// Check Playwright, target URLs and scenario files
    Check,

    /// Parse scenario suites without running them
    Validate(validate::ValidateArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let outcome = match cli.command {
        Commands::Run(args) => run::execute(args, &cli.config, cli.format).await,
        Commands::Locators(args) => locators::execute(args, cli.format),
        Commands::Check => check::execute(&cli.config, cli.format).await,
        Commands::Validate(args) => validate::execute(args, &cli.config, cli.format),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}
