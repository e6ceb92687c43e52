//! resilient-api CLI
//!
//! Drives user lifecycle scenarios against a Users REST API and validates
//! user payloads against the API contract.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS connection is opened
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);
    output::set_quiet(cli.quiet);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Scenario(args) => commands::scenario::run(args, config).await,
        Commands::Burst(args) => commands::burst::run(args, config).await,
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Config(args) => commands::config::run(args, config),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    // HTTP stack internals stay at warn unless asked for explicitly
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn,h2=warn"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
