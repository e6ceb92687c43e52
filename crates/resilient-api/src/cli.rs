//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// resilient-api - Exercise a Users REST API with retries and deletion checks
#[derive(Parser, Debug)]
#[command(name = "resilient-api")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Runtime configuration file layered over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, verify, patch and delete a batch of users
    Scenario(ScenarioArgs),

    /// Concurrent create-patch-fetch burst followed by cleanup
    Burst(BurstArgs),

    /// Validate a JSON file of users against the contract
    Validate(ValidateArgs),

    /// Print the resolved runtime configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct ScenarioArgs {
    /// Number of users to create
    #[arg(short = 'n', long, default_value_t = 3)]
    pub count: u32,

    /// Use the async client instead of the blocking one
    #[arg(long = "async")]
    pub use_async: bool,

    /// Treat exhausted deletion polls as deleted
    #[arg(long)]
    pub best_effort: bool,
}

#[derive(Args, Debug)]
pub struct BurstArgs {
    /// Number of concurrent user lifecycles
    #[arg(short, long, default_value_t = 10)]
    pub size: u32,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON file holding an array of user objects
    pub file: Utf8PathBuf,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the bearer token instead of masking it
    #[arg(long)]
    pub show_token: bool,
}
