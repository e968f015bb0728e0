use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(
    name = "attest",
    version,
    long_version = LONG_VERSION,
    about = "Multi-agent compliance analysis pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline, or a single agent
    Run(RunArgs),
    /// Show data readiness per agent
    Readiness(ReadinessArgs),
    /// Show the persisted run and agent states
    Status(StatusArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Run only this agent, outside phase order
    #[arg(short, long)]
    pub agent: Option<String>,
}

#[derive(Args, Clone)]
pub struct ReadinessArgs {
    /// Agent id (omit for every agent)
    pub agent: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print each completed agent's result text
    #[arg(long)]
    pub results: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: PathBuf,
}
