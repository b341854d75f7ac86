//! Command-line interface definitions.

pub mod check;
pub mod run;
pub mod status;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::error::Result;

/// Arbhound - cross-venue arbitrage detection and execution.
#[derive(Parser, Debug)]
#[command(name = "arbhound")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the trading loop (foreground)
    Run(RunArgs),

    /// Show the running instance's status and recent trades
    Status(StatusArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `arbhound check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Execute the top opportunity each cycle (off = detection only)
    #[arg(long)]
    pub auto_trading: bool,

    /// Detect opportunities but never place orders
    #[arg(long)]
    pub dry_run: bool,

    /// Override minimum net spread percentage
    #[arg(long)]
    pub min_spread: Option<Decimal>,

    /// Override per-trade quantity
    #[arg(long)]
    pub quantity: Option<Decimal>,

    /// Override polling interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of recent trades to show
    #[arg(short = 'n', long, default_value = "10")]
    pub trades: i64,
}

/// Route a parsed command to its handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Status(args) => status::execute(&args),
        Commands::Check(CheckCommand::Config(args)) => check::execute_config(&args),
    }
}
