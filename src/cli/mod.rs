//! CLI interface for pairs-guard
//!
//! Provides subcommands for:
//! - `replay`: Run the engine over recorded quotes against a paper gateway
//! - `config`: Show configuration

mod replay;

pub use replay::{ReplayArgs, TickRecord};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pairs-guard")]
#[command(about = "Mean-reversion pairs trading engine with pre-trade guard rails")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay recorded quotes through the engine
    Replay(ReplayArgs),
    /// Show configuration
    Config,
}
