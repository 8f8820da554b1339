//! VaultSync CLI - Command-line interface for VaultSync
//!
//! Provides commands for:
//! - Running sync passes, once or on a timer
//! - Viewing sync status and the action log
//! - Enrolling notebooks
//! - Exporting the search index
//! - Managing configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod notifier;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, export::ExportCommand,
    hash::HashCommand, log::LogCommand, notebooks::NotebooksCommand, status::StatusCommand,
    sync::SyncCommand, CliContext,
};
use output::OutputFormat;
use vaultsync_core::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "vaultsync",
    version,
    about = "Two-way sync between a notes vault and a cloud-synced mirror folder"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a sync pass between the vault and the mirror
    Sync(SyncCommand),
    /// Show what a sync pass would do right now
    Status(StatusCommand),
    /// List and enroll notebooks
    #[command(subcommand)]
    Notebooks(NotebooksCommand),
    /// Write the search index for the companion app
    Export(ExportCommand),
    /// Show recent action log entries
    Log(LogCommand),
    /// Print the provider content hash of a file
    Hash(HashCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.log_json || config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let ctx = CliContext::new(OutputFormat::from_json_flag(cli.json), config_path);

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::Notebooks(cmd) => cmd.execute(&ctx).await,
        Commands::Export(cmd) => cmd.execute(&ctx).await,
        Commands::Log(cmd) => cmd.execute(&ctx).await,
        Commands::Hash(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}
