//! Offer Pay CLI

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

mod config;
mod sub_commands;

/// Simple CLI application paying BOLT12 offers against a fake peer
#[derive(Parser)]
#[command(name = "offer-pay-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Logging level
    #[arg(short, long, default_value = "error")]
    log_level: Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an offer answered by the fake peer
    CreateOffer(sub_commands::create_offer::CreateOfferSubCommand),
    /// Pay an offer
    Pay(sub_commands::pay::PaySubCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();
    let default_filter = args.log_level;

    let env_filter = EnvFilter::new(format!("{default_filter}"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let settings = config::Settings::new(args.config.clone());

    match &args.command {
        Commands::CreateOffer(sub_command_args) => {
            sub_commands::create_offer::create_offer(sub_command_args)
        }
        Commands::Pay(sub_command_args) => sub_commands::pay::pay(&settings, sub_command_args).await,
    }
}
