//! Featherprobe CLI - dataset profiling with an audited execution trail

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{audit, profile};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    match &cli.command {
        cli::Commands::Profile(args) => profile::execute(args, &cli.global).await,
        cli::Commands::Audit(args) => audit::execute(args, &cli.global).await,
    }
}
