//! ninjactl - XP, levels and ranks for Trader Ninja users.

use anyhow::Result;
use clap::Parser;
use ninja_common::NinjaConfig;
use ninjactl::cli::Cli;
use ninjactl::commands::{self, CommandContext};
use ninjactl::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = NinjaConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    logging::init(&config.log.level, cli.verbose)?;
    tracing::debug!(
        version = ninjactl::cli::VERSION,
        built = ninjactl::cli::BUILD_DATE,
        "ninjactl starting"
    );

    let ctx = CommandContext {
        config,
        offline: cli.offline,
        json: cli.json,
    };
    commands::run(&ctx, cli.command).await
}
