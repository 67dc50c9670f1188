//! Workout Runner CLI entry point.

use anyhow::Result;
use clap::Parser;

use workout_runner::cli::{handle_error, Cli};
use workout_runner::infrastructure::config::ConfigLoader;
use workout_runner::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    workout_runner::cli::commands::execute(cli, &config).await
}
