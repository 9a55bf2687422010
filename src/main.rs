use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

mod collector;
mod commands;
mod config;
mod data;
mod sources;
mod storage;

use commands::CommandOutcome;
use config::{Cli, Command, Settings};

/// Exit code for a collection that produced data despite failed sources or sinks.
const EXIT_PARTIAL: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let failed = e.use_stderr();
            let _ = e.print();
            return if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    match run(&cli).await {
        Ok(CommandOutcome::Success) => {
            info!("✅ Command completed successfully");
            ExitCode::SUCCESS
        }
        Ok(CommandOutcome::Partial) => {
            info!("⚠️ Command completed with partial failures");
            ExitCode::from(EXIT_PARTIAL)
        }
        Err(e) => {
            error!("Error executing command: {:#}", e);
            error!("❌ Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<CommandOutcome> {
    match &cli.command {
        Command::Collect(args) => commands::collect(&load_settings(cli)?, args).await,
        Command::Train(args) => commands::train(args),
        Command::Predict(args) => commands::predict(args),
        Command::Status => commands::status(&cli.config, &load_settings(cli)?).await,
    }
}

/// Settings file plus command-line overrides; only commands that talk to
/// sources or storage read it.
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    Ok(Settings::load(&cli.config)?.with_overrides(cli))
}
