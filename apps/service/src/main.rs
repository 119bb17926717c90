use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use sitewatch_service::{Service, config::Config, shutdown};

#[derive(Debug, Parser)]
#[command(name = "sitewatch", version, about = "Headless HTTP uptime monitor")]
struct Cli {
    /// Path to the TOML config file (created with defaults when missing)
    #[arg(short, long, env = "SITEWATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the monitoring scheduler until Ctrl-C (default)
    Run,
    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref())?;

    logger::init_tracing_from_config(&config.logging.level);

    match cli.command.unwrap_or(Command::Run) {
        Command::Config => {
            print!("{config}");
            Ok(())
        }
        Command::Run => run(config).await,
    }
}

async fn run(config: Config) -> Result<()> {
    let (stop, signal) = shutdown::channel();
    let service = Service::build(&config, signal).await?;

    let scheduler = tokio::spawn(service.scheduler.run());

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, finishing the current tick");
    stop.trigger();

    scheduler.await?;
    Ok(())
}
