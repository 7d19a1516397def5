//! Dockyard - Container image build orchestrator
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use dockyard::cli::{Cli, Commands};
use dockyard::config::{Config, ConfigManager};
use dockyard::error::DockyardResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("dockyard=warn"),
        1 => EnvFilter::new("dockyard=info"),
        _ => EnvFilter::new("dockyard=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

async fn run() -> DockyardResult<ExitCode> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Loaded configuration from {}", config_manager.path().display());

    match cli.command {
        Commands::Build(args) => {
            let success = dockyard::cli::commands::build(args, &config).await?;
            Ok(if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Registries(args) => {
            dockyard::cli::commands::registries(args, &config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            dockyard::cli::commands::version(&config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(args) => {
            dockyard::cli::commands::config(args, &config, &config_manager).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
