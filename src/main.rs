use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use priestess_observability::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();
    let command = args.get_command();
    let config_path = args.config.as_deref();

    // Version and config commands work without a valid configuration
    match &command {
        cli::Commands::Version => {
            println!("Priestess Observability v{}", env!("CARGO_PKG_VERSION"));
            println!("Rust {}", env!("CARGO_PKG_RUST_VERSION"));
            return Ok(());
        }
        cli::Commands::Config { action } => {
            return match action {
                cli::ConfigCommands::Show => commands::config::show(config_path),
                cli::ConfigCommands::Validate => commands::config::validate(config_path),
            };
        }
        _ => {}
    }

    let mut cfg = config::load_config(config_path)?;

    // The dashboard owns the terminal
    if matches!(command, cli::Commands::Monitor { .. }) {
        cfg.logging.console = false;
    }

    init_tracing(&cfg.logging);

    match command {
        cli::Commands::Check => commands::check::execute(cfg)?,
        cli::Commands::Status { json, chat } => {
            commands::status::execute(cfg, json, chat).await?
        }
        cli::Commands::Monitor { interval } => commands::monitor::execute(cfg, interval).await?,
        cli::Commands::Version | cli::Commands::Config { .. } => {}
    }

    Ok(())
}
