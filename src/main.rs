use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use mitm_proxy_config::commands;
use mitm_proxy_config::config;

#[derive(Parser, Debug)]
#[command(name = "mitm-proxy-config")]
#[command(about = "Resolve and validate intercepting proxy options", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (YAML/JSON/TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Build the proxy configuration and report what was resolved (default)
    Check,
    /// Print the loaded options as JSON
    Show,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("mitm_proxy_config={log_level}").parse()?),
        )
        .init();

    let options = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            config::load_from_path(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => {
            info!("Loading configuration from default locations");
            config::load_from_env_or_file().context("Failed to load configuration")?
        }
    };

    match args.command.unwrap_or(Command::Check) {
        Command::Check => {
            if let Err(e) = commands::run_config_check(&options) {
                error!("{}", e);
                return Err(e.into());
            }
        }
        Command::Show => println!("{}", commands::show_options(&options)?),
    }

    Ok(())
}
