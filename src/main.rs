//! openwrt-cache - Build cache accelerator for OpenWrt
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use openwrt_cache::cli::commands::{self, PhasePaths};
use openwrt_cache::cli::{Cli, Commands};
use openwrt_cache::config::{Config, ConfigManager};
use openwrt_cache::error::CacheResult;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // The logger's format comes from config, so load it first and report
    // any failure once logging is up
    let loaded = config_manager.load().await;
    let json_logs = loaded
        .as_ref()
        .map(|c| c.general.json_logs())
        .unwrap_or(false);
    init_logging(cli.verbose, json_logs);

    let config = match loaded {
        Ok(config) => config,
        // Save must never break the pipeline
        Err(e) if matches!(cli.command, Commands::Save(_)) => {
            warn!("{}; using default configuration", e);
            Config::default()
        }
        Err(e) => return Err(e),
    };

    let paths = PhasePaths {
        state_file: cli.state_file,
        store: cli.store,
    };

    match cli.command {
        Commands::Restore(args) => commands::restore(args, config, paths).await,
        Commands::Save(args) => commands::save(args, config, paths).await,
        Commands::Key(args) => commands::key(args, config, paths).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// Initialize logging: 0 = info, 1 = debug, 2+ = trace. `RUST_LOG` wins.
fn init_logging(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("openwrt_cache=info"),
        1 => EnvFilter::new("openwrt_cache=debug"),
        _ => EnvFilter::new("openwrt_cache=trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
