// src/main.rs

use anyhow::Result;
use clap::Parser;
use pantry::ShareOptions;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Share {
            cookbook,
            category,
            name,
            user,
            key,
            site,
        } => commands::cmd_share(
            config,
            &cookbook,
            ShareOptions { category, name },
            user,
            key,
            site,
        ),
        Commands::Stage { cookbook, name } => commands::cmd_stage(&cookbook, name),
        Commands::Keygen { name, dir } => commands::cmd_keygen(&name, &dir),
    }
}
