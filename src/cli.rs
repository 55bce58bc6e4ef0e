// src/cli.rs
//! CLI definitions for pantry
//!
//! Argument parsing only; the handlers live in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pantry")]
#[command(author = "Pantry Contributors")]
#[command(version)]
#[command(about = "Stage, package, and share cookbooks", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/pantry/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a cookbook to the cookbook site
    Share {
        /// Cookbook directory
        cookbook: PathBuf,

        /// Site category for the cookbook
        #[arg(long)]
        category: Option<String>,

        /// Cookbook name (default: from metadata.json or the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Client name to sign as
        #[arg(short, long)]
        user: Option<String>,

        /// Private key used for signing
        #[arg(short, long)]
        key: Option<PathBuf>,

        /// Cookbook site URL
        #[arg(short, long)]
        site: Option<String>,
    },

    /// Copy a cookbook into a fresh staging directory
    Stage {
        /// Cookbook directory
        cookbook: PathBuf,

        /// Cookbook name (default: from metadata.json or the directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Generate an Ed25519 signing key pair
    Keygen {
        /// Key name; files are written as <name>.key and <name>.pub
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}
