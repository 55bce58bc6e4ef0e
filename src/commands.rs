// src/commands.rs
//! Command handlers for the pantry CLI

use anyhow::{bail, Context, Result};
use pantry::{
    share_cookbook, BuildDirectoryAssembler, Config, CookbookDir, CookbookFileTree, ShareOptions,
    ShareSettings, SigningKeyPair,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Stage, package, and upload a cookbook
pub fn cmd_share(
    config_path: Option<&Path>,
    cookbook: &Path,
    options: ShareOptions,
    user: Option<String>,
    key: Option<PathBuf>,
    site: Option<String>,
) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let settings = ShareSettings::resolve(&config, user, key, site)?;

    let outcome = share_cookbook(cookbook, &options, &settings)
        .with_context(|| format!("Failed to share {}", cookbook.display()))?;

    println!("Staging directory left at {}", outcome.staging_dir.display());
    if outcome.is_success() {
        println!("Uploaded cookbook {} to {}", outcome.cookbook, settings.site_url);
        return Ok(());
    }

    eprintln!(
        "Upload of {} rejected (HTTP {}):",
        outcome.cookbook, outcome.status
    );
    for message in &outcome.errors {
        eprintln!("  {}", message);
    }
    bail!("Cookbook site rejected {}", outcome.cookbook)
}

/// Stage a cookbook and report where it went
pub fn cmd_stage(cookbook: &Path, name: Option<String>) -> Result<()> {
    let mut tree = CookbookDir::load(cookbook)?;
    if let Some(name) = name {
        tree = tree.with_name(name);
    }

    let staging = BuildDirectoryAssembler::new().assemble(&tree)?;
    info!(
        "Staged {} files ({} directories created)",
        staging.files().len(),
        staging.directories_created()
    );
    println!("Staged {} at {}", tree.name(), staging.cookbook_dir().display());
    Ok(())
}

/// Generate a signing key pair under `dir`
pub fn cmd_keygen(name: &str, dir: &Path) -> Result<()> {
    let private_path = dir.join(format!("{name}.key"));
    let public_path = dir.join(format!("{name}.pub"));
    if private_path.exists() {
        bail!("Refusing to overwrite {}", private_path.display());
    }

    let keypair = SigningKeyPair::generate().with_key_id(name);
    keypair.save_to_files(&private_path, &public_path)?;

    println!("Private key: {}", private_path.display());
    println!("Public key:  {}", public_path.display());
    println!("Public key (base64): {}", keypair.public_key_base64());
    Ok(())
}
