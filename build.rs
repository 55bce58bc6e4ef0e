// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: cookbook directory
fn cookbook_arg() -> Arg {
    Arg::new("cookbook")
        .required(true)
        .value_name("DIR")
        .help("Cookbook directory")
}

/// Common argument: cookbook name override
fn name_arg() -> Arg {
    Arg::new("name")
        .short('n')
        .long("name")
        .help("Cookbook name (default: from metadata.json or the directory name)")
}

fn build_cli() -> Command {
    Command::new("pantry")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Pantry Contributors")
        .about("Stage, package, and share cookbooks")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file (default: ~/.config/pantry/config.toml)"),
        )
        .subcommand(
            Command::new("share")
                .about("Upload a cookbook to the cookbook site")
                .arg(cookbook_arg())
                .arg(Arg::new("category").long("category").help("Site category for the cookbook"))
                .arg(name_arg())
                .arg(Arg::new("user").short('u').long("user").help("Client name to sign as"))
                .arg(Arg::new("key").short('k').long("key").help("Private key used for signing"))
                .arg(Arg::new("site").short('s').long("site").help("Cookbook site URL")),
        )
        .subcommand(
            Command::new("stage")
                .about("Copy a cookbook into a fresh staging directory")
                .arg(cookbook_arg())
                .arg(name_arg()),
        )
        .subcommand(
            Command::new("keygen")
                .about("Generate an Ed25519 signing key pair")
                .arg(Arg::new("name").required(true).help("Key name"))
                .arg(
                    Arg::new("dir")
                        .short('d')
                        .long("dir")
                        .default_value(".")
                        .help("Output directory"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("pantry.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
        return;
    }

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
