// src/package.rs

//! Cookbook tarballs
//!
//! The staged cookbook directory is archived as `<name>.tgz` next to it in
//! the staging root. Entries are stored under `<name>/` so the archive
//! unpacks into a single directory.

use crate::error::{Error, Result};
use crate::staging::StagingDirectory;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tar::Builder;
use tracing::info;

/// Archive the staged cookbook as a gzipped tarball
///
/// Returns the path of the written `.tgz`.
pub fn package_cookbook(staging: &StagingDirectory) -> Result<PathBuf> {
    let name = staging.cookbook_name();
    let tarball = staging.root().join(format!("{name}.tgz"));

    write_tarball(&tarball, name, &staging.cookbook_dir()).map_err(|source| Error::PackageError {
        path: tarball.clone(),
        source,
    })?;

    info!("Packaged {} as {}", name, tarball.display());
    Ok(tarball)
}

fn write_tarball(tarball: &Path, name: &str, cookbook_dir: &Path) -> io::Result<()> {
    let output = File::create(tarball)?;
    let encoder = GzEncoder::new(output, Compression::default());
    let mut archive = Builder::new(encoder);

    // An empty cookbook has no staged directory; archive it as an empty dir
    if cookbook_dir.is_dir() {
        archive.append_dir_all(name, cookbook_dir)?;
    }

    let encoder = archive.into_inner()?;
    encoder.finish()?;
    Ok(())
}
