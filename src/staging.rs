// src/staging.rs

//! Build directory staging
//!
//! Before packaging, a cookbook is copied into a fresh temporary directory so
//! the tarball only contains the cookbook's own files. The copy lives at
//! `<staging root>/<cookbook name>/`, mirroring the cookbook's relative
//! paths. Staging directories are not removed automatically; the caller
//! decides when to delete them.

use crate::cookbook::CookbookFileTree;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// A populated staging directory
#[derive(Debug, Clone)]
pub struct StagingDirectory {
    root: PathBuf,
    name: String,
    files: Vec<PathBuf>,
    directories_created: usize,
}

impl StagingDirectory {
    /// Root of the staging area
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the cookbook copy
    pub fn cookbook_dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    pub fn cookbook_name(&self) -> &str {
        &self.name
    }

    /// Relative paths of the staged files
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Number of directory creations performed while staging
    pub fn directories_created(&self) -> usize {
        self.directories_created
    }
}

/// Copies cookbook trees into temporary staging directories
#[derive(Debug, Clone, Default)]
pub struct BuildDirectoryAssembler {
    parent: Option<PathBuf>,
}

impl BuildDirectoryAssembler {
    /// Stage under the system temp directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage under `parent` instead of the system temp directory
    pub fn in_dir(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: Some(parent.into()),
        }
    }

    /// Copy every file of `cookbook` into a new staging directory
    ///
    /// Any failure aborts the whole assembly. Whatever was staged before the
    /// failure stays on disk for inspection.
    pub fn assemble(&self, cookbook: &dyn CookbookFileTree) -> Result<StagingDirectory> {
        let name = cookbook.name();
        validate_name(name)?;

        let root = self.create_root(name)?;
        info!("Staging cookbook {} at {}", name, root.display());

        let cookbook_dir = root.join(name);
        let mut created: HashSet<PathBuf> = HashSet::new();

        for relative in cookbook.files() {
            validate_relative(relative)?;

            let source = cookbook.root().join(relative);
            let dest = cookbook_dir.join(relative);

            if let Some(parent) = dest.parent() {
                if created.insert(parent.to_path_buf()) {
                    fs::create_dir_all(parent).map_err(|source| Error::AssemblyError {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
            }

            debug!("Staging {} to {}", source.display(), dest.display());
            fs::copy(&source, &dest).map_err(|source_err| Error::AssemblyError {
                path: source.clone(),
                source: source_err,
            })?;
        }

        Ok(StagingDirectory {
            root,
            name: name.to_string(),
            files: cookbook.files().to_vec(),
            directories_created: created.len(),
        })
    }

    fn create_root(&self, name: &str) -> Result<PathBuf> {
        let prefix = format!("pantry-{name}-build");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).disable_cleanup(true);

        let temp = match &self.parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|source| Error::AssemblyError {
            path: self.parent.clone().unwrap_or_else(std::env::temp_dir),
            source,
        })?;

        Ok(temp.path().to_path_buf())
    }
}

fn invalid_input(path: &Path, message: &str) -> Error {
    Error::AssemblyError {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, message.to_string()),
    }
}

fn validate_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid_input(path, "cookbook name must be a single path segment")),
    }
}

fn validate_relative(relative: &Path) -> Result<()> {
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || relative.as_os_str().is_empty() {
        return Err(invalid_input(
            relative,
            "cookbook file path must be relative and stay inside the cookbook",
        ));
    }
    Ok(())
}
