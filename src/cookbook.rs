// src/cookbook.rs

//! Cookbook file trees
//!
//! A cookbook is consumed as a name, a root directory, and the list of file
//! paths relative to that root. [`CookbookDir`] provides that view for a
//! directory on disk.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directories never shipped with a cookbook
const IGNORED_DIRS: &[&str] = &[".git", ".svn", ".hg"];

/// The file tree of a cookbook
pub trait CookbookFileTree {
    /// Cookbook name, used for the staging and tarball names
    fn name(&self) -> &str;

    /// Directory the relative paths are resolved against
    fn root(&self) -> &Path;

    /// File paths relative to [`root`](Self::root)
    fn files(&self) -> &[PathBuf];
}

/// A cookbook read from a directory on disk
#[derive(Debug, Clone)]
pub struct CookbookDir {
    name: String,
    root: PathBuf,
    files: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct Metadata {
    name: Option<String>,
}

impl CookbookDir {
    /// Walk `root` and collect its files
    ///
    /// The name comes from `metadata.json` when it has one, otherwise from
    /// the directory name.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::ConfigError(format!(
                "Cookbook directory not found: {}",
                root.display()
            )));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| !is_ignored(entry.file_name().to_str().unwrap_or_default(), entry.file_type().is_dir()));

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&root) {
                files.push(relative.to_path_buf());
            }
        }
        files.sort();

        let name = metadata_name(&root).unwrap_or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "cookbook".to_string())
        });

        debug!("Loaded cookbook {} with {} files", name, files.len());
        Ok(Self { name, root, files })
    }

    /// Override the cookbook name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl CookbookFileTree for CookbookDir {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

fn is_ignored(file_name: &str, is_dir: bool) -> bool {
    if is_dir {
        IGNORED_DIRS.contains(&file_name)
    } else {
        file_name.ends_with('~') || file_name.ends_with(".swp")
    }
}

fn metadata_name(root: &Path) -> Option<String> {
    let content = fs::read_to_string(root.join("metadata.json")).ok()?;
    let metadata: Metadata = serde_json::from_str(&content).ok()?;
    metadata.name.filter(|n| !n.is_empty())
}
