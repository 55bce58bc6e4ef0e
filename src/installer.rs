// src/installer.rs

//! Native package installer dispatch
//!
//! Picks the system installer for a package file. The format is detected
//! from the file extension first and from the leading magic bytes otherwise,
//! and is only detected once per [`Installer`].

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::debug;

/// Package formats with a known installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallerKind {
    Rpm,
    Deb,
    Arch,
}

impl InstallerKind {
    /// Detect the package format of `path`
    pub fn detect(path: &Path) -> Result<Self> {
        if let Some(kind) = Self::from_extension(path) {
            return Ok(kind);
        }

        let mut magic = Vec::with_capacity(8);
        File::open(path)?.take(8).read_to_end(&mut magic)?;
        Self::from_magic(&magic)
            .ok_or_else(|| Error::UnsupportedInstaller(path.display().to_string()))
    }

    fn from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".rpm") {
            Some(Self::Rpm)
        } else if name.ends_with(".deb") {
            Some(Self::Deb)
        } else if name.ends_with(".pkg.tar.zst") || name.ends_with(".pkg.tar.xz") {
            Some(Self::Arch)
        } else {
            None
        }
    }

    fn from_magic(magic: &[u8]) -> Option<Self> {
        if magic.starts_with(&[0xED, 0xAB, 0xEE, 0xDB]) {
            Some(Self::Rpm)
        } else if magic.starts_with(b"!<arch>") {
            // ar archive
            Some(Self::Deb)
        } else if magic.starts_with(&[0x28, 0xB5, 0x2F, 0xFD])
            || magic.starts_with(&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00])
        {
            // zstd or xz compressed tar
            Some(Self::Arch)
        } else {
            None
        }
    }

    /// Installer program and its arguments, before the package path
    pub fn program(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Rpm => ("rpm", &["-Uvh"]),
            Self::Deb => ("dpkg", &["-i"]),
            Self::Arch => ("pacman", &["-U", "--noconfirm"]),
        }
    }
}

/// Installs one package file with the matching system installer
#[derive(Debug)]
pub struct Installer {
    path: PathBuf,
    kind: OnceLock<InstallerKind>,
}

impl Installer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected package format, resolved on first call
    pub fn kind(&self) -> Result<InstallerKind> {
        if let Some(kind) = self.kind.get() {
            return Ok(*kind);
        }
        let kind = InstallerKind::detect(&self.path)?;
        debug!("Detected {:?} package: {}", kind, self.path.display());
        Ok(*self.kind.get_or_init(|| kind))
    }

    /// Command that installs the package; not spawned here
    pub fn command(&self) -> Result<Command> {
        let (program, args) = self.kind()?.program();
        let mut command = Command::new(program);
        command.args(args).arg(&self.path);
        Ok(command)
    }
}
