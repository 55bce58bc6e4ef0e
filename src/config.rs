// src/config.rs

//! Client configuration
//!
//! Read from a TOML file, by default `$XDG_CONFIG_HOME/pantry/config.toml`:
//!
//! ```toml
//! node_name = "alice"
//! client_key = "~/.pantry/alice.key"
//! site_url = "https://supermarket.example.com"
//! ssl_verify_mode = "verify_peer"
//! ssl_ca_file = "/etc/pantry/ca.pem"
//! timeout_secs = 300
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Whether TLS peers must present a certificate we trust
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Accept any server certificate
    VerifyNone,
    /// Verify the server certificate chain (default)
    #[default]
    VerifyPeer,
}

impl std::fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyMode::VerifyNone => write!(f, "verify_none"),
            VerifyMode::VerifyPeer => write!(f, "verify_peer"),
        }
    }
}

/// TLS settings handed to the upload transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub verify_mode: VerifyMode,
    /// Extra CA certificate (PEM) trusted in addition to the platform roots
    pub ca_file: Option<PathBuf>,
}

impl TlsConfig {
    pub fn new(verify_mode: VerifyMode) -> Self {
        Self {
            verify_mode,
            ca_file: None,
        }
    }

    pub fn with_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_file = Some(path.into());
        self
    }
}

/// Contents of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Client name sent as the request user id
    #[serde(default)]
    pub node_name: Option<String>,

    /// Path to the client's private key
    #[serde(default)]
    pub client_key: Option<PathBuf>,

    /// Base URL of the cookbook site
    #[serde(default)]
    pub site_url: Option<String>,

    #[serde(default)]
    pub ssl_verify_mode: VerifyMode,

    #[serde(default)]
    pub ssl_ca_file: Option<PathBuf>,

    /// Request timeout; unset means no client-side deadline
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pantry").join("config.toml"))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Load the file at `path`, or the default file if it exists
    ///
    /// An explicitly given path must exist. A missing default file yields an
    /// empty configuration so command-line flags can supply everything.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::load(&default),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn tls(&self) -> TlsConfig {
        TlsConfig {
            verify_mode: self.ssl_verify_mode,
            ca_file: self.ssl_ca_file.as_deref().map(expand_home),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn require_node_name(&self) -> Result<&str> {
        self.node_name.as_deref().ok_or_else(|| missing("node_name"))
    }

    pub fn require_client_key(&self) -> Result<PathBuf> {
        self.client_key
            .as_deref()
            .map(expand_home)
            .ok_or_else(|| missing("client_key"))
    }

    pub fn require_site_url(&self) -> Result<&str> {
        self.site_url.as_deref().ok_or_else(|| missing("site_url"))
    }
}

fn missing(key: &str) -> Error {
    Error::ConfigError(format!("`{key}` is not set (add it to the config file or pass it as a flag)"))
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
