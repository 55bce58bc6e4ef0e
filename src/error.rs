// src/error.rs

//! Error types for pantry
//!
//! Each variant keeps its underlying cause so a signing failure and a
//! transport failure both surface with the original error attached.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file missing, unparsable, or lacking a required value
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The private key file could not be read
    #[error("Failed to read signing key {}: {source}", path.display())]
    KeyReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private key file was read but is not a usable key
    #[error("Invalid signing key {}: {reason}", path.display())]
    KeyFormatError { path: PathBuf, reason: String },

    /// The header authentication algorithm rejected the request
    #[error("Signing failed: {0}")]
    SigningError(String),

    /// Connection, TLS handshake, or request failure in the HTTP client
    #[error("HTTP transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A configured CA certificate could not be loaded
    #[error("Failed to load CA certificate {}: {reason}", path.display())]
    CertificateError { path: PathBuf, reason: String },

    /// Filesystem failure while staging a build directory
    #[error("Failed to assemble build directory at {}: {source}", path.display())]
    AssemblyError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failure while writing the cookbook tarball
    #[error("Failed to package {}: {source}", path.display())]
    PackageError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unsupported installer: {0}")]
    UnsupportedInstaller(String),
}
