// src/lib.rs

//! Pantry cookbook client
//!
//! Stages cookbooks into temporary build directories, packages them, and
//! shares them with a cookbook site over signed multipart uploads.
//!
//! # Architecture
//!
//! - Streaming bodies: multipart forms are read part by part, never buffered
//! - Exact lengths: the body size is known before the first byte is sent
//! - Header signing: every request carries Ed25519 `X-Ops-*` headers
//! - Per-request TLS: verification mode and extra CA files come from config

pub mod auth;
pub mod config;
pub mod cookbook;
mod error;
pub mod hash;
pub mod installer;
pub mod multipart;
pub mod package;
pub mod request;
pub mod share;
pub mod signing;
pub mod staging;
pub mod transport;

pub use auth::{CanonicalRequest, Ed25519HeaderAuth, HeaderAuth, RequestSigner};
pub use config::{Config, TlsConfig, VerifyMode};
pub use cookbook::{CookbookDir, CookbookFileTree};
pub use error::{Error, Result};
pub use installer::{Installer, InstallerKind};
pub use multipart::{FilePart, MultipartStream, Part, StringPart, UploadForm};
pub use package::package_cookbook;
pub use request::{SignedRequest, UploadMethod};
pub use share::{share_cookbook, ShareOptions, ShareOutcome, ShareSettings};
pub use signing::SigningKeyPair;
pub use staging::{BuildDirectoryAssembler, StagingDirectory};
pub use transport::{ConnectionSettings, TrustStore, UploadTransport};
