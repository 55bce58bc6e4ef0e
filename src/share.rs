// src/share.rs

//! Sharing a cookbook with a cookbook site
//!
//! Loads the cookbook, stages it, packages the staging copy, and uploads the
//! tarball as a signed multipart POST to `<site>/api/v1/cookbooks`.

use crate::config::{Config, TlsConfig};
use crate::cookbook::{CookbookDir, CookbookFileTree};
use crate::error::{Error, Result};
use crate::multipart::UploadForm;
use crate::package::package_cookbook;
use crate::request::UploadMethod;
use crate::staging::BuildDirectoryAssembler;
use crate::transport::UploadTransport;
use serde::Deserialize;
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Path of the cookbook upload endpoint below the site URL
pub const COOKBOOKS_ENDPOINT: &str = "api/v1/cookbooks";

/// Category used when none is given
pub const DEFAULT_CATEGORY: &str = "Other";

/// Where and as whom to upload
#[derive(Debug, Clone)]
pub struct ShareSettings {
    pub user_id: String,
    pub key_path: PathBuf,
    pub site_url: String,
    pub tls: TlsConfig,
    pub timeout: Option<Duration>,
}

impl ShareSettings {
    /// Resolve settings from the configuration, letting flags win
    pub fn resolve(
        config: &Config,
        user_id: Option<String>,
        key_path: Option<PathBuf>,
        site_url: Option<String>,
    ) -> Result<Self> {
        let user_id = match user_id {
            Some(user) => user,
            None => config.require_node_name()?.to_string(),
        };
        let key_path = match key_path {
            Some(path) => path,
            None => config.require_client_key()?,
        };
        let site_url = match site_url {
            Some(url) => url,
            None => config.require_site_url()?.to_string(),
        };

        Ok(Self {
            user_id,
            key_path,
            site_url,
            tls: config.tls(),
            timeout: config.timeout(),
        })
    }

    /// Full URL of the upload endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.site_url.trim_end_matches('/'), COOKBOOKS_ENDPOINT)
    }
}

/// What to share
#[derive(Debug, Clone, Default)]
pub struct ShareOptions {
    pub category: Option<String>,
    /// Overrides the name read from the cookbook
    pub name: Option<String>,
}

/// Result of a completed upload attempt
#[derive(Debug, Clone)]
pub struct ShareOutcome {
    pub cookbook: String,
    pub status: u16,
    /// Staging directory left on disk
    pub staging_dir: PathBuf,
    /// Messages reported by the site for a rejected upload
    pub errors: Vec<String>,
}

impl ShareOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Extract the error messages from a rejection body
///
/// Prefers `error_messages`, falls back to `error` (a string or a list), and
/// finally to the raw body.
pub fn parse_error_messages(body: &str) -> Vec<String> {
    let trimmed = body.trim();
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(trimmed) else {
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    };

    if !parsed.error_messages.is_empty() {
        return parsed.error_messages;
    }

    match parsed.error {
        Some(serde_json::Value::String(message)) => vec![message],
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Some(other) => vec![other.to_string()],
        None => vec![trimmed.to_string()],
    }
}

/// Build the upload form for a packaged cookbook
pub fn cookbook_form(tarball: &Path, category: &str) -> Result<UploadForm> {
    let filename = tarball
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::ConfigError(format!("Invalid tarball path: {}", tarball.display())))?;
    let file = File::open(tarball).map_err(|source| Error::PackageError {
        path: tarball.to_path_buf(),
        source,
    })?;
    let metadata = json!({ "category": category }).to_string();

    Ok(UploadForm::new()
        .file("tarball", Arc::new(file), filename)
        .text("cookbook", metadata))
}

/// Stage, package, and upload the cookbook at `cookbook_dir`
///
/// Local failures are returned as errors. A response from the site, whatever
/// its status, is returned as a [`ShareOutcome`].
pub fn share_cookbook(
    cookbook_dir: &Path,
    options: &ShareOptions,
    settings: &ShareSettings,
) -> Result<ShareOutcome> {
    let mut cookbook = CookbookDir::load(cookbook_dir)?;
    if let Some(name) = &options.name {
        cookbook = cookbook.with_name(name.clone());
    }
    let name = cookbook.name().to_string();
    let category = options.category.as_deref().unwrap_or(DEFAULT_CATEGORY);

    let staging = BuildDirectoryAssembler::new().assemble(&cookbook)?;
    let tarball = package_cookbook(&staging)?;
    let form = cookbook_form(&tarball, category)?;

    info!("Sharing {} in category {} to {}", name, category, settings.site_url);
    let transport = UploadTransport::new(settings.tls.clone()).with_timeout(settings.timeout);
    let response = transport.upload(
        UploadMethod::Post,
        &settings.endpoint(),
        &settings.user_id,
        &settings.key_path,
        form,
    )?;

    let status = response.status().as_u16();
    let body = response.text()?;
    let mut outcome = ShareOutcome {
        cookbook: name,
        status,
        staging_dir: staging.root().to_path_buf(),
        errors: Vec::new(),
    };
    if !outcome.is_success() {
        outcome.errors = parse_error_messages(&body);
        warn!("Upload of {} rejected with status {}", outcome.cookbook, status);
    }
    Ok(outcome)
}
