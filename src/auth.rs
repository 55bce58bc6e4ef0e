// src/auth.rs

//! Request authentication headers
//!
//! Every upload carries headers that let the site verify who sent it and that
//! the body was not altered:
//!
//! - `X-Ops-Userid`: the client name
//! - `X-Ops-Timestamp`: UTC time of signing
//! - `X-Ops-Content-Hash`: base64 SHA-256 of the body
//! - `X-Ops-Sign`: algorithm and protocol version
//! - `X-Ops-Authorization-N`: the signature over the canonical request, split
//!   into 60-character lines
//!
//! The canonical request covers the method, the hashed normalized path, the
//! content hash, the timestamp, and the user id, so changing any of them
//! changes the signature.

use crate::error::Result;
use crate::hash::sha256_base64;
use crate::multipart::MultipartStream;
use crate::request::UploadMethod;
use crate::signing::SigningKeyPair;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Protocol version advertised in `X-Ops-Sign`
pub const SIGN_VERSION: &str = "1.0";

/// Width of each `X-Ops-Authorization-N` header value
const AUTHORIZATION_LINE_WIDTH: usize = 60;

/// Timestamp format used in `X-Ops-Timestamp`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The fields covered by a request signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub method: UploadMethod,
    /// Normalized request path
    pub path: String,
    pub user_id: String,
    pub content_hash: String,
    pub timestamp: String,
}

impl CanonicalRequest {
    pub fn new(
        method: UploadMethod,
        path: &str,
        user_id: &str,
        content_hash: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            method,
            path: canonical_path(path),
            user_id: user_id.to_string(),
            content_hash,
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// The exact bytes that get signed
    pub fn to_signable(&self) -> String {
        format!(
            "Method:{}\nHashed Path:{}\nX-Ops-Content-Hash:{}\nX-Ops-Timestamp:{}\nX-Ops-UserId:{}",
            self.method,
            sha256_base64(self.path.as_bytes()),
            self.content_hash,
            self.timestamp,
            self.user_id
        )
    }
}

/// Collapse repeated slashes and drop a trailing slash (except for `/`)
pub fn canonical_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(c);
    }

    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Algorithm that turns a canonical request into authentication headers
pub trait HeaderAuth {
    fn sign(&self, request: &CanonicalRequest, key: &SigningKeyPair) -> Result<BTreeMap<String, String>>;
}

/// Ed25519 signature over the canonical request
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519HeaderAuth;

impl HeaderAuth for Ed25519HeaderAuth {
    fn sign(&self, request: &CanonicalRequest, key: &SigningKeyPair) -> Result<BTreeMap<String, String>> {
        let signature = key.sign_base64(request.to_signable().as_bytes());

        let mut headers = BTreeMap::new();
        headers.insert(
            "X-Ops-Sign".to_string(),
            format!("algorithm=ed25519;version={SIGN_VERSION}"),
        );
        headers.insert("X-Ops-Userid".to_string(), request.user_id.clone());
        headers.insert("X-Ops-Timestamp".to_string(), request.timestamp.clone());
        headers.insert("X-Ops-Content-Hash".to_string(), request.content_hash.clone());

        // base64 is pure ASCII, so byte chunks are valid UTF-8
        for (i, line) in signature.as_bytes().chunks(AUTHORIZATION_LINE_WIDTH).enumerate() {
            headers.insert(
                format!("X-Ops-Authorization-{}", i + 1),
                String::from_utf8_lossy(line).into_owned(),
            );
        }

        Ok(headers)
    }
}

/// Join `X-Ops-Authorization-N` headers back into the base64 signature
pub fn joined_authorization(headers: &BTreeMap<String, String>) -> String {
    let mut signature = String::new();
    for i in 1.. {
        match headers.get(&format!("X-Ops-Authorization-{i}")) {
            Some(line) => signature.push_str(line),
            None => break,
        }
    }
    signature
}

/// Builds authentication headers for upload requests
#[derive(Debug, Clone, Default)]
pub struct RequestSigner<A: HeaderAuth = Ed25519HeaderAuth> {
    auth: A,
}

impl RequestSigner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A: HeaderAuth> RequestSigner<A> {
    /// Use a different header authentication algorithm
    pub fn with_auth(auth: A) -> Self {
        Self { auth }
    }

    /// Sign a request at the current time
    pub fn sign(
        &self,
        method: UploadMethod,
        url: &Url,
        user_id: &str,
        key_path: &Path,
        body: Option<&MultipartStream>,
    ) -> Result<BTreeMap<String, String>> {
        self.sign_at(method, url, user_id, key_path, body, Utc::now())
    }

    /// Sign a request at a fixed time
    ///
    /// The key is read from `key_path` on every call. An absent body signs
    /// the hash of the empty string.
    pub fn sign_at(
        &self,
        method: UploadMethod,
        url: &Url,
        user_id: &str,
        key_path: &Path,
        body: Option<&MultipartStream>,
        timestamp: DateTime<Utc>,
    ) -> Result<BTreeMap<String, String>> {
        let key = SigningKeyPair::load_from_file(key_path)?;

        let content_hash = match body {
            Some(stream) => stream.content_hash()?,
            None => sha256_base64(b""),
        };

        let canonical = CanonicalRequest::new(method, url.path(), user_id, content_hash, timestamp);
        debug!(
            "Signing {} {} as {} at {}",
            canonical.method, canonical.path, canonical.user_id, canonical.timestamp
        );

        self.auth.sign(&canonical, &key)
    }
}
