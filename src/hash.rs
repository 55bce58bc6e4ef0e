// src/hash.rs

//! Content digests for request signing
//!
//! Request signatures carry a base64-encoded SHA-256 of the request body and
//! of the request path. Bodies can be large, so the hasher accepts data
//! incrementally.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

/// Incremental SHA-256 hasher producing base64 output
#[derive(Default)]
pub struct ContentHasher {
    state: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more data into the hasher
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Finalize and return the digest as standard base64
    pub fn finalize_base64(self) -> String {
        BASE64.encode(self.state.finalize())
    }
}

/// Base64-encoded SHA-256 of a byte slice
pub fn sha256_base64(data: &[u8]) -> String {
    let mut hasher = ContentHasher::new();
    hasher.update(data);
    hasher.finalize_base64()
}
