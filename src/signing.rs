// src/signing.rs
//! Client signing keys
//!
//! Ed25519 key pairs used to authenticate upload requests. Private keys are
//! stored as small TOML files holding the base64 seed; public keys use the
//! same format so a site operator can register them.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Algorithm name written to key files
pub const KEY_ALGORITHM: &str = "ed25519";

/// A signing key pair for a client
pub struct SigningKeyPair {
    signing_key: SigningKey,
    key_id: Option<String>,
}

impl SigningKeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
            key_id: None,
        }
    }

    /// Set a human-readable key identifier
    pub fn with_key_id(mut self, id: &str) -> Self {
        self.key_id = Some(id.to_string());
        self
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Get the public key as base64
    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.verifying_key().as_bytes())
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Sign content and return the base64 signature
    pub fn sign_base64(&self, content: &[u8]) -> String {
        BASE64.encode(self.signing_key.sign(content).to_bytes())
    }

    /// Save the key pair to files (private and public)
    pub fn save_to_files(&self, private_path: &Path, public_path: &Path) -> Result<()> {
        let private_data = KeyFile {
            algorithm: KEY_ALGORITHM.to_string(),
            key: BASE64.encode(self.signing_key.to_bytes()),
            key_id: self.key_id.clone(),
        };
        write_key_file(private_path, &private_data)?;

        // Private key must not be readable by other users
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(private_path, fs::Permissions::from_mode(0o600))?;
        }

        let public_data = KeyFile {
            algorithm: KEY_ALGORITHM.to_string(),
            key: self.public_key_base64(),
            key_id: self.key_id.clone(),
        };
        write_key_file(public_path, &public_data)
    }

    /// Load a key pair from a private key file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::KeyReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let invalid = |reason: String| Error::KeyFormatError {
            path: path.to_path_buf(),
            reason,
        };

        let key_file: KeyFile = toml::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        if key_file.algorithm != KEY_ALGORITHM {
            return Err(invalid(format!(
                "unsupported key algorithm: {}",
                key_file.algorithm
            )));
        }

        let key_bytes = BASE64
            .decode(&key_file.key)
            .map_err(|e| invalid(format!("invalid base64: {e}")))?;

        let key_array: [u8; 32] = key_bytes
            .try_into()
            .map_err(|_| invalid("invalid key length".to_string()))?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&key_array),
            key_id: key_file.key_id,
        })
    }
}

/// Key file format
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    algorithm: String,
    key: String,
    #[serde(default)]
    key_id: Option<String>,
}

fn write_key_file(path: &Path, data: &KeyFile) -> Result<()> {
    let toml = toml::to_string_pretty(data)
        .map_err(|e| Error::ConfigError(format!("Failed to encode key file: {e}")))?;
    fs::write(path, toml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_and_sign() {
        let keypair = SigningKeyPair::generate().with_key_id("test-key");

        let content = b"canonical request";
        let signature = keypair.sign_base64(content);

        let sig_bytes = BASE64.decode(&signature).unwrap();
        let sig = ed25519_dalek::Signature::from_slice(&sig_bytes).unwrap();
        keypair.verifying_key().verify_strict(content, &sig).unwrap();
        assert_eq!(keypair.key_id(), Some("test-key"));
    }

    #[test]
    fn test_signatures_are_deterministic() {
        let keypair = SigningKeyPair::generate();
        assert_eq!(keypair.sign_base64(b"abc"), keypair.sign_base64(b"abc"));
        assert_ne!(keypair.sign_base64(b"abc"), keypair.sign_base64(b"abd"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let private_path = temp_dir.path().join("alice.key");
        let public_path = temp_dir.path().join("alice.pub");

        let keypair = SigningKeyPair::generate().with_key_id("alice");
        let original_public = keypair.public_key_base64();
        keypair.save_to_files(&private_path, &public_path).unwrap();

        let loaded = SigningKeyPair::load_from_file(&private_path).unwrap();
        assert_eq!(loaded.public_key_base64(), original_public);
        assert_eq!(loaded.key_id(), Some("alice"));
        assert!(fs::read_to_string(&public_path).unwrap().contains(&original_public));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&private_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_missing_key_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = SigningKeyPair::load_from_file(&temp_dir.path().join("missing.key"));
        assert!(matches!(result, Err(Error::KeyReadError { .. })));
    }

    #[test]
    fn test_malformed_key_is_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.key");

        fs::write(&path, "algorithm = \"ed25519\"\nkey = \"c2hvcnQ=\"\n").unwrap();
        assert!(matches!(
            SigningKeyPair::load_from_file(&path),
            Err(Error::KeyFormatError { .. })
        ));

        fs::write(&path, "algorithm = \"rsa\"\nkey = \"AAAA\"\n").unwrap();
        assert!(matches!(
            SigningKeyPair::load_from_file(&path),
            Err(Error::KeyFormatError { .. })
        ));
    }
}
