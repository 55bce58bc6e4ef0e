// src/transport.rs

//! HTTP(S) upload transport
//!
//! Frames a form as a streamed multipart body, signs the request, and sends
//! it with a blocking client. The response is returned as-is; deciding what a
//! status code means is up to the caller.

use crate::auth::RequestSigner;
use crate::config::{TlsConfig, VerifyMode};
use crate::error::{Error, Result};
use crate::multipart::{content_type, generate_boundary, UploadForm};
use crate::request::{SignedRequest, UploadMethod};
use reqwest::blocking::{Body, Client, Response};
use reqwest::Certificate;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// User agent sent with every request
const USER_AGENT: &str = concat!("pantry/", env!("CARGO_PKG_VERSION"));

/// Certificate authorities trusted for a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStore {
    /// Whether the client's built-in roots are included: the platform's
    /// native certificate store plus the bundled Mozilla set
    pub system_defaults: bool,
    /// Additional PEM files
    pub ca_files: Vec<PathBuf>,
}

/// TLS settings resolved for one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// True for `https` URLs
    pub secure: bool,
    /// Verification mode; `None` for plain HTTP
    pub verify_mode: Option<VerifyMode>,
    /// Custom trust store; `None` leaves the client's defaults untouched
    pub trust_store: Option<TrustStore>,
}

/// Sends signed multipart uploads
#[derive(Debug, Clone, Default)]
pub struct UploadTransport {
    tls: TlsConfig,
    timeout: Option<Duration>,
    signer: RequestSigner,
}

impl UploadTransport {
    pub fn new(tls: TlsConfig) -> Self {
        Self {
            tls,
            timeout: None,
            signer: RequestSigner::new(),
        }
    }

    /// Limit how long a request may take; unset means no limit
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload `form` to `url`
    ///
    /// An empty form sends an empty body. Connection and TLS failures come
    /// back as [`Error::TransportError`], an unreadable key as
    /// [`Error::KeyReadError`]. Nothing is retried.
    pub fn upload(
        &self,
        method: UploadMethod,
        url: &str,
        user_id: &str,
        key_path: &Path,
        form: UploadForm,
    ) -> Result<Response> {
        let url = Url::parse(url)?;
        let request = self.prepare(method, url, user_id, key_path, form)?;
        self.send(request)
    }

    /// Frame and sign a request without sending it
    pub fn prepare(
        &self,
        method: UploadMethod,
        url: Url,
        user_id: &str,
        key_path: &Path,
        form: UploadForm,
    ) -> Result<SignedRequest> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::ConfigError(format!(
                "Unsupported URL scheme '{}' in {}",
                url.scheme(),
                url
            )));
        }

        let (body, content_type) = if form.is_empty() {
            (None, None)
        } else {
            let boundary = generate_boundary();
            let stream = form.into_stream(&boundary)?;
            (Some(stream), Some(content_type(&boundary)))
        };

        let mut headers = self
            .signer
            .sign(method, &url, user_id, key_path, body.as_ref())?;
        headers.insert("Accept".to_string(), "application/json".to_string());
        if let Some(content_type) = content_type {
            headers.insert("Content-Type".to_string(), content_type);
        }

        let request = SignedRequest {
            method,
            url,
            headers,
            body,
        };
        debug!(
            "Prepared {} {} with {} body bytes",
            request.method,
            request.url,
            request.content_length()
        );
        Ok(request)
    }

    /// Send a signed request and return the raw response
    pub fn send(&self, request: SignedRequest) -> Result<Response> {
        let settings = self.connection_settings(&request.url);
        let client = self.build_client(&settings)?;

        let content_length = request.content_length();
        let SignedRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = client.request(method.into(), url.clone());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = match body {
            Some(stream) => Body::sized(stream, content_length),
            None => Body::from(Vec::new()),
        };

        info!("Uploading {} bytes: {} {}", content_length, method, url);
        let response = builder.body(body).send()?;
        info!("{} {} returned {}", method, url, response.status());
        Ok(response)
    }

    /// Resolve the TLS settings that apply to `url`
    pub fn connection_settings(&self, url: &Url) -> ConnectionSettings {
        if url.scheme() != "https" {
            return ConnectionSettings {
                secure: false,
                verify_mode: None,
                trust_store: None,
            };
        }

        let trust_store = self.tls.ca_file.as_ref().map(|ca_file| TrustStore {
            system_defaults: true,
            ca_files: vec![ca_file.clone()],
        });

        ConnectionSettings {
            secure: true,
            verify_mode: Some(self.tls.verify_mode),
            trust_store,
        }
    }

    /// Build a client applying `settings`
    pub fn build_client(&self, settings: &ConnectionSettings) -> Result<Client> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .timeout(self.timeout);

        if let Some(mode) = settings.verify_mode {
            debug!("TLS verify mode: {}", mode);
            builder = builder.danger_accept_invalid_certs(mode == VerifyMode::VerifyNone);
        }

        if let Some(store) = &settings.trust_store {
            builder = builder.tls_built_in_root_certs(store.system_defaults);
            for path in &store.ca_files {
                debug!("Trusting CA certificate {}", path.display());
                builder = builder.add_root_certificate(load_certificate(path)?);
            }
        }

        Ok(builder.build()?)
    }
}

fn load_certificate(path: &Path) -> Result<Certificate> {
    let pem = fs::read(path).map_err(|e| Error::CertificateError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Certificate::from_pem(&pem).map_err(|e| Error::CertificateError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::SigningKeyPair;
    use std::fs::File;
    use std::io::Read;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn key_fixture(dir: &Path) -> PathBuf {
        let private_path = dir.join("client.key");
        SigningKeyPair::generate()
            .save_to_files(&private_path, &dir.join("client.pub"))
            .unwrap();
        private_path
    }

    fn https() -> Url {
        Url::parse("https://site.example.com/api/v1/cookbooks").unwrap()
    }

    #[test]
    fn test_verify_modes() {
        let none = UploadTransport::new(TlsConfig::new(VerifyMode::VerifyNone));
        let peer = UploadTransport::new(TlsConfig::new(VerifyMode::VerifyPeer));

        assert_eq!(
            none.connection_settings(&https()).verify_mode,
            Some(VerifyMode::VerifyNone)
        );
        assert_eq!(
            peer.connection_settings(&https()).verify_mode,
            Some(VerifyMode::VerifyPeer)
        );
        none.build_client(&none.connection_settings(&https())).unwrap();
        peer.build_client(&peer.connection_settings(&https())).unwrap();
    }

    #[test]
    fn test_plain_http_has_no_tls_settings() {
        let transport = UploadTransport::new(
            TlsConfig::new(VerifyMode::VerifyNone).with_ca_file("/does/not/exist.pem"),
        );
        let url = Url::parse("http://localhost:8080/upload").unwrap();
        let settings = transport.connection_settings(&url);

        assert!(!settings.secure);
        assert!(settings.verify_mode.is_none());
        assert!(settings.trust_store.is_none());
        // The missing CA file is never touched for plain HTTP
        transport.build_client(&settings).unwrap();
    }

    #[test]
    fn test_custom_ca_extends_system_roots() {
        let transport =
            UploadTransport::new(TlsConfig::new(VerifyMode::VerifyPeer).with_ca_file("/etc/pantry/ca.pem"));
        let settings = transport.connection_settings(&https());

        assert_eq!(
            settings.trust_store,
            Some(TrustStore {
                system_defaults: true,
                ca_files: vec![PathBuf::from("/etc/pantry/ca.pem")],
            })
        );
    }

    #[test]
    fn test_no_custom_ca_leaves_trust_store_unset() {
        let transport = UploadTransport::new(TlsConfig::default());
        assert!(transport.connection_settings(&https()).trust_store.is_none());
    }

    #[test]
    fn test_unreadable_ca_file() {
        let temp_dir = TempDir::new().unwrap();
        let transport = UploadTransport::new(
            TlsConfig::new(VerifyMode::VerifyPeer).with_ca_file(temp_dir.path().join("missing.pem")),
        );
        let result = transport.build_client(&transport.connection_settings(&https()));
        assert!(matches!(result, Err(Error::CertificateError { .. })));
    }

    #[test]
    fn test_prepare_frames_and_signs() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = key_fixture(temp_dir.path());

        let data_path = temp_dir.path().join("data.bin");
        fs::write(&data_path, b"12345").unwrap();
        let file = Arc::new(File::open(&data_path).unwrap());

        let form = UploadForm::new()
            .file("myfile", Arc::clone(&file), "data.bin")
            .text("mystring", "hello");
        let mut request = UploadTransport::default()
            .prepare(UploadMethod::Post, https(), "alice", &key_path, form)
            .unwrap();

        let content_type = request.header("content-type").unwrap().to_string();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string();

        let framing = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"myfile\"; filename=\"data.bin\"\r\n\r\n\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"mystring\"\r\n\r\n\r\n\
             --{b}--\r\n",
            b = boundary
        );
        assert_eq!(request.content_length(), framing.len() as u64 + 5 + 5);
        assert_eq!(request.header("X-Ops-Userid"), Some("alice"));
        assert!(request.header("X-Ops-Authorization-1").is_some());

        let mut body = Vec::new();
        request.body.as_mut().unwrap().read_to_end(&mut body).unwrap();
        assert_eq!(body.len() as u64, request.content_length());
        assert_eq!(
            request.header("X-Ops-Content-Hash").unwrap(),
            crate::hash::sha256_base64(&body)
        );
    }

    #[test]
    fn test_prepare_empty_form() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = key_fixture(temp_dir.path());

        let request = UploadTransport::default()
            .prepare(UploadMethod::Put, https(), "alice", &key_path, UploadForm::new())
            .unwrap();

        assert!(request.body().is_none());
        assert_eq!(request.content_length(), 0);
        assert!(request.header("content-type").is_none());
        assert_eq!(
            request.header("X-Ops-Content-Hash"),
            Some(crate::hash::sha256_base64(b"").as_str())
        );
    }

    #[test]
    fn test_prepare_rejects_other_schemes() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = key_fixture(temp_dir.path());
        let url = Url::parse("ftp://site.example.com/upload").unwrap();

        let result = UploadTransport::default().prepare(
            UploadMethod::Post,
            url,
            "alice",
            &key_path,
            UploadForm::new(),
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_missing_key_fails_before_sending() {
        let temp_dir = TempDir::new().unwrap();
        let result = UploadTransport::default().upload(
            UploadMethod::Post,
            "https://127.0.0.1:1/api",
            "alice",
            &temp_dir.path().join("missing.key"),
            UploadForm::new().text("a", "b"),
        );
        assert!(matches!(result, Err(Error::KeyReadError { .. })));
    }

    #[test]
    fn test_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = key_fixture(temp_dir.path());
        let result = UploadTransport::default().upload(
            UploadMethod::Post,
            "not a url",
            "alice",
            &key_path,
            UploadForm::new(),
        );
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        let temp_dir = TempDir::new().unwrap();
        let key_path = key_fixture(temp_dir.path());

        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = UploadTransport::default().upload(
            UploadMethod::Post,
            &format!("http://127.0.0.1:{port}/api/v1/cookbooks"),
            "alice",
            &key_path,
            UploadForm::new().text("a", "b"),
        );
        assert!(matches!(result, Err(Error::TransportError(_))));
    }
}
