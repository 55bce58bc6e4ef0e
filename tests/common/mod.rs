// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use pantry::SigningKeyPair;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A request as seen by the test server
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Read one request from `stream` and answer it with `status` and `body`
///
/// Returns the stream so a TLS caller can close the session cleanly.
fn serve<S: Read + Write>(stream: S, status: u16, body: &str) -> io::Result<(CapturedRequest, S)> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length: usize = headers
        .get("content-length")
        .map(|v| v.parse().unwrap())
        .unwrap_or(0);
    let mut request_body = vec![0u8; length];
    reader.read_exact(&mut request_body)?;

    let mut stream = reader.into_inner();
    let response = format!(
        "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()?;

    let request = CapturedRequest {
        method,
        path,
        headers,
        body: request_body,
    };
    Ok((request, stream))
}

/// Server that accepts exactly one request and answers it
pub struct OneShotServer {
    pub url: String,
    handle: JoinHandle<io::Result<CapturedRequest>>,
}

impl OneShotServer {
    /// Answer the next request with `status` and a JSON `body`
    pub fn start(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept()?;
            serve(stream, status, &body).map(|(request, _)| request)
        });

        Self { url, handle }
    }

    /// Answer the next request over TLS with a freshly generated self-signed
    /// certificate for `127.0.0.1`
    pub fn start_tls(status: u16, body: &str) -> Self {
        let certified = rcgen::generate_simple_self_signed(vec![
            "127.0.0.1".to_string(),
            "localhost".to_string(),
        ])
        .unwrap();
        let config = rustls::ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(
                vec![rustls::Certificate(certified.cert.der().to_vec())],
                rustls::PrivateKey(certified.key_pair.serialize_der()),
            )
            .unwrap();
        let config = Arc::new(config);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("https://{}", listener.local_addr().unwrap());
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let (tcp, _) = listener.accept()?;
            tcp.set_read_timeout(Some(Duration::from_secs(10)))?;
            let conn = rustls::ServerConnection::new(config)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let (request, mut stream) = serve(rustls::StreamOwned::new(conn, tcp), status, &body)?;
            stream.conn.send_close_notify();
            stream.flush()?;
            Ok(request)
        });

        Self { url, handle }
    }

    /// Wait for the request to be answered and return it
    pub fn finish(self) -> CapturedRequest {
        self.handle.join().unwrap().unwrap()
    }

    /// Wait for the server thread; errors if no request was answered
    pub fn finish_result(self) -> io::Result<CapturedRequest> {
        self.handle.join().unwrap()
    }
}

/// Write a fresh key pair into `dir`, returning (private path, key pair)
pub fn write_key(dir: &Path) -> (PathBuf, SigningKeyPair) {
    let keypair = SigningKeyPair::generate();
    let private_path = dir.join("client.key");
    keypair
        .save_to_files(&private_path, &dir.join("client.pub"))
        .unwrap();
    (private_path, keypair)
}

/// Create a small cookbook named `name` under `parent`
pub fn write_cookbook(parent: &Path, name: &str) -> PathBuf {
    let root = parent.join(name);
    std::fs::create_dir_all(root.join("recipes")).unwrap();
    std::fs::write(
        root.join("metadata.json"),
        format!(r#"{{"name": "{name}", "version": "0.1.0"}}"#),
    )
    .unwrap();
    std::fs::write(root.join("recipes/default.rb"), format!("package '{name}'")).unwrap();
    std::fs::write(root.join("README.md"), format!("# {name}")).unwrap();
    root
}
