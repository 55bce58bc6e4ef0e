// src/request.rs

//! Signed upload requests

use crate::multipart::MultipartStream;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// HTTP methods accepted for uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadMethod {
    Post,
    Put,
}

impl UploadMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<UploadMethod> for reqwest::Method {
    fn from(method: UploadMethod) -> Self {
        match method {
            UploadMethod::Post => reqwest::Method::POST,
            UploadMethod::Put => reqwest::Method::PUT,
        }
    }
}

/// A request with its authentication headers attached
///
/// Built once per upload attempt and not modified after signing.
#[derive(Debug)]
pub struct SignedRequest {
    pub(crate) method: UploadMethod,
    pub(crate) url: Url,
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) body: Option<MultipartStream>,
}

impl SignedRequest {
    pub fn method(&self) -> UploadMethod {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> Option<&MultipartStream> {
        self.body.as_ref()
    }

    /// Exact number of body bytes that will be sent
    pub fn content_length(&self) -> u64 {
        self.body.as_ref().map_or(0, MultipartStream::size)
    }
}
