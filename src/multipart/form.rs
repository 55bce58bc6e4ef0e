// src/multipart/form.rs

//! `multipart/form-data` framing
//!
//! A form is an ordered list of named fields. Framing turns it into a
//! [`MultipartStream`] whose parts are the boundary and header lines plus the
//! field payloads, so the exact body length is known before a single payload
//! byte is read.

use super::part::{FilePart, Part, StringPart};
use super::stream::MultipartStream;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fs::File;
use std::io;
use std::sync::Arc;

/// Random characters appended to the boundary prefix
const BOUNDARY_RANDOM_LEN: usize = 16;

/// Value carried by a form field
#[derive(Debug, Clone)]
pub enum FormValue {
    /// Inline text (or bytes) sent as the field body
    Text(Vec<u8>),
    /// An open file streamed from disk under the given filename
    File { file: Arc<File>, filename: String },
}

/// Ordered set of named form fields
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    fields: Vec<(String, FormValue)>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    /// Add a file field backed by a shared handle
    pub fn file(mut self, name: impl Into<String>, file: Arc<File>, filename: impl Into<String>) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File {
                file,
                filename: filename.into(),
            },
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    /// Frame the form into a body stream delimited by `boundary`
    ///
    /// File sizes are taken from the handles' metadata at this point. Field
    /// names and filenames containing `"`, CR or LF are rejected with
    /// `InvalidInput`, since they would break out of the quoted
    /// `Content-Disposition` parameters.
    pub fn into_stream(self, boundary: &str) -> io::Result<MultipartStream> {
        for (name, value) in &self.fields {
            check_header_value(name)?;
            if let FormValue::File { filename, .. } = value {
                check_header_value(filename)?;
            }
        }

        let mut parts: Vec<Box<dyn Part>> = Vec::with_capacity(self.fields.len() * 3 + 1);

        for (name, value) in self.fields {
            match value {
                FormValue::Text(body) => {
                    parts.push(Box::new(StringPart::new(format!(
                        "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                    ))));
                    let mut payload = body;
                    payload.extend_from_slice(b"\r\n");
                    parts.push(Box::new(StringPart::new(payload)));
                }
                FormValue::File { file, filename } => {
                    parts.push(Box::new(StringPart::new(format!(
                        "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\r\n"
                    ))));
                    parts.push(Box::new(FilePart::new(file)?));
                    parts.push(Box::new(StringPart::new("\r\n")));
                }
            }
        }

        parts.push(Box::new(StringPart::new(format!("--{boundary}--\r\n"))));
        Ok(MultipartStream::new(parts))
    }
}

fn check_header_value(value: &str) -> io::Result<()> {
    if value.contains(['"', '\r', '\n']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("form name {value:?} contains a quote or line break"),
        ));
    }
    Ok(())
}

/// Generate a fresh boundary string
pub fn generate_boundary() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("----PantryMultipart{suffix}")
}

/// `Content-Type` header value for a body framed with `boundary`
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}
