// src/multipart/mod.rs

//! Lazy `multipart/form-data` bodies
//!
//! Bodies are composed from [`Part`]s (in-memory strings and open files) and
//! read through a [`MultipartStream`] without ever holding the whole payload
//! in memory.

mod form;
mod part;
mod stream;

pub use form::{content_type, generate_boundary, FormValue, UploadForm};
pub use part::{FilePart, Part, StringPart};
pub use stream::MultipartStream;
