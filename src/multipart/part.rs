// src/multipart/part.rs

//! Randomly readable building blocks of a multipart body
//!
//! A part has a size fixed at construction and can be read at any offset.
//! Reads past the end are clamped rather than rejected: asking for more bytes
//! than remain returns what is left, and an offset at or beyond the end
//! returns nothing.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

/// A fixed-size, offset-readable unit of bytes
pub trait Part: Send {
    /// Size in bytes, constant for the lifetime of the part
    fn size(&self) -> u64;

    /// Copy bytes starting at `offset` into `buf`
    ///
    /// Returns the number of bytes written, which is
    /// `min(buf.len(), size - offset)`, or 0 when `offset >= size`.
    fn read_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Read up to `length` bytes starting at `offset`
    fn read(&self, offset: u64, length: usize) -> io::Result<Vec<u8>> {
        let available = self.size().saturating_sub(offset);
        let len = (length as u64).min(available) as usize;
        let mut buf = vec![0u8; len];
        let n = self.read_into(offset, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

/// An in-memory part
#[derive(Debug, Clone)]
pub struct StringPart {
    data: Vec<u8>,
}

impl StringPart {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl Part for StringPart {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }
}

/// A part backed by an open file
///
/// The handle is shared with the caller, who decides when it is closed. Each
/// read seeks the shared handle, so independent reads through other clones of
/// the same handle must not run concurrently. The size is captured once; a
/// file that shrinks after construction makes the owning stream fail with
/// `UnexpectedEof`.
#[derive(Debug, Clone)]
pub struct FilePart {
    file: Arc<File>,
    size: u64,
}

impl FilePart {
    /// Wrap a file, taking its current length as the part size
    pub fn new(file: Arc<File>) -> io::Result<Self> {
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }

    /// Wrap a file with an explicitly known size
    pub fn with_size(file: Arc<File>, size: u64) -> Self {
        Self { file, size }
    }
}

impl Part for FilePart {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_into(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }
        let want = (buf.len() as u64).min(self.size - offset) as usize;

        let mut handle: &File = &self.file;
        handle.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < want {
            match handle.read(&mut buf[filled..want]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}
