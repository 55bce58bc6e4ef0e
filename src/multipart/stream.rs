// src/multipart/stream.rs

//! Sequential view over an ordered list of parts
//!
//! The stream never concatenates its parts. Each read locates the part that
//! holds the cursor through the cumulative start offsets and pulls only the
//! bytes it needs, so memory use is bounded by the read length no matter how
//! large the file parts are.

use super::part::Part;
use crate::hash::ContentHasher;
use std::io::{self, Read};

/// Buffer size used when digesting the body (8 KB)
const DIGEST_BUFFER_SIZE: usize = 8192;

/// One logical byte stream composed from parts
pub struct MultipartStream {
    parts: Vec<Box<dyn Part>>,
    /// Stream offset at which each part begins
    starts: Vec<u64>,
    size: u64,
    cursor: u64,
}

impl MultipartStream {
    pub fn new(parts: Vec<Box<dyn Part>>) -> Self {
        let mut starts = Vec::with_capacity(parts.len());
        let mut size = 0u64;
        for part in &parts {
            starts.push(size);
            size += part.size();
        }

        Self {
            parts,
            starts,
            size,
            cursor: 0,
        }
    }

    /// Total length of the stream in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Current read position
    pub fn position(&self) -> u64 {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.size
    }

    /// Read up to `length` bytes from the cursor
    ///
    /// Returns `None` once the stream is exhausted.
    pub fn read_chunk(&mut self, length: usize) -> io::Result<Option<Vec<u8>>> {
        let mut chunk = Vec::new();
        Ok(self.read_chunk_into(length, &mut chunk)?.map(|_| chunk))
    }

    /// Read up to `length` bytes into a reusable buffer
    ///
    /// `dest` is cleared and refilled. Returns the number of bytes written, or
    /// `None` once the stream is exhausted.
    pub fn read_chunk_into(&mut self, length: usize, dest: &mut Vec<u8>) -> io::Result<Option<usize>> {
        if self.is_exhausted() {
            return Ok(None);
        }

        let wanted = (self.size - self.cursor).min(length as u64) as usize;
        dest.clear();
        dest.resize(wanted, 0);
        let n = self.fill(dest)?;
        dest.truncate(n);
        Ok(Some(n))
    }

    /// Base64 SHA-256 of the whole body
    ///
    /// Reads every part at its own offsets, so the cursor is left untouched.
    pub fn content_hash(&self) -> io::Result<String> {
        let mut hasher = ContentHasher::new();
        let mut buffer = vec![0u8; DIGEST_BUFFER_SIZE];

        for part in &self.parts {
            let mut offset = 0u64;
            while offset < part.size() {
                let n = part.read_into(offset, &mut buffer)?;
                if n == 0 {
                    return Err(short_part_error());
                }
                hasher.update(&buffer[..n]);
                offset += n as u64;
            }
        }

        Ok(hasher.finalize_base64())
    }

    /// Index of the part holding stream position `pos`
    ///
    /// Empty parts share their start offset with the next part; taking the
    /// last part starting at or before `pos` skips over them.
    fn part_index(&self, pos: u64) -> usize {
        self.starts.partition_point(|&start| start <= pos) - 1
    }

    /// Fill `buf` from the cursor across part boundaries
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;

        while filled < buf.len() && !self.is_exhausted() {
            let index = self.part_index(self.cursor);
            let local = self.cursor - self.starts[index];
            let n = self.parts[index].read_into(local, &mut buf[filled..])?;
            if n == 0 {
                return Err(short_part_error());
            }
            filled += n;
            self.cursor += n as u64;
        }

        Ok(filled)
    }
}

fn short_part_error() -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "multipart part ended before its recorded size",
    )
}

impl Read for MultipartStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill(buf)
    }
}

impl std::fmt::Debug for MultipartStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartStream")
            .field("parts", &self.parts.len())
            .field("size", &self.size)
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256_base64;
    use crate::multipart::part::{FilePart, StringPart};
    use std::fs::File;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn string_stream(chunks: &[&str]) -> MultipartStream {
        MultipartStream::new(
            chunks
                .iter()
                .map(|c| Box::new(StringPart::new(*c)) as Box<dyn Part>)
                .collect(),
        )
    }

    #[test]
    fn test_two_string_parts() {
        let mut stream = string_stream(&["stream1", "stream2"]);
        assert_eq!(stream.size(), 14);

        assert_eq!(stream.read_chunk(10).unwrap().unwrap(), b"stream1str");
        assert_eq!(stream.position(), 10);
        assert_eq!(stream.read_chunk(10).unwrap().unwrap(), b"eam2");
        assert!(stream.read_chunk(10).unwrap().is_none());
    }

    #[test]
    fn test_any_chunk_length_reconstructs_body() {
        let chunks = ["--b\r\n", "", "alpha", "beta gamma", "", "\r\n--b--\r\n"];
        let expected: Vec<u8> = chunks.concat().into_bytes();

        for k in 1..=expected.len() + 1 {
            let mut stream = string_stream(&chunks);
            assert_eq!(stream.size(), expected.len() as u64);

            let mut out = Vec::new();
            while let Some(chunk) = stream.read_chunk(k).unwrap() {
                assert!(!chunk.is_empty() && chunk.len() <= k);
                out.extend_from_slice(&chunk);
            }
            assert_eq!(out, expected, "chunk length {}", k);
        }
    }

    #[test]
    fn test_reusable_buffer_matches_fresh_reads() {
        let mut fresh = string_stream(&["stream1", "stream2", "stream3"]);
        let mut reused = string_stream(&["stream1", "stream2", "stream3"]);
        let mut buffer = Vec::with_capacity(4);

        loop {
            let a = fresh.read_chunk(4).unwrap();
            let b = reused.read_chunk_into(4, &mut buffer).unwrap();
            match (a, b) {
                (Some(chunk), Some(n)) => {
                    assert_eq!(n, chunk.len());
                    assert_eq!(&buffer[..n], chunk.as_slice());
                }
                (None, None) => break,
                other => panic!("streams diverged: {:?}", other),
            }
        }
    }

    #[test]
    fn test_zero_length_read_before_end() {
        let mut stream = string_stream(&["abc"]);
        assert_eq!(stream.read_chunk(0).unwrap().unwrap(), Vec::<u8>::new());
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_empty_stream_is_exhausted() {
        let mut stream = MultipartStream::new(Vec::new());
        assert_eq!(stream.size(), 0);
        assert!(stream.read_chunk(16).unwrap().is_none());
    }

    #[test]
    fn test_mixed_file_and_string_parts() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"FILEDATA").unwrap();
        temp.flush().unwrap();
        let handle = Arc::new(File::open(temp.path()).unwrap());

        let mut stream = MultipartStream::new(vec![
            Box::new(StringPart::new("head:")),
            Box::new(FilePart::new(handle).unwrap()),
            Box::new(StringPart::new(":tail")),
        ]);

        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"head:FILEDATA:tail");
    }

    #[test]
    fn test_io_read_with_small_buffer() {
        let mut stream = string_stream(&["stream1", "stream2"]);
        let mut buf = [0u8; 3];
        let mut out = Vec::new();
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"stream1stream2");
    }

    #[test]
    fn test_content_hash_leaves_cursor() {
        let mut stream = string_stream(&["Hello, ", "World!"]);
        stream.read_chunk(3).unwrap();

        assert_eq!(
            stream.content_hash().unwrap(),
            sha256_base64(b"Hello, World!")
        );
        assert_eq!(stream.position(), 3);
        assert_eq!(stream.read_chunk(100).unwrap().unwrap(), b"lo, World!");
    }

    #[test]
    fn test_truncated_file_part_fails() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"abc").unwrap();
        temp.flush().unwrap();
        let handle = Arc::new(File::open(temp.path()).unwrap());

        let mut stream = MultipartStream::new(vec![Box::new(FilePart::with_size(handle, 10))]);
        let err = stream.read_chunk(10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
