//! Counting and digesting writer.
//!
//! This module provides a `HashingWriter` that wraps any `Write`
//! implementation, tracks the total number of bytes written and feeds them
//! to a BLAKE3 hasher, so entry content can be verified in the same pass
//! that writes it to disk.

use std::io::Write;

/// Wrapper writer that counts and digests the bytes it passes through.
///
/// Only bytes the inner writer accepted are counted and hashed. If a write
/// fails partway through, the count and digest cover exactly the bytes that
/// reached the inner writer.
///
/// # Examples
///
/// ```
/// use sae_core::io::HashingWriter;
/// use std::io::Write;
///
/// let mut writer = HashingWriter::new(Vec::new());
/// writer.write_all(b"Hello, ")?;
/// writer.write_all(b"World!")?;
///
/// assert_eq!(writer.total_bytes(), 13);
/// assert_eq!(writer.digest(), *blake3::hash(b"Hello, World!").as_bytes());
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct HashingWriter<W> {
    inner: W,
    hasher: blake3::Hasher,
    bytes_written: u64,
}

impl<W> HashingWriter<W> {
    /// Creates a new hashing writer around `inner`.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: blake3::Hasher::new(),
            bytes_written: 0,
        }
    }

    /// Returns the total number of bytes successfully written.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.bytes_written
    }

    /// Returns the BLAKE3 digest of everything written so far.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        *self.hasher.finalize().as_bytes()
    }

    /// Returns a reference to the inner writer.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consumes the writer and returns the inner writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes = self.inner.write(buf)?;
        self.hasher.update(&buf[..bytes]);
        self.bytes_written += bytes as u64;
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
