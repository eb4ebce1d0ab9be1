//! Bounded sequential reader over a [`ByteSource`].

use std::io::Read;

use thiserror::Error;

use super::ByteSource;

/// Errors from checked reads.
#[derive(Error, Debug)]
pub enum ReadError {
    /// Fewer bytes remain than were requested.
    #[error("truncated at offset {offset}: wanted {wanted} bytes, {available} available")]
    Truncated {
        /// Offset of the attempted read.
        offset: u64,
        /// Bytes requested.
        wanted: u64,
        /// Bytes remaining at `offset`.
        available: u64,
    },

    /// A length prefix exceeds the caller's bound.
    #[error("length {length} exceeds bound {max}")]
    LengthOutOfBounds {
        /// Declared length.
        length: u64,
        /// Maximum accepted length.
        max: u64,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sequential cursor with checked reads.
///
/// The cursor only moves forward. Every read either returns exactly the
/// requested number of bytes or fails without advancing.
///
/// # Examples
///
/// ```
/// use sae_core::io::ByteReader;
///
/// let data = b"\x03\x00\x00\x00abc".to_vec();
/// let mut reader = ByteReader::new(&data);
/// let body = reader.read_length_prefixed(16)?;
/// assert_eq!(body, b"abc");
/// assert_eq!(reader.remaining(), 0);
/// # Ok::<(), sae_core::io::ReadError>(())
/// ```
#[derive(Debug)]
pub struct ByteReader<'a, S: ByteSource + ?Sized> {
    source: &'a S,
    position: u64,
}

impl<'a, S: ByteSource + ?Sized> ByteReader<'a, S> {
    /// Creates a reader positioned at the start of `source`.
    #[must_use]
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Current offset from the start of the source.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left between the cursor and the end of the source.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.source.len().saturating_sub(self.position)
    }

    /// Reads exactly `n` bytes.
    ///
    /// The bound is checked before allocating, so a hostile length cannot
    /// force a large allocation.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Truncated`] if fewer than `n` bytes remain.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        let wanted = n as u64;
        if wanted > self.remaining() {
            return Err(ReadError::Truncated {
                offset: self.position,
                wanted,
                available: self.remaining(),
            });
        }
        let mut buf = vec![0u8; n];
        self.source.read_exact_at(self.position, &mut buf)?;
        self.position += wanted;
        Ok(buf)
    }

    /// Reads a fixed-size array.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Truncated`] if fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let mut buf = [0u8; N];
        self.source.read_exact_at(self.position, &mut buf)?;
        self.position += N as u64;
        Ok(buf)
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Truncated`] at end of input.
    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Truncated`] if fewer than 4 bytes remain.
    pub fn read_u32_le(&mut self) -> Result<u32, ReadError> {
        self.read_array::<4>().map(u32::from_le_bytes)
    }

    /// Reads a `u32` little-endian length prefix followed by that many bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::LengthOutOfBounds`] if the prefix exceeds `max`
    /// (nothing past the prefix is read), or [`ReadError::Truncated`] if the
    /// prefix or body is cut short.
    pub fn read_length_prefixed(&mut self, max: u64) -> Result<Vec<u8>, ReadError> {
        let start = self.position;
        let length = u64::from(self.read_u32_le()?);
        if length > max {
            self.position = start;
            return Err(ReadError::LengthOutOfBounds { length, max });
        }
        match self.read_exact(length as usize) {
            Ok(body) => Ok(body),
            Err(e) => {
                self.position = start;
                Err(e)
            }
        }
    }
}

/// `Read` adapter over the window `[offset, offset + len)` of a source.
///
/// Used to stream entry content by recorded offset. A window that reaches
/// past the end of the source yields an `UnexpectedEof` error at the point
/// of truncation.
#[derive(Debug)]
pub struct EntryReader<'a, S: ByteSource + ?Sized> {
    source: &'a S,
    offset: u64,
    end: u64,
}

impl<'a, S: ByteSource + ?Sized> EntryReader<'a, S> {
    /// Creates a reader over `len` bytes starting at `offset`.
    #[must_use]
    pub fn new(source: &'a S, offset: u64, len: u64) -> Self {
        Self {
            source,
            offset,
            end: offset.saturating_add(len),
        }
    }

    /// Bytes not yet read from the window.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.end - self.offset
    }
}

impl<S: ByteSource + ?Sized> Read for EntryReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(usize::try_from(self.remaining()).unwrap_or(usize::MAX));
        if n == 0 {
            return Ok(0);
        }
        self.source
            .read_exact_at(self.offset, &mut buf[..n])
            .map_err(|e| match e {
                ReadError::Io(io) => io,
                other => std::io::Error::new(std::io::ErrorKind::UnexpectedEof, other),
            })?;
        self.offset += n as u64;
        Ok(n)
    }
}
