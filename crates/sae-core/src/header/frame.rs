//! Outer framing: preamble, length-bounded header, trailing signature.
//!
//! ```text
//! offset 0   magic        3 bytes  BF BA AD
//! offset 3   version      1 byte
//! offset 4   header_len   u32 LE
//! offset 8   header       header_len bytes (MessagePack map)
//! ...        content      entry payloads, addressed relative to here
//! EOF - 64   signature    Ed25519 over bytes [0, 8 + header_len)
//! ```

use crate::ArchiveError;
use crate::Result;
use crate::io::ByteReader;
use crate::io::ByteSource;
use crate::io::ReadError;
use crate::verify::SIGNATURE_LEN;

/// Archive magic.
pub const MAGIC: [u8; 3] = [0xBF, 0xBA, 0xAD];

/// Only format version this engine reads.
pub const FORMAT_VERSION: u8 = 3;

/// Magic, version and length prefix.
pub const PREAMBLE_LEN: usize = 8;

/// A framed but not yet authenticated header.
#[derive(Debug, Clone)]
pub struct RawHeader {
    /// Format version from the preamble.
    pub version: u8,
    /// Declared header length.
    pub header_len: u32,
    /// Preamble plus header bytes; the region the signature covers.
    pub signed: Vec<u8>,
    /// Trailing signature.
    pub signature: [u8; SIGNATURE_LEN],
    /// Absolute offset of the content area.
    pub content_offset: u64,
    /// Length of the content area (up to the signature).
    pub content_len: u64,
}

impl RawHeader {
    /// The header bytes without the preamble.
    #[must_use]
    pub fn header_bytes(&self) -> &[u8] {
        &self.signed[PREAMBLE_LEN..]
    }
}

/// Reads the frame of `source`.
///
/// Nothing past the header and the trailing signature is read.
///
/// # Errors
///
/// - [`ArchiveError::ReadVersion`] if the preamble is cut short
/// - [`ArchiveError::InvalidFormat`] on a magic mismatch
/// - [`ArchiveError::InvalidVersion`] on an unsupported version
/// - [`ArchiveError::ReadHeaderLength`] if the length prefix is cut short
/// - [`ArchiveError::InvalidHeader`] on a zero-length header
/// - [`ArchiveError::HeaderExceedsMax`] if the length exceeds `max_header_size`
/// - [`ArchiveError::ReadHeader`] if the header or signature is cut short
pub fn read_frame<S: ByteSource + ?Sized>(source: &S, max_header_size: u32) -> Result<RawHeader> {
    let mut reader = ByteReader::new(source);

    let [m0, m1, m2, version] = reader.read_array::<4>().map_err(ArchiveError::ReadVersion)?;
    let magic = [m0, m1, m2];
    if magic != MAGIC {
        return Err(ArchiveError::InvalidFormat { found: magic });
    }
    if version != FORMAT_VERSION {
        return Err(ArchiveError::InvalidVersion { version });
    }

    let header_len = reader
        .read_u32_le()
        .map_err(ArchiveError::ReadHeaderLength)?;
    if header_len == 0 {
        return Err(ArchiveError::InvalidHeader("header is empty".to_string()));
    }
    if header_len > max_header_size {
        return Err(ArchiveError::HeaderExceedsMax {
            length: u64::from(header_len),
            max: u64::from(max_header_size),
        });
    }

    let header = reader
        .read_exact(header_len as usize)
        .map_err(ArchiveError::ReadHeader)?;

    let sig_len = SIGNATURE_LEN as u64;
    if reader.remaining() < sig_len {
        return Err(ArchiveError::ReadHeader(ReadError::Truncated {
            offset: reader.position(),
            wanted: sig_len,
            available: reader.remaining(),
        }));
    }
    let content_offset = reader.position();
    let content_len = reader.remaining() - sig_len;

    let mut signature = [0u8; SIGNATURE_LEN];
    source
        .read_exact_at(content_offset + content_len, &mut signature)
        .map_err(ArchiveError::ReadHeader)?;

    let mut signed = Vec::with_capacity(PREAMBLE_LEN + header.len());
    signed.extend_from_slice(&MAGIC);
    signed.push(version);
    signed.extend_from_slice(&header_len.to_le_bytes());
    signed.extend_from_slice(&header);

    tracing::trace!(
        version,
        header_len,
        content_offset,
        content_len,
        "archive frame read"
    );

    Ok(RawHeader {
        version,
        header_len,
        signed,
        signature,
        content_offset,
        content_len,
    })
}
