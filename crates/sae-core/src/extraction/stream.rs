//! Verified content copy.

use std::io::Read;
use std::io::Write;
use std::path::Path;

use crate::ArchiveError;
use crate::Result;
use crate::header::EntryDescriptor;
use crate::io::CopyBuffer;
use crate::io::CopyError;
use crate::io::HashingWriter;
use crate::io::ReadError;
use crate::io::copy_with_buffer;

/// Copies an entry's content from `reader` to `writer`, checking it against
/// the size and digest recorded in the signed header.
///
/// The writer must be disposable: on a mismatch its contents are wrong and
/// the caller discards them.
///
/// # Errors
///
/// - [`ArchiveError::ReadEntry`] if the content cannot be read
/// - [`ArchiveError::WriteDisk`] if writing to `destination` fails
/// - [`ArchiveError::EntryDigestMismatch`] on a length or digest mismatch
pub fn copy_validated<R: Read + ?Sized, W: Write>(
    reader: &mut R,
    writer: W,
    entry: &EntryDescriptor,
    destination: &Path,
    buffer: &mut CopyBuffer,
) -> Result<u64> {
    let mut hashing = HashingWriter::new(writer);
    let copied = copy_with_buffer(reader, &mut hashing, buffer).map_err(|e| match e {
        CopyError::Read(source) => ArchiveError::ReadEntry {
            path: entry.path.clone(),
            source: ReadError::Io(source),
        },
        CopyError::Write(source) => ArchiveError::WriteDisk {
            path: destination.to_path_buf(),
            source,
        },
    })?;
    hashing.flush().map_err(|source| ArchiveError::WriteDisk {
        path: destination.to_path_buf(),
        source,
    })?;

    if copied != entry.size || entry.digest != Some(hashing.digest()) {
        tracing::warn!(
            path = entry.path.as_str(),
            expected = entry.size,
            copied,
            "entry content does not match signed digest"
        );
        return Err(ArchiveError::EntryDigestMismatch {
            path: entry.path.clone(),
        });
    }
    Ok(copied)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use crate::header::EntryKind;
    use crate::header::EntryMetadata;

    fn entry(content: &[u8]) -> EntryDescriptor {
        EntryDescriptor {
            path: "a.txt".to_string(),
            kind: EntryKind::File,
            size: content.len() as u64,
            offset: 0,
            digest: Some(*blake3::hash(content).as_bytes()),
            metadata: EntryMetadata::default(),
        }
    }

    #[test]
    fn test_matching_content() {
        let mut out = Vec::<u8>::new();
        let mut input: &[u8] = b"0123456789";
        let copied = copy_validated(
            &mut input,
            &mut out,
            &entry(b"0123456789"),
            Path::new("a.txt"),
            &mut CopyBuffer::new(),
        )
        .unwrap();
        assert_eq!(copied, 10);
        assert_eq!(out, b"0123456789");
    }

    #[test]
    fn test_empty_content() {
        let mut out = Vec::<u8>::new();
        let mut input: &[u8] = b"";
        let copied = copy_validated(
            &mut input,
            &mut out,
            &entry(b""),
            Path::new("empty"),
            &mut CopyBuffer::new(),
        )
        .unwrap();
        assert_eq!(copied, 0);
    }

    #[test]
    fn test_altered_content() {
        let mut out = Vec::<u8>::new();
        let mut input: &[u8] = b"0123456788";
        let err = copy_validated(
            &mut input,
            &mut out,
            &entry(b"0123456789"),
            Path::new("a.txt"),
            &mut CopyBuffer::new(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSignature);
        assert!(err.is_tamper());
    }

    #[test]
    fn test_short_content() {
        let mut out = Vec::<u8>::new();
        let mut input: &[u8] = b"01234";
        let err = copy_validated(
            &mut input,
            &mut out,
            &entry(b"0123456789"),
            Path::new("a.txt"),
            &mut CopyBuffer::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::EntryDigestMismatch { .. }));
    }

    #[test]
    fn test_read_failure() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "archive truncated",
                ))
            }
        }

        let err = copy_validated(
            &mut Broken,
            Vec::<u8>::new(),
            &entry(b"x"),
            Path::new("a.txt"),
            &mut CopyBuffer::new(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ReadNewFailed);
    }
}
