//! Random-access byte sources.

use std::fs::File;
use std::path::Path;

use super::ReadError;

/// A read-only, random-access source of archive bytes.
///
/// Implementors only provide the total length and an in-bounds positional
/// read; bounds checking is done once, in [`read_exact_at`], so every source
/// reports truncation the same way.
///
/// Sources take `&self` for reads, so one source can back any number of
/// readers (header cursor, entry windows) without mutation.
///
/// [`read_exact_at`]: ByteSource::read_exact_at
pub trait ByteSource {
    /// Total number of bytes in the source.
    fn len(&self) -> u64;

    /// Returns `true` if the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills `buf` from `offset`. Only called with an in-bounds range.
    fn fill_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()>;

    /// Reads exactly `buf.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Truncated`] if the range extends past the end of
    /// the source, or [`ReadError::Io`] if the underlying read fails.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), ReadError> {
        let wanted = buf.len() as u64;
        let available = self.len().saturating_sub(offset);
        if wanted > available {
            return Err(ReadError::Truncated {
                offset,
                wanted,
                available,
            });
        }
        if buf.is_empty() {
            return Ok(());
        }
        self.fill_at(offset, buf).map_err(ReadError::Io)
    }
}

impl ByteSource for [u8] {
    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    #[allow(clippy::cast_possible_truncation)]
    fn fill_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        // In-bounds by contract, so the offset fits in usize.
        let start = offset as usize;
        buf.copy_from_slice(&self[start..start + buf.len()]);
        Ok(())
    }
}

impl ByteSource for Vec<u8> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn fill_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        self.as_slice().fill_at(offset, buf)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &T {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn fill_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        (**self).fill_at(offset, buf)
    }
}

/// An archive file opened for positional reads.
///
/// The length is captured once at open time; a file that shrinks afterwards
/// surfaces as an I/O error on the affected read rather than silently short
/// data.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    /// Opens `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening the file or reading its metadata.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    #[cfg(unix)]
    fn fill_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.read_exact_at(buf, offset)
    }

    #[cfg(windows)]
    fn fill_at(&self, offset: u64, buf: &mut [u8]) -> std::io::Result<()> {
        use std::os::windows::fs::FileExt;

        let mut filled = 0;
        while filled < buf.len() {
            match self.file.seek_read(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => return Err(std::io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
