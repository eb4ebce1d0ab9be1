//! Validated destination root.

use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;

/// A validated destination directory for extraction.
///
/// The directory exists, is writable and is held as an absolute canonical
/// path. Every extracted path is checked against this canonical root.
///
/// # Examples
///
/// ```no_run
/// use sae_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/volume1/@tmp/update")?;
/// println!("extracting to {}", dest.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

fn invalid(path: &Path, reason: impl Into<String>) -> ArchiveError {
    ArchiveError::FilePathInvalid {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

impl DestDir {
    /// Validates `path` as a destination root.
    ///
    /// There is a window between this check and later writes in which the
    /// directory could be swapped for a symlink. Every directory the
    /// extractor creates is re-resolved against the canonical root, which
    /// limits what such a swap can reach.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::FilePathInvalid`] if the path does not exist,
    /// is not a directory, cannot be canonicalized, or is not writable.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)
            .map_err(|e| invalid(&path, format!("destination is not accessible: {e}")))?;
        if !metadata.is_dir() {
            return Err(invalid(&path, "destination is not a directory"));
        }

        let canonical = path
            .canonicalize()
            .map_err(|e| invalid(&path, format!("cannot canonicalize destination: {e}")))?;

        #[cfg(unix)]
        {
            use std::ffi::CString;
            use std::os::unix::ffi::OsStrExt;

            let c_path = CString::new(canonical.as_os_str().as_bytes())
                .map_err(|_| invalid(&canonical, "path contains NUL byte"))?;

            // SAFETY: `c_path` is a valid NUL-terminated string that outlives
            // the call; access() only reads it.
            #[allow(unsafe_code)]
            let result = unsafe { libc::access(c_path.as_ptr(), libc::W_OK) };

            if result != 0 {
                return Err(invalid(&canonical, "destination is not writable"));
            }
        }

        Ok(Self(canonical))
    }

    /// Returns the canonical root.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a validated entry path to the root.
    #[inline]
    #[must_use]
    pub fn join(&self, safe_path: &super::SafePath) -> PathBuf {
        self.0.join(safe_path.as_path())
    }

    /// Verifies that the existing directory `dir` resolves inside the root.
    ///
    /// `entry` is the archive path being extracted, used for the error.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::FilePathInvalid`] if `dir` cannot be resolved
    /// or resolves outside the root.
    pub fn ensure_contains(&self, dir: &Path, entry: &str) -> Result<()> {
        let canonical = dir.canonicalize().map_err(|e| ArchiveError::FilePathInvalid {
            path: entry.to_string(),
            reason: format!("cannot resolve {}: {e}", dir.display()),
        })?;
        if canonical.starts_with(&self.0) {
            Ok(())
        } else {
            Err(ArchiveError::FilePathInvalid {
                path: entry.to_string(),
                reason: format!("{} resolves outside the destination", dir.display()),
            })
        }
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}
