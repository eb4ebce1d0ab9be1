//! Validated entry path.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveError;
use crate::Result;

use super::DestDir;

/// An entry path that is safe to create under a destination root.
///
/// A `SafePath` is relative, free of `..`, NUL bytes and root or prefix
/// components, within the configured depth, and every existing ancestor of
/// its target resolves inside the root. It can only be built through
/// [`SafePath::validate`].
///
/// # Examples
///
/// ```no_run
/// use sae_core::types::{DestDir, SafePath};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/update")?;
///
/// let safe = SafePath::validate("./etc/synoinfo.conf", &dest, 64)?;
/// assert_eq!(safe.as_path().to_str(), Some("etc/synoinfo.conf"));
///
/// assert!(SafePath::validate("../../etc/passwd", &dest, 64).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Validates the archive path `entry` for extraction under `dest`.
    ///
    /// `.` components are dropped. Existing ancestors of the target are
    /// canonicalized so that a symlink already inside the root cannot route
    /// the entry outside it. The target itself is not resolved: the extractor
    /// replaces it rather than writing through it.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::FilePathInvalid`] if the path is empty,
    /// absolute, contains `..` or a NUL byte, exceeds `max_depth`, or has an
    /// ancestor that resolves outside `dest`.
    pub fn validate(entry: &str, dest: &DestDir, max_depth: usize) -> Result<Self> {
        let reject = |reason: String| ArchiveError::FilePathInvalid {
            path: entry.to_string(),
            reason,
        };

        if entry.contains('\0') {
            return Err(reject("path contains NUL byte".to_string()));
        }

        let path = Path::new(entry);
        if path.has_root() || path.is_absolute() {
            return Err(reject("absolute path".to_string()));
        }

        let mut normalized = PathBuf::new();
        let mut depth = 0usize;
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    depth += 1;
                    normalized.push(part);
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(reject("parent directory traversal".to_string()));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(reject("absolute path".to_string()));
                }
            }
        }

        if depth == 0 {
            return Err(reject("path names no file".to_string()));
        }
        if depth > max_depth {
            return Err(reject(format!(
                "path depth {depth} exceeds maximum {max_depth}"
            )));
        }

        let target = dest.as_path().join(&normalized);
        check_ancestors(&target, dest).map_err(reject)?;

        Ok(Self(normalized))
    }

    /// Returns the normalized relative path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Number of components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.components().count()
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

/// Finds the deepest existing ancestor of `target` and checks that it
/// resolves inside `dest`.
fn check_ancestors(target: &Path, dest: &DestDir) -> std::result::Result<(), String> {
    let mut current = target.parent();
    while let Some(dir) = current {
        match dir.canonicalize() {
            Ok(canonical) if canonical.starts_with(dest.as_path()) => return Ok(()),
            Ok(_) => {
                return Err(format!(
                    "{} resolves outside the destination",
                    dir.display()
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => current = dir.parent(),
            Err(e) => return Err(format!("cannot resolve {}: {e}", dir.display())),
        }
    }
    Ok(())
}
