//! Write-to-temp-then-rename staging.

use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::ArchiveError;
use crate::Result;

/// A file being written next to its final location.
///
/// The temporary file lives in the target's directory so the final rename
/// stays on one filesystem. Dropping a `StagedFile` without calling
/// [`commit`](Self::commit) deletes the temporary file, so no partially
/// written or unverified content is ever visible at the target path.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Creates a temporary file alongside `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::OpenFile`] if the temporary file cannot be
    /// created.
    pub fn create(target: &Path) -> Result<Self> {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let temp = tempfile::Builder::new()
            .prefix(".sae-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(|source| ArchiveError::OpenFile {
                path: dir.to_path_buf(),
                source,
            })?;
        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Path of the temporary file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Final destination.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The open temporary file.
    pub fn file_mut(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }

    /// Atomically renames the temporary file onto the target, replacing any
    /// existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::WriteDisk`] if the rename fails; the temporary
    /// file is removed in that case.
    pub fn commit(self) -> Result<()> {
        let Self { temp, target } = self;
        temp.persist(&target)
            .map(drop)
            .map_err(|e| ArchiveError::WriteDisk {
                path: target,
                source: e.error,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_commit_places_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out.bin");

        let mut staged = StagedFile::create(&target).unwrap();
        assert_eq!(staged.target(), target);
        assert!(staged.path().starts_with(temp.path()));
        staged.file_mut().write_all(b"content").unwrap();
        staged.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"content");
        assert_eq!(entries(temp.path()), vec!["out.bin"]);
    }

    #[test]
    fn test_commit_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out.bin");
        fs::write(&target, b"old").unwrap();

        let mut staged = StagedFile::create(&target).unwrap();
        staged.file_mut().write_all(b"new").unwrap();
        staged.commit().unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_drop_discards_temp() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out.bin");
        {
            let mut staged = StagedFile::create(&target).unwrap();
            staged.file_mut().write_all(b"partial").unwrap();
        }
        assert!(entries(temp.path()).is_empty());
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("missing/out.bin");
        let err = StagedFile::create(&target).unwrap_err();
        assert!(matches!(err, ArchiveError::OpenFile { .. }));
    }

    #[test]
    fn test_commit_onto_directory_fails_and_cleans_up() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("taken");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("child"), b"x").unwrap();

        let staged = StagedFile::create(&target).unwrap();
        let err = staged.commit().unwrap_err();
        assert!(matches!(err, ArchiveError::WriteDisk { .. }));
        assert_eq!(entries(temp.path()), vec!["taken"]);
    }
}
