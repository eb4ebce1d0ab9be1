//! Rules for entries whose destination already exists.

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;

use crate::ArchiveError;
use crate::Result;
use crate::config::CollisionPolicy;
use crate::header::EntryDescriptor;
use crate::types::ExtractFlags;

/// What to do with an entry's destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Nothing exists at the destination.
    Absent,
    /// A directory entry meets an existing directory; reuse it.
    ReuseDir,
    /// Replace the existing file by renaming over it.
    Replace,
    /// Remove the existing path first.
    Unlink,
    /// Leave the existing path alone.
    Skip(&'static str),
}

/// Decides how to treat `target` for `entry` under `flags`.
///
/// `NO_OVERWRITE` takes precedence over `NO_OVERWRITE_NEWER`, which takes
/// precedence over `UNLINK`. An entry without an mtime is treated as older
/// than any existing file.
///
/// # Errors
///
/// - [`ArchiveError::AlreadyExists`] under `NO_OVERWRITE` with
///   [`CollisionPolicy::Abort`], or when a directory entry meets an existing
///   non-directory without `UNLINK`
/// - [`ArchiveError::WriteDisk`] if the destination cannot be inspected
pub fn resolve_collision(
    target: &Path,
    entry: &EntryDescriptor,
    flags: ExtractFlags,
    policy: CollisionPolicy,
) -> Result<Collision> {
    let existing = match fs::symlink_metadata(target) {
        Ok(existing) => existing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Collision::Absent),
        Err(source) => {
            return Err(ArchiveError::WriteDisk {
                path: target.to_path_buf(),
                source,
            });
        }
    };

    if entry.is_dir() && existing.is_dir() {
        return Ok(Collision::ReuseDir);
    }

    if flags.contains(ExtractFlags::NO_OVERWRITE) {
        return match policy {
            CollisionPolicy::Abort => Err(ArchiveError::AlreadyExists {
                path: target.to_path_buf(),
            }),
            CollisionPolicy::Skip => Ok(Collision::Skip("destination exists")),
        };
    }

    if flags.contains(ExtractFlags::NO_OVERWRITE_NEWER) {
        let existing_mtime = FileTime::from_last_modification_time(&existing).unix_seconds();
        let entry_mtime = entry.metadata.mtime.unwrap_or(i64::MIN);
        if existing_mtime >= entry_mtime {
            return Ok(Collision::Skip("existing file is not older"));
        }
    }

    if flags.contains(ExtractFlags::UNLINK) {
        return Ok(Collision::Unlink);
    }
    if entry.is_dir() {
        return Err(ArchiveError::AlreadyExists {
            path: target.to_path_buf(),
        });
    }
    Ok(Collision::Replace)
}

/// Removes a file, symlink or empty directory at `target`.
///
/// # Errors
///
/// Returns [`ArchiveError::WriteDisk`] if removal fails, including for a
/// non-empty directory.
pub fn remove_existing(target: &Path) -> Result<()> {
    let result = match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(target),
        Ok(_) => fs::remove_file(target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|source| ArchiveError::WriteDisk {
        path: target.to_path_buf(),
        source,
    })
}
