//! Batch extraction of catalog entries.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::ExtractionReport;
use crate::Result;
use crate::catalog::Catalog;
use crate::header::EntryDescriptor;
use crate::header::EntryKind;
use crate::header::EntryMetadata;
use crate::io::ByteSource;
use crate::io::CopyBuffer;
use crate::io::EntryReader;
use crate::types::DestDir;
use crate::types::ExtractFlags;
use crate::types::SafePath;

use super::atomic::StagedFile;
use super::collision::Collision;
use super::collision::remove_existing;
use super::collision::resolve_collision;
use super::metadata;
use super::stream::copy_validated;

/// Metadata applied to a directory once the batch has written its children.
#[derive(Debug)]
struct DirFixup {
    path: PathBuf,
    depth: usize,
    metadata: EntryMetadata,
}

/// Writes catalog entries from a verified archive into a destination root.
///
/// An extraction is fail-fast: the first failing entry ends the batch.
/// Every requested path is resolved and validated before anything is
/// written, so a missing name or an unsafe path leaves the destination
/// untouched.
pub struct Extractor<'a, S: ByteSource + ?Sized> {
    source: &'a S,
    content_offset: u64,
    catalog: &'a Catalog,
    dest: &'a DestDir,
    flags: ExtractFlags,
    config: &'a ArchiveConfig,
}

impl<'a, S: ByteSource + ?Sized> Extractor<'a, S> {
    /// Creates an extractor reading content from `source`, where entry
    /// offsets are relative to `content_offset`.
    #[must_use]
    pub fn new(
        source: &'a S,
        content_offset: u64,
        catalog: &'a Catalog,
        dest: &'a DestDir,
        flags: ExtractFlags,
        config: &'a ArchiveConfig,
    ) -> Self {
        Self {
            source,
            content_offset,
            catalog,
            dest,
            flags,
            config,
        }
    }

    /// Extracts `paths`, or every entry if `paths` is empty.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::FileNotFound`] if a requested path is not in the
    ///   catalog, or (for a full extraction) an entry's content window is
    ///   out of bounds
    /// - [`ArchiveError::FilePathInvalid`] for unsafe entry paths or a missing
    ///   parent under `NO_AUTODIR`
    /// - [`ArchiveError::OpenFile`] if a temporary file cannot be created
    /// - [`ArchiveError::ReadEntry`] if content cannot be read
    /// - [`ArchiveError::EntryDigestMismatch`] if content fails verification
    /// - [`ArchiveError::WriteDisk`], [`ArchiveError::AlreadyExists`] or
    ///   [`ArchiveError::Restore`] for destination failures
    pub fn run<P: AsRef<str>>(&self, paths: &[P]) -> Result<ExtractionReport> {
        let start = Instant::now();

        let selected = self.select(paths)?;
        let planned = selected
            .into_iter()
            .map(|entry| {
                SafePath::validate(&entry.path, self.dest, self.config.max_path_depth)
                    .map(|safe| (entry, safe))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            entries = planned.len(),
            flags = ?self.flags,
            dest = %self.dest.as_path().display(),
            "starting extraction"
        );

        let mut report = ExtractionReport::new();
        if self.catalog.superseded() > 0 {
            report.add_warning(format!(
                "{} duplicate entries superseded by later entries with the same path",
                self.catalog.superseded()
            ));
        }

        let mut buffer = CopyBuffer::new();
        let mut fixups = Vec::new();
        for (entry, safe) in &planned {
            match entry.kind {
                EntryKind::File => self.extract_file(entry, safe, &mut buffer, &mut report)?,
                EntryKind::Directory => {
                    self.extract_dir(entry, safe, &mut fixups, &mut report)?;
                }
            }
        }
        self.apply_dir_fixups(fixups)?;

        report.duration = start.elapsed();
        tracing::info!(
            files = report.files_extracted,
            directories = report.directories_created,
            skipped = report.files_skipped,
            bytes = report.bytes_written,
            "extraction complete"
        );
        Ok(report)
    }

    fn select<P: AsRef<str>>(&self, paths: &[P]) -> Result<Vec<&'a EntryDescriptor>> {
        let catalog: &'a Catalog = self.catalog;
        if paths.is_empty() {
            catalog.names().map(|name| catalog.find(name)).collect()
        } else {
            paths.iter().map(|path| catalog.find(path.as_ref())).collect()
        }
    }

    /// Makes sure the parent of `target` exists inside the root.
    fn prepare_parent(&self, target: &Path, entry: &EntryDescriptor) -> Result<()> {
        let Some(parent) = target.parent() else {
            return Ok(());
        };
        if self.flags.contains(ExtractFlags::NO_AUTODIR) {
            if !parent.is_dir() {
                return Err(ArchiveError::FilePathInvalid {
                    path: entry.path.clone(),
                    reason: "parent directory does not exist".to_string(),
                });
            }
        } else {
            fs::create_dir_all(parent).map_err(|source| ArchiveError::WriteDisk {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.dest.ensure_contains(parent, &entry.path)
    }

    fn extract_file(
        &self,
        entry: &EntryDescriptor,
        safe: &SafePath,
        buffer: &mut CopyBuffer,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let target = self.dest.join(safe);
        self.prepare_parent(&target, entry)?;

        match resolve_collision(&target, entry, self.flags, self.config.collision_policy)? {
            Collision::Skip(why) => {
                tracing::warn!(path = entry.path.as_str(), why, "entry skipped");
                report.record_skip(&entry.path, why);
                return Ok(());
            }
            Collision::Unlink => remove_existing(&target)?,
            Collision::Absent | Collision::Replace | Collision::ReuseDir => {}
        }

        let mut staged = StagedFile::create(&target)?;
        let mut reader = EntryReader::new(
            self.source,
            self.content_offset + entry.offset,
            entry.size,
        );
        let written = copy_validated(&mut reader, staged.file_mut(), entry, &target, buffer)?;

        if !self.flags.contains(ExtractFlags::PERM) || entry.metadata.mode.is_none() {
            metadata::restore_mode(staged.path(), default_file_mode(&entry.metadata)).map_err(
                |source| ArchiveError::WriteDisk {
                    path: target.clone(),
                    source,
                },
            )?;
        }
        self.restore_metadata(staged.path(), &target, &entry.metadata)?;
        staged.commit()?;
        self.restore_fflags(&target, &entry.metadata)?;

        tracing::debug!(path = entry.path.as_str(), bytes = written, "file extracted");
        report.files_extracted += 1;
        report.bytes_written += written;
        Ok(())
    }

    fn extract_dir(
        &self,
        entry: &EntryDescriptor,
        safe: &SafePath,
        fixups: &mut Vec<DirFixup>,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let target = self.dest.join(safe);
        self.prepare_parent(&target, entry)?;

        match resolve_collision(&target, entry, self.flags, self.config.collision_policy)? {
            Collision::Skip(why) => {
                tracing::warn!(path = entry.path.as_str(), why, "entry skipped");
                report.record_skip(&entry.path, why);
                return Ok(());
            }
            Collision::ReuseDir => {}
            Collision::Unlink => {
                remove_existing(&target)?;
                create_dir(&target)?;
                report.directories_created += 1;
            }
            Collision::Absent | Collision::Replace => {
                create_dir(&target)?;
                report.directories_created += 1;
            }
        }
        self.dest.ensure_contains(&target, &entry.path)?;

        tracing::debug!(path = entry.path.as_str(), "directory ready");
        fixups.push(DirFixup {
            path: target,
            depth: safe.depth(),
            metadata: entry.metadata.clone(),
        });
        Ok(())
    }

    /// Applies directory metadata deepest first, after all children exist.
    fn apply_dir_fixups(&self, mut fixups: Vec<DirFixup>) -> Result<()> {
        fixups.sort_by(|a, b| b.depth.cmp(&a.depth));
        for fixup in &fixups {
            self.restore_metadata(&fixup.path, &fixup.path, &fixup.metadata)?;
            self.restore_fflags(&fixup.path, &fixup.metadata)?;
        }
        Ok(())
    }

    /// Applies the requested attributes to `path` in the order owner,
    /// permissions, xattrs, ACL, times. Errors name `reported`.
    fn restore_metadata(&self, path: &Path, reported: &Path, meta: &EntryMetadata) -> Result<()> {
        let fail = |attribute: &'static str| {
            move |source: io::Error| ArchiveError::Restore {
                path: reported.to_path_buf(),
                attribute,
                source,
            }
        };

        if self.flags.contains(ExtractFlags::OWNER) && (meta.uid.is_some() || meta.gid.is_some()) {
            metadata::restore_owner(path, meta.uid, meta.gid).map_err(fail("owner"))?;
        }
        if self.flags.contains(ExtractFlags::PERM)
            && let Some(mode) = meta.mode
        {
            metadata::restore_mode(path, mode).map_err(fail("permissions"))?;
        }
        if self.flags.contains(ExtractFlags::XATTR) {
            for (name, value) in &meta.xattrs {
                metadata::restore_xattr(path, name, value).map_err(fail("xattr"))?;
            }
        }
        if self.flags.contains(ExtractFlags::ACL)
            && let Some(acl) = &meta.acl
        {
            metadata::restore_acl(path, acl).map_err(fail("acl"))?;
        }
        if self.flags.contains(ExtractFlags::TIME)
            && let Some(mtime) = meta.mtime
        {
            metadata::restore_mtime(path, mtime).map_err(fail("mtime"))?;
        }
        Ok(())
    }

    fn restore_fflags(&self, path: &Path, meta: &EntryMetadata) -> Result<()> {
        if self.flags.contains(ExtractFlags::FFLAGS)
            && let Some(fflags) = meta.fflags
        {
            metadata::restore_fflags(path, fflags).map_err(|source| ArchiveError::Restore {
                path: path.to_path_buf(),
                attribute: "fflags",
                source,
            })?;
        }
        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path).map_err(|source| ArchiveError::WriteDisk {
        path: path.to_path_buf(),
        source,
    })
}

/// Mode for files whose recorded mode is not restored: world-readable,
/// executable only if the archive marks it so.
fn default_file_mode(meta: &EntryMetadata) -> u32 {
    if meta.mode.is_some_and(|mode| mode & 0o111 != 0) {
        0o755
    } else {
        0o644
    }
}
