//! High-level public API for archive extraction.

use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::ExtractionReport;
use crate::Result;
use crate::archive::VerifiedArchive;
use crate::types::DestDir;
use crate::types::ExtractFlags;
use crate::verify::KeyType;

/// Opens, verifies and extracts an archive in one call.
///
/// Uses [`ExtractFlags::DEFAULT`] (owner, permissions and times). An empty
/// `paths` extracts every entry.
///
/// # Arguments
///
/// * `key_type` - Key type the archive must be signed with
/// * `archive_path` - Path to the archive file
/// * `output_dir` - Existing, writable destination root
/// * `paths` - Entry paths to extract
/// * `config` - Bounds, policy and verification keys
///
/// # Errors
///
/// Returns an error if:
/// - No key is configured for `key_type`
/// - The archive cannot be opened, fails verification or is not applicable
/// - The destination is invalid
/// - Any entry fails to extract
///
/// # Examples
///
/// ```no_run
/// use sae_core::ArchiveConfig;
/// use sae_core::KeyRing;
/// use sae_core::KeyType;
/// use sae_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ArchiveConfig::default().with_keyring(KeyRing::new().with_key(KeyType::Spk, [0u8; 32]));
/// let report = extract_archive(KeyType::Spk, "package.spk", "/tmp/output", &["INFO"], &config)?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<str>>(
    key_type: KeyType,
    archive_path: P,
    output_dir: Q,
    paths: &[S],
    config: &ArchiveConfig,
) -> Result<ExtractionReport> {
    let archive = VerifiedArchive::open(archive_path, key_type, config)?;
    let dest = DestDir::new(output_dir.as_ref())?;
    archive.extract(&dest, ExtractFlags::DEFAULT, paths, config)
}

/// Builder for configuring archive extraction.
///
/// # Examples
///
/// ```no_run
/// use sae_core::ArchiveBuilder;
/// use sae_core::ExtractFlags;
/// use sae_core::KeyType;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = ArchiveBuilder::new()
///     .key_type(KeyType::System)
///     .archive("update.pat")
///     .output_dir("/tmp/output")
///     .flags(ExtractFlags::DEFAULT | ExtractFlags::XATTR)
///     .extract()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    key_type: Option<KeyType>,
    archive_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    flags: Option<ExtractFlags>,
    paths: Vec<String>,
    config: Option<ArchiveConfig>,
}

impl ArchiveBuilder {
    /// Creates a new `ArchiveBuilder`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key type.
    #[must_use]
    pub fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = Some(key_type);
        self
    }

    /// Sets the archive file path.
    #[must_use]
    pub fn archive<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the extraction flags; [`ExtractFlags::DEFAULT`] if unset.
    #[must_use]
    pub fn flags(mut self, flags: ExtractFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Adds an entry path to extract. With none, every entry is extracted.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: ArchiveConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Executes the extraction with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the key type, archive path or output directory
    /// are not set, or if opening or extraction fails.
    pub fn extract(self) -> Result<ExtractionReport> {
        let key_type = self
            .key_type
            .ok_or_else(|| ArchiveError::UnknownKeyType("key type not set".to_string()))?;

        let archive_path = self.archive_path.ok_or_else(|| ArchiveError::OpenArchive {
            path: PathBuf::new(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "archive path not set",
            ),
        })?;

        let output_dir = self
            .output_dir
            .ok_or_else(|| ArchiveError::FilePathInvalid {
                path: String::new(),
                reason: "output directory not set".to_string(),
            })?;

        let config = self.config.unwrap_or_default();
        let flags = self.flags.unwrap_or_default();

        let archive = VerifiedArchive::open(archive_path, key_type, &config)?;
        let dest = DestDir::new(output_dir)?;
        archive.extract(&dest, flags, self.paths.as_slice(), &config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use crate::test_utils::FixtureBuilder;
    use crate::test_utils::test_public_key;
    use crate::verify::KeyRing;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> ArchiveConfig {
        ArchiveConfig::default()
            .with_keyring(KeyRing::new().with_key(KeyType::System, test_public_key()))
    }

    #[test]
    fn test_extract_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.pat");
        fs::write(
            &path,
            FixtureBuilder::new("system")
                .file("x/y.txt", b"payload")
                .build(),
        )
        .unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();

        let report = extract_archive::<_, _, &str>(KeyType::System, &path, &out, &[], &config())
            .unwrap();
        assert_eq!(report.files_extracted, 1);
        assert_eq!(fs::read(out.join("x/y.txt")).unwrap(), b"payload");
    }

    #[test]
    fn test_builder_selected_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.pat");
        fs::write(
            &path,
            FixtureBuilder::new("system")
                .file("keep", b"1")
                .file("other", b"2")
                .build(),
        )
        .unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();

        let report = ArchiveBuilder::new()
            .key_type(KeyType::System)
            .archive(&path)
            .output_dir(&out)
            .flags(ExtractFlags::TIME)
            .path("keep")
            .config(config())
            .extract()
            .unwrap();
        assert_eq!(report.files_extracted, 1);
        assert!(out.join("keep").exists());
        assert!(!out.join("other").exists());
    }

    #[test]
    fn test_builder_missing_key_type() {
        let err = ArchiveBuilder::new()
            .archive("test.pat")
            .output_dir("/tmp/test")
            .extract()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownKeyType);
    }

    #[test]
    fn test_builder_missing_archive() {
        let err = ArchiveBuilder::new()
            .key_type(KeyType::System)
            .output_dir("/tmp/test")
            .extract()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OpenArchiveFailed);
    }

    #[test]
    fn test_builder_missing_output() {
        let err = ArchiveBuilder::new()
            .key_type(KeyType::System)
            .archive("test.pat")
            .extract()
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FilePathInvalid);
    }
}
