//! Verified archive handles.
//!
//! [`VerifiedArchive`] is the owned result of a successful open: it can only
//! be constructed by reading the frame, verifying the signature and passing
//! the validity checks, so holding one proves the catalog is authentic.
//! [`SynoArchive`] wraps it in a long-lived context with a state machine and
//! a last-diagnostic string.

use std::path::Path;
use std::path::PathBuf;

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::ErrorCode;
use crate::ExtractionReport;
use crate::Result;
use crate::catalog::Catalog;
use crate::extraction::Extractor;
use crate::header::HeaderDescriptor;
use crate::header::read_frame;
use crate::io::ByteSource;
use crate::io::FileSource;
use crate::types::DestDir;
use crate::types::ExtractFlags;
use crate::verify::KeyType;
use crate::verify::check_validity;
use crate::verify::verify_signature;

/// An archive whose header signature and validity have been checked.
#[derive(Debug)]
pub struct VerifiedArchive<S: ByteSource = FileSource> {
    source: S,
    content_offset: u64,
    header: HeaderDescriptor,
    catalog: Catalog,
}

impl VerifiedArchive<FileSource> {
    /// Opens and verifies the archive at `path`.
    ///
    /// The verification key is resolved before the file is touched, so an
    /// unprovisioned key type fails without any I/O.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::MissingKey`] / [`ArchiveError::CreateEntryKey`] for
    ///   key problems
    /// - [`ArchiveError::OpenArchive`] if the file cannot be opened
    /// - any framing, signature, decode or validity error
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sae_core::ArchiveConfig;
    /// use sae_core::KeyRing;
    /// use sae_core::KeyType;
    /// use sae_core::VerifiedArchive;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let keyring = KeyRing::new().with_key(KeyType::System, [0u8; 32]);
    /// let config = ArchiveConfig::default().with_keyring(keyring);
    /// let archive = VerifiedArchive::open("update.pat", KeyType::System, &config)?;
    /// for entry in archive.catalog().list_all() {
    ///     println!("{} ({} bytes)", entry.path, entry.size);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, key_type: KeyType, config: &ArchiveConfig) -> Result<Self> {
        let path = path.as_ref();
        let key = config.keyring.verifying_key(key_type)?;
        let source = FileSource::open(path).map_err(|source| ArchiveError::OpenArchive {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), %key_type, "archive opened");
        Self::verify(source, key_type, &key, config)
    }
}

impl<S: ByteSource> VerifiedArchive<S> {
    /// Verifies an archive held by any byte source.
    ///
    /// # Errors
    ///
    /// Same as [`VerifiedArchive::open`], minus the file open.
    pub fn from_source(source: S, key_type: KeyType, config: &ArchiveConfig) -> Result<Self> {
        let key = config.keyring.verifying_key(key_type)?;
        Self::verify(source, key_type, &key, config)
    }

    fn verify(
        source: S,
        key_type: KeyType,
        key: &ed25519_dalek::VerifyingKey,
        config: &ArchiveConfig,
    ) -> Result<Self> {
        let raw = read_frame(&source, config.max_header_size)?;
        verify_signature(&raw.signed, &raw.signature, key_type, key)?;
        let header = HeaderDescriptor::decode(&raw, key_type, config)?;
        check_validity(&header, config)?;
        let catalog = Catalog::from_header(&header, raw.content_len);

        tracing::info!(
            %key_type,
            uuid = %header.uuid_hex(),
            entries = catalog.len(),
            "archive verified"
        );
        Ok(Self {
            source,
            content_offset: raw.content_offset,
            header,
            catalog,
        })
    }

    /// The authenticated header.
    #[must_use]
    pub fn header(&self) -> &HeaderDescriptor {
        &self.header
    }

    /// The entry catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// One-line description of the archive.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} archive {} (version {}, {} entries)",
            self.header.key_type,
            self.header.uuid_hex(),
            self.header.version,
            self.catalog.len()
        )
    }

    /// Extracts `paths` (or every entry when empty) into `dest`.
    ///
    /// # Errors
    ///
    /// See [`Extractor::run`].
    pub fn extract<P: AsRef<str>>(
        &self,
        dest: &DestDir,
        flags: ExtractFlags,
        paths: &[P],
        config: &ArchiveConfig,
    ) -> Result<ExtractionReport> {
        Extractor::new(
            &self.source,
            self.content_offset,
            &self.catalog,
            dest,
            flags,
            config,
        )
        .run(paths)
    }
}

/// Lifecycle of a [`SynoArchive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveState {
    /// No archive opened yet.
    Created,
    /// A verified archive is held.
    Opened,
    /// The last extraction wrote this many entries.
    Extracted(usize),
    /// Opening failed; terminal.
    OpenFailed(ErrorCode),
    /// Extraction failed; terminal.
    ExtractFailed(ErrorCode),
}

impl ArchiveState {
    /// Returns `true` for the failure states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::OpenFailed(_) | Self::ExtractFailed(_))
    }
}

/// An extraction context bound to one destination root.
///
/// ```text
/// Created --open--> Opened --extract--> Extracted(n) --extract--> ...
///    |                 |                     |
///    +--> OpenFailed   +--> ExtractFailed <--+
/// ```
///
/// Both failure states are terminal: every later call fails with
/// [`ArchiveError::NotOpened`] and leaves the state unchanged. Opening again
/// from `Opened` or `Extracted` re-reads and re-verifies the file.
///
/// # Examples
///
/// ```no_run
/// use sae_core::ArchiveConfig;
/// use sae_core::ExtractFlags;
/// use sae_core::KeyRing;
/// use sae_core::SynoArchive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut keyring = KeyRing::new();
/// keyring.insert_hex("SYSTEM".parse()?, &std::fs::read_to_string("system.pub")?)?;
///
/// let mut archive =
///     SynoArchive::with_config("/tmp/out", ArchiveConfig::default().with_keyring(keyring));
/// archive.open_named("system", "update.pat")?;
/// let report = archive.extract(ExtractFlags::DEFAULT, &["VERSION"])?;
/// println!("{}: {} files", archive.info(), report.files_extracted);
/// archive.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SynoArchive {
    dest: PathBuf,
    config: ArchiveConfig,
    archive: Option<VerifiedArchive>,
    state: ArchiveState,
    info: String,
    last_error: Option<ErrorCode>,
}

impl SynoArchive {
    /// Creates a context extracting into `dest` with default configuration.
    #[must_use]
    pub fn new<P: AsRef<Path>>(dest: P) -> Self {
        Self::with_config(dest, ArchiveConfig::default())
    }

    /// Creates a context extracting into `dest`.
    #[must_use]
    pub fn with_config<P: AsRef<Path>>(dest: P, config: ArchiveConfig) -> Self {
        Self {
            dest: dest.as_ref().to_path_buf(),
            config,
            archive: None,
            state: ArchiveState::Created,
            info: String::new(),
            last_error: None,
        }
    }

    /// Opens and verifies `path` with `key_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotOpened`] from a failure state, otherwise
    /// any error of [`VerifiedArchive::open`]; the context then moves to
    /// [`ArchiveState::OpenFailed`].
    pub fn open<P: AsRef<Path>>(&mut self, key_type: KeyType, path: P) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.note(ArchiveError::NotOpened));
        }
        self.archive = None;

        match VerifiedArchive::open(path, key_type, &self.config) {
            Ok(archive) => {
                self.info = archive.summary();
                self.last_error = None;
                self.archive = Some(archive);
                self.state = ArchiveState::Opened;
                Ok(())
            }
            Err(e) => {
                self.state = ArchiveState::OpenFailed(e.code());
                Err(self.note(e))
            }
        }
    }

    /// Opens `path` with a key type given by name, e.g. `"SYSTEM"`.
    ///
    /// The name is resolved before any I/O.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::UnknownKeyType`] for an unrecognized name, otherwise
    /// as [`open`](Self::open).
    pub fn open_named<P: AsRef<Path>>(&mut self, key_type: &str, path: P) -> Result<()> {
        if self.state.is_terminal() {
            return Err(self.note(ArchiveError::NotOpened));
        }
        match key_type.parse::<KeyType>() {
            Ok(key_type) => self.open(key_type, path),
            Err(e) => {
                self.archive = None;
                self.state = ArchiveState::OpenFailed(e.code());
                Err(self.note(e))
            }
        }
    }

    /// Extracts `paths` (or every entry when empty) into the destination.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::NotOpened`] unless the context is `Opened` or
    /// `Extracted`, otherwise any extraction error. A failure moves the
    /// context to [`ArchiveState::ExtractFailed`] and releases the archive.
    pub fn extract<P: AsRef<str>>(
        &mut self,
        flags: ExtractFlags,
        paths: &[P],
    ) -> Result<ExtractionReport> {
        if self.state.is_terminal() {
            return Err(self.note(ArchiveError::NotOpened));
        }

        let result = match &self.archive {
            Some(archive) => DestDir::new(&self.dest)
                .and_then(|dest| archive.extract(&dest, flags, paths, &self.config)),
            None => Err(ArchiveError::NotOpened),
        };

        match result {
            Ok(report) => {
                self.state = ArchiveState::Extracted(report.total_items());
                self.info = format!(
                    "extracted {} files and {} directories ({} bytes)",
                    report.files_extracted, report.directories_created, report.bytes_written
                );
                self.last_error = None;
                Ok(report)
            }
            Err(e) => {
                self.archive = None;
                self.state = ArchiveState::ExtractFailed(e.code());
                Err(self.note(e))
            }
        }
    }

    fn note(&mut self, error: ArchiveError) -> ArchiveError {
        tracing::warn!(code = %error.code(), error = %error, "archive operation failed");
        self.info = error.to_string();
        self.last_error = Some(error.code());
        error
    }

    /// Diagnostic string of the most recent operation.
    #[must_use]
    pub fn info(&self) -> &str {
        &self.info
    }

    /// Code of the most recent failure, cleared by a successful operation.
    #[must_use]
    pub fn last_error(&self) -> Option<ErrorCode> {
        self.last_error
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ArchiveState {
        self.state
    }

    /// Destination root.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Header of the verified archive, while one is held.
    #[must_use]
    pub fn header(&self) -> Option<&HeaderDescriptor> {
        self.archive.as_ref().map(VerifiedArchive::header)
    }

    /// Catalog of the verified archive, while one is held.
    #[must_use]
    pub fn catalog(&self) -> Option<&Catalog> {
        self.archive.as_ref().map(VerifiedArchive::catalog)
    }

    /// Releases the archive file.
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::FixtureBuilder;
    use crate::test_utils::other_signing_key;
    use crate::test_utils::test_public_key;
    use crate::verify::KeyRing;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> ArchiveConfig {
        ArchiveConfig::default().with_keyring(KeyRing::new().with_key(KeyType::System, test_public_key()))
    }

    fn write_fixture(dir: &Path, builder: &FixtureBuilder) -> PathBuf {
        let path = dir.join("fixture.pat");
        fs::write(&path, builder.build()).unwrap();
        path
    }

    #[test]
    fn test_verified_from_memory() {
        let data = FixtureBuilder::new("system").file("a.txt", b"abc").build();
        let archive = VerifiedArchive::from_source(data, KeyType::System, &config()).unwrap();
        assert_eq!(archive.catalog().len(), 1);
        assert_eq!(archive.header().object_type, "system");
        assert!(archive.summary().starts_with("SYSTEM archive"));
    }

    #[test]
    fn test_missing_key_before_io() {
        let err = VerifiedArchive::open("/nonexistent/fixture.pat", KeyType::Spk, &config())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownKeyType);
    }

    #[test]
    fn test_missing_file() {
        let err = VerifiedArchive::open("/nonexistent/fixture.pat", KeyType::System, &config())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OpenArchiveFailed);
    }

    #[test]
    fn test_open_extract_reextract() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(
            temp.path(),
            &FixtureBuilder::new("system").file("a.txt", b"abc").file("b.txt", b"de"),
        );
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();

        let mut archive = SynoArchive::with_config(&out, config());
        assert_eq!(archive.state(), ArchiveState::Created);
        assert!(archive.header().is_none());

        archive.open(KeyType::System, &path).unwrap();
        assert_eq!(archive.state(), ArchiveState::Opened);
        assert!(!archive.info().is_empty());
        assert_eq!(archive.catalog().unwrap().len(), 2);

        archive.extract(ExtractFlags::empty(), &["a.txt"]).unwrap();
        assert_eq!(archive.state(), ArchiveState::Extracted(1));
        archive.extract::<&str>(ExtractFlags::empty(), &[]).unwrap();
        assert_eq!(archive.state(), ArchiveState::Extracted(2));
        assert_eq!(fs::read(out.join("b.txt")).unwrap(), b"de");

        archive.open(KeyType::System, &path).unwrap();
        assert_eq!(archive.state(), ArchiveState::Opened);
        archive.close();
    }

    #[test]
    fn test_extract_before_open() {
        let temp = TempDir::new().unwrap();
        let mut archive = SynoArchive::with_config(temp.path(), config());
        let err = archive.extract::<&str>(ExtractFlags::DEFAULT, &[]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OpenArchiveFailed);
        assert_eq!(
            archive.state(),
            ArchiveState::ExtractFailed(ErrorCode::OpenArchiveFailed)
        );
        assert_eq!(archive.last_error(), Some(ErrorCode::OpenArchiveFailed));
    }

    #[test]
    fn test_open_failure_is_terminal() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(
            temp.path(),
            &FixtureBuilder::new("system")
                .file("a.txt", b"abc")
                .signing_key(other_signing_key()),
        );

        let mut archive = SynoArchive::with_config(temp.path(), config());
        let err = archive.open(KeyType::System, &path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSignature);
        assert_eq!(
            archive.state(),
            ArchiveState::OpenFailed(ErrorCode::InvalidSignature)
        );
        assert!(archive.info().contains("signature"));
        assert!(archive.catalog().is_none());

        let err = archive.extract::<&str>(ExtractFlags::DEFAULT, &[]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OpenArchiveFailed);
        assert_eq!(
            archive.state(),
            ArchiveState::OpenFailed(ErrorCode::InvalidSignature)
        );
    }

    #[test]
    fn test_unknown_key_name() {
        let temp = TempDir::new().unwrap();
        let mut archive = SynoArchive::with_config(temp.path(), config());
        let err = archive
            .open_named("BOGUS", temp.path().join("never-read.pat"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownKeyType);
        assert_eq!(archive.last_error(), Some(ErrorCode::UnknownKeyType));
    }

    #[test]
    fn test_extract_failure_releases_archive() {
        let temp = TempDir::new().unwrap();
        let path = write_fixture(temp.path(), &FixtureBuilder::new("system").file("a", b"x"));
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();

        let mut archive = SynoArchive::with_config(&out, config());
        archive.open_named("system", &path).unwrap();
        let err = archive.extract(ExtractFlags::DEFAULT, &["missing"]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileNotFound);
        assert_eq!(
            archive.state(),
            ArchiveState::ExtractFailed(ErrorCode::FileNotFound)
        );
        assert!(archive.header().is_none());
    }
}
