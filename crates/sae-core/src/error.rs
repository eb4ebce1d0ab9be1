//! Error types for archive open, verification and extraction.

use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::io::ReadError;
use crate::verify::KeyType;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Stable numeric error codes.
///
/// The numbering is part of the public contract: callers that persist or
/// compare raw codes (for example `18` for a missing member) keep working
/// across releases. `Ok` is never produced by an [`ArchiveError`]; it exists
/// so that a full code table can be expressed with one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// Success.
    Ok = 0,
    /// The archive file could not be opened, or no archive is open.
    OpenArchiveFailed = 1,
    /// The magic/version field could not be read.
    ReadVersion = 2,
    /// The header length field could not be read.
    ReadHeaderLength = 3,
    /// The header (or its trailing signature) could not be read.
    ReadHeader = 4,
    /// The signature backend failed to initialize.
    CryptoInitFailed = 5,
    /// The magic bytes do not identify a signed archive.
    InvalidFormat = 6,
    /// The format version is not supported.
    InvalidVersion = 7,
    /// The header is structurally valid but semantically wrong.
    InvalidHeader = 8,
    /// The header bytes are not a valid structured map.
    InvalidHeaderDecode = 9,
    /// The header object type does not match the key type.
    InvalidObjectType = 10,
    /// The UUID field has the wrong type tag.
    InvalidUuidType = 11,
    /// The UUID field has the wrong size.
    InvalidUuidSize = 12,
    /// The verification key could not be constructed.
    CreateEntryKeyFailed = 13,
    /// Signature or entry digest verification failed.
    InvalidSignature = 14,
    /// Entry content could not be read from the archive.
    ReadNewFailed = 15,
    /// Writing an entry (or its metadata) to disk failed.
    WriteDiskNewFailed = 16,
    /// An entry path is invalid or escapes the destination.
    FilePathInvalid = 17,
    /// A requested entry does not exist in the archive.
    FileNotFound = 18,
    /// The declared header length exceeds the configured maximum.
    HeaderExceedsMax = 19,
    /// The key type is unknown or has no verification key.
    UnknownKeyType = 20,
    /// The archive validity window has ended.
    Expired = 21,
    /// The archive is bound to a different device serial.
    SerialNumMismatch = 22,
    /// A destination file could not be created.
    OpenFileFailed = 23,
}

impl ErrorCode {
    const ALL: [Self; 24] = [
        Self::Ok,
        Self::OpenArchiveFailed,
        Self::ReadVersion,
        Self::ReadHeaderLength,
        Self::ReadHeader,
        Self::CryptoInitFailed,
        Self::InvalidFormat,
        Self::InvalidVersion,
        Self::InvalidHeader,
        Self::InvalidHeaderDecode,
        Self::InvalidObjectType,
        Self::InvalidUuidType,
        Self::InvalidUuidSize,
        Self::CreateEntryKeyFailed,
        Self::InvalidSignature,
        Self::ReadNewFailed,
        Self::WriteDiskNewFailed,
        Self::FilePathInvalid,
        Self::FileNotFound,
        Self::HeaderExceedsMax,
        Self::UnknownKeyType,
        Self::Expired,
        Self::SerialNumMismatch,
        Self::OpenFileFailed,
    ];

    /// Returns the raw numeric code.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Looks up a code by its numeric value.
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Returns the upper-case symbolic name, e.g. `FILE_NOT_FOUND`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::OpenArchiveFailed => "OPEN_ARCHIVE_FAILED",
            Self::ReadVersion => "READ_VERSION",
            Self::ReadHeaderLength => "READ_HEADER_LENGTH",
            Self::ReadHeader => "READ_HEADER",
            Self::CryptoInitFailed => "CRYPTO_INIT_FAILED",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidVersion => "INVALID_VERSION",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::InvalidHeaderDecode => "INVALID_HEADER_DECODE",
            Self::InvalidObjectType => "INVALID_OBJECT_TYPE",
            Self::InvalidUuidType => "INVALID_UUID_TYPE",
            Self::InvalidUuidSize => "INVALID_UUID_SIZE",
            Self::CreateEntryKeyFailed => "CREATE_ENTRY_KEY_FAILED",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::ReadNewFailed => "READ_NEW_FAILED",
            Self::WriteDiskNewFailed => "WRITE_DISK_NEW_FAILED",
            Self::FilePathInvalid => "FILE_PATH_INVALID",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::HeaderExceedsMax => "HEADER_EXCEEDS_MAX",
            Self::UnknownKeyType => "UNKNOWN_KEY_TYPE",
            Self::Expired => "EXPIRED",
            Self::SerialNumMismatch => "SERIAL_NUM_MISMATCH",
            Self::OpenFileFailed => "OPEN_FILE_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.as_u32())
    }
}

/// Errors that can occur while opening, verifying or extracting an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive file could not be opened.
    #[error("cannot open archive {path}: {source}")]
    OpenArchive {
        /// The archive path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An operation required an open, verified archive.
    #[error("no verified archive is open")]
    NotOpened,

    /// The magic/version field could not be read.
    #[error("cannot read format version: {0}")]
    ReadVersion(#[source] ReadError),

    /// The header length field could not be read.
    #[error("cannot read header length: {0}")]
    ReadHeaderLength(#[source] ReadError),

    /// The header bytes or the signature trailer could not be read.
    #[error("cannot read header: {0}")]
    ReadHeader(#[source] ReadError),

    /// The signature backend failed to initialize.
    #[error("signature backend initialization failed: {0}")]
    CryptoInit(String),

    /// Magic bytes do not match.
    #[error("not a signed archive (magic {found:02x?})")]
    InvalidFormat {
        /// The magic bytes found at the start of the file.
        found: [u8; 3],
    },

    /// Unsupported format version.
    #[error("unsupported format version {version}")]
    InvalidVersion {
        /// The version byte found.
        version: u8,
    },

    /// Header is well-formed but does not describe a valid archive.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Header bytes could not be decoded as a structured map.
    #[error("header decode failed: {0}")]
    InvalidHeaderDecode(String),

    /// Header object type does not match the key type.
    #[error("object type mismatch: expected {expected:?}, found {found:?}")]
    InvalidObjectType {
        /// Object type required by the key type.
        expected: &'static str,
        /// Object type declared by the header.
        found: String,
    },

    /// UUID field has the wrong type tag.
    #[error("uuid field has type {found}, expected binary")]
    InvalidUuidType {
        /// Type tag found in the header.
        found: &'static str,
    },

    /// UUID field has the wrong size.
    #[error("uuid field is {size} bytes, expected {expected}")]
    InvalidUuidSize {
        /// Size found.
        size: usize,
        /// Required size.
        expected: usize,
    },

    /// The verification key for a key type could not be constructed.
    #[error("cannot create verification key for {key_type}: {reason}")]
    CreateEntryKey {
        /// Key type whose key failed.
        key_type: KeyType,
        /// Why the key was rejected.
        reason: String,
    },

    /// Header signature does not verify.
    #[error("header signature verification failed for key type {key_type}")]
    InvalidSignature {
        /// Key type used for verification.
        key_type: KeyType,
    },

    /// Entry content does not match the digest or size in the signed header.
    #[error("content of {path} does not match its signed digest")]
    EntryDigestMismatch {
        /// Entry path inside the archive.
        path: String,
    },

    /// Entry content could not be read from the archive.
    #[error("cannot read content of {path}: {source}")]
    ReadEntry {
        /// Entry path inside the archive.
        path: String,
        /// Underlying read error.
        #[source]
        source: ReadError,
    },

    /// Writing to the destination failed.
    #[error("write to {path} failed: {source}")]
    WriteDisk {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Destination exists and overwriting is disabled.
    #[error("refusing to overwrite existing {path}")]
    AlreadyExists {
        /// Destination path.
        path: PathBuf,
    },

    /// A requested metadata restoration failed.
    #[error("cannot restore {attribute} on {path}: {source}")]
    Restore {
        /// Destination path.
        path: PathBuf,
        /// Which attribute failed (owner, permissions, ...).
        attribute: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Entry path is invalid or resolves outside the destination.
    #[error("invalid entry path {path:?}: {reason}")]
    FilePathInvalid {
        /// Entry path as recorded in the archive.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Entry is not present in the catalog.
    #[error("file not found in archive: {path}")]
    FileNotFound {
        /// Requested path.
        path: String,
    },

    /// Declared header length exceeds the limit.
    #[error("header length {length} exceeds maximum {max}")]
    HeaderExceedsMax {
        /// Declared header length.
        length: u64,
        /// Configured maximum.
        max: u64,
    },

    /// Key type name or number is not recognized.
    #[error("unknown key type: {0}")]
    UnknownKeyType(String),

    /// Key type is recognized but has no verification key.
    #[error("no verification key configured for key type {0}")]
    MissingKey(KeyType),

    /// Archive validity window has ended.
    #[error("archive expired at {expired_at} (now {now})")]
    Expired {
        /// Expiry time, unix seconds.
        expired_at: u64,
        /// Reference time used for the check, unix seconds.
        now: u64,
    },

    /// Archive is bound to another device.
    #[error("archive is bound to serial {expected:?}, device serial is {actual:?}")]
    SerialNumMismatch {
        /// Serial recorded in the archive.
        expected: String,
        /// Serial of this device, if configured.
        actual: Option<String>,
    },

    /// Destination file could not be created.
    #[error("cannot create file in {path}: {source}")]
    OpenFile {
        /// Directory or path being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    /// Returns the stable numeric code for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use sae_core::ArchiveError;
    /// use sae_core::ErrorCode;
    ///
    /// let err = ArchiveError::FileNotFound {
    ///     path: "a.txt".into(),
    /// };
    /// assert_eq!(err.code(), ErrorCode::FileNotFound);
    /// assert_eq!(err.code().as_u32(), 18);
    /// ```
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::OpenArchive { .. } | Self::NotOpened => ErrorCode::OpenArchiveFailed,
            Self::ReadVersion(_) => ErrorCode::ReadVersion,
            Self::ReadHeaderLength(_) => ErrorCode::ReadHeaderLength,
            Self::ReadHeader(_) => ErrorCode::ReadHeader,
            Self::CryptoInit(_) => ErrorCode::CryptoInitFailed,
            Self::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            Self::InvalidVersion { .. } => ErrorCode::InvalidVersion,
            Self::InvalidHeader(_) => ErrorCode::InvalidHeader,
            Self::InvalidHeaderDecode(_) => ErrorCode::InvalidHeaderDecode,
            Self::InvalidObjectType { .. } => ErrorCode::InvalidObjectType,
            Self::InvalidUuidType { .. } => ErrorCode::InvalidUuidType,
            Self::InvalidUuidSize { .. } => ErrorCode::InvalidUuidSize,
            Self::CreateEntryKey { .. } => ErrorCode::CreateEntryKeyFailed,
            Self::InvalidSignature { .. } | Self::EntryDigestMismatch { .. } => {
                ErrorCode::InvalidSignature
            }
            Self::ReadEntry { .. } => ErrorCode::ReadNewFailed,
            Self::WriteDisk { .. } | Self::AlreadyExists { .. } | Self::Restore { .. } => {
                ErrorCode::WriteDiskNewFailed
            }
            Self::FilePathInvalid { .. } => ErrorCode::FilePathInvalid,
            Self::FileNotFound { .. } => ErrorCode::FileNotFound,
            Self::HeaderExceedsMax { .. } => ErrorCode::HeaderExceedsMax,
            Self::UnknownKeyType(_) | Self::MissingKey(_) => ErrorCode::UnknownKeyType,
            Self::Expired { .. } => ErrorCode::Expired,
            Self::SerialNumMismatch { .. } => ErrorCode::SerialNumMismatch,
            Self::OpenFile { .. } => ErrorCode::OpenFileFailed,
        }
    }

    /// Returns `true` if the archive bytes were altered after signing.
    ///
    /// Distinguishes "tampered" from [`is_not_applicable`](Self::is_not_applicable)
    /// archives that are authentic but not meant for this device or time.
    #[must_use]
    pub const fn is_tamper(&self) -> bool {
        matches!(
            self,
            Self::InvalidSignature { .. } | Self::EntryDigestMismatch { .. }
        )
    }

    /// Returns `true` for authentic archives rejected by validity policy.
    #[must_use]
    pub const fn is_not_applicable(&self) -> bool {
        matches!(self, Self::Expired { .. } | Self::SerialNumMismatch { .. })
    }

    /// Returns `true` if the error stems from caller configuration rather
    /// than archive content.
    ///
    /// # Examples
    ///
    /// ```
    /// use sae_core::ArchiveError;
    ///
    /// let err = ArchiveError::UnknownKeyType("BOGUS".into());
    /// assert!(err.is_configuration());
    /// assert!(!err.is_tamper());
    /// ```
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownKeyType(_) | Self::MissingKey(_) | Self::CreateEntryKey { .. }
        )
    }

    /// Returns the filesystem path involved in this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::OpenArchive { path, .. }
            | Self::WriteDisk { path, .. }
            | Self::AlreadyExists { path }
            | Self::Restore { path, .. }
            | Self::OpenFile { path, .. } => Some(path),
            _ => None,
        }
    }
}
