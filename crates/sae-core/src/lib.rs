//! Reader, verifier and safe extractor for signed firmware update archives.
//!
//! `sae-core` opens the signed `.pat`-style container used to ship firmware
//! and package updates, verifies its Ed25519 header signature before any
//! header field is trusted, checks expiry and device binding, and extracts
//! selected members with per-entry BLAKE3 verification, path containment and
//! metadata restoration (owner, mode, times, xattrs, ACL, file flags).
//!
//! # Examples
//!
//! ```no_run
//! use sae_core::ArchiveConfig;
//! use sae_core::KeyRing;
//! use sae_core::KeyType;
//! use sae_core::extract_archive;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut keyring = KeyRing::new();
//! keyring.insert_hex(KeyType::System, &std::fs::read_to_string("system.pub")?)?;
//! let config = ArchiveConfig::default().with_keyring(keyring);
//!
//! let report = extract_archive::<_, _, &str>(KeyType::System, "update.pat", "/output/dir", &[], &config)?;
//! println!("Extracted {} files", report.files_extracted);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extraction;
pub mod header;
pub mod io;
pub mod report;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export main API types
pub use api::ArchiveBuilder;
pub use api::extract_archive;
pub use archive::ArchiveState;
pub use archive::SynoArchive;
pub use archive::VerifiedArchive;
pub use catalog::Catalog;
pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use error::ErrorCode;
pub use error::Result;
pub use report::ExtractionReport;

// Re-export types module for easier access
pub use header::EntryDescriptor;
pub use header::HeaderDescriptor;
pub use types::DestDir;
pub use types::ExtractFlags;
pub use types::SafePath;
pub use verify::KeyRing;
pub use verify::KeyType;
