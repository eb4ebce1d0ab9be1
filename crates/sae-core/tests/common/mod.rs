//! Shared helpers for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

#[path = "../../src/test_utils.rs"]
mod fixture;

pub use fixture::*;

use sae_core::ArchiveConfig;
use sae_core::KeyRing;
use sae_core::KeyType;
use std::path::Path;
use std::path::PathBuf;

/// Configuration trusting the fixture key for `key_type`.
pub fn config_for(key_type: KeyType) -> ArchiveConfig {
    ArchiveConfig::default().with_keyring(KeyRing::new().with_key(key_type, test_public_key()))
}

/// Writes `builder`'s archive into `dir` and returns its path.
pub fn write_archive(dir: &Path, name: &str, builder: &FixtureBuilder) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, builder.build()).unwrap();
    path
}

/// Creates and returns an empty `out` directory under `dir`.
pub fn out_dir(dir: &Path) -> PathBuf {
    let out = dir.join("out");
    std::fs::create_dir(&out).unwrap();
    out
}
