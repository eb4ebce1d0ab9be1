//! Archive reading and extraction configuration.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::verify::KeyRing;

/// What to do when `NO_OVERWRITE` meets an existing destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Fail the batch with [`crate::ArchiveError::AlreadyExists`].
    #[default]
    Abort,
    /// Leave the existing file alone and record the entry as skipped.
    Skip,
}

/// Configuration for opening and extracting archives.
///
/// Bounds default to values that accept every real firmware archive while
/// refusing pathological headers. Verification keys are not built in: the
/// keyring starts empty and every key type used must be provisioned.
///
/// # Examples
///
/// ```
/// use sae_core::ArchiveConfig;
/// use sae_core::config::CollisionPolicy;
///
/// let config = ArchiveConfig::default()
///     .with_max_entries(10_000)
///     .with_collision_policy(CollisionPolicy::Skip)
///     .with_device_serial("1930PDN123456");
///
/// assert_eq!(config.max_entries, 10_000);
/// assert_eq!(config.device_serial.as_deref(), Some("1930PDN123456"));
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Maximum accepted header length in bytes.
    pub max_header_size: u32,

    /// Maximum number of entries a header may declare.
    pub max_entries: usize,

    /// Maximum number of components in an entry path.
    pub max_path_depth: usize,

    /// Behavior of `NO_OVERWRITE` on collision.
    pub collision_policy: CollisionPolicy,

    /// Serial number of this device, checked against device-bound archives.
    pub device_serial: Option<String>,

    /// Time used for expiry checks; `None` means the system clock.
    pub reference_time: Option<SystemTime>,

    /// Verification keys per key type.
    pub keyring: KeyRing,
}

impl Default for ArchiveConfig {
    /// Default values:
    /// - `max_header_size`: 16 MiB
    /// - `max_entries`: 100,000
    /// - `max_path_depth`: 64
    /// - `collision_policy`: [`CollisionPolicy::Abort`]
    /// - `device_serial`: none
    /// - `reference_time`: system clock
    /// - `keyring`: empty
    fn default() -> Self {
        Self {
            max_header_size: 16 * 1024 * 1024, // 16 MiB
            max_entries: 100_000,
            max_path_depth: 64,
            collision_policy: CollisionPolicy::Abort,
            device_serial: None,
            reference_time: None,
            keyring: KeyRing::new(),
        }
    }
}

impl ArchiveConfig {
    /// Sets the header size bound.
    #[must_use]
    pub fn with_max_header_size(mut self, max: u32) -> Self {
        self.max_header_size = max;
        self
    }

    /// Sets the entry count bound.
    #[must_use]
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the path depth bound.
    #[must_use]
    pub fn with_max_path_depth(mut self, max: usize) -> Self {
        self.max_path_depth = max;
        self
    }

    /// Sets the `NO_OVERWRITE` collision policy.
    #[must_use]
    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Sets the device serial.
    #[must_use]
    pub fn with_device_serial(mut self, serial: impl Into<String>) -> Self {
        self.device_serial = Some(serial.into());
        self
    }

    /// Pins the time used for expiry checks.
    #[must_use]
    pub fn with_reference_time(mut self, time: SystemTime) -> Self {
        self.reference_time = Some(time);
        self
    }

    /// Replaces the keyring.
    #[must_use]
    pub fn with_keyring(mut self, keyring: KeyRing) -> Self {
        self.keyring = keyring;
        self
    }

    /// Reference time as seconds since the Unix epoch.
    ///
    /// Times before the epoch clamp to zero.
    #[must_use]
    pub fn reference_unix_time(&self) -> u64 {
        self.reference_time
            .unwrap_or_else(SystemTime::now)
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}
