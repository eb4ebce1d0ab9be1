//! Closed enumeration of archive key types.

use std::fmt;
use std::str::FromStr;

use crate::ArchiveError;

/// Selects the verification key and the archive sub-format.
///
/// Numeric codes match the values used by existing tooling and are stable.
/// Name lookup is an explicit exhaustive mapping; there is no fallback key.
///
/// # Examples
///
/// ```
/// use sae_core::verify::KeyType;
///
/// let key_type: KeyType = "system".parse()?;
/// assert_eq!(key_type, KeyType::System);
/// assert_eq!(key_type.code(), 0);
/// assert!("BOGUS".parse::<KeyType>().is_err());
/// # Ok::<(), sae_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum KeyType {
    /// System (DSM) images.
    System = 0,
    /// Nano updates.
    Nano = 1,
    /// Security JSON bundles.
    Json = 2,
    /// Packages.
    Spk = 3,
    /// Unassigned slot 4.
    Unk4 = 4,
    /// Security scan database.
    Ssdb = 5,
    /// Unassigned slot 6.
    Unk6 = 6,
    /// Unassigned slot 7.
    Unk7 = 7,
    /// Device-bound developer token.
    Dev = 8,
    /// Wedjat bundles.
    Wedjat = 9,
    /// Unassigned slot 10.
    Unk10 = 10,
    /// Small patches.
    Small = 11,
}

impl KeyType {
    /// Every key type, in code order.
    pub const ALL: [Self; 12] = [
        Self::System,
        Self::Nano,
        Self::Json,
        Self::Spk,
        Self::Unk4,
        Self::Ssdb,
        Self::Unk6,
        Self::Unk7,
        Self::Dev,
        Self::Wedjat,
        Self::Unk10,
        Self::Small,
    ];

    /// Returns the numeric code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::System => "SYSTEM",
            Self::Nano => "NANO",
            Self::Json => "JSON",
            Self::Spk => "SPK",
            Self::Unk4 => "UNK4",
            Self::Ssdb => "SSDB",
            Self::Unk6 => "UNK6",
            Self::Unk7 => "UNK7",
            Self::Dev => "DEV",
            Self::Wedjat => "WEDJAT",
            Self::Unk10 => "UNK10",
            Self::Small => "SMALL",
        }
    }

    /// Object type a header must declare to be accepted with this key type.
    #[must_use]
    pub const fn object_type(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Nano => "nano",
            Self::Json => "security_json",
            Self::Spk => "spk",
            Self::Unk4 => "unk4",
            Self::Ssdb => "securityscan_db",
            Self::Unk6 => "unk6",
            Self::Unk7 => "unk7",
            Self::Dev => "dev_token",
            Self::Wedjat => "wedjat",
            Self::Unk10 => "unk10",
            Self::Small => "small_patch",
        }
    }

    /// Returns `true` if archives of this type must name the device serial.
    #[must_use]
    pub const fn is_device_bound(self) -> bool {
        matches!(self, Self::Dev)
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyType {
    type Err = ArchiveError;

    /// Parses a key type name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let key_type = match upper.as_str() {
            "SYSTEM" => Self::System,
            "NANO" => Self::Nano,
            "JSON" => Self::Json,
            "SPK" => Self::Spk,
            "UNK4" => Self::Unk4,
            "SSDB" => Self::Ssdb,
            "UNK6" => Self::Unk6,
            "UNK7" => Self::Unk7,
            "DEV" => Self::Dev,
            "WEDJAT" => Self::Wedjat,
            "UNK10" => Self::Unk10,
            "SMALL" => Self::Small,
            _ => return Err(ArchiveError::UnknownKeyType(s.to_string())),
        };
        Ok(key_type)
    }
}

impl TryFrom<u32> for KeyType {
    type Error = ArchiveError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| ArchiveError::UnknownKeyType(code.to_string()))
    }
}
