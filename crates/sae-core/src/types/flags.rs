//! Extraction option bits.

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Options controlling how entries are written and which metadata is
    /// restored.
    ///
    /// Bit values are stable and match the numeric options accepted by
    /// existing callers.
    ///
    /// # Examples
    ///
    /// ```
    /// use sae_core::ExtractFlags;
    ///
    /// let flags: ExtractFlags = "owner|perm|time".parse()?;
    /// assert_eq!(flags, ExtractFlags::DEFAULT);
    /// assert_eq!(flags.bits(), 7);
    /// # Ok::<(), sae_core::types::flags::UnknownFlag>(())
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExtractFlags: u32 {
        /// Restore owner and group.
        const OWNER = 1;
        /// Restore permission bits, including setuid/setgid/sticky.
        const PERM = 1 << 1;
        /// Restore modification time.
        const TIME = 1 << 2;
        /// Never replace an existing file.
        const NO_OVERWRITE = 1 << 3;
        /// Remove an existing file before writing.
        const UNLINK = 1 << 4;
        /// Restore access ACLs.
        const ACL = 1 << 5;
        /// Restore file flags.
        const FFLAGS = 1 << 6;
        /// Restore extended attributes.
        const XATTR = 1 << 7;
        /// Do not create missing parent directories.
        const NO_AUTODIR = 1 << 8;
        /// Skip entries not newer than the existing file.
        const NO_OVERWRITE_NEWER = 1 << 9;
    }
}

impl ExtractFlags {
    /// Owner, permissions and modification time.
    pub const DEFAULT: Self = Self::OWNER.union(Self::PERM).union(Self::TIME);
}

impl Default for ExtractFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A flag name that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown extract flag: {0}")]
pub struct UnknownFlag(pub String);

impl std::str::FromStr for ExtractFlags {
    type Err = UnknownFlag;

    /// Parses names separated by `|`, `,` or whitespace, ignoring case.
    /// An empty string yields no flags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(|c: char| c == '|' || c == ',' || c.is_whitespace())
            .filter(|name| !name.is_empty())
            .try_fold(Self::empty(), |flags, name| {
                Self::from_name(&name.to_ascii_uppercase())
                    .map(|flag| flags | flag)
                    .ok_or_else(|| UnknownFlag(name.to_string()))
            })
    }
}
