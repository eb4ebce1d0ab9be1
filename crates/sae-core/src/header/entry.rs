//! Per-entry descriptors decoded from the signed header.

use rmpv::Value;

use crate::ArchiveError;
use crate::Result;

use super::fields::Fields;

/// Maximum number of fields in one entry map.
pub const MAX_ENTRY_FIELDS: usize = 32;

/// Maximum number of extended attributes on one entry.
pub const MAX_XATTRS: usize = 256;

/// Entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file with content in the content area.
    File,
    /// Directory; carries metadata only.
    Directory,
}

impl EntryKind {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "file" => Some(Self::File),
            "dir" => Some(Self::Directory),
            _ => None,
        }
    }
}

/// Metadata restorable on extraction. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Unix mode bits.
    pub mode: Option<u32>,
    /// Owner user id.
    pub uid: Option<u32>,
    /// Owner group id.
    pub gid: Option<u32>,
    /// Modification time, unix seconds.
    pub mtime: Option<i64>,
    /// Access ACL in the kernel's xattr encoding.
    pub acl: Option<Vec<u8>>,
    /// Extended attributes, in header order.
    pub xattrs: Vec<(String, Vec<u8>)>,
    /// File flags (chattr / chflags bits).
    pub fflags: Option<u32>,
}

/// One archive member as recorded in the signed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// Path relative to the destination, as recorded.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Content length in bytes; zero for directories.
    pub size: u64,
    /// Content offset relative to the start of the content area.
    pub offset: u64,
    /// BLAKE3 digest of the content; present for every file.
    pub digest: Option<[u8; 32]>,
    /// Restorable metadata.
    pub metadata: EntryMetadata,
}

impl EntryDescriptor {
    /// Returns `true` for directory entries.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// End of the content window, or `None` on overflow.
    #[must_use]
    pub fn content_end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }

    /// Decodes entry number `index` of the header's entry list.
    pub(crate) fn decode(index: usize, value: &Value) -> Result<Self> {
        let fields = Fields::new(value, format!("entry {index}"), MAX_ENTRY_FIELDS)?;
        let invalid = |reason: String| {
            ArchiveError::InvalidHeader(format!("{}: {reason}", fields.context()))
        };

        let path = fields.str("path")?;
        if path.is_empty() {
            return Err(invalid("empty path".to_string()));
        }

        let kind = match fields.opt_str("kind")? {
            None => EntryKind::File,
            Some(name) => {
                EntryKind::parse(name).ok_or_else(|| invalid(format!("unknown kind `{name}`")))?
            }
        };

        let size = fields.opt_u64("size")?.unwrap_or(0);
        let offset = fields.opt_u64("offset")?.unwrap_or(0);
        let digest = match fields.opt_bytes("hash")? {
            Some(bytes) => Some(
                <[u8; 32]>::try_from(bytes)
                    .map_err(|_| invalid(format!("hash is {} bytes, expected 32", bytes.len())))?,
            ),
            None => None,
        };

        match kind {
            EntryKind::File => {
                if fields.get("size").is_none() || fields.get("offset").is_none() {
                    return Err(invalid("file entry needs `size` and `offset`".to_string()));
                }
                if digest.is_none() {
                    return Err(invalid("file entry needs `hash`".to_string()));
                }
            }
            EntryKind::Directory => {
                if size != 0 {
                    return Err(invalid(format!("directory declares {size} content bytes")));
                }
            }
        }

        let xattrs = match fields.get("xattrs") {
            None => Vec::new(),
            Some(value) => decode_xattrs(value, &invalid)?,
        };

        let metadata = EntryMetadata {
            mode: fields.opt_u32("mode")?,
            uid: fields.opt_u32("uid")?,
            gid: fields.opt_u32("gid")?,
            mtime: fields.opt_i64("mtime")?,
            acl: fields.opt_bytes("acl")?.map(<[u8]>::to_vec),
            xattrs,
            fflags: fields.opt_u32("fflags")?,
        };

        Ok(Self {
            path: path.to_string(),
            kind,
            size,
            offset,
            digest,
            metadata,
        })
    }
}

fn decode_xattrs(
    value: &Value,
    invalid: &impl Fn(String) -> ArchiveError,
) -> Result<Vec<(String, Vec<u8>)>> {
    let Value::Map(pairs) = value else {
        return Err(invalid("`xattrs` must be a map".to_string()));
    };
    if pairs.len() > MAX_XATTRS {
        return Err(invalid(format!(
            "{} xattrs exceeds limit of {MAX_XATTRS}",
            pairs.len()
        )));
    }
    pairs
        .iter()
        .map(|(name, data)| {
            let name = name
                .as_str()
                .filter(|n| !n.is_empty() && !n.contains('\0'))
                .ok_or_else(|| invalid("xattr name must be a non-empty string".to_string()))?;
            let data = data
                .as_slice()
                .ok_or_else(|| invalid(format!("xattr `{name}` value must be binary")))?;
            Ok((name.to_string(), data.to_vec()))
        })
        .collect()
}
